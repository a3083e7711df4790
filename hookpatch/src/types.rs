use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a method lives: class file on disk, class name and method signature
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct MethodLocation {
    pub file: String,
    pub class_name: String,
    pub method_name: String,
    pub method_descriptor: String,
}

impl fmt::Display for MethodLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}.{}{})",
            self.file, self.class_name, self.method_name, self.method_descriptor
        )
    }
}

/// One recognized hook construction
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MatchReport {
    pub location: MethodLocation,
    pub scalar_args: Vec<String>,
    pub variadic_args: Vec<String>,
    pub substituted: bool,
}

/// Totals for one batch of files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub visited: usize,
    pub touched: usize,
    pub failed: usize,
}
