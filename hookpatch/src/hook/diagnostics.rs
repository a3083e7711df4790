use colored::Colorize;

use crate::types::MatchReport;

/// Receives every hook construction the rewriter recognizes
pub trait Diagnostics {
    fn report(&mut self, report: &MatchReport);
}

/// Drops all reports
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDiagnostics;

impl Diagnostics for NoDiagnostics {
    fn report(&mut self, _report: &MatchReport) {}
}

/// Prints reports to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleDiagnostics;

impl Diagnostics for ConsoleDiagnostics {
    fn report(&mut self, report: &MatchReport) {
        let verdict = if report.substituted {
            "rewritten".green()
        } else {
            "found".yellow()
        };
        println!("{} hook in {}", verdict, report.location);
        println!("  parameters: {:?}", report.scalar_args);
        println!("  varargs: {:?}", report.variadic_args);
    }
}

impl Diagnostics for Vec<MatchReport> {
    fn report(&mut self, report: &MatchReport) {
        self.push(report.clone());
    }
}

impl<D: Diagnostics + ?Sized> Diagnostics for &mut D {
    fn report(&mut self, report: &MatchReport) {
        (**self).report(report);
    }
}
