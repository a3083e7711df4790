//! Finding class files on disk and rewriting them in place

pub mod files;

pub use files::{collect_class_files, process_files, ProcessOptions};
