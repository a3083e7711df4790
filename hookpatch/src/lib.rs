//! Post-compilation patcher for `lombok.patcher.Hook` constructions
//!
//! Scans compiled method bodies for the instruction run a compiler emits for
//! `new Hook("owner", "method", "returnType", "param"...)`, resolves the
//! literal arguments and optionally rewrites the call site. The work is split
//! into two halves:
//!
//! - `hook`: the format-independent matcher and rewriter over instruction events
//! - `class`: class-file parsing, event decoding, re-encoding and file handling
//!
//! # Example Usage
//!
//! ```no_run
//! use hookpatch::{class::{collect_class_files, process_files, ProcessOptions}, hook::{ConsoleDiagnostics, DiagnoseOnly}};
//!
//! let files = collect_class_files(["build/classes"]);
//! let summary = process_files(&files, ProcessOptions::default(), &DiagnoseOnly, &mut ConsoleDiagnostics);
//! println!("{} files changed", summary.touched);
//! ```

pub mod class;
pub mod hook;
pub mod types;

pub use class::{apply_transformations, patch_class, PatchError};
pub use hook::{rewrite_method, DiagnoseOnly, Diagnostics, InsnEvent, RewritePolicy, StaticFactory};
pub use types::{MatchReport, MethodLocation, RunSummary};
