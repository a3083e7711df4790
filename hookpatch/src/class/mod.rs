//! Class-file side of the hook patcher
//!
//! - `analysis`: constant-pool lookups and cheap class-level checks
//! - `core`: decoding, encoding and reassembly
//! - `modification`: running the rewriter over a parsed class
//! - `io`: class files on disk

pub mod analysis;
pub mod core;
pub mod io;
pub mod modification;

pub use core::{reasm, ReasmError};
pub use io::{collect_class_files, process_files, ProcessOptions};
pub use modification::{apply_transformations, patch_class, PatchError};
