//! Rewriting hook constructions inside parsed classes

pub mod patcher;

pub use patcher::{apply_transformations, patch_class, PatchError};
