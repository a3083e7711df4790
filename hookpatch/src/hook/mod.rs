//! Recognition and rewriting of `lombok.patcher.Hook` constructions
//!
//! This module is independent of the class-file format: it works on
//! [`InsnEvent`] sequences, one method at a time.
//!
//! - `event`: instruction events and their payloads
//! - `signature`: the constructor being searched for
//! - `accumulator`: symbolic record of pushed string constants
//! - `rewriter`: the per-method scan and substitution
//! - `policy`: what to do with a recognized construction
//! - `diagnostics`: where match reports go

pub mod accumulator;
pub mod diagnostics;
pub mod event;
pub mod policy;
pub mod rewriter;
pub mod signature;

pub use diagnostics::{ConsoleDiagnostics, Diagnostics, NoDiagnostics};
pub use event::{Constant, ElementType, InsnEvent, Invocation, InvokeKind};
pub use policy::{DiagnoseOnly, Replacement, RewritePolicy, SiteStart, StaticFactory, Substitution};
pub use rewriter::{rewrite_method, HookMatch, Rewrite, Splice};
pub use signature::TargetSignature;
