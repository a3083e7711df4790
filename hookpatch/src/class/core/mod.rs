//! Class-file plumbing around the rewriter
//!
//! - `assembly`: re-encoding a class through Krakatau's disassembler and assembler
//! - `decode`: turning instructions into rewriter events
//! - `encode`: turning rewritten events back into instructions

pub mod assembly;
pub mod decode;
pub mod encode;

pub use assembly::{init_refprinter, reasm, ReasmError};
pub use decode::decode_instr;
pub use encode::{splice_bytecode, string_constants, ConstantPoolEditor, EncodeError};
