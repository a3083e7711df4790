//! Constant-pool lookups and class-level checks

pub mod introspection;
pub mod scanner;

pub use introspection::{
    find_class_name, find_ldc_constant, find_method_description, find_utf_ldc, MethodRef,
};
pub use scanner::uses_method;
