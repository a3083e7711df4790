//! Instruction events consumed by the hook rewriter.
//!
//! An event is one decoded bytecode instruction, reduced to the shape the
//! matcher cares about. Constant-pool references are already resolved, so
//! events can be built by hand in tests without a class file around them.

use std::fmt;

/// Internal name of `java.lang.String`
pub const STRING_CLASS: &str = "java/lang/String";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsnEvent {
    /// `ldc`, `ldc_w`, `ldc2_w`
    ConstantLoad(Constant),
    /// `aastore`
    ArrayStore,
    /// `anewarray` / `newarray`
    NewArray(ElementType),
    /// `invokevirtual`, `invokespecial`, `invokestatic`, `invokeinterface`
    Invoke(Invocation),
    /// `new`
    New(String),
    /// `dup`
    Dup,
    /// `iconst_*`, `bipush`, `sipush`
    PushInt(i32),
    Other,
}

impl InsnEvent {
    pub fn string(value: impl Into<String>) -> Self {
        InsnEvent::ConstantLoad(Constant::String(value.into()))
    }

    pub fn new_string_array() -> Self {
        InsnEvent::NewArray(ElementType::Reference(STRING_CLASS.to_string()))
    }

    /// True for events that never touch the accumulation state
    pub fn is_stack_bookkeeping(&self) -> bool {
        matches!(self, InsnEvent::Dup | InsnEvent::PushInt(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constant {
    String(String),
    /// Numeric constant in its textual form (`42`, `1.5f`, `7L`, ...)
    Number(String),
    Class(String),
    /// Method handles, method types and dynamic constants
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementType {
    /// Internal class name, e.g. `java/lang/String`
    Reference(String),
    /// Primitive `newarray` type code (`T_INT` = 10 and friends)
    Primitive(u8),
}

impl ElementType {
    pub fn is_string(&self) -> bool {
        matches!(self, ElementType::Reference(name) if name == STRING_CLASS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum InvokeKind {
    #[strum(serialize = "invokevirtual")]
    Virtual,
    /// Constructors, private methods and `super` calls
    #[strum(serialize = "invokespecial")]
    Special,
    #[strum(serialize = "invokestatic")]
    Static,
    #[strum(serialize = "invokeinterface")]
    Interface,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub kind: InvokeKind,
    pub owner: String,
    pub name: String,
    pub descriptor: String,
}

impl Invocation {
    pub fn new(
        kind: InvokeKind,
        owner: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            owner: owner.into(),
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }

    pub fn is_constructor(&self) -> bool {
        self.kind == InvokeKind::Special && self.name == "<init>"
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}.{}{}", self.kind, self.owner, self.name, self.descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_array_is_recognized() {
        assert!(ElementType::Reference(STRING_CLASS.into()).is_string());
        assert!(!ElementType::Reference("java/lang/Object".into()).is_string());
        assert!(!ElementType::Primitive(10).is_string());
    }

    #[test]
    fn invocation_display_uses_mnemonic() {
        let call = Invocation::new(InvokeKind::Special, "a/B", "<init>", "()V");
        assert_eq!(call.to_string(), "invokespecial a/B.<init>()V");
        assert!(call.is_constructor());
    }
}
