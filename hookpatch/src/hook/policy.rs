//! What to do with a recognized hook construction.

use super::{
    event::{InsnEvent, Invocation, InvokeKind},
    rewriter::HookMatch,
    signature::TargetSignature,
};

/// First event of the matched site that a substitution replaces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteStart {
    /// The first fixed-argument load; `new Hook; dup` stays in place
    Arguments,
    /// The `new Hook; dup` pair in front of the arguments
    Allocation,
}

/// One event of a replacement sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replacement {
    /// Reuse the input event at this index verbatim
    Keep(usize),
    Insert(InsnEvent),
}

/// Events that replace a matched site, through the constructor call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub start: SiteStart,
    pub events: Vec<Replacement>,
}

pub trait RewritePolicy {
    /// `None` leaves the call as it is
    fn rewrite(&self, hook: &HookMatch<'_>) -> Option<Substitution>;

    /// Names that new constant-pool entries may need.
    ///
    /// A parsed class borrows its input buffer, so text for appended UTF-8
    /// entries has to outlive it; the policy owns that text.
    fn symbols(&self) -> &[String] {
        &[]
    }
}

impl<F> RewritePolicy for F
where
    F: Fn(&HookMatch<'_>) -> Option<Substitution>,
{
    fn rewrite(&self, hook: &HookMatch<'_>) -> Option<Substitution> {
        self(hook)
    }
}

/// Reports matches and never rewrites anything
#[derive(Debug, Default, Clone, Copy)]
pub struct DiagnoseOnly;

impl RewritePolicy for DiagnoseOnly {
    fn rewrite(&self, _hook: &HookMatch<'_>) -> Option<Substitution> {
        None
    }
}

/// Routes hook construction through a static factory method.
///
/// `new Hook; dup; <args>; invokespecial Hook.<init>` becomes
/// `<args>; invokestatic owner.name(...)LHook;` with the argument
/// construction kept as compiled.
#[derive(Debug, Clone)]
pub struct StaticFactory {
    call: Invocation,
    symbols: Vec<String>,
}

impl StaticFactory {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        let descriptor = TargetSignature::HOOK.factory_descriptor();
        let call = Invocation::new(InvokeKind::Static, owner, name, descriptor);
        let symbols = vec![
            call.owner.clone(),
            call.name.clone(),
            call.descriptor.clone(),
        ];
        Self { call, symbols }
    }

    pub fn call(&self) -> &Invocation {
        &self.call
    }
}

impl RewritePolicy for StaticFactory {
    fn rewrite(&self, hook: &HookMatch<'_>) -> Option<Substitution> {
        let mut events: Vec<_> = hook.arguments().map(Replacement::Keep).collect();
        events.push(Replacement::Insert(InsnEvent::Invoke(self.call.clone())));
        Some(Substitution {
            start: SiteStart::Allocation,
            events,
        })
    }

    fn symbols(&self) -> &[String] {
        &self.symbols
    }
}
