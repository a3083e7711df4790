//! Pattern-matching rewriter for hook constructions.
//!
//! A compiler lowers `new Hook("a", "b", "c", "d", "e")` to a straight run of
//! instructions:
//!
//! ```text
//! new Hook; dup
//! ldc "a"; ldc "b"; ldc "c"
//! iconst_2; anewarray String
//! dup; iconst_0; ldc "d"; aastore
//! dup; iconst_1; ldc "e"; aastore
//! invokespecial Hook.<init>(String, String, String, String[])
//! ```
//!
//! The rewriter replays the stack effects of that run through an
//! [`Accumulator`], so by the time the constructor call arrives the
//! arguments are known as literals.

use std::{collections::HashSet, ops::Range};

use tracing::{debug, warn};

use super::{
    accumulator::{Accumulator, ResolvedArgs},
    diagnostics::Diagnostics,
    event::InsnEvent,
    policy::{Replacement, RewritePolicy, SiteStart, Substitution},
    signature::TargetSignature,
};
use crate::types::{MatchReport, MethodLocation};

/// A recognized construction, handed to the rewrite policy
#[derive(Debug)]
pub struct HookMatch<'e> {
    pub location: &'e MethodLocation,
    pub scalar_args: Vec<String>,
    pub variadic_args: Vec<String>,
    /// Index of the first fixed-argument load
    pub args_start: usize,
    /// Index of `new Hook` when the call site starts with `new Hook; dup`
    pub allocation: Option<usize>,
    /// Index of the constructor call
    pub call_index: usize,
    /// All events of the method
    pub events: &'e [InsnEvent],
}

impl HookMatch<'_> {
    /// Indices of the argument construction events, excluding the call
    pub fn arguments(&self) -> Range<usize> {
        self.args_start..self.call_index
    }

    /// Indices covered by a substitution starting at `start`, call included
    pub fn site(&self, start: SiteStart) -> Option<Range<usize>> {
        let first = match start {
            SiteStart::Arguments => self.args_start,
            SiteStart::Allocation => self.allocation?,
        };
        Some(first..self.call_index + 1)
    }
}

/// A contiguous run of input events replaced by a substitution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    pub range: Range<usize>,
    pub replacement: Vec<Replacement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub events: Vec<InsnEvent>,
    pub changed: bool,
    /// In input order, never overlapping
    pub splices: Vec<Splice>,
}

/// Scan one method's events and substitute hook constructions per `policy`.
pub fn rewrite_method<P, D>(
    events: &[InsnEvent],
    location: &MethodLocation,
    policy: &P,
    diagnostics: &mut D,
) -> Rewrite
where
    P: RewritePolicy + ?Sized,
    D: Diagnostics + ?Sized,
{
    let target = TargetSignature::HOOK;
    let mut acc = Accumulator::new();
    let mut output: Vec<InsnEvent> = Vec::with_capacity(events.len());
    let mut splices: Vec<Splice> = Vec::new();
    // Input events before this index belong to an earlier splice
    let mut floor = 0;

    for (index, event) in events.iter().enumerate() {
        let InsnEvent::Invoke(call) = event else {
            acc.observe(index, event);
            output.push(event.clone());
            continue;
        };

        if !target.matches(call) {
            acc.clear();
            output.push(event.clone());
            continue;
        }

        let Some(resolved) = acc.take() else {
            debug!("{} called without literal arguments in {}", call, location);
            output.push(event.clone());
            continue;
        };

        let hook = build_match(events, location, resolved, index, floor);
        let splice = policy
            .rewrite(&hook)
            .and_then(|substitution| plan_splice(&hook, substitution));

        diagnostics.report(&MatchReport {
            location: location.clone(),
            scalar_args: hook.scalar_args.clone(),
            variadic_args: hook.variadic_args.clone(),
            substituted: splice.is_some(),
        });

        let Some(splice) = splice else {
            output.push(event.clone());
            continue;
        };

        debug!(
            "Substituting events {:?} with {} events in {}",
            splice.range,
            splice.replacement.len(),
            location
        );

        // Everything from the site start up to this call has been forwarded already
        let forwarded = index - splice.range.start;
        output.truncate(output.len() - forwarded);
        output.extend(splice.replacement.iter().map(|item| match item {
            Replacement::Keep(kept) => events[*kept].clone(),
            Replacement::Insert(event) => event.clone(),
        }));

        floor = index + 1;
        splices.push(splice);
    }

    Rewrite {
        events: output,
        changed: !splices.is_empty(),
        splices,
    }
}

fn build_match<'e>(
    events: &'e [InsnEvent],
    location: &'e MethodLocation,
    resolved: ResolvedArgs,
    call_index: usize,
    floor: usize,
) -> HookMatch<'e> {
    let ResolvedArgs {
        scalar_args,
        variadic_args,
        args_start,
    } = resolved;

    let allocation = args_start
        .checked_sub(2)
        .filter(|&start| start >= floor)
        .filter(|&start| match &events[start..args_start] {
            [InsnEvent::New(class), InsnEvent::Dup] => class == TargetSignature::HOOK.owner,
            _ => false,
        });

    HookMatch {
        location,
        scalar_args,
        variadic_args,
        args_start,
        allocation,
        call_index,
        events,
    }
}

fn plan_splice(hook: &HookMatch<'_>, substitution: Substitution) -> Option<Splice> {
    let Some(range) = hook.site(substitution.start) else {
        warn!(
            "Cannot replace allocation of hook in {}: no `new; dup` in front of the arguments",
            hook.location
        );
        return None;
    };

    if substitution.events.len() > range.len() {
        warn!(
            "Substitution in {} has {} events for a site of {}, leaving call unchanged",
            hook.location,
            substitution.events.len(),
            range.len()
        );
        return None;
    }

    let mut kept = HashSet::new();
    let invalid_keep = substitution.events.iter().any(|item| match item {
        Replacement::Keep(index) => !range.contains(index) || !kept.insert(*index),
        Replacement::Insert(_) => false,
    });
    if invalid_keep {
        warn!(
            "Substitution in {} reuses events outside of {:?} or more than once, leaving call unchanged",
            hook.location, range
        );
        return None;
    }

    Some(Splice {
        range,
        replacement: substitution.events,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::hook::{
        diagnostics::NoDiagnostics,
        event::{Constant, Invocation, InvokeKind},
        policy::{DiagnoseOnly, StaticFactory},
    };

    fn hook_init() -> InsnEvent {
        let target = TargetSignature::HOOK;
        InsnEvent::Invoke(Invocation::new(
            InvokeKind::Special,
            target.owner,
            target.name,
            target.descriptor,
        ))
    }

    /// `new Hook("x", "y", "z", varargs...)` as javac emits it
    fn construction(varargs: &[&str]) -> Vec<InsnEvent> {
        let mut events = vec![
            InsnEvent::New(TargetSignature::HOOK.owner.into()),
            InsnEvent::Dup,
            InsnEvent::string("x"),
            InsnEvent::string("y"),
            InsnEvent::string("z"),
            InsnEvent::PushInt(varargs.len() as i32),
            InsnEvent::new_string_array(),
        ];
        for (i, arg) in varargs.iter().enumerate() {
            events.push(InsnEvent::Dup);
            events.push(InsnEvent::PushInt(i as i32));
            events.push(InsnEvent::string(*arg));
            events.push(InsnEvent::ArrayStore);
        }
        events.push(hook_init());
        events
    }

    #[test]
    fn match_resolves_arguments_and_site() {
        let events = construction(&["a"]);
        let location = MethodLocation::default();
        let seen = std::cell::RefCell::new(None);
        let policy = |hook: &HookMatch<'_>| -> Option<Substitution> {
            *seen.borrow_mut() = Some((
                hook.scalar_args.clone(),
                hook.variadic_args.clone(),
                hook.allocation,
                hook.args_start,
                hook.call_index,
            ));
            None
        };

        let rewrite = rewrite_method(&events, &location, &policy, &mut NoDiagnostics);

        assert!(!rewrite.changed);
        assert_eq!(
            seen.into_inner(),
            Some((
                vec!["x".to_string(), "y".to_string(), "z".to_string()],
                vec!["a".to_string()],
                Some(0),
                2,
                11,
            ))
        );
    }

    #[test]
    fn diagnose_only_reports_without_changes() {
        let events = construction(&["a", "b"]);
        let mut reports = Vec::new();

        let rewrite = rewrite_method(&events, &MethodLocation::default(), &DiagnoseOnly, &mut reports);

        assert!(!rewrite.changed);
        assert!(rewrite.splices.is_empty());
        assert_eq!(rewrite.events, events);
        assert_eq!(reports.len(), 1);
        assert!(!reports[0].substituted);
    }

    #[test]
    fn static_factory_drops_allocation() {
        let events = construction(&["a"]);
        let factory = StaticFactory::new("lombok/patcher/Hooks", "of");
        let mut reports = Vec::new();

        let rewrite = rewrite_method(&events, &MethodLocation::default(), &factory, &mut reports);

        assert!(rewrite.changed);
        assert_eq!(rewrite.splices.len(), 1);
        assert_eq!(rewrite.splices[0].range, 0..12);

        let mut expected = events[2..11].to_vec();
        expected.push(InsnEvent::Invoke(factory.call().clone()));
        assert_eq!(rewrite.events, expected);
        assert!(reports[0].substituted);
    }

    #[test]
    fn allocation_request_without_allocation_is_declined() {
        // Arguments only, e.g. a `this(...)` delegation with the receiver loaded elsewhere
        let events = construction(&[])[2..].to_vec();
        let factory = StaticFactory::new("lombok/patcher/Hooks", "of");
        let mut reports = Vec::new();

        let rewrite = rewrite_method(&events, &MethodLocation::default(), &factory, &mut reports);

        assert!(!rewrite.changed);
        assert_eq!(rewrite.events, events);
        assert_eq!(reports.len(), 1);
        assert!(!reports[0].substituted);
    }

    #[test]
    fn argument_substitution_keeps_allocation() {
        let events = construction(&[]);
        let folded = InsnEvent::ConstantLoad(Constant::String("x y z".into()));
        let policy = |_hook: &HookMatch<'_>| {
            Some(Substitution {
                start: SiteStart::Arguments,
                events: vec![Replacement::Insert(folded.clone()), Replacement::Keep(7)],
            })
        };

        let rewrite = rewrite_method(&events, &MethodLocation::default(), &policy, &mut NoDiagnostics);

        assert!(rewrite.changed);
        assert_eq!(rewrite.splices[0].range, 2..8);
        assert_eq!(
            rewrite.events,
            vec![
                events[0].clone(),
                events[1].clone(),
                folded.clone(),
                hook_init(),
            ]
        );
    }

    #[test]
    fn keep_outside_of_site_is_declined() {
        let events = construction(&[]);
        let policy = |_hook: &HookMatch<'_>| {
            Some(Substitution {
                start: SiteStart::Arguments,
                events: vec![Replacement::Keep(0)],
            })
        };

        let rewrite = rewrite_method(&events, &MethodLocation::default(), &policy, &mut NoDiagnostics);

        assert!(!rewrite.changed);
        assert_eq!(rewrite.events, events);
    }

    #[test]
    fn replacement_longer_than_site_is_declined() {
        let events = construction(&[])[2..].to_vec();
        let policy = |_hook: &HookMatch<'_>| {
            let mut replacement: Vec<_> = (0..5).map(Replacement::Keep).collect();
            replacement.push(Replacement::Insert(InsnEvent::Dup));
            replacement.push(Replacement::Keep(5));
            Some(Substitution {
                start: SiteStart::Arguments,
                events: replacement,
            })
        };
        let mut reports = Vec::new();

        let rewrite = rewrite_method(&events, &MethodLocation::default(), &policy, &mut reports);

        assert_eq!(events.len(), 6);
        assert!(!rewrite.changed);
        assert_eq!(rewrite.events, events);
        assert_eq!(reports.len(), 1);
        assert!(!reports[0].substituted);
    }

    #[test]
    fn repeated_keep_is_declined() {
        let events = construction(&[]);
        let policy = |_hook: &HookMatch<'_>| {
            Some(Substitution {
                start: SiteStart::Arguments,
                events: vec![Replacement::Keep(2), Replacement::Keep(2), Replacement::Keep(7)],
            })
        };
        let mut reports = Vec::new();

        let rewrite = rewrite_method(&events, &MethodLocation::default(), &policy, &mut reports);

        assert!(!rewrite.changed);
        assert!(!reports[0].substituted);
    }

    #[test]
    fn consecutive_sites_are_spliced_independently() {
        let mut events = construction(&["a"]);
        events.push(InsnEvent::Other);
        events.extend(construction(&["b", "c"]));
        let factory = StaticFactory::new("lombok/patcher/Hooks", "of");

        let rewrite = rewrite_method(&events, &MethodLocation::default(), &factory, &mut NoDiagnostics);

        assert_eq!(rewrite.splices.len(), 2);
        assert_eq!(rewrite.splices[0].range, 0..12);
        assert_eq!(rewrite.splices[1].range, 13..29);
        // 12 -> 10 events, then the separator, then 16 -> 14 events
        assert_eq!(rewrite.events.len(), 10 + 1 + 14);
        assert_eq!(rewrite.events[10], InsnEvent::Other);
    }
}
