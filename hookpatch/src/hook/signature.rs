use super::event::{Invocation, InvokeKind};

/// The constructor the rewriter is looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSignature {
    pub owner: &'static str,
    pub name: &'static str,
    pub descriptor: &'static str,
}

impl TargetSignature {
    /// `lombok.patcher.Hook(String className, String methodName, String returnType, String... parameters)`
    pub const HOOK: TargetSignature = TargetSignature {
        owner: "lombok/patcher/Hook",
        name: "<init>",
        descriptor: "(Ljava/lang/String;Ljava/lang/String;Ljava/lang/String;[Ljava/lang/String;)V",
    };

    pub fn matches(&self, call: &Invocation) -> bool {
        call.kind == InvokeKind::Special
            && call.name == self.name
            && call.descriptor == self.descriptor
            && call.owner == self.owner
    }

    /// Descriptor of a static factory taking the same arguments and returning the owner type
    pub fn factory_descriptor(&self) -> String {
        let params = self
            .descriptor
            .strip_prefix('(')
            .and_then(|rest| rest.split_once(')'))
            .map(|(params, _ret)| params)
            .unwrap_or_default();
        format!("({})L{};", params, self.owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_only_exact_constructor() {
        let hook = TargetSignature::HOOK;
        let exact = Invocation::new(InvokeKind::Special, hook.owner, hook.name, hook.descriptor);
        assert!(hook.matches(&exact));

        let wrong_kind = Invocation {
            kind: InvokeKind::Virtual,
            ..exact.clone()
        };
        assert!(!hook.matches(&wrong_kind));

        let wrong_owner = Invocation {
            owner: "lombok/patcher/Hooks".into(),
            ..exact.clone()
        };
        assert!(!hook.matches(&wrong_owner));

        let wrong_desc = Invocation {
            descriptor: "(Ljava/lang/String;Ljava/lang/String;Ljava/lang/String;)V".into(),
            ..exact
        };
        assert!(!hook.matches(&wrong_desc));
    }

    #[test]
    fn factory_descriptor_returns_owner() {
        assert_eq!(
            TargetSignature::HOOK.factory_descriptor(),
            "(Ljava/lang/String;Ljava/lang/String;Ljava/lang/String;[Ljava/lang/String;)Llombok/patcher/Hook;"
        );
    }
}
