use smallvec::SmallVec;

use super::event::{Constant, InsnEvent};

/// Number of fixed `String` parameters in front of the varargs array
pub const FIXED_ARGS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingString {
    index: usize,
    value: String,
}

/// Arguments of one construction, resolved from constant loads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArgs {
    pub scalar_args: Vec<String>,
    pub variadic_args: Vec<String>,
    /// Event index of the first fixed argument load
    pub args_start: usize,
}

/// Symbolic record of the string constants pushed since the last reset.
///
/// Lives for one method scan. Only the side effects of constant loads, array
/// stores and array allocation are replayed; anything else resets it.
#[derive(Debug, Default)]
pub struct Accumulator {
    scalar_args: SmallVec<[PendingString; 4]>,
    variadic_args: Vec<String>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one non-target event at `index`
    pub fn observe(&mut self, index: usize, event: &InsnEvent) {
        match event {
            InsnEvent::ConstantLoad(Constant::String(value)) => {
                self.scalar_args.push(PendingString {
                    index,
                    value: value.clone(),
                });
            }
            InsnEvent::ArrayStore => self.store_element(),
            InsnEvent::NewArray(element) if element.is_string() => self.begin_varargs(),
            event if event.is_stack_bookkeeping() => {}
            _ => self.clear(),
        }
    }

    /// `aastore` moves the value just loaded into the varargs array
    fn store_element(&mut self) {
        if self.scalar_args.len() > FIXED_ARGS {
            if let Some(element) = self.scalar_args.pop() {
                self.variadic_args.push(element.value);
            }
        } else {
            self.clear();
        }
    }

    /// `anewarray java/lang/String` settles the fixed-argument prefix
    fn begin_varargs(&mut self) {
        let len = self.scalar_args.len();
        if len < FIXED_ARGS {
            self.clear();
        } else {
            self.scalar_args.drain(..len - FIXED_ARGS);
        }
    }

    /// Take the arguments collected for the call being made right now.
    ///
    /// Always leaves the accumulator empty.
    pub fn take(&mut self) -> Option<ResolvedArgs> {
        let scalar_args = std::mem::take(&mut self.scalar_args);
        let variadic_args = std::mem::take(&mut self.variadic_args);
        if scalar_args.len() != FIXED_ARGS {
            return None;
        }

        Some(ResolvedArgs {
            args_start: scalar_args[0].index,
            scalar_args: scalar_args.into_iter().map(|arg| arg.value).collect(),
            variadic_args,
        })
    }

    pub fn clear(&mut self) {
        self.scalar_args.clear();
        self.variadic_args.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.scalar_args.is_empty() && self.variadic_args.is_empty()
    }

    pub fn scalar_args(&self) -> impl Iterator<Item = &str> {
        self.scalar_args.iter().map(|arg| arg.value.as_str())
    }

    pub fn variadic_args(&self) -> &[String] {
        &self.variadic_args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::event::ElementType;

    fn feed(acc: &mut Accumulator, events: &[InsnEvent]) {
        for (index, event) in events.iter().enumerate() {
            acc.observe(index, event);
        }
    }

    #[test]
    fn string_loads_accumulate_in_order() {
        let mut acc = Accumulator::new();
        feed(&mut acc, &[InsnEvent::string("a"), InsnEvent::string("b")]);
        assert_eq!(acc.scalar_args().collect::<Vec<_>>(), ["a", "b"]);
    }

    #[test]
    fn non_string_constant_resets() {
        let mut acc = Accumulator::new();
        feed(
            &mut acc,
            &[
                InsnEvent::string("a"),
                InsnEvent::ConstantLoad(Constant::Number("42".into())),
            ],
        );
        assert!(acc.is_empty());
    }

    #[test]
    fn string_array_keeps_last_three() {
        let mut acc = Accumulator::new();
        feed(
            &mut acc,
            &[
                InsnEvent::string("junk"),
                InsnEvent::string("x"),
                InsnEvent::string("y"),
                InsnEvent::string("z"),
                InsnEvent::PushInt(0),
                InsnEvent::new_string_array(),
            ],
        );
        assert_eq!(acc.scalar_args().collect::<Vec<_>>(), ["x", "y", "z"]);

        let resolved = acc.take().unwrap();
        assert_eq!(resolved.args_start, 1);
        assert!(acc.is_empty());
    }

    #[test]
    fn array_of_other_type_resets() {
        let mut acc = Accumulator::new();
        feed(
            &mut acc,
            &[
                InsnEvent::string("x"),
                InsnEvent::string("y"),
                InsnEvent::string("z"),
                InsnEvent::NewArray(ElementType::Reference("java/lang/Object".into())),
            ],
        );
        assert!(acc.is_empty());
    }

    #[test]
    fn store_without_fourth_value_resets() {
        let mut acc = Accumulator::new();
        feed(
            &mut acc,
            &[
                InsnEvent::string("x"),
                InsnEvent::string("y"),
                InsnEvent::string("z"),
                InsnEvent::new_string_array(),
                InsnEvent::Dup,
                InsnEvent::PushInt(0),
                InsnEvent::ArrayStore,
            ],
        );
        assert!(acc.is_empty());
    }

    #[test]
    fn take_requires_exactly_three_fixed_args() {
        let mut acc = Accumulator::new();
        feed(&mut acc, &[InsnEvent::string("x"), InsnEvent::string("y")]);
        assert_eq!(acc.take(), None);
        assert!(acc.is_empty());
    }
}
