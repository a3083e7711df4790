use krakatau2::lib::{classfile::code::Instr, disassemble::refprinter::RefPrinter};

use crate::{
    class::analysis::introspection::{find_class_name, find_ldc_constant, find_method_description},
    hook::event::{ElementType, InsnEvent, Invocation, InvokeKind},
};

/// Classify one instruction, resolving its constant-pool operands.
///
/// Never fails: anything that does not resolve is [`InsnEvent::Other`].
pub fn decode_instr(rp: &RefPrinter<'_>, ix: &Instr) -> InsnEvent {
    match ix {
        Instr::Ldc(id) => InsnEvent::ConstantLoad(find_ldc_constant(rp, *id as u16)),
        Instr::LdcW(id) | Instr::Ldc2W(id) => InsnEvent::ConstantLoad(find_ldc_constant(rp, *id)),

        Instr::Aastore => InsnEvent::ArrayStore,
        Instr::Dup => InsnEvent::Dup,

        Instr::IconstM1 => InsnEvent::PushInt(-1),
        Instr::Iconst0 => InsnEvent::PushInt(0),
        Instr::Iconst1 => InsnEvent::PushInt(1),
        Instr::Iconst2 => InsnEvent::PushInt(2),
        Instr::Iconst3 => InsnEvent::PushInt(3),
        Instr::Iconst4 => InsnEvent::PushInt(4),
        Instr::Iconst5 => InsnEvent::PushInt(5),
        Instr::Bipush(x) => InsnEvent::PushInt(*x as i32),
        Instr::Sipush(x) => InsnEvent::PushInt(*x as i32),

        Instr::Anewarray(id) => find_class_name(rp, *id)
            .map(|name| InsnEvent::NewArray(ElementType::Reference(name)))
            .unwrap_or(InsnEvent::Other),
        Instr::Newarray(code) => InsnEvent::NewArray(ElementType::Primitive(*code)),
        Instr::New(id) => find_class_name(rp, *id)
            .map(InsnEvent::New)
            .unwrap_or(InsnEvent::Other),

        Instr::Invokevirtual(id) => invoke(rp, InvokeKind::Virtual, *id),
        Instr::Invokespecial(id) => invoke(rp, InvokeKind::Special, *id),
        Instr::Invokestatic(id) => invoke(rp, InvokeKind::Static, *id),
        Instr::Invokeinterface(id, ..) => invoke(rp, InvokeKind::Interface, *id),

        _ => InsnEvent::Other,
    }
}

fn invoke(rp: &RefPrinter<'_>, kind: InvokeKind, method_id: u16) -> InsnEvent {
    let Some(method) = find_method_description(rp, method_id) else {
        return InsnEvent::Other;
    };
    InsnEvent::Invoke(Invocation::new(
        kind,
        method.owner,
        method.name,
        method.descriptor,
    ))
}
