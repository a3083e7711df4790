use krakatau2::lib::disassemble::refprinter::{ConstData, FmimTag, RefPrinter, SingleTag};

use crate::hook::event::Constant;

/// Owner, name and descriptor of a method reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRef {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
}

/// Resolve a method (or interface method) reference through the constant pool
pub fn find_method_description(rp: &RefPrinter<'_>, method_id: u16) -> Option<MethodRef> {
    let const_line = rp.cpool.get(method_id as usize)?;
    let ConstData::Fmim(tag, c, nat) = &const_line.data else {
        return None;
    };
    if matches!(tag, FmimTag::Field) {
        return None;
    }

    let owner = find_class_name(rp, *c)?;

    let const_line = rp.cpool.get(*nat as usize)?;
    let ConstData::Nat(name_idx, desc_idx) = &const_line.data else {
        return None;
    };
    let name = find_utf8(rp, *name_idx)?;
    let descriptor = find_utf8(rp, *desc_idx)?;

    Some(MethodRef {
        owner,
        name,
        descriptor,
    })
}

/// Internal name behind a `Class` constant
pub fn find_class_name(rp: &RefPrinter<'_>, id: u16) -> Option<String> {
    let const_line = rp.cpool.get(id as usize)?;
    let ConstData::Single(SingleTag::Class, name_idx) = &const_line.data else {
        return None;
    };
    find_utf8(rp, *name_idx)
}

/// Find UTF-8 string from an LDC instruction
pub fn find_utf_ldc(rp: &RefPrinter<'_>, id: u16) -> Option<String> {
    let const_line = rp.cpool.get(id as usize)?;
    let ConstData::Single(SingleTag::String, idx) = &const_line.data else {
        return None;
    };
    find_utf8(rp, *idx)
}

/// Whatever an `ldc` at `id` pushes
pub fn find_ldc_constant(rp: &RefPrinter<'_>, id: u16) -> Constant {
    let Some(const_line) = rp.cpool.get(id as usize) else {
        return Constant::Other;
    };
    match &const_line.data {
        ConstData::Single(SingleTag::String, idx) => find_utf8(rp, *idx)
            .map(Constant::String)
            .unwrap_or(Constant::Other),
        ConstData::Single(SingleTag::Class, idx) => find_utf8(rp, *idx)
            .map(Constant::Class)
            .unwrap_or(Constant::Other),
        ConstData::Prim(_tag, text) => Constant::Number(text.to_string()),
        _ => Constant::Other,
    }
}

fn find_utf8(rp: &RefPrinter<'_>, id: u16) -> Option<String> {
    let const_line = rp.cpool.get(id as usize)?;
    let ConstData::Utf8(utf_data) = &const_line.data else {
        return None;
    };
    Some(utf_data.s.to_string())
}
