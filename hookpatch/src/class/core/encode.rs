//! Lowering of rewritten event sequences back into a method's bytecode

use std::collections::{HashMap, HashSet};

use krakatau2::lib::{
    classfile::{
        code::{Instr, Pos},
        cpool::{BStr, Const, ConstPool},
    },
    disassemble::refprinter::RefPrinter,
};
use thiserror::Error;

use crate::{
    class::analysis::introspection::find_utf_ldc,
    hook::{
        event::{Constant, ElementType, InsnEvent, Invocation, InvokeKind},
        policy::Replacement,
        rewriter::Splice,
    },
};

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("No symbol registered for new constant {0:?}")]
    UnregisteredSymbol(String),
    #[error("Replacement of {replacement} events does not fit a site of {site} instructions")]
    ReplacementTooLong { site: usize, replacement: usize },
    #[error("Site {0:?} is outside of the method body")]
    SiteOutOfBounds(std::ops::Range<usize>),
    #[error("Instruction {0} is reused outside of its site or more than once")]
    InvalidKeep(usize),
    #[error("Cannot encode {0}")]
    Unsupported(String),
    #[error("Constant pool is full")]
    ConstantPoolFull,
}

/// `String` constants already in the pool, by value
pub type StringConstants = HashMap<String, u16>;

pub fn string_constants(rp: &RefPrinter<'_>, pool_len: usize) -> StringConstants {
    let mut strings = HashMap::new();
    for idx in 1..pool_len {
        if let Some(text) = find_utf_ldc(rp, idx as u16) {
            strings.entry(text).or_insert(idx as u16);
        }
    }
    strings
}

/// Looks up constants for new instructions and appends the missing ones
pub struct ConstantPoolEditor<'p, 'a> {
    cp: &'p mut ConstPool<'a>,
    strings: &'p StringConstants,
    symbols: &'a [String],
}

impl<'p, 'a> ConstantPoolEditor<'p, 'a> {
    pub fn new(cp: &'p mut ConstPool<'a>, strings: &'p StringConstants, symbols: &'a [String]) -> Self {
        Self {
            cp,
            strings,
            symbols,
        }
    }

    pub fn lower(&mut self, event: &InsnEvent) -> Result<Instr, EncodeError> {
        Ok(match event {
            InsnEvent::ConstantLoad(Constant::String(value)) => {
                let idx = match self.strings.get(value) {
                    Some(idx) => *idx,
                    None => self.string(value)?,
                };
                if idx > 255 {
                    Instr::LdcW(idx)
                } else {
                    Instr::Ldc(idx as u8)
                }
            }
            InsnEvent::ConstantLoad(other) => {
                return Err(EncodeError::Unsupported(format!("constant load {:?}", other)))
            }
            InsnEvent::ArrayStore => Instr::Aastore,
            InsnEvent::Dup => Instr::Dup,
            InsnEvent::PushInt(value) => push_int(*value)?,
            InsnEvent::NewArray(ElementType::Reference(name)) => Instr::Anewarray(self.class(name)?),
            InsnEvent::NewArray(ElementType::Primitive(code)) => Instr::Newarray(*code),
            InsnEvent::New(name) => Instr::New(self.class(name)?),
            InsnEvent::Invoke(call) => match call.kind {
                InvokeKind::Virtual => Instr::Invokevirtual(self.method(call)?),
                InvokeKind::Special => Instr::Invokespecial(self.method(call)?),
                InvokeKind::Static => Instr::Invokestatic(self.method(call)?),
                InvokeKind::Interface => return Err(EncodeError::Unsupported(call.to_string())),
            },
            InsnEvent::Other => return Err(EncodeError::Unsupported("opaque instruction".into())),
        })
    }

    fn utf8(&mut self, text: &str) -> Result<u16, EncodeError> {
        let existing = self.cp.0.iter().position(|entry| match entry {
            Const::Utf8(txt) => txt.0 == text.as_bytes(),
            _ => false,
        });
        if let Some(idx) = existing {
            return Ok(idx as u16);
        }

        let symbol = self
            .symbols
            .iter()
            .find(|symbol| symbol.as_str() == text)
            .ok_or_else(|| EncodeError::UnregisteredSymbol(text.to_string()))?;
        self.push(Const::Utf8(BStr(symbol.as_bytes())))
    }

    fn class(&mut self, name: &str) -> Result<u16, EncodeError> {
        let name_id = self.utf8(name)?;
        let existing = self.cp.0.iter().position(|entry| match entry {
            Const::Class(utf) => *utf == name_id,
            _ => false,
        });
        match existing {
            Some(idx) => Ok(idx as u16),
            None => self.push(Const::Class(name_id)),
        }
    }

    fn string(&mut self, value: &str) -> Result<u16, EncodeError> {
        let utf_id = self.utf8(value)?;
        let existing = self.cp.0.iter().position(|entry| match entry {
            Const::Str(utf) => *utf == utf_id,
            _ => false,
        });
        match existing {
            Some(idx) => Ok(idx as u16),
            None => self.push(Const::Str(utf_id)),
        }
    }

    fn method(&mut self, call: &Invocation) -> Result<u16, EncodeError> {
        let class_id = self.class(&call.owner)?;
        let name_id = self.utf8(&call.name)?;
        let sig_id = self.utf8(&call.descriptor)?;

        let existing_nat = self.cp.0.iter().position(|entry| match entry {
            Const::NameAndType(name, sig) => *name == name_id && *sig == sig_id,
            _ => false,
        });
        let name_and_type_id = match existing_nat {
            Some(idx) => idx as u16,
            None => self.push(Const::NameAndType(name_id, sig_id))?,
        };

        let existing = self.cp.0.iter().position(|entry| match entry {
            Const::Method(class, nat) => *class == class_id && *nat == name_and_type_id,
            _ => false,
        });
        match existing {
            Some(idx) => Ok(idx as u16),
            None => self.push(Const::Method(class_id, name_and_type_id)),
        }
    }

    fn push(&mut self, entry: Const<'a>) -> Result<u16, EncodeError> {
        let idx = self.cp.0.len();
        if idx >= u16::MAX as usize {
            return Err(EncodeError::ConstantPoolFull);
        }
        self.cp.0.push(entry);
        Ok(idx as u16)
    }
}

fn push_int(value: i32) -> Result<Instr, EncodeError> {
    Ok(match value {
        -1 => Instr::IconstM1,
        0 => Instr::Iconst0,
        1 => Instr::Iconst1,
        2 => Instr::Iconst2,
        3 => Instr::Iconst3,
        4 => Instr::Iconst4,
        5 => Instr::Iconst5,
        v if i8::try_from(v).is_ok() => Instr::Bipush(v as i8),
        v if i16::try_from(v).is_ok() => Instr::Sipush(v as i16),
        v => return Err(EncodeError::Unsupported(format!("int push of {}", v))),
    })
}

enum Lowered {
    Keep(usize),
    Insert(Instr),
}

/// Replace every splice site in `bytecode` with its replacement.
///
/// All replacements are lowered before the body is touched, so on error the
/// method is left as it was (new constant-pool entries may remain).
pub fn splice_bytecode(
    bytecode: &mut Vec<(Pos, Instr)>,
    splices: &[Splice],
    editor: &mut ConstantPoolEditor<'_, '_>,
) -> Result<(), EncodeError> {
    let mut plans = Vec::with_capacity(splices.len());
    for splice in splices {
        let range = splice.range.clone();
        let Some(site) = bytecode.get(range.clone()) else {
            return Err(EncodeError::SiteOutOfBounds(range));
        };
        let positions = site_positions(site, splice.replacement.len())?;

        let mut kept = HashSet::new();
        let mut items = Vec::with_capacity(splice.replacement.len());
        for item in &splice.replacement {
            items.push(match item {
                Replacement::Keep(idx) => {
                    if !range.contains(idx) || !kept.insert(*idx) {
                        return Err(EncodeError::InvalidKeep(*idx));
                    }
                    Lowered::Keep(*idx)
                }
                Replacement::Insert(event) => Lowered::Insert(editor.lower(event)?),
            });
        }
        plans.push((range, positions, items));
    }

    let mut slots: Vec<Option<(Pos, Instr)>> = bytecode.drain(..).map(Some).collect();
    let mut new_bytecode = Vec::with_capacity(slots.len());
    let mut plans = plans.into_iter().peekable();
    let mut idx = 0;

    while idx < slots.len() {
        let Some((range, positions, items)) = plans.next_if(|(range, _, _)| range.start == idx)
        else {
            if let Some(entry) = slots[idx].take() {
                new_bytecode.push(entry);
            }
            idx += 1;
            continue;
        };

        for (pos, item) in positions.into_iter().zip(items) {
            match item {
                Lowered::Keep(kept) => {
                    if let Some((_, ix)) = slots[kept].take() {
                        new_bytecode.push((pos, ix));
                    }
                }
                Lowered::Insert(ix) => new_bytecode.push((pos, ix)),
            }
        }
        idx = range.end;
    }

    *bytecode = new_bytecode;
    Ok(())
}

/// Positions for `count` instructions replacing `site`.
///
/// The first and last positions of the site survive, so branch targets,
/// exception ranges and frames anchored at either end stay valid.
fn site_positions(site: &[(Pos, Instr)], count: usize) -> Result<Vec<Pos>, EncodeError> {
    if count > site.len() {
        return Err(EncodeError::ReplacementTooLong {
            site: site.len(),
            replacement: count,
        });
    }
    let Some(((last, _), head)) = site.split_last() else {
        return Ok(Vec::new());
    };
    if count == 0 {
        return Ok(Vec::new());
    }

    Ok(head[..count - 1]
        .iter()
        .map(|(pos, _)| *pos)
        .chain(std::iter::once(*last))
        .collect())
}
