use krakatau2::lib::{
    classfile::{self, attrs::AttrBody, parse::Class},
    parse_utf8, ParserOptions,
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    class::{
        analysis::scanner::uses_method,
        core::{
            assembly::{init_refprinter, reasm, ReasmError},
            decode::decode_instr,
            encode::{splice_bytecode, string_constants, ConstantPoolEditor, StringConstants},
        },
    },
    hook::{
        diagnostics::Diagnostics,
        event::InsnEvent,
        policy::RewritePolicy,
        rewriter::{rewrite_method, Splice},
        signature::TargetSignature,
    },
    types::{MatchReport, MethodLocation},
};

const PARSER_OPTIONS: ParserOptions = ParserOptions {
    no_short_code_attr: true,
};

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("Parse error in {file}: {message}")]
    Parse { file: String, message: String },
    #[error(transparent)]
    Reasm(#[from] ReasmError),
}

/// Rewriter output for one method, held until its splices are encoded
struct MethodScan {
    method_idx: usize,
    location: MethodLocation,
    splices: Vec<Splice>,
    reports: Vec<MatchReport>,
}

/// Run the hook rewriter over every method of `class`.
///
/// Match reports reach `diagnostics` after encoding, so a site whose splice
/// could not be encoded is reported as not substituted. Returns whether any
/// method body was changed.
pub fn patch_class<'a, P, D>(
    class: &mut Class<'a>,
    file_name: &str,
    policy: &'a P,
    diagnostics: &mut D,
) -> bool
where
    P: RewritePolicy + ?Sized,
    D: Diagnostics + ?Sized,
{
    let rp = init_refprinter(&class.cp, &class.attrs);
    let class_name = class
        .cp
        .clsutf(class.this)
        .and_then(parse_utf8)
        .unwrap_or_default();

    let mut scans = Vec::new();
    for (method_idx, method) in class.methods.iter().enumerate() {
        let Some(code) = method.attrs.iter().find_map(|attr| match &attr.body {
            AttrBody::Code((code_1, _)) => Some(code_1),
            _ => None,
        }) else {
            continue;
        };

        let location = MethodLocation {
            file: file_name.to_string(),
            class_name: class_name.clone(),
            method_name: class
                .cp
                .utf8(method.name)
                .and_then(parse_utf8)
                .unwrap_or_default(),
            method_descriptor: class
                .cp
                .utf8(method.desc)
                .and_then(parse_utf8)
                .unwrap_or_default(),
        };

        let events: Vec<InsnEvent> = code
            .bytecode
            .0
            .iter()
            .map(|(_pos, ix)| decode_instr(&rp, ix))
            .collect();

        let mut reports = Vec::new();
        let rewrite = rewrite_method(&events, &location, policy, &mut reports);
        if reports.is_empty() {
            continue;
        }
        scans.push(MethodScan {
            method_idx,
            location,
            splices: rewrite.splices,
            reports,
        });
    }

    let strings = string_constants(&rp, class.cp.0.len());
    drop(rp);

    let mut changed = false;
    for scan in &mut scans {
        if scan.splices.is_empty() {
            continue;
        }
        if encode_method(class, scan, &strings, policy.symbols()) {
            changed = true;
        } else {
            for report in &mut scan.reports {
                report.substituted = false;
            }
        }
    }

    for report in scans.iter().flat_map(|scan| &scan.reports) {
        diagnostics.report(report);
    }

    changed
}

/// Splice one method's bytecode; `false` leaves the method unchanged
fn encode_method<'a>(
    class: &mut Class<'a>,
    scan: &MethodScan,
    strings: &StringConstants,
    symbols: &'a [String],
) -> bool {
    let Some(method) = class.methods.get_mut(scan.method_idx) else {
        return false;
    };
    let Some(code) = method.attrs.iter_mut().find_map(|attr| match &mut attr.body {
        AttrBody::Code((code_1, _)) => Some(code_1),
        _ => None,
    }) else {
        return false;
    };

    let mut editor = ConstantPoolEditor::new(&mut class.cp, strings, symbols);
    if let Err(err) = splice_bytecode(&mut code.bytecode.0, &scan.splices, &mut editor) {
        warn!("Leaving {} unchanged: {}", scan.location, err);
        return false;
    }

    // Positions inside replaced sites are gone
    for attr in &mut code.attrs {
        let AttrBody::LineNumberTable(table) = &mut attr.body else {
            continue;
        };
        table.clear();
    }

    debug!("Rewrote {} hook site(s) in {}", scan.splices.len(), scan.location);
    true
}

/// Patch one class file image.
///
/// `Ok(None)` when the class does not construct hooks or nothing was rewritten.
pub fn apply_transformations<P, D>(
    original: &[u8],
    file_name: &str,
    policy: &P,
    diagnostics: &mut D,
) -> Result<Option<Vec<u8>>, PatchError>
where
    P: RewritePolicy + ?Sized,
    D: Diagnostics + ?Sized,
{
    let mut class = classfile::parse(original, PARSER_OPTIONS).map_err(|err| PatchError::Parse {
        file: file_name.to_string(),
        message: format!("{:?}", err),
    })?;

    let target = TargetSignature::HOOK;
    if !uses_method(&class, target.owner, target.name) {
        return Ok(None);
    }

    if !patch_class(&mut class, file_name, policy, diagnostics) {
        return Ok(None);
    }

    Ok(Some(reasm(file_name, &class)?))
}
