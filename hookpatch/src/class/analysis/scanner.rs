use krakatau2::lib::classfile::parse::Class;

use super::introspection::find_method_description;
use crate::class::core::assembly::init_refprinter;

/// Check whether the constant pool references `owner.name` as a method.
///
/// Cheap enough to run on every class before decoding any method bodies.
pub fn uses_method(class: &Class<'_>, owner: &str, name: &str) -> bool {
    let rp = init_refprinter(&class.cp, &class.attrs);

    (1..class.cp.0.len()).any(|idx| {
        find_method_description(&rp, idx as u16)
            .is_some_and(|method| method.owner == owner && method.name == name)
    })
}
