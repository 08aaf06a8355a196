//! Container-wide checks run before any code is generated.

use std::collections::HashSet;

use crate::attrs::{ContainerAttrs, Directions, FieldAttrs, KeyFamily};
use crate::decl::Declaration;
use crate::diagnostics::Diagnostics;
use crate::options::{ContainerOptions, FieldOptions};
use crate::property::Property;

/// Rejects two attributes of one family on a field, and `coding_key` used
/// together with a direction-specific attribute. Returns false on error.
pub fn key_attributes(attrs: &FieldAttrs, diag: &mut Diagnostics) -> bool {
    let mut ok = true;
    let mut seen = HashSet::new();
    for key in &attrs.keys {
        if !seen.insert(key.family) {
            diag.error(
                key.span,
                format!("duplicate #[{}] attribute", key.family.attr_name()),
            );
            ok = false;
        }
    }
    if seen.contains(&KeyFamily::Coding)
        && (seen.contains(&KeyFamily::Decoding) || seen.contains(&KeyFamily::Encoding))
    {
        if let Some(key) = attrs.keys.iter().find(|key| key.family != KeyFamily::Coding) {
            diag.error(
                key.span,
                format!(
                    "#[{}] cannot be combined with #[coding_key]",
                    key.family.attr_name()
                ),
            );
        }
        ok = false;
    }
    ok
}

/// Option combinations: hard errors for impossible ones, warnings for
/// options that do nothing.
pub fn field_options(properties: &[Property], diag: &mut Diagnostics) {
    for property in properties {
        if property.is_ignored() {
            continue;
        }
        let name = &property.name;

        if property.decode_strategy().is_none() || property.encode_strategy().is_none() {
            let other = if property.options.contains(FieldOptions::LOSSY) {
                "lossy"
            } else {
                "transcode_raw_string"
            };
            diag.error(
                property.span,
                format!("`transformer` cannot be combined with `{other}` on `{name}`"),
            );
        }
        if property.options.contains(FieldOptions::USE_DEFAULT_ON_FAILURE) && !property.has_fallback() {
            diag.warn(
                property.span,
                format!("`use_default_on_failure` has no effect on `{name}`: it is neither optional nor defaulted"),
            );
        }
        if property.options.contains(FieldOptions::EXPLICIT_NIL) && !property.is_optional {
            diag.warn(
                property.span,
                format!("`explicit_nil` has no effect on non-optional `{name}`"),
            );
        }
        if property.options.contains(FieldOptions::LOSSY) && !property.shape.is_collection() {
            diag.warn(
                property.span,
                format!("`lossy` has no effect on `{name}`: it is not an array, set or dictionary"),
            );
        }
    }
}

/// Direction-specific key attributes must match a direction the container
/// generates.
pub fn family_compatibility(properties: &[Property], directions: Directions, diag: &mut Diagnostics) {
    for property in properties {
        for family in &property.provenance {
            let compatible = match family {
                KeyFamily::Coding => true,
                KeyFamily::Decoding => directions.decode,
                KeyFamily::Encoding => directions.encode,
            };
            if !compatible {
                let container = if directions.decode { "decode-only" } else { "encode-only" };
                diag.error(
                    property.span,
                    format!(
                        "#[{}] on `{}` does not apply to a {container} container",
                        family.attr_name(),
                        property.name
                    ),
                );
            }
        }
    }
}

/// Warns about container macros whose output is already generated by an
/// earlier one on the same item.
pub fn conformances(container: &ContainerAttrs, diag: &mut Diagnostics) {
    if container.has(ContainerOptions::SKIP_PROTOCOL_CONFORMANCE) {
        return;
    }
    let mut provided = Directions::default();
    for conformance in &container.conformances {
        let requested = conformance.family.directions();
        if provided.contains(requested) {
            diag.warn(
                conformance.span,
                format!(
                    "#[{}] is redundant: the container already generates it",
                    conformance.family.name()
                ),
            );
        }
        provided = provided.union(requested);
    }
}

/// Supertype chaining needs exactly one inheritance entry with storage.
pub fn supertype(decl: &Declaration, container: &ContainerAttrs, diag: &mut Diagnostics) {
    if !decl.has_supertype() {
        if container.has(ContainerOptions::SKIP_SUPER_CODING) {
            diag.warn(
                decl.span,
                "`skip_super_coding` has no effect: there is no #[coding_super] field",
            );
        }
        return;
    }
    if let Some(extra) = decl.inheritance.get(1) {
        diag.error(extra.span, "only one #[coding_super] field is supported");
    }
    if let Some(inherited) = decl.inheritance.first().filter(|inherited| inherited.storage.is_none()) {
        diag.error(inherited.span, "the supertype has no field to decode into");
    }
}
