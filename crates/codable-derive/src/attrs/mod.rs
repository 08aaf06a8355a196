//! Attribute parsing for the codable macros.
//!
//! # Module Structure
//!
//! - `types` - Enum definitions for attribute values
//! - `container` - Container-level attribute definitions
//! - `field` - Field-level attribute definitions
//! - `type_utils` - Type analysis utilities
//! - `parse` - Parsing entry points using `parse_nested_meta`

mod container;
mod field;
mod parse;
mod type_utils;
mod types;

pub use container::{Conformance, ContainerAttrs};
pub use field::FieldAttrs;
pub use parse::{
    container_family, is_field_helper, is_hook_helper, parse_container_args, parse_container_attr,
    parse_field_attrs, parse_hook_attr, strip_field_helpers,
};
pub use type_utils::{option_inner, TypeShape};
pub use types::{to_pascal_case, Direction, Directions, KeyFamily, MacroFamily, RenameStrategy};
