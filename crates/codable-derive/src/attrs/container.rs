//! Container-level (struct/enum) attribute definitions.

use proc_macro2::Span;

use super::types::{Directions, MacroFamily, RenameStrategy};
use crate::options::ContainerOptions;

/// One container macro attached to the item, in source order.
#[derive(Debug, Clone)]
pub struct Conformance {
    pub family: MacroFamily,
    pub span: Span,
}

/// Container arguments merged across every stacked container macro.
///
/// Populated by `parse_container_args` and `parse_container_attr` in
/// `parse.rs`.
#[derive(Debug, Clone, Default)]
pub struct ContainerAttrs {
    pub options: ContainerOptions,
    /// Rename strategy for fields and cases without a custom key.
    pub rename_all: RenameStrategy,
    pub rename_all_span: Option<Span>,
    /// Every container macro requested for the item.
    pub conformances: Vec<Conformance>,
}

impl ContainerAttrs {
    pub fn directions(&self) -> Directions {
        self.conformances
            .iter()
            .fold(Directions::default(), |acc, conformance| {
                acc.union(conformance.family.directions())
            })
    }

    pub fn has(&self, option: ContainerOptions) -> bool {
        self.options.contains(option)
    }
}
