//! Decode and encode namespace trees for one container, and their key enums.

use std::sync::Arc;

use proc_macro2::TokenStream;
use syn::Visibility;

use crate::attrs::{Direction, Directions, RenameStrategy};
use crate::cache::namespace_tree;
use crate::namespace::{KeyConflict, KeyInput, NamespaceTree};
use crate::property::Property;

pub struct KeyTrees {
    pub decode: Arc<NamespaceTree>,
    pub encode: Arc<NamespaceTree>,
    shared: bool,
}

impl KeyTrees {
    /// One `{base}CodingKeys` family when both directions key alike (or only
    /// one direction is generated), else `{base}DecodingKeys` and
    /// `{base}EncodingKeys`. Ignored properties get no key.
    pub fn build(
        base: &str,
        properties: &[Property],
        rename: RenameStrategy,
        directions: Directions,
    ) -> Self {
        let decode_inputs = inputs(properties, Direction::Decode, rename);
        let encode_inputs = inputs(properties, Direction::Encode, rename);

        if !directions.both() || decode_inputs == encode_inputs {
            let source = if directions.decode {
                &decode_inputs
            } else {
                &encode_inputs
            };
            let tree = namespace_tree(&format!("{base}CodingKeys"), source);
            return Self {
                decode: Arc::clone(&tree),
                encode: tree,
                shared: true,
            };
        }

        Self {
            decode: namespace_tree(&format!("{base}DecodingKeys"), &decode_inputs),
            encode: namespace_tree(&format!("{base}EncodingKeys"), &encode_inputs),
            shared: false,
        }
    }

    /// Conflicts of every distinct tree.
    pub fn conflicts(&self) -> Vec<&KeyConflict> {
        let mut conflicts: Vec<&KeyConflict> = self.decode.conflicts().iter().collect();
        if !self.shared {
            conflicts.extend(self.encode.conflicts());
        }
        conflicts
    }

    pub fn key_enums(&self, vis: &Visibility) -> TokenStream {
        let mut tokens = self.decode.key_enums(vis);
        if !self.shared {
            tokens.extend(self.encode.key_enums(vis));
        }
        tokens
    }
}

fn inputs(properties: &[Property], direction: Direction, rename: RenameStrategy) -> Vec<KeyInput> {
    properties
        .iter()
        .enumerate()
        .filter(|(_, property)| !property.is_ignored())
        .map(|(index, property)| KeyInput {
            property: index,
            path: property.path(direction, rename),
        })
        .collect()
}
