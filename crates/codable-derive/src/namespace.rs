//! Namespace tree: dotted key paths folded into nested keyed containers.
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]; a node's
//! parent link is only used to rebuild its key path.

use std::collections::{BTreeMap, HashSet};

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::Visibility;

use crate::attrs::to_pascal_case;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// Input to the builder: one property and its wire path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyInput {
    pub property: usize,
    pub path: Vec<String>,
}

/// A property whose path ends at a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    pub property: usize,
    pub wire: String,
    pub variant: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceNode {
    pub segment: String,
    pub key_enum: String,
    pub leaves: Vec<Leaf>,
    pub children: BTreeMap<String, NodeId>,
    pub parent: Option<NodeId>,
    /// Variant naming this node in its parent's key enum.
    pub variant: String,
}

impl NamespaceNode {
    fn new(segment: &str, parent: Option<NodeId>) -> Self {
        Self {
            segment: segment.to_string(),
            key_enum: String::new(),
            leaves: Vec::new(),
            children: BTreeMap::new(),
            parent,
            variant: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty() && self.children.is_empty()
    }
}

/// Two or more properties claiming one wire key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyConflict {
    /// Full dotted key.
    pub key: String,
    pub properties: Vec<usize>,
}

/// One case of a node's key enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyCase<'t> {
    pub variant: &'t str,
    pub wire: &'t str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceTree {
    nodes: Vec<NamespaceNode>,
    conflicts: Vec<KeyConflict>,
}

impl NamespaceTree {
    /// Builds the tree for one direction. `root_enum` names the root key enum;
    /// nested enums are named after it and their segment chain.
    pub fn build(root_enum: &str, inputs: &[KeyInput]) -> Self {
        let mut tree = Self {
            nodes: vec![NamespaceNode::new("", None)],
            conflicts: Vec::new(),
        };

        for input in inputs {
            let Some((last, parents)) = input.path.split_last() else {
                continue;
            };
            let mut node = NodeId::ROOT;
            for segment in parents {
                node = tree.child_or_insert(node, segment);
            }
            tree.nodes[node.0].leaves.push(Leaf {
                property: input.property,
                wire: last.clone(),
                variant: String::new(),
            });
        }

        tree.detect_conflicts();
        tree.assign_names(root_enum);
        tree
    }

    fn child_or_insert(&mut self, parent: NodeId, segment: &str) -> NodeId {
        if let Some(&child) = self.nodes[parent.0].children.get(segment) {
            return child;
        }
        let child = NodeId(self.nodes.len());
        self.nodes.push(NamespaceNode::new(segment, Some(parent)));
        self.nodes[parent.0]
            .children
            .insert(segment.to_string(), child);
        child
    }

    fn detect_conflicts(&mut self) {
        let mut conflicts = Vec::new();
        for id in self.preorder() {
            let node = &self.nodes[id.0];
            let prefix = self.path_of(id);
            let mut by_wire: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
            for leaf in &node.leaves {
                by_wire.entry(leaf.wire.as_str()).or_default().push(leaf.property);
            }
            for (wire, mut properties) in by_wire {
                let nested = node.children.get(wire).copied();
                if properties.len() < 2 && nested.is_none() {
                    continue;
                }
                if let Some(child) = nested {
                    properties.extend(self.subtree_properties(child));
                }
                let mut key = prefix.clone();
                key.push(wire);
                conflicts.push(KeyConflict {
                    key: key.join("."),
                    properties,
                });
            }
        }
        self.conflicts = conflicts;
    }

    fn assign_names(&mut self, root_enum: &str) {
        let mut used_enums = HashSet::new();
        self.nodes[0].key_enum = root_enum.to_string();
        used_enums.insert(root_enum.to_string());

        for id in self.preorder() {
            let mut used_variants = HashSet::new();
            let key_enum = self.nodes[id.0].key_enum.clone();

            for leaf in &mut self.nodes[id.0].leaves {
                leaf.variant = unique(variant_name(&leaf.wire), &mut used_variants);
            }
            let children: Vec<(String, NodeId)> = self.nodes[id.0]
                .children
                .iter()
                .map(|(segment, child)| (segment.clone(), *child))
                .collect();
            for (segment, child) in children {
                let variant = unique(variant_name(&segment), &mut used_variants);
                let name = unique(
                    format!("{key_enum}_{}", sanitize_segment(&segment)),
                    &mut used_enums,
                );
                let node = &mut self.nodes[child.0];
                node.variant = variant;
                node.key_enum = name;
            }
        }
    }

    pub fn node(&self, id: NodeId) -> &NamespaceNode {
        &self.nodes[id.0]
    }

    pub fn root(&self) -> &NamespaceNode {
        &self.nodes[0]
    }

    /// The leaf carrying `property` at node `id`.
    pub fn leaf(&self, id: NodeId, property: usize) -> Option<&Leaf> {
        self.nodes[id.0]
            .leaves
            .iter()
            .find(|leaf| leaf.property == property)
    }

    pub fn conflicts(&self) -> &[KeyConflict] {
        &self.conflicts
    }

    /// Root first, then children depth-first in sibling order.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![NodeId::ROOT];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.values().rev().copied());
        }
        order
    }

    /// Segments from the root down to `id`.
    pub fn path_of(&self, id: NodeId) -> Vec<&str> {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = &self.nodes[node_id.0];
            if node.parent.is_some() {
                segments.push(node.segment.as_str());
            }
            current = node.parent;
        }
        segments.reverse();
        segments
    }

    /// Every property in the subtree rooted at `id`, in preorder.
    pub fn subtree_properties(&self, id: NodeId) -> Vec<usize> {
        let mut properties = Vec::new();
        let mut stack = vec![id];
        while let Some(node_id) = stack.pop() {
            let node = &self.nodes[node_id.0];
            properties.extend(node.leaves.iter().map(|leaf| leaf.property));
            stack.extend(node.children.values().rev().copied());
        }
        properties
    }

    pub fn cases(&self, id: NodeId) -> Vec<KeyCase<'_>> {
        let node = &self.nodes[id.0];
        node.leaves
            .iter()
            .map(|leaf| KeyCase {
                variant: &leaf.variant,
                wire: &leaf.wire,
            })
            .chain(node.children.iter().map(|(segment, child)| KeyCase {
                variant: &self.nodes[child.0].variant,
                wire: segment,
            }))
            .collect()
    }

    /// Whether any property is coded at all.
    pub fn is_empty(&self) -> bool {
        self.nodes[0].is_empty()
    }

    /// Key enum declarations, root first, depth-first in sibling order.
    pub fn key_enums(&self, vis: &Visibility) -> TokenStream {
        self.preorder()
            .into_iter()
            .filter(|id| !self.nodes[id.0].is_empty())
            .map(|id| self.key_enum(id, vis))
            .collect()
    }

    fn key_enum(&self, id: NodeId, vis: &Visibility) -> TokenStream {
        let name = format_ident!("{}", self.nodes[id.0].key_enum);
        let cases = self.cases(id);
        let variants: Vec<_> = cases
            .iter()
            .map(|case| format_ident!("{}", case.variant))
            .collect();
        let wires: Vec<&str> = cases.iter().map(|case| case.wire).collect();

        quote! {
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            #[allow(non_camel_case_types)]
            #vis enum #name {
                #(#variants,)*
            }

            impl ::codable::CodingKey for #name {
                fn as_str(&self) -> &'static str {
                    match self {
                        #(Self::#variants => #wires,)*
                    }
                }

                fn from_key(key: &str) -> ::core::option::Option<Self> {
                    match key {
                        #(#wires => ::core::option::Option::Some(Self::#variants),)*
                        _ => ::core::option::Option::None,
                    }
                }

                fn all() -> &'static [Self] {
                    &[#(Self::#variants),*]
                }
            }
        }
    }
}

fn unique(candidate: String, used: &mut HashSet<String>) -> String {
    if used.insert(candidate.clone()) {
        return candidate;
    }
    let mut suffix = 2;
    loop {
        let next = format!("{candidate}{suffix}");
        if used.insert(next.clone()) {
            return next;
        }
        suffix += 1;
    }
}

/// PascalCase identifier for a wire key.
fn variant_name(wire: &str) -> String {
    let cleaned: String = wire
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let pascal = to_pascal_case(&cleaned);
    match pascal.chars().next() {
        None => "Key".to_string(),
        Some(first) if first.is_ascii_digit() => format!("Key{pascal}"),
        Some(_) if pascal == "Self" => "Self_".to_string(),
        Some(_) => pascal,
    }
}

fn sanitize_segment(segment: &str) -> String {
    let cleaned: String = segment
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "key".to_string()
    } else {
        cleaned
    }
}
