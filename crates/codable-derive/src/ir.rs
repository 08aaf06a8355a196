//! Ordered statement plans for decode and encode routines.
//!
//! Plans are built from a namespace tree and lowered to tokens by
//! `decode_gen` and `encode_gen`.

use crate::namespace::{NamespaceTree, NodeId};
use crate::options::{AbsentPolicy, DecodeStrategy, EncodeStrategy};
use crate::property::{Fallback, Property};

/// How a nested container is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireMode {
    /// The nested object must exist.
    Required,
    /// Absent or null becomes an empty container; every property below has a
    /// fallback.
    IfPresent,
    /// Anything but an object becomes an empty container; every property
    /// below also falls back on failure.
    Lenient,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecode {
    pub strategy: DecodeStrategy,
    pub fallback: Fallback,
    pub lenient: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecodeStmt {
    OpenRoot {
        node: NodeId,
    },
    /// One raw-string decoder shared by every field of the routine.
    SharedRawStringDecoder,
    OpenNested {
        node: NodeId,
        parent: NodeId,
        mode: AcquireMode,
    },
    Field {
        property: usize,
        node: NodeId,
        plan: FieldDecode,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldEncode {
    pub strategy: EncodeStrategy,
    pub optional: bool,
    pub absent: AbsentPolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EncodeStmt {
    OpenRoot {
        node: NodeId,
    },
    SharedRawStringEncoder,
    /// Opens a scope holding the nested container until the matching
    /// `ExitNested`.
    EnterNested {
        node: NodeId,
        parent: NodeId,
    },
    ExitNested,
    Field {
        property: usize,
        node: NodeId,
        plan: FieldEncode,
    },
}

/// Container acquisition, then each node's fields, root first and children in
/// sibling order.
pub fn plan_decode(tree: &NamespaceTree, properties: &[Property]) -> Vec<DecodeStmt> {
    let mut stmts = Vec::new();
    if tree.is_empty() {
        return stmts;
    }

    stmts.push(DecodeStmt::OpenRoot { node: NodeId::ROOT });
    let uses_raw_string = tree.subtree_properties(NodeId::ROOT).into_iter().any(|index| {
        properties[index]
            .decode_strategy()
            .is_some_and(DecodeStrategy::uses_raw_string)
    });
    if uses_raw_string {
        stmts.push(DecodeStmt::SharedRawStringDecoder);
    }

    for id in tree.preorder() {
        let node = tree.node(id);
        if let Some(parent) = node.parent {
            stmts.push(DecodeStmt::OpenNested {
                node: id,
                parent,
                mode: acquire_mode(tree, id, properties),
            });
        }
        for leaf in &node.leaves {
            let property = &properties[leaf.property];
            let Some(strategy) = property.decode_strategy() else {
                continue;
            };
            stmts.push(DecodeStmt::Field {
                property: leaf.property,
                node: id,
                plan: FieldDecode {
                    strategy,
                    fallback: property.fallback(),
                    lenient: property.is_lenient(),
                },
            });
        }
    }
    stmts
}

pub fn acquire_mode(tree: &NamespaceTree, id: NodeId, properties: &[Property]) -> AcquireMode {
    let subtree = tree.subtree_properties(id);
    if !subtree.iter().all(|&index| properties[index].has_fallback()) {
        AcquireMode::Required
    } else if subtree.iter().all(|&index| properties[index].is_lenient()) {
        AcquireMode::Lenient
    } else {
        AcquireMode::IfPresent
    }
}

/// Mirrors [`plan_decode`]; nested containers are scoped so the parent can be
/// used again once a child is done.
pub fn plan_encode(tree: &NamespaceTree, properties: &[Property]) -> Vec<EncodeStmt> {
    let mut stmts = Vec::new();
    if tree.is_empty() {
        return stmts;
    }

    stmts.push(EncodeStmt::OpenRoot { node: NodeId::ROOT });
    let uses_raw_string = tree.subtree_properties(NodeId::ROOT).into_iter().any(|index| {
        properties[index]
            .encode_strategy()
            .is_some_and(EncodeStrategy::uses_raw_string)
    });
    if uses_raw_string {
        stmts.push(EncodeStmt::SharedRawStringEncoder);
    }
    plan_encode_node(tree, NodeId::ROOT, properties, &mut stmts);
    stmts
}

fn plan_encode_node(
    tree: &NamespaceTree,
    id: NodeId,
    properties: &[Property],
    stmts: &mut Vec<EncodeStmt>,
) {
    let node = tree.node(id);
    for leaf in &node.leaves {
        let property = &properties[leaf.property];
        let Some(strategy) = property.encode_strategy() else {
            continue;
        };
        stmts.push(EncodeStmt::Field {
            property: leaf.property,
            node: id,
            plan: FieldEncode {
                strategy,
                optional: property.is_optional,
                absent: property.options.absent_policy(),
            },
        });
    }
    for &child in node.children.values() {
        stmts.push(EncodeStmt::EnterNested {
            node: child,
            parent: id,
        });
        plan_encode_node(tree, child, properties, stmts);
        stmts.push(EncodeStmt::ExitNested);
    }
}

#[cfg(test)]
mod tests {
    use syn::{parse_quote, ItemStruct};

    use super::*;
    use crate::attrs::{Direction, RenameStrategy};
    use crate::decl::Declaration;
    use crate::diagnostics::Diagnostics;
    use crate::namespace::KeyInput;
    use crate::property::extract_properties;

    fn setup(item: ItemStruct) -> (NamespaceTree, Vec<Property>) {
        let decl = Declaration::from_struct(&item).unwrap();
        let mut diag = Diagnostics::new();
        let props = extract_properties(&decl, &mut diag);
        assert!(!diag.has_errors());
        let inputs: Vec<KeyInput> = props
            .iter()
            .enumerate()
            .map(|(property, prop)| KeyInput {
                property,
                path: prop.path(Direction::Decode, RenameStrategy::None),
            })
            .collect();
        (NamespaceTree::build("Keys", &inputs), props)
    }

    #[test]
    fn nested_modes_follow_fallbacks() {
        let (tree, props) = setup(parse_quote! {
            struct Config {
                #[coding_key("server.host")]
                host: String,
                #[coding_key("limits.max", default = 10)]
                max: u32,
                #[coding_key("extra.note", use_default_on_failure)]
                note: Option<String>,
            }
        });
        let modes: Vec<(String, AcquireMode)> = plan_decode(&tree, &props)
            .into_iter()
            .filter_map(|stmt| match stmt {
                DecodeStmt::OpenNested { node, mode, .. } => {
                    Some((tree.node(node).segment.clone(), mode))
                }
                _ => None,
            })
            .collect();
        assert_eq!(
            modes,
            vec![
                ("extra".to_string(), AcquireMode::Lenient),
                ("limits".to_string(), AcquireMode::IfPresent),
                ("server".to_string(), AcquireMode::Required),
            ]
        );
    }

    #[test]
    fn raw_string_decoder_is_shared_once() {
        let (tree, props) = setup(parse_quote! {
            struct Booking {
                #[coding_key(transcode_raw_string)]
                room: Room,
                #[coding_key("guest.prefs", safe_transcode_raw_string)]
                prefs: Option<Prefs>,
            }
        });
        let plan = plan_decode(&tree, &props);
        let shared = plan
            .iter()
            .filter(|stmt| matches!(stmt, DecodeStmt::SharedRawStringDecoder))
            .count();
        assert_eq!(shared, 1);
        assert_eq!(plan[1], DecodeStmt::SharedRawStringDecoder);
    }

    #[test]
    fn encode_scopes_are_balanced() {
        let (tree, props) = setup(parse_quote! {
            struct User {
                id: u64,
                #[coding_key("profile.info.name")]
                name: String,
                #[coding_key("profile.bio")]
                bio: Option<String>,
            }
        });
        let plan = plan_encode(&tree, &props);
        let enters = plan
            .iter()
            .filter(|stmt| matches!(stmt, EncodeStmt::EnterNested { .. }))
            .count();
        let exits = plan
            .iter()
            .filter(|stmt| matches!(stmt, EncodeStmt::ExitNested))
            .count();
        assert_eq!((enters, exits), (2, 2));
        assert!(!plan
            .iter()
            .any(|stmt| matches!(stmt, EncodeStmt::SharedRawStringEncoder)));
    }

    #[test]
    fn planning_twice_is_identical() {
        let item: ItemStruct = parse_quote! {
            struct User {
                #[coding_key("a.b")]
                b: u8,
                #[coding_key("a.c", default)]
                c: u8,
                d: Option<u8>,
            }
        };
        let (tree_a, props_a) = setup(item.clone());
        let (tree_b, props_b) = setup(item);
        assert_eq!(plan_decode(&tree_a, &props_a), plan_decode(&tree_b, &props_b));
        assert_eq!(plan_encode(&tree_a, &props_a), plan_encode(&tree_b, &props_b));
    }
}
