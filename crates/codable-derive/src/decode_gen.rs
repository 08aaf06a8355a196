//! Lowers decode plans to the body of a `Decode` impl.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::{parse_quote, Generics, Ident, Type};

use crate::ir::{plan_decode, AcquireMode, DecodeStmt, FieldDecode};
use crate::namespace::{NamespaceTree, NodeId};
use crate::options::DecodeStrategy;
use crate::property::{Fallback, Property};

/// The supertype a struct chains to.
pub struct SuperCoding<'a> {
    pub field: &'a Ident,
    pub ty: &'a Type,
    pub skip: bool,
}

pub fn generate_decode_impl(
    ident: &Ident,
    generics: &Generics,
    tree: &NamespaceTree,
    properties: &[Property],
    supertype: Option<&SuperCoding<'_>>,
) -> TokenStream {
    let generics = with_bound(generics, quote!(::codable::Decode));
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let statements = decode_fields(tree, properties, &quote!(decoder));
    let field_inits = field_inits(properties);
    let (super_stmt, super_init) = match supertype {
        Some(SuperCoding { field, ty, skip }) => {
            let value = if *skip {
                quote!(::core::default::Default::default())
            } else {
                quote!(<#ty as ::codable::Decode>::decode(decoder)?)
            };
            (
                quote! { let __super: #ty = #value; },
                quote! { #field: __super, },
            )
        }
        None => (quote!(), quote!()),
    };

    quote! {
        impl #impl_generics ::codable::Decode for #ident #ty_generics #where_clause {
            fn decode(decoder: &::codable::Decoder<'_>) -> ::core::result::Result<Self, ::codable::CodingError> {
                <Self as ::codable::CodingHooks>::pre_decode(decoder)?;
                #statements
                #super_stmt
                let mut value = Self {
                    #(#field_inits,)*
                    #super_init
                };
                <Self as ::codable::CodingHooks>::post_decode(&mut value, decoder)?;
                ::core::result::Result::Ok(value)
            }
        }
    }
}

/// `name: __field_name` initializers, one per property.
pub(crate) fn field_inits(properties: &[Property]) -> Vec<TokenStream> {
    properties
        .iter()
        .map(|property| {
            let name = &property.name;
            let local = field_local(&property.name);
            quote!(#name: #local)
        })
        .collect()
}

pub(crate) fn field_local(name: &Ident) -> Ident {
    format_ident!("__field_{}", name.unraw())
}

pub(crate) fn container_local(node: NodeId) -> Ident {
    format_ident!("__container_{}", node.index())
}

/// Statements binding one `__field_<name>` local per property, decoding from
/// the keyed container `decoder` points at.
pub(crate) fn decode_fields(
    tree: &NamespaceTree,
    properties: &[Property],
    decoder: &TokenStream,
) -> TokenStream {
    let mut statements = Vec::new();
    let mut bound = vec![false; properties.len()];

    for stmt in plan_decode(tree, properties) {
        statements.push(match stmt {
            DecodeStmt::OpenRoot { node } => {
                let container = container_local(node);
                let key_enum = format_ident!("{}", tree.node(node).key_enum);
                quote! {
                    let #container = #decoder.container::<#key_enum>()?;
                }
            }
            DecodeStmt::SharedRawStringDecoder => quote! {
                let __raw_decoder = ::codable::RawStringDecoder::new();
            },
            DecodeStmt::OpenNested { node, parent, mode } => {
                let container = container_local(node);
                let parent_container = container_local(parent);
                let child = tree.node(node);
                let child_enum = format_ident!("{}", child.key_enum);
                let parent_enum = format_ident!("{}", tree.node(parent).key_enum);
                let variant = format_ident!("{}", child.variant);
                let acquire = match mode {
                    AcquireMode::Required => quote! {
                        #parent_container.nested_container::<#child_enum>(#parent_enum::#variant)?
                    },
                    AcquireMode::IfPresent => quote! {
                        #parent_container.nested_container_if_present::<#child_enum>(#parent_enum::#variant)?
                    },
                    AcquireMode::Lenient => quote! {
                        #parent_container.nested_container_lenient::<#child_enum>(#parent_enum::#variant)
                    },
                };
                quote! {
                    let #container = #acquire;
                }
            }
            DecodeStmt::Field { property, node, plan } => {
                bound[property] = true;
                let prop = &properties[property];
                let node_ref = tree.node(node);
                let key_enum = format_ident!("{}", node_ref.key_enum);
                let Some(leaf) = tree.leaf(node, property) else {
                    continue;
                };
                let variant = format_ident!("{}", leaf.variant);
                let key = quote!(#key_enum::#variant);
                let local = field_local(&prop.name);
                let ty = &prop.ty;
                let value = field_value(prop, &plan, &container_local(node), &key);
                quote! {
                    let #local: #ty = #value;
                }
            }
        });
    }

    // Ignored properties, and anything without a key in this tree, take
    // their fallback.
    for (index, property) in properties.iter().enumerate() {
        if bound[index] {
            continue;
        }
        let local = field_local(&property.name);
        let ty = &property.ty;
        let value = match property.fallback() {
            Fallback::Default(expr) => quote!(#expr),
            Fallback::None | Fallback::Required => quote!(::core::default::Default::default()),
        };
        statements.push(quote! {
            let #local: #ty = #value;
        });
    }

    quote!(#(#statements)*)
}

fn field_value(
    property: &Property,
    plan: &FieldDecode,
    container: &Ident,
    key: &TokenStream,
) -> TokenStream {
    let required = attempt(property, plan.strategy, container, key, false);
    let if_present = attempt(property, plan.strategy, container, key, true);
    let optional_attempt = if plan.lenient {
        quote!(::codable::lenient(#if_present))
    } else {
        quote!(#if_present?)
    };

    match &plan.fallback {
        Fallback::Required => quote!(#required?),
        Fallback::None => optional_attempt,
        Fallback::Default(default) => {
            let present = if property.is_optional {
                quote!(::core::option::Option::Some(value))
            } else {
                quote!(value)
            };
            quote! {
                match #optional_attempt {
                    ::core::option::Option::Some(value) => #present,
                    ::core::option::Option::None => #default,
                }
            }
        }
    }
}

/// The container call decoding one value, as a `Result<T>` or, with
/// `if_present`, a `Result<Option<T>>`.
fn attempt(
    property: &Property,
    strategy: DecodeStrategy,
    container: &Ident,
    key: &TokenStream,
    if_present: bool,
) -> TokenStream {
    let value_ty = property.value_type();
    let suffix = if if_present { "_if_present" } else { "" };
    match strategy {
        DecodeStrategy::Value => {
            let method = format_ident!("decode{suffix}");
            quote!(#container.#method::<#value_ty>(#key))
        }
        DecodeStrategy::Transform => {
            let method = format_ident!("decode_transformed{suffix}");
            let transformer = &property.transformer;
            quote!(#container.#method(#key, &(#transformer)))
        }
        DecodeStrategy::Lossy => {
            let method = format_ident!("decode_lossy{suffix}");
            quote!(#container.#method::<#value_ty>(#key))
        }
        DecodeStrategy::RawString => {
            let method = format_ident!("decode_raw_string{suffix}");
            quote!(#container.#method::<#value_ty>(#key, &__raw_decoder))
        }
        DecodeStrategy::LossyRawString => {
            let method = format_ident!("decode_lossy_raw_string{suffix}");
            quote!(#container.#method::<#value_ty>(#key, &__raw_decoder))
        }
    }
}

/// Adds `bound` to every type parameter.
pub(crate) fn with_bound(generics: &Generics, bound: TokenStream) -> Generics {
    let mut generics = generics.clone();
    let params: Vec<Ident> = generics
        .type_params()
        .map(|param| param.ident.clone())
        .collect();
    if params.is_empty() {
        return generics;
    }
    let where_clause = generics.make_where_clause();
    for param in params {
        where_clause.predicates.push(parse_quote!(#param: #bound));
    }
    generics
}

#[cfg(test)]
mod tests {
    use syn::ItemStruct;

    use super::*;
    use crate::attrs::{Direction, RenameStrategy};
    use crate::decl::Declaration;
    use crate::diagnostics::Diagnostics;
    use crate::namespace::KeyInput;
    use crate::property::extract_properties;

    fn generate(item: ItemStruct) -> String {
        let decl = Declaration::from_struct(&item).unwrap();
        let mut diag = Diagnostics::new();
        let props = extract_properties(&decl, &mut diag);
        let inputs: Vec<KeyInput> = props
            .iter()
            .enumerate()
            .filter(|(_, prop)| !prop.is_ignored())
            .map(|(property, prop)| KeyInput {
                property,
                path: prop.path(Direction::Decode, RenameStrategy::None),
            })
            .collect();
        let tree = NamespaceTree::build("Keys", &inputs);
        generate_decode_impl(&decl.ident, &decl.generics, &tree, &props, None).to_string()
    }

    #[test]
    fn required_optional_and_default_fields() {
        let code = generate(parse_quote! {
            struct User {
                id: u64,
                nickname: Option<String>,
                #[coding_key(default = 18)]
                age: u8,
            }
        });
        assert!(code.contains("__container_0 . decode :: < u64 > (Keys :: Id) ?"));
        assert!(code.contains("__container_0 . decode_if_present :: < String > (Keys :: Nickname) ?"));
        assert!(code.contains(":: core :: option :: Option :: None => 18"));
    }

    #[test]
    fn lenient_fields_swallow_failures() {
        let code = generate(parse_quote! {
            struct Config {
                #[coding_key("limits.retries", default = 3, use_default_on_failure)]
                retries: u8,
            }
        });
        assert!(code.contains("nested_container_lenient :: < Keys_limits > (Keys :: Limits)"));
        assert!(code.contains(":: codable :: lenient (__container_1 . decode_if_present :: < u8 >"));
    }

    #[test]
    fn ignored_fields_use_their_default() {
        let code = generate(parse_quote! {
            struct Session {
                token: String,
                #[coding_key(ignored)]
                cache: Vec<u8>,
            }
        });
        assert!(code.contains("let __field_cache : Vec < u8 > = :: core :: default :: Default :: default () ;"));
    }

    #[test]
    fn generic_parameters_are_bounded() {
        let code = generate(parse_quote! {
            struct Page<T> {
                items: Vec<T>,
            }
        });
        assert!(code.contains("where T : :: codable :: Decode"));
    }
}
