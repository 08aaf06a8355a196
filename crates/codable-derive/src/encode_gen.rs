//! Lowers encode plans to the body of an `Encode` impl.
//!
//! Shares local naming with `decode_gen` so both directions agree on
//! container bindings.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Generics, Ident};

use crate::decode_gen::{container_local, field_local, with_bound, SuperCoding};
use crate::ir::{plan_encode, EncodeStmt, FieldEncode};
use crate::namespace::NamespaceTree;
use crate::options::{AbsentPolicy, EncodeStrategy};
use crate::property::Property;

/// How a property's value is reached from the encode routine.
pub(crate) struct FieldAccessor {
    reference: TokenStream,
}

impl FieldAccessor {
    pub(crate) fn for_self(property: &Property) -> Self {
        let name = &property.name;
        Self {
            reference: quote! { &self.#name },
        }
    }

    /// A `__field_<name>` binding from a `match self` pattern, already a
    /// reference.
    pub(crate) fn binding(property: &Property) -> Self {
        let local = field_local(&property.name);
        Self {
            reference: quote! { #local },
        }
    }
}

pub fn generate_encode_impl(
    ident: &Ident,
    generics: &Generics,
    tree: &NamespaceTree,
    properties: &[Property],
    supertype: Option<&SuperCoding<'_>>,
) -> TokenStream {
    let generics = with_bound(generics, quote!(::codable::Encode));
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let body = if tree.is_empty() {
        // Still an object, unless a supertype writes into the same one.
        match supertype {
            Some(_) => quote!(),
            None => quote! { encoder.keyed()?; },
        }
    } else {
        let root_enum = format_ident!("{}", tree.root().key_enum);
        encode_fields(
            tree,
            properties,
            quote!(encoder.container::<#root_enum>()?),
            FieldAccessor::for_self,
        )
    };
    let super_stmt = match supertype {
        Some(SuperCoding {
            field,
            ty,
            skip: false,
        }) => quote! {
            <#ty as ::codable::Encode>::encode(&self.#field, encoder)?;
        },
        _ => quote!(),
    };

    quote! {
        impl #impl_generics ::codable::Encode for #ident #ty_generics #where_clause {
            fn encode(&self, encoder: &mut ::codable::Encoder) -> ::core::result::Result<(), ::codable::CodingError> {
                <Self as ::codable::CodingHooks>::pre_encode(self, encoder)?;
                {
                    #body
                }
                #super_stmt
                <Self as ::codable::CodingHooks>::post_encode(self, encoder)?;
                ::core::result::Result::Ok(())
            }
        }
    }
}

/// Statements writing every planned property. `open_root` evaluates to the
/// root keyed container.
pub(crate) fn encode_fields(
    tree: &NamespaceTree,
    properties: &[Property],
    open_root: TokenStream,
    accessor: fn(&Property) -> FieldAccessor,
) -> TokenStream {
    let mut out = TokenStream::new();
    // Statement lists of the scopes still open; the innermost is last.
    let mut scopes: Vec<TokenStream> = Vec::new();

    for stmt in plan_encode(tree, properties) {
        let emitted = match stmt {
            EncodeStmt::OpenRoot { node } => {
                let container = container_local(node);
                quote! {
                    let mut #container = #open_root;
                }
            }
            EncodeStmt::SharedRawStringEncoder => quote! {
                let __raw_encoder = ::codable::RawStringEncoder::new();
            },
            EncodeStmt::EnterNested { node, parent } => {
                let container = container_local(node);
                let parent_container = container_local(parent);
                let child = tree.node(node);
                let child_enum = format_ident!("{}", child.key_enum);
                let parent_enum = format_ident!("{}", tree.node(parent).key_enum);
                let variant = format_ident!("{}", child.variant);
                scopes.push(quote! {
                    let mut #container = #parent_container.nested_container::<#child_enum>(#parent_enum::#variant);
                });
                continue;
            }
            EncodeStmt::ExitNested => {
                let Some(inner) = scopes.pop() else {
                    continue;
                };
                quote! {
                    {
                        #inner
                    }
                }
            }
            EncodeStmt::Field { property, node, plan } => {
                let prop = &properties[property];
                let node_ref = tree.node(node);
                let Some(leaf) = tree.leaf(node, property) else {
                    continue;
                };
                let key_enum = format_ident!("{}", node_ref.key_enum);
                let variant = format_ident!("{}", leaf.variant);
                let key = quote!(#key_enum::#variant);
                field_write(prop, &plan, &container_local(node), &key, &accessor(prop))
            }
        };
        match scopes.last_mut() {
            Some(scope) => scope.extend(emitted),
            None => out.extend(emitted),
        }
    }

    out
}

fn field_write(
    property: &Property,
    plan: &FieldEncode,
    container: &Ident,
    key: &TokenStream,
    accessor: &FieldAccessor,
) -> TokenStream {
    let reference = &accessor.reference;
    let write = |value: TokenStream| -> TokenStream {
        match plan.strategy {
            EncodeStrategy::Value => quote!(#container.encode(#key, #value)?),
            EncodeStrategy::Transform => {
                let transformer = &property.transformer;
                quote!(#container.encode_transformed(#key, #value, &(#transformer))?)
            }
            EncodeStrategy::RawString => {
                quote!(#container.encode_raw_string(#key, #value, &__raw_encoder)?)
            }
        }
    };

    if !plan.optional {
        let write = write(quote!(#reference));
        return quote! { #write; };
    }

    match (plan.strategy, plan.absent) {
        (EncodeStrategy::Value, AbsentPolicy::Omit) => quote! {
            #container.encode_if_present(#key, (#reference).as_ref())?;
        },
        (_, AbsentPolicy::Omit) => {
            let write = write(quote!(value));
            quote! {
                if let ::core::option::Option::Some(value) = (#reference).as_ref() {
                    #write;
                }
            }
        }
        (_, AbsentPolicy::WriteNil) => {
            let write = write(quote!(value));
            quote! {
                match (#reference).as_ref() {
                    ::core::option::Option::Some(value) => #write,
                    ::core::option::Option::None => #container.encode_nil(#key),
                }
            }
        }
    }
}
