use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Generics, Ident};

use crate::decode_gen::{decode_fields, field_inits, field_local, with_bound};
use crate::encode_gen::{encode_fields, FieldAccessor};
use crate::key_trees::KeyTrees;
use crate::namespace::{NamespaceTree, NodeId};
use crate::property::{CasePayloadSpec, CaseSpec};

/// One case with the key trees of its named fields, if it has any.
pub struct CaseCoding<'a> {
    pub index: usize,
    pub spec: &'a CaseSpec,
    pub payload_keys: Option<KeyTrees>,
}

impl CaseCoding<'_> {
    fn ident(&self) -> &Ident {
        &self.spec.property.name
    }

    /// Pattern matching this case without binding anything.
    fn wildcard_pattern(&self) -> TokenStream {
        let ident = self.ident();
        match &self.spec.payload {
            CasePayloadSpec::Unit => quote!(Self::#ident),
            CasePayloadSpec::Single(_) | CasePayloadSpec::Tuple => quote!(Self::#ident(..)),
            CasePayloadSpec::Fields(_) => quote!(Self::#ident { .. }),
        }
    }
}

fn case_key(tree: &NamespaceTree, case: &CaseCoding<'_>) -> Option<TokenStream> {
    let leaf = tree.leaf(NodeId::ROOT, case.index)?;
    let key_enum = format_ident!("{}", tree.root().key_enum);
    let variant = format_ident!("{}", leaf.variant);
    Some(quote!(#key_enum::#variant))
}

pub fn generate_enum_decode_impl(
    ident: &Ident,
    generics: &Generics,
    case_keys: &KeyTrees,
    cases: &[CaseCoding<'_>],
) -> TokenStream {
    let generics = with_bound(generics, quote!(::codable::Decode));
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let tree = &case_keys.decode;

    let body = if tree.is_empty() {
        let message = format!("`{ident}` has no decodable cases");
        quote! {
            ::core::result::Result::Err(::codable::CodingError::invalid_value(
                decoder.coding_path().clone(),
                #message,
            ))
        }
    } else {
        let key_enum = format_ident!("{}", tree.root().key_enum);
        let arms = cases.iter().filter_map(|case| {
            let key = case_key(tree, case)?;
            let construct = decode_case(case);
            Some(quote!(#key => #construct,))
        });
        quote! {
            let (__case, __payload) = decoder.enum_case::<#key_enum>()?;
            let mut value = match __case {
                #(#arms)*
            };
            <Self as ::codable::CodingHooks>::post_decode(&mut value, decoder)?;
            ::core::result::Result::Ok(value)
        }
    };

    quote! {
        impl #impl_generics ::codable::Decode for #ident #ty_generics #where_clause {
            fn decode(decoder: &::codable::Decoder<'_>) -> ::core::result::Result<Self, ::codable::CodingError> {
                <Self as ::codable::CodingHooks>::pre_decode(decoder)?;
                #body
            }
        }
    }
}

fn decode_case(case: &CaseCoding<'_>) -> TokenStream {
    let ident = case.ident();
    match &case.spec.payload {
        CasePayloadSpec::Unit => quote!(Self::#ident),
        CasePayloadSpec::Single(ty) => quote!(Self::#ident(__payload.decode::<#ty>()?)),
        CasePayloadSpec::Fields(properties) => {
            let Some(keys) = &case.payload_keys else {
                return quote!();
            };
            let statements = decode_fields(&keys.decode, properties, &quote!(__payload));
            let inits = field_inits(properties);
            quote! {
                {
                    #statements
                    Self::#ident { #(#inits,)* }
                }
            }
        }
        // Rejected unless ignored, and ignored cases have no arm.
        CasePayloadSpec::Tuple => quote!(),
    }
}

pub fn generate_enum_encode_impl(
    ident: &Ident,
    generics: &Generics,
    case_keys: &KeyTrees,
    cases: &[CaseCoding<'_>],
) -> TokenStream {
    let generics = with_bound(generics, quote!(::codable::Encode));
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let tree = &case_keys.encode;

    let body = if cases.is_empty() {
        quote!(match *self {})
    } else {
        let case_enum = format_ident!("{}", tree.root().key_enum);
        let arms = cases.iter().map(|case| match case_key(tree, case) {
            Some(key) => encode_case(case, &case_enum, &key),
            None => {
                let pattern = case.wildcard_pattern();
                let message = format!("case `{}` is not encodable", case.ident());
                quote! {
                    #pattern => {
                        return ::core::result::Result::Err(::codable::CodingError::invalid_value(
                            encoder.coding_path().clone(),
                            #message,
                        ));
                    }
                }
            }
        });
        quote! {
            match self {
                #(#arms)*
            }
        }
    };

    quote! {
        impl #impl_generics ::codable::Encode for #ident #ty_generics #where_clause {
            fn encode(&self, encoder: &mut ::codable::Encoder) -> ::core::result::Result<(), ::codable::CodingError> {
                <Self as ::codable::CodingHooks>::pre_encode(self, encoder)?;
                #body
                <Self as ::codable::CodingHooks>::post_encode(self, encoder)?;
                ::core::result::Result::Ok(())
            }
        }
    }
}

fn encode_case(case: &CaseCoding<'_>, case_enum: &Ident, key: &TokenStream) -> TokenStream {
    let ident = case.ident();
    match &case.spec.payload {
        CasePayloadSpec::Unit => quote! {
            Self::#ident => encoder.encode_case(#key),
        },
        CasePayloadSpec::Single(_) => quote! {
            Self::#ident(__payload) => encoder.encode_case_payload(#key, __payload)?,
        },
        CasePayloadSpec::Fields(properties) => {
            let bound: Vec<TokenStream> = properties
                .iter()
                .filter(|property| !property.is_ignored())
                .map(|property| {
                    let name = &property.name;
                    let local = field_local(name);
                    quote!(#name: #local)
                })
                .collect();
            let body = match &case.payload_keys {
                Some(keys) if !keys.encode.is_empty() => {
                    let payload_enum = format_ident!("{}", keys.encode.root().key_enum);
                    encode_fields(
                        &keys.encode,
                        properties,
                        quote!(encoder.case_container::<#case_enum, #payload_enum>(#key)?),
                        FieldAccessor::binding,
                    )
                }
                _ => quote! {
                    encoder.case_container::<#case_enum, #case_enum>(#key)?;
                },
            };
            quote! {
                Self::#ident { #(#bound,)* .. } => {
                    #body
                }
            }
        }
        CasePayloadSpec::Tuple => {
            let pattern = case.wildcard_pattern();
            quote!(#pattern => {})
        }
    }
}

#[cfg(test)]
mod tests {
    use syn::{parse_quote, ItemEnum};

    use super::*;
    use crate::attrs::{MacroFamily, RenameStrategy};
    use crate::decl::Declaration;
    use crate::diagnostics::Diagnostics;
    use crate::property::extract_cases;

    struct Generated {
        key_enums: String,
        decode: String,
        encode: String,
    }

    fn generate(item: ItemEnum) -> Generated {
        let decl = Declaration::from_enum(&item).unwrap();
        let mut diag = Diagnostics::new();
        let specs = extract_cases(&decl, &mut diag);
        assert!(!diag.has_errors());
        let properties: Vec<_> = specs.iter().map(|spec| spec.property.clone()).collect();
        let directions = MacroFamily::Codable.directions();
        let case_keys = KeyTrees::build("Shape", &properties, RenameStrategy::SnakeCase, directions);
        let cases: Vec<CaseCoding<'_>> = specs
            .iter()
            .enumerate()
            .map(|(index, spec)| CaseCoding {
                index,
                spec,
                payload_keys: match &spec.payload {
                    CasePayloadSpec::Fields(fields) => Some(KeyTrees::build(
                        &format!("Shape_{}", spec.property.name),
                        fields,
                        RenameStrategy::None,
                        directions,
                    )),
                    _ => None,
                },
            })
            .collect();
        Generated {
            key_enums: case_keys.key_enums(&decl.vis).to_string(),
            decode: generate_enum_decode_impl(&decl.ident, &decl.generics, &case_keys, &cases)
                .to_string(),
            encode: generate_enum_encode_impl(&decl.ident, &decl.generics, &case_keys, &cases)
                .to_string(),
        }
    }

    #[test]
    fn each_payload_kind_gets_an_arm() {
        let Generated { decode, encode, .. } = generate(parse_quote! {
            enum Shape {
                Empty,
                Circle(f64),
                Rect { width: f64, height: f64 },
            }
        });
        assert!(decode.contains("ShapeCodingKeys :: Empty => Self :: Empty"));
        assert!(decode.contains("Self :: Circle (__payload . decode :: < f64 > () ?)"));
        assert!(decode.contains("__payload . container :: < Shape_RectCodingKeys > () ?"));
        assert!(encode.contains("encoder . encode_case (ShapeCodingKeys :: Empty)"));
        assert!(encode.contains("encoder . case_container :: < ShapeCodingKeys , Shape_RectCodingKeys > (ShapeCodingKeys :: Rect) ?"));
        assert!(encode.contains("Self :: Rect { width : __field_width , height : __field_height , .. }"));
    }

    #[test]
    fn ignored_case_fails_to_encode() {
        let Generated { decode, encode, .. } = generate(parse_quote! {
            enum Shape {
                Point,
                #[coding_key(ignored)]
                Legacy(u8, u8),
            }
        });
        assert!(!decode.contains("Legacy"));
        assert!(encode.contains("Self :: Legacy (..) =>"));
        assert!(encode.contains("case `Legacy` is not encodable"));
    }

    #[test]
    fn case_keys_follow_rename() {
        let generated = generate(parse_quote! {
            enum Shape {
                BigCircle,
            }
        });
        assert!(generated.key_enums.contains("BigCircle => \"big_circle\""));
        assert!(generated.decode.contains("ShapeCodingKeys :: BigCircle => Self :: BigCircle"));
    }
}
