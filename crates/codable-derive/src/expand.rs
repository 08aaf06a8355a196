//! Expansion of the container macros and of `#[coding_hooks]`.

use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote};
use syn::spanned::Spanned;
use syn::{Attribute, Fields, Item, ItemEnum, ItemImpl, ItemStruct};

use crate::attrs::{
    container_family, is_hook_helper, parse_container_args, parse_container_attr,
    strip_field_helpers, Conformance, ContainerAttrs, Direction, Directions, MacroFamily,
    RenameStrategy,
};
use crate::decl::Declaration;
use crate::decode_gen::{generate_decode_impl, with_bound, SuperCoding};
use crate::diagnostics::Diagnostics;
use crate::encode_gen::generate_encode_impl;
use crate::enum_gen::{generate_enum_decode_impl, generate_enum_encode_impl, CaseCoding};
use crate::hooks;
use crate::key_trees::KeyTrees;
use crate::options::{ContainerOptions, FieldOptions};
use crate::property::{extract_cases, extract_properties, CasePayloadSpec, Property};
use crate::validate;

/// Expands `#[codable]`, `#[decodable]` or `#[encodable]` on a struct or enum.
pub fn expand_container(family: MacroFamily, args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item: Item = match syn::parse2(input.clone()) {
        Ok(item) => item,
        Err(err) => {
            let error = err.to_compile_error();
            return quote!(#input #error);
        }
    };

    let mut diag = Diagnostics::new();
    let mut container = ContainerAttrs::default();
    container.conformances.push(Conformance {
        family,
        span: Span::call_site(),
    });
    if let Err(err) = parse_container_args(args, &mut container) {
        diag.push(err);
    }

    let generated = match &mut item {
        Item::Struct(item) => {
            merge_stacked(&mut item.attrs, &mut container, &mut diag);
            let original = item.clone();
            strip_struct(item);
            expand_struct(&original, &container, &mut diag)
        }
        Item::Enum(item) => {
            merge_stacked(&mut item.attrs, &mut container, &mut diag);
            let original = item.clone();
            strip_enum(item);
            expand_enum(&original, &container, &mut diag)
        }
        other => {
            diag.error_spanned(
                &other,
                format!("#[{}] applies to structs and enums", family.name()),
            );
            TokenStream::new()
        }
    };

    finish(quote!(#item), generated, &diag)
}

/// Expands `#[coding_hooks]` on an inherent impl block.
pub fn expand_hooks(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item: ItemImpl = match syn::parse2(input.clone()) {
        Ok(item) => item,
        Err(err) => {
            let error = err.to_compile_error();
            return quote!(#input #error);
        }
    };

    let mut diag = Diagnostics::new();
    if !args.is_empty() {
        diag.error_spanned(&args, "#[coding_hooks] takes no arguments");
    }

    let mut generated = TokenStream::new();
    if let Some((_, path, _)) = &item.trait_ {
        diag.error_spanned(
            path,
            "#[coding_hooks] applies to inherent impl blocks, not trait impls",
        );
    } else {
        match Declaration::from_impl(&item) {
            Ok(decl) => {
                let hooks = hooks::detect(&decl, &mut diag);
                // Only reported: key attributes on associated consts.
                extract_properties(&decl, &mut diag);
                if !diag.has_errors() {
                    generated = hooks::to_impl(&item, &hooks);
                }
            }
            Err(err) => diag.push(err),
        }
    }

    for impl_item in &mut item.items {
        match impl_item {
            syn::ImplItem::Fn(method) => method.attrs.retain(|attr| !is_hook_helper(attr)),
            syn::ImplItem::Const(constant) => strip_field_helpers(&mut constant.attrs),
            _ => {}
        }
    }

    finish(quote!(#item), generated, &diag)
}

fn finish(item: TokenStream, generated: TokenStream, diag: &Diagnostics) -> TokenStream {
    let warnings = diag.warning_tokens();
    if diag.has_errors() {
        let errors = diag.error_tokens();
        return quote! {
            #item
            #errors
            #warnings
        };
    }
    quote! {
        #item
        #generated
        #warnings
    }
}

/// Folds later container macros on the same item into this expansion and
/// removes them so they do not expand again.
fn merge_stacked(attrs: &mut Vec<Attribute>, container: &mut ContainerAttrs, diag: &mut Diagnostics) {
    attrs.retain(|attr| {
        let Some(family) = container_family(attr) else {
            return true;
        };
        container.conformances.push(Conformance {
            family,
            span: attr.span(),
        });
        if let Err(err) = parse_container_attr(attr, container) {
            diag.push(err);
        }
        false
    });
}

fn strip_struct(item: &mut ItemStruct) {
    strip_fields(&mut item.fields);
}

fn strip_enum(item: &mut ItemEnum) {
    for variant in &mut item.variants {
        strip_field_helpers(&mut variant.attrs);
        strip_fields(&mut variant.fields);
    }
}

fn strip_fields(fields: &mut Fields) {
    for field in fields.iter_mut() {
        strip_field_helpers(&mut field.attrs);
    }
}

fn expand_struct(item: &ItemStruct, container: &ContainerAttrs, diag: &mut Diagnostics) -> TokenStream {
    let decl = match Declaration::from_struct(item) {
        Ok(decl) => decl,
        Err(err) => {
            diag.push(err);
            return TokenStream::new();
        }
    };
    let directions = container.directions();

    validate::conformances(container, diag);
    validate::supertype(&decl, container, diag);
    let properties = extract_properties(&decl, diag);
    validate::field_options(&properties, diag);
    validate::family_compatibility(&properties, directions, diag);

    let keys = KeyTrees::build(
        &decl.ident.to_string(),
        &properties,
        container.rename_all,
        directions,
    );
    report_conflicts(&keys, &properties, diag);
    if diag.has_errors() {
        return TokenStream::new();
    }

    let supertype = decl
        .inheritance
        .first()
        .and_then(|inherited| {
            inherited.storage.as_ref().map(|field| SuperCoding {
                field,
                ty: &inherited.ty,
                skip: container.has(ContainerOptions::SKIP_SUPER_CODING),
            })
        });

    let ident = &decl.ident;
    let key_enums = keys.key_enums(&decl.vis);
    let accessors = custom_key_accessors(
        &decl,
        properties
            .iter()
            .map(|property| (property, property.name.to_string(), &property.vis)),
        container.rename_all,
    );
    let decode_impl = if directions.decode {
        generate_decode_impl(ident, &decl.generics, &keys.decode, &properties, supertype.as_ref())
    } else {
        TokenStream::new()
    };
    let encode_impl = if directions.encode {
        generate_encode_impl(ident, &decl.generics, &keys.encode, &properties, supertype.as_ref())
    } else {
        TokenStream::new()
    };
    let conformance = conformance_impls(&decl, container, directions);

    quote! {
        #key_enums
        #accessors
        #decode_impl
        #encode_impl
        #conformance
    }
}

fn expand_enum(item: &ItemEnum, container: &ContainerAttrs, diag: &mut Diagnostics) -> TokenStream {
    let decl = match Declaration::from_enum(item) {
        Ok(decl) => decl,
        Err(err) => {
            diag.push(err);
            return TokenStream::new();
        }
    };
    let directions = container.directions();
    let ident = &decl.ident;

    validate::conformances(container, diag);
    validate::supertype(&decl, container, diag);
    let specs = extract_cases(&decl, diag);
    let case_properties: Vec<Property> = specs.iter().map(|spec| spec.property.clone()).collect();
    validate::family_compatibility(&case_properties, directions, diag);

    let case_keys = KeyTrees::build(
        &ident.to_string(),
        &case_properties,
        container.rename_all,
        directions,
    );
    report_conflicts(&case_keys, &case_properties, diag);

    let mut cases = Vec::with_capacity(specs.len());
    for (index, spec) in specs.iter().enumerate() {
        let payload_keys = match &spec.payload {
            CasePayloadSpec::Fields(fields) if !spec.property.is_ignored() => {
                validate::field_options(fields, diag);
                validate::family_compatibility(fields, directions, diag);
                let keys = KeyTrees::build(
                    &format!("{ident}_{}", spec.property.name),
                    fields,
                    RenameStrategy::None,
                    directions,
                );
                report_conflicts(&keys, fields, diag);
                Some(keys)
            }
            _ => None,
        };
        cases.push(CaseCoding {
            index,
            spec,
            payload_keys,
        });
    }
    if diag.has_errors() {
        return TokenStream::new();
    }

    let mut key_enums = case_keys.key_enums(&decl.vis);
    for case in &cases {
        if let Some(keys) = &case.payload_keys {
            key_enums.extend(keys.key_enums(&decl.vis));
        }
    }

    let vis = &decl.vis;
    let case_accessors = case_properties
        .iter()
        .map(|property| (property, property.name.to_string(), vis));
    let field_accessors = specs.iter().flat_map(|spec| {
        let case = RenameStrategy::SnakeCase.apply(&spec.property.name.to_string());
        let fields: &[Property] = match &spec.payload {
            CasePayloadSpec::Fields(fields) => fields,
            _ => &[],
        };
        fields
            .iter()
            .map(move |field| (field, format!("{case}_{}", field.name), vis))
    });
    let accessors = custom_key_accessors(
        &decl,
        case_accessors.chain(field_accessors),
        container.rename_all,
    );

    let decode_impl = if directions.decode {
        generate_enum_decode_impl(ident, &decl.generics, &case_keys, &cases)
    } else {
        TokenStream::new()
    };
    let encode_impl = if directions.encode {
        generate_enum_encode_impl(ident, &decl.generics, &case_keys, &cases)
    } else {
        TokenStream::new()
    };
    let conformance = conformance_impls(&decl, container, directions);

    quote! {
        #key_enums
        #accessors
        #decode_impl
        #encode_impl
        #conformance
    }
}

fn report_conflicts(keys: &KeyTrees, properties: &[Property], diag: &mut Diagnostics) {
    for conflict in keys.conflicts() {
        let names: Vec<String> = conflict
            .properties
            .iter()
            .map(|&index| format!("`{}`", properties[index].name))
            .collect();
        let span = conflict
            .properties
            .last()
            .map(|&index| properties[index].span)
            .unwrap_or_else(Span::call_site);
        diag.error(
            span,
            format!(
                "key conflict: \"{}\" is claimed by {}",
                conflict.key,
                names.join(", ")
            ),
        );
    }
}

/// `const fn <name>_coding_key()` for every property asking for one.
fn custom_key_accessors<'a>(
    decl: &Declaration,
    properties: impl Iterator<Item = (&'a Property, String, &'a syn::Visibility)>,
    rename: RenameStrategy,
) -> TokenStream {
    let accessors: Vec<TokenStream> = properties
        .filter(|(property, _, _)| property.options.contains(FieldOptions::GENERATE_CUSTOM_KEY))
        .map(|(property, name, vis)| {
            let key = property
                .key(Direction::Decode)
                .or_else(|| property.key(Direction::Encode))
                .map(|key| key.dotted())
                .unwrap_or_else(|| rename.apply(&property.name.to_string()));
            let method = format_ident!(
                "{}_coding_key",
                RenameStrategy::SnakeCase.apply(&name)
            );
            quote! {
                #vis const fn #method() -> &'static str {
                    #key
                }
            }
        })
        .collect();
    if accessors.is_empty() {
        return TokenStream::new();
    }

    let ident = &decl.ident;
    let (impl_generics, ty_generics, where_clause) = decl.generics.split_for_impl();
    quote! {
        impl #impl_generics #ident #ty_generics #where_clause {
            #(#accessors)*
        }
    }
}

/// The empty `CodingHooks` impl (plus the reserved hook names) when hooks come
/// from nowhere else, and the `Codable` marker when both directions are
/// generated.
fn conformance_impls(decl: &Declaration, container: &ContainerAttrs, directions: Directions) -> TokenStream {
    let ident = &decl.ident;
    let mut tokens = TokenStream::new();

    if !container.has(ContainerOptions::HOOKS) {
        let (impl_generics, ty_generics, where_clause) = decl.generics.split_for_impl();
        tokens.extend(quote! {
            impl #impl_generics ::codable::CodingHooks for #ident #ty_generics #where_clause {}
        });
        tokens.extend(hooks::reserved_names(ident, &decl.generics));
    }

    if directions.both() && !container.has(ContainerOptions::SKIP_PROTOCOL_CONFORMANCE) {
        let generics = with_bound(
            &with_bound(&decl.generics, quote!(::codable::Decode)),
            quote!(::codable::Encode),
        );
        let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
        tokens.extend(quote! {
            impl #impl_generics ::codable::Codable for #ident #ty_generics #where_clause {}
        });
    }

    tokens
}

#[cfg(test)]
mod tests {
    use quote::quote;
    use syn::Ident;

    use super::*;

    fn accessor_name(name: &str) -> Ident {
        format_ident!("{}_coding_key", RenameStrategy::SnakeCase.apply(name))
    }

    fn expand(family: MacroFamily, args: TokenStream, item: TokenStream) -> String {
        expand_container(family, args, item).to_string()
    }

    #[test]
    fn struct_expansion_emits_keys_impls_and_marker() {
        let code = expand(
            MacroFamily::Codable,
            quote!(),
            quote! {
                pub struct User {
                    #[coding_key("profile.name")]
                    name: String,
                    age: u8,
                }
            },
        );
        assert!(code.contains("pub struct User { name : String , age : u8 , }"));
        assert!(!code.contains("coding_key (\"profile.name\")"));
        assert!(code.contains("pub enum UserCodingKeys"));
        assert!(code.contains("pub enum UserCodingKeys_profile"));
        assert!(code.contains(":: codable :: Decode for User"));
        assert!(code.contains(":: codable :: Encode for User"));
        assert!(code.contains(":: codable :: CodingHooks for User { }"));
        assert!(code.contains("fn did_decode () { }"));
        assert!(code.contains(":: codable :: Codable for User { }"));
    }

    #[test]
    fn stacked_macros_merge_into_one_expansion() {
        let code = expand(
            MacroFamily::Decodable,
            quote!(rename_all = "camelCase"),
            quote! {
                #[encodable]
                struct Settings {
                    max_retries: u8,
                }
            },
        );
        assert!(!code.contains("# [encodable]"));
        assert!(code.contains("\"maxRetries\""));
        assert!(code.contains(":: codable :: Codable for Settings"));
        assert!(!code.contains("deprecated"));
    }

    #[test]
    fn redundant_stacked_macro_warns() {
        let code = expand(
            MacroFamily::Codable,
            quote!(),
            quote! {
                #[decodable]
                struct Settings {
                    port: u16,
                }
            },
        );
        assert!(code.contains("deprecated"));
        assert!(code.contains("is redundant"));
    }

    #[test]
    fn decode_only_container_has_no_encode_or_marker() {
        let code = expand(
            MacroFamily::Decodable,
            quote!(),
            quote! {
                struct Request {
                    id: u64,
                }
            },
        );
        assert!(code.contains(":: codable :: Decode for Request"));
        assert!(!code.contains(":: codable :: Encode for Request"));
        assert!(!code.contains(":: codable :: Codable for Request"));
    }

    #[test]
    fn key_conflicts_name_the_properties() {
        let code = expand(
            MacroFamily::Codable,
            quote!(),
            quote! {
                struct Clash {
                    #[coding_key("value")]
                    first: u8,
                    #[coding_key("value")]
                    second: u8,
                }
            },
        );
        assert!(code.contains("compile_error"));
        assert!(code.contains("key conflict: \\\"value\\\" is claimed by `first`, `second`"));
        assert!(!code.contains(":: codable :: Decode for Clash"));
    }

    #[test]
    fn hooks_option_suppresses_the_empty_impl() {
        let code = expand(
            MacroFamily::Codable,
            quote!(hooks),
            quote! {
                struct Account {
                    id: u64,
                }
            },
        );
        assert!(!code.contains("CodingHooks for Account { }"));
        assert!(!code.contains("fn did_decode"));
        assert!(code.contains("< Self as :: codable :: CodingHooks > :: pre_decode (decoder) ?"));
    }

    #[test]
    fn supertype_chains_unless_skipped() {
        let item = quote! {
            struct Admin {
                #[coding_super]
                base: User,
                level: u8,
            }
        };
        let code = expand(MacroFamily::Codable, quote!(), item.clone());
        assert!(code.contains("< User as :: codable :: Decode > :: decode (decoder) ?"));
        assert!(code.contains("< User as :: codable :: Encode > :: encode (& self . base , encoder) ?"));

        let code = expand(MacroFamily::Codable, quote!(skip_super_coding), item);
        assert!(!code.contains("< User as :: codable :: Decode >"));
        assert!(code.contains("let __super : User = :: core :: default :: Default :: default ()"));
    }

    #[test]
    fn custom_key_accessor_uses_the_key() {
        let code = expand(
            MacroFamily::Codable,
            quote!(),
            quote! {
                struct User {
                    #[coding_key("profile.display_name", generate_custom_key)]
                    pub name: String,
                }
            },
        );
        let method = accessor_name("name").to_string();
        assert!(code.contains(&format!("pub const fn {method} () -> & 'static str {{ \"profile.display_name\" }}")));
    }

    #[test]
    fn enums_expand_case_keys() {
        let code = expand(
            MacroFamily::Codable,
            quote!(rename_all = "snake_case"),
            quote! {
                enum Status {
                    Active,
                    #[coding_key("on_hold")]
                    Paused { reason: String },
                }
            },
        );
        assert!(code.contains("enum StatusCodingKeys"));
        // Separated so a sibling `StatusPaused` container keeps its own keys.
        assert!(code.contains("enum Status_PausedCodingKeys"));
        assert!(!code.contains("StatusPausedCodingKeys"));
        assert!(code.contains("\"on_hold\""));
        assert!(code.contains("\"active\""));
    }

    #[test]
    fn non_container_item_is_rejected() {
        let code = expand(MacroFamily::Codable, quote!(), quote!(fn helper() {}));
        assert!(code.contains("compile_error"));
        assert!(code.contains("fn helper"));
    }

    #[test]
    fn coding_hooks_strip_markers_and_generate_impl() {
        let code = expand_hooks(
            quote!(),
            quote! {
                impl Account {
                    #[hook(post_decode)]
                    fn normalize(&mut self) {}
                }
            },
        )
        .to_string();
        assert!(!code.contains("# [hook"));
        assert!(code.contains(":: codable :: CodingHooks for Account"));
    }

    #[test]
    fn coding_hooks_reject_trait_impls() {
        let code = expand_hooks(
            quote!(),
            quote! {
                impl Display for Account {}
            },
        )
        .to_string();
        assert!(code.contains("compile_error"));
    }
}
