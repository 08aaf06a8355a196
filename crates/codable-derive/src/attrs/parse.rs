//! Attribute parsing entry points.

use proc_macro2::{Span, TokenStream};
use syn::parse::{ParseStream, Parser};
use syn::spanned::Spanned;
use syn::{Attribute, Expr, Ident, LitStr, Meta, Token};

use super::container::ContainerAttrs;
use super::field::{DefaultSpec, FieldAttrs, KeyAttr};
use super::types::{KeyFamily, MacroFamily, RenameStrategy};
use crate::hooks::HookStage;
use crate::options::{ContainerOptions, FieldOptions};

const SUPER_ATTR: &str = "coding_super";
const HOOK_ATTR: &str = "hook";

/// Parse the arguments of the container macro being expanded.
pub fn parse_container_args(args: TokenStream, result: &mut ContainerAttrs) -> syn::Result<()> {
    if args.is_empty() {
        return Ok(());
    }
    syn::meta::parser(|meta| parse_container_meta(&meta, result)).parse2(args)
}

/// Parse a stacked container macro attribute such as a trailing `#[encodable(..)]`.
pub fn parse_container_attr(attr: &Attribute, result: &mut ContainerAttrs) -> syn::Result<()> {
    match &attr.meta {
        Meta::Path(_) => Ok(()),
        Meta::List(_) => attr.parse_nested_meta(|meta| parse_container_meta(&meta, result)),
        Meta::NameValue(value) => Err(syn::Error::new_spanned(
            value,
            "container macros take a parenthesized argument list",
        )),
    }
}

fn parse_container_meta(
    meta: &syn::meta::ParseNestedMeta,
    result: &mut ContainerAttrs,
) -> syn::Result<()> {
    let ident = meta.path.get_ident().map(|i| i.to_string());

    match ident.as_deref() {
        Some("skip_super_coding") => result.options |= ContainerOptions::SKIP_SUPER_CODING,
        Some("skip_protocol_conformance") => {
            result.options |= ContainerOptions::SKIP_PROTOCOL_CONFORMANCE
        }
        Some("hooks") => result.options |= ContainerOptions::HOOKS,
        Some("rename_all") => {
            let value: LitStr = meta.value()?.parse()?;
            let strategy = RenameStrategy::parse(&value.value()).ok_or_else(|| {
                syn::Error::new_spanned(
                    &value,
                    "invalid rename_all value, expected one of: kebab-case, snake_case, SCREAMING_SNAKE_CASE, camelCase, PascalCase, lowercase, UPPERCASE, none",
                )
            })?;
            if result.rename_all_span.is_some() && result.rename_all != strategy {
                return Err(syn::Error::new_spanned(
                    &value,
                    "conflicting rename_all values on stacked container macros",
                ));
            }
            result.rename_all = strategy;
            result.rename_all_span = Some(value.span());
        }
        _ => {
            return Err(meta.error(
                "unknown container option, expected one of: skip_super_coding, skip_protocol_conformance, hooks, rename_all",
            ));
        }
    }
    Ok(())
}

/// The container macro family named by `attr`, if it is one.
pub fn container_family(attr: &Attribute) -> Option<MacroFamily> {
    MacroFamily::from_path(attr.path())
}

/// Parse every key and supertype attribute on a field or enum case.
pub fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut result = FieldAttrs::default();
    let mut errors: Option<syn::Error> = None;

    for attr in attrs {
        if attr.path().is_ident(SUPER_ATTR) {
            if let Err(err) = attr.meta.require_path_only() {
                push_error(&mut errors, err);
            }
            result.super_span = Some(attr.span());
            continue;
        }
        let Some(family) = KeyFamily::from_path(attr.path()) else {
            continue;
        };
        match parse_key_attr(attr, family) {
            Ok(key) => result.keys.push(key),
            Err(err) => push_error(&mut errors, err),
        }
    }

    match errors {
        Some(err) => Err(err),
        None => Ok(result),
    }
}

fn push_error(errors: &mut Option<syn::Error>, err: syn::Error) {
    match errors {
        Some(existing) => existing.combine(err),
        None => *errors = Some(err),
    }
}

fn parse_key_attr(attr: &Attribute, family: KeyFamily) -> syn::Result<KeyAttr> {
    let span = attr.span();
    match &attr.meta {
        Meta::Path(_) => Ok(KeyAttr::new(family, span)),
        Meta::List(_) => attr.parse_args_with(|input: ParseStream| parse_key_args(input, family, span)),
        Meta::NameValue(value) => Err(syn::Error::new_spanned(
            value,
            format!(
                "use #[{}(\"key\")] rather than #[{} = ..]",
                family.attr_name(),
                family.attr_name()
            ),
        )),
    }
}

/// `"a.b.c", default = expr, transformer = expr, lossy, ...`
///
/// The key may also be spelled `key = "a.b.c"`.
fn parse_key_args(input: ParseStream, family: KeyFamily, span: Span) -> syn::Result<KeyAttr> {
    let mut attr = KeyAttr::new(family, span);
    if input.peek(LitStr) {
        attr.key = Some(input.parse()?);
        if input.is_empty() {
            return Ok(attr);
        }
        input.parse::<Token![,]>()?;
    }
    let rest: TokenStream = input.parse()?;
    if !rest.is_empty() {
        syn::meta::parser(|meta| parse_key_meta(&meta, &mut attr)).parse2(rest)?;
    }
    Ok(attr)
}

fn parse_key_meta(meta: &syn::meta::ParseNestedMeta, attr: &mut KeyAttr) -> syn::Result<()> {
    let ident = meta.path.get_ident().map(|i| i.to_string());

    match ident.as_deref() {
        Some("key") => {
            if attr.key.is_some() {
                return Err(meta.error("key is already set"));
            }
            attr.key = Some(meta.value()?.parse()?);
        }
        Some("default") => {
            if attr.default.is_some() {
                return Err(meta.error("default is already set"));
            }
            attr.default = if meta.input.peek(Token![=]) {
                let value: Expr = meta.value()?.parse()?;
                Some(DefaultSpec::Expr(value))
            } else {
                Some(DefaultSpec::Trait)
            };
        }
        Some("transformer") => {
            if attr.transformer.is_some() {
                return Err(meta.error("transformer is already set"));
            }
            let value: Expr = meta.value()?.parse()?;
            attr.transformer = Some(value);
        }
        Some(name) => match FieldOptions::parse(name) {
            Some(option) => attr.options |= option,
            None => {
                return Err(meta.error(format!(
                    "unknown {} option `{name}`",
                    attr.family.attr_name()
                )))
            }
        },
        None => return Err(meta.error("expected an option name")),
    }
    Ok(())
}

/// Stage named by `#[hook(stage)]`, or `None` when `attr` is not a hook marker.
pub fn parse_hook_attr(attr: &Attribute) -> Option<syn::Result<HookStage>> {
    if !attr.path().is_ident(HOOK_ATTR) {
        return None;
    }
    Some(attr.parse_args::<Ident>().and_then(|stage| {
        HookStage::parse(&stage.to_string()).ok_or_else(|| {
            syn::Error::new_spanned(
                &stage,
                "unknown hook stage, expected one of: pre_decode, post_decode, pre_encode, post_encode",
            )
        })
    }))
}

/// True for attributes consumed by the container macros on fields and cases.
pub fn is_field_helper(attr: &Attribute) -> bool {
    attr.path().is_ident(SUPER_ATTR) || KeyFamily::from_path(attr.path()).is_some()
}

pub fn is_hook_helper(attr: &Attribute) -> bool {
    attr.path().is_ident(HOOK_ATTR)
}

pub fn strip_field_helpers(attrs: &mut Vec<Attribute>) {
    attrs.retain(|attr| !is_field_helper(attr));
}
