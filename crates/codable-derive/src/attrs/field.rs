//! Field-level attribute definitions.

use proc_macro2::Span;
use syn::{parse_quote, Expr, LitStr};

use super::types::{Direction, KeyFamily};
use crate::options::FieldOptions;

/// Default value of a field, from `default` or `default = expr`.
#[derive(Debug, Clone)]
pub enum DefaultSpec {
    /// Bare `default`: `Default::default()`.
    Trait,
    Expr(Expr),
}

impl DefaultSpec {
    pub fn to_expr(&self) -> Expr {
        match self {
            DefaultSpec::Trait => parse_quote!(::core::default::Default::default()),
            DefaultSpec::Expr(expr) => expr.clone(),
        }
    }
}

/// One `#[coding_key(..)]`, `#[decoding_key(..)]` or `#[encoding_key(..)]`.
#[derive(Debug, Clone)]
pub struct KeyAttr {
    pub family: KeyFamily,
    /// Custom wire key, possibly dotted.
    pub key: Option<LitStr>,
    pub default: Option<DefaultSpec>,
    pub transformer: Option<Expr>,
    pub options: FieldOptions,
    pub span: Span,
}

impl KeyAttr {
    pub fn new(family: KeyFamily, span: Span) -> Self {
        Self {
            family,
            key: None,
            default: None,
            transformer: None,
            options: FieldOptions::empty(),
            span,
        }
    }
}

/// Helper attributes found on one field or enum case.
#[derive(Debug, Clone, Default)]
pub struct FieldAttrs {
    pub keys: Vec<KeyAttr>,
    /// Span of `#[coding_super]`, when present.
    pub super_span: Option<Span>,
}

impl FieldAttrs {
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.super_span.is_none()
    }

    pub fn is_super(&self) -> bool {
        self.super_span.is_some()
    }

    /// The attribute that sets the key for one direction: the direction's own
    /// family, else `coding_key`.
    pub fn key_for(&self, direction: Direction) -> Option<&KeyAttr> {
        self.keys
            .iter()
            .find(|attr| attr.family != KeyFamily::Coding && attr.family.applies_to(direction))
            .or_else(|| self.keys.iter().find(|attr| attr.family == KeyFamily::Coding))
    }

    pub fn options(&self) -> FieldOptions {
        self.keys
            .iter()
            .fold(FieldOptions::empty(), |acc, attr| acc | attr.options)
    }

    pub fn default_spec(&self) -> Option<&DefaultSpec> {
        self.keys.iter().find_map(|attr| attr.default.as_ref())
    }

    pub fn transformer(&self) -> Option<&Expr> {
        self.keys.iter().find_map(|attr| attr.transformer.as_ref())
    }
}
