//! Property model: one record per coded field or enum case.

use proc_macro2::Span;
use syn::{parse_quote, Expr, Ident, LitStr, Type, Visibility};

use crate::attrs::{
    option_inner, parse_field_attrs, Direction, FieldAttrs, KeyFamily, RenameStrategy, TypeShape,
};
use crate::decl::{CasePayload, Declaration, StoredMember};
use crate::diagnostics::Diagnostics;
use crate::options::{DecodeStrategy, EncodeStrategy, FieldOptions};
use crate::validate;

/// A custom wire key, split on `.` into nested segments.
#[derive(Debug, Clone)]
pub struct KeyPath {
    pub segments: Vec<String>,
    pub span: Span,
}

impl KeyPath {
    pub fn parse(lit: &LitStr) -> syn::Result<Self> {
        let value = lit.value();
        let segments: Vec<String> = value.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(syn::Error::new_spanned(
                lit,
                format!("invalid key \"{value}\": empty path segment"),
            ));
        }
        Ok(Self {
            segments,
            span: lit.span(),
        })
    }

    pub fn is_dotted(&self) -> bool {
        self.segments.len() > 1
    }

    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }
}

/// What decode produces when a value is absent.
#[derive(Debug, Clone, PartialEq)]
pub enum Fallback {
    /// Absence is an error.
    Required,
    /// Optional field, absent becomes `None`.
    None,
    Default(Expr),
}

#[derive(Debug, Clone)]
pub struct Property {
    pub name: Ident,
    pub ty: Type,
    pub shape: TypeShape,
    pub is_optional: bool,
    pub default: Option<Expr>,
    pub decode_key: Option<KeyPath>,
    pub encode_key: Option<KeyPath>,
    pub options: FieldOptions,
    pub transformer: Option<Expr>,
    /// Key attribute families attached, sorted and deduplicated.
    pub provenance: Vec<KeyFamily>,
    pub vis: Visibility,
    pub span: Span,
}

impl Property {
    pub fn key(&self, direction: Direction) -> Option<&KeyPath> {
        match direction {
            Direction::Decode => self.decode_key.as_ref(),
            Direction::Encode => self.encode_key.as_ref(),
        }
    }

    /// Wire path for one direction: the custom key's segments, else the
    /// renamed field name.
    pub fn path(&self, direction: Direction, rename: RenameStrategy) -> Vec<String> {
        match self.key(direction) {
            Some(key) => key.segments.clone(),
            None => vec![rename.apply(&self.name.to_string())],
        }
    }

    /// The type decode produces before wrapping: `T` for `Option<T>`.
    pub fn value_type(&self) -> &Type {
        if self.is_optional {
            option_inner(&self.ty).unwrap_or(&self.ty)
        } else {
            &self.ty
        }
    }

    pub fn fallback(&self) -> Fallback {
        match (&self.default, self.is_optional) {
            (Some(default), _) => Fallback::Default(default.clone()),
            (None, true) => Fallback::None,
            (None, false) => Fallback::Required,
        }
    }

    pub fn has_fallback(&self) -> bool {
        self.default.is_some() || self.is_optional
    }

    /// `use_default_on_failure` with something to fall back to.
    pub fn is_lenient(&self) -> bool {
        self.options.contains(FieldOptions::USE_DEFAULT_ON_FAILURE) && self.has_fallback()
    }

    pub fn is_ignored(&self) -> bool {
        self.options.is_ignored()
    }

    pub fn decode_strategy(&self) -> Option<DecodeStrategy> {
        self.options
            .decode_strategy(self.transformer.is_some(), self.shape.is_collection())
    }

    pub fn encode_strategy(&self) -> Option<EncodeStrategy> {
        self.options.encode_strategy(self.transformer.is_some())
    }
}

/// An enum case and what it carries.
#[derive(Debug, Clone)]
pub struct CaseSpec {
    pub property: Property,
    pub payload: CasePayloadSpec,
}

#[derive(Debug, Clone)]
pub enum CasePayloadSpec {
    Unit,
    Single(Type),
    Fields(Vec<Property>),
    /// Multi-field tuple case; only allowed when ignored.
    Tuple,
}

/// Extracts the coded properties of a struct-like declaration.
pub fn extract_properties(decl: &Declaration, diag: &mut Diagnostics) -> Vec<Property> {
    extract_stored(decl.stored(), diag)
}

pub fn extract_stored<'a>(
    members: impl IntoIterator<Item = &'a StoredMember>,
    diag: &mut Diagnostics,
) -> Vec<Property> {
    let mut properties = Vec::new();

    for member in members {
        let attrs = match parse_field_attrs(&member.attrs) {
            Ok(attrs) => attrs,
            Err(err) => {
                diag.push(err);
                continue;
            }
        };

        if member.is_static {
            if !attrs.is_empty() {
                diag.error(
                    member.span,
                    "key attributes cannot be applied to static members",
                );
            }
            continue;
        }
        if member.is_computed {
            if !attrs.is_empty() {
                diag.error(
                    member.span,
                    "key attributes need a stored field; this member has no stored backing",
                );
            }
            continue;
        }
        if attrs.is_super() {
            diag.error(member.span, "#[coding_super] applies to struct fields only");
            continue;
        }
        if !validate::key_attributes(&attrs, diag) {
            continue;
        }

        let decode_key = key_path(&attrs, Direction::Decode, diag);
        let encode_key = key_path(&attrs, Direction::Encode, diag);
        if member.bindings.len() > 1
            && [&decode_key, &encode_key]
                .iter()
                .any(|key| key.as_ref().is_some_and(KeyPath::is_dotted))
        {
            diag.error(
                member.span,
                "ambiguous dotted key: a declaration with several bindings cannot share a dotted key",
            );
            continue;
        }

        // A trailing binding's type also applies to untyped bindings before it.
        let mut trailing: Option<&Type> = None;
        let mut typed = Vec::with_capacity(member.bindings.len());
        for binding in member.bindings.iter().rev() {
            if let Some(ty) = &binding.ty {
                trailing = Some(ty);
            }
            match trailing {
                Some(ty) => typed.push((binding, ty.clone())),
                None => diag.error(
                    binding.ident.span(),
                    format!("missing type annotation for `{}`", binding.ident),
                ),
            }
        }
        typed.reverse();

        let mut provenance: Vec<KeyFamily> = attrs.keys.iter().map(|key| key.family).collect();
        provenance.sort();
        provenance.dedup();

        for (binding, ty) in typed {
            let shape = TypeShape::of(&ty);
            properties.push(Property {
                name: binding.ident.clone(),
                is_optional: shape.is_optional(),
                shape,
                ty,
                default: attrs
                    .default_spec()
                    .map(|default| default.to_expr())
                    .or_else(|| binding.default.clone()),
                decode_key: decode_key.clone(),
                encode_key: encode_key.clone(),
                options: attrs.options(),
                transformer: attrs.transformer().cloned(),
                provenance: provenance.clone(),
                vis: member.vis.clone(),
                span: binding.ident.span(),
            });
        }
    }

    properties
}

fn key_path(attrs: &FieldAttrs, direction: Direction, diag: &mut Diagnostics) -> Option<KeyPath> {
    let lit = attrs.key_for(direction)?.key.as_ref()?;
    match KeyPath::parse(lit) {
        Ok(path) => Some(path),
        Err(err) => {
            diag.push(err);
            None
        }
    }
}

/// Extracts one property per enum case, plus its payload.
pub fn extract_cases(decl: &Declaration, diag: &mut Diagnostics) -> Vec<CaseSpec> {
    let mut cases = Vec::new();

    for case in decl.cases() {
        let attrs = match parse_field_attrs(&case.attrs) {
            Ok(attrs) => attrs,
            Err(err) => {
                diag.push(err);
                continue;
            }
        };
        if let Some(span) = attrs.super_span {
            diag.error(span, "#[coding_super] applies to struct fields only");
        }
        if !validate::key_attributes(&attrs, diag) {
            continue;
        }
        let options = attrs.options();
        let unsupported = options - (FieldOptions::IGNORED | FieldOptions::GENERATE_CUSTOM_KEY);
        if !unsupported.is_empty() || attrs.default_spec().is_some() || attrs.transformer().is_some() {
            diag.error(
                case.span,
                "enum cases accept only a key, `ignored` and `generate_custom_key`",
            );
            continue;
        }

        let decode_key = key_path(&attrs, Direction::Decode, diag);
        let encode_key = key_path(&attrs, Direction::Encode, diag);
        if let Some(key) = [&decode_key, &encode_key]
            .into_iter()
            .flatten()
            .find(|key| key.is_dotted())
        {
            diag.error(key.span, "enum case keys cannot be dotted");
            continue;
        }

        let payload = match &case.payload {
            CasePayload::Unit => CasePayloadSpec::Unit,
            CasePayload::Single(ty) => CasePayloadSpec::Single(ty.clone()),
            CasePayload::Fields(fields) => CasePayloadSpec::Fields(extract_stored(fields, diag)),
            CasePayload::Unsupported { arity } => {
                if !options.is_ignored() {
                    diag.error(
                        case.span,
                        format!(
                            "tuple case `{}` has {arity} fields; use named fields or a single value",
                            case.ident
                        ),
                    );
                }
                CasePayloadSpec::Tuple
            }
        };

        let mut provenance: Vec<KeyFamily> = attrs.keys.iter().map(|key| key.family).collect();
        provenance.sort();
        provenance.dedup();

        cases.push(CaseSpec {
            property: Property {
                name: case.ident.clone(),
                ty: parse_quote!(()),
                shape: TypeShape::Named,
                is_optional: false,
                default: None,
                decode_key,
                encode_key,
                options,
                transformer: None,
                provenance,
                vis: decl.vis.clone(),
                span: case.ident.span(),
            },
            payload,
        });
    }

    cases
}
