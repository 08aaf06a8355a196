//! Read-only declaration model the engine works on.
//!
//! The `from_*` constructors lower `syn` items into this model; everything
//! downstream only sees members, their attributes, types, defaults and
//! modifiers.

use proc_macro2::Span;
use syn::spanned::Spanned;
use syn::{
    Attribute, Expr, Fields, FnArg, Generics, Ident, ImplItem, ItemEnum, ItemImpl, ItemStruct,
    Type, Visibility,
};

use crate::attrs::is_field_helper;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Plain aggregate.
    Value,
    /// Aggregate that extends a supertype through its inheritance clause.
    Reference,
    /// Tagged union.
    Union,
}

/// One entry of the inheritance clause.
#[derive(Debug, Clone)]
pub struct Inherited {
    pub ty: Type,
    /// The field holding the supertype's state.
    pub storage: Option<Ident>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub ident: Ident,
    pub ty: Option<Type>,
    pub default: Option<Expr>,
}

/// A stored member declaring one or more bindings.
#[derive(Debug, Clone)]
pub struct StoredMember {
    pub bindings: Vec<Binding>,
    pub attrs: Vec<Attribute>,
    pub vis: Visibility,
    /// Type-level member, not part of an instance.
    pub is_static: bool,
    /// Member without stored backing.
    pub is_computed: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum CasePayload {
    Unit,
    Single(Type),
    Fields(Vec<StoredMember>),
    Unsupported { arity: usize },
}

#[derive(Debug, Clone)]
pub struct CaseMember {
    pub ident: Ident,
    pub attrs: Vec<Attribute>,
    pub payload: CasePayload,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receiver {
    None,
    Ref,
    RefMut,
    Owned,
}

#[derive(Debug, Clone)]
pub struct MethodMember {
    pub ident: Ident,
    pub attrs: Vec<Attribute>,
    pub receiver: Receiver,
    /// Arguments besides the receiver.
    pub arguments: usize,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Member {
    Stored(StoredMember),
    Case(CaseMember),
    Method(MethodMember),
}

#[derive(Debug, Clone)]
pub struct Declaration {
    pub ident: Ident,
    pub vis: Visibility,
    pub generics: Generics,
    pub shape: Shape,
    pub inheritance: Vec<Inherited>,
    pub members: Vec<Member>,
    pub span: Span,
}

impl Declaration {
    pub fn from_struct(item: &ItemStruct) -> syn::Result<Self> {
        let mut members = Vec::new();
        let mut inheritance = Vec::new();

        match &item.fields {
            Fields::Named(named) => {
                for field in &named.named {
                    let Some(ident) = field.ident.clone() else {
                        continue;
                    };
                    if field.attrs.iter().any(|attr| attr.path().is_ident("coding_super")) {
                        inheritance.push(Inherited {
                            ty: field.ty.clone(),
                            storage: Some(ident),
                            span: field.span(),
                        });
                        if let Some(attr) = field
                            .attrs
                            .iter()
                            .find(|attr| is_field_helper(attr) && !attr.path().is_ident("coding_super"))
                        {
                            return Err(syn::Error::new_spanned(
                                attr,
                                "a #[coding_super] field cannot carry key attributes",
                            ));
                        }
                        continue;
                    }
                    members.push(Member::Stored(stored_field(field, ident)));
                }
            }
            Fields::Unnamed(unnamed) => {
                return Err(syn::Error::new_spanned(
                    unnamed,
                    "tuple structs have no field names to key; use named fields",
                ));
            }
            Fields::Unit => {}
        }

        Ok(Self {
            ident: item.ident.clone(),
            vis: item.vis.clone(),
            generics: item.generics.clone(),
            shape: if inheritance.is_empty() {
                Shape::Value
            } else {
                Shape::Reference
            },
            inheritance,
            members,
            span: item.ident.span(),
        })
    }

    pub fn from_enum(item: &ItemEnum) -> syn::Result<Self> {
        let mut members = Vec::new();
        for variant in &item.variants {
            let payload = match &variant.fields {
                Fields::Unit => CasePayload::Unit,
                Fields::Unnamed(unnamed) if unnamed.unnamed.len() == 1 => {
                    CasePayload::Single(unnamed.unnamed[0].ty.clone())
                }
                Fields::Unnamed(unnamed) => CasePayload::Unsupported {
                    arity: unnamed.unnamed.len(),
                },
                Fields::Named(named) => CasePayload::Fields(
                    named
                        .named
                        .iter()
                        .filter_map(|field| {
                            field
                                .ident
                                .clone()
                                .map(|ident| stored_field(field, ident))
                        })
                        .collect(),
                ),
            };
            members.push(Member::Case(CaseMember {
                ident: variant.ident.clone(),
                attrs: variant.attrs.clone(),
                payload,
                span: variant.span(),
            }));
        }

        Ok(Self {
            ident: item.ident.clone(),
            vis: item.vis.clone(),
            generics: item.generics.clone(),
            shape: Shape::Union,
            inheritance: Vec::new(),
            members,
            span: item.ident.span(),
        })
    }

    /// Lowers an inherent impl block: methods, and consts as static members.
    pub fn from_impl(item: &ItemImpl) -> syn::Result<Self> {
        let ident = match &*item.self_ty {
            Type::Path(path) => path.path.segments.last().map(|segment| segment.ident.clone()),
            _ => None,
        }
        .ok_or_else(|| syn::Error::new_spanned(&item.self_ty, "expected a named type"))?;

        let mut members = Vec::new();
        for impl_item in &item.items {
            match impl_item {
                ImplItem::Fn(method) => {
                    let receiver = match method.sig.receiver() {
                        None => Receiver::None,
                        Some(receiver) if receiver.reference.is_none() => Receiver::Owned,
                        Some(receiver) if receiver.mutability.is_some() => Receiver::RefMut,
                        Some(_) => Receiver::Ref,
                    };
                    let arguments = method
                        .sig
                        .inputs
                        .iter()
                        .filter(|input| matches!(input, FnArg::Typed(_)))
                        .count();
                    members.push(Member::Method(MethodMember {
                        ident: method.sig.ident.clone(),
                        attrs: method.attrs.clone(),
                        receiver,
                        arguments,
                        span: method.sig.ident.span(),
                    }));
                }
                ImplItem::Const(constant) => members.push(Member::Stored(StoredMember {
                    bindings: vec![Binding {
                        ident: constant.ident.clone(),
                        ty: Some(constant.ty.clone()),
                        default: Some(constant.expr.clone()),
                    }],
                    attrs: constant.attrs.clone(),
                    vis: constant.vis.clone(),
                    is_static: true,
                    is_computed: false,
                    span: constant.ident.span(),
                })),
                _ => {}
            }
        }

        Ok(Self {
            ident,
            vis: Visibility::Inherited,
            generics: item.generics.clone(),
            shape: Shape::Value,
            inheritance: Vec::new(),
            members,
            span: item.self_ty.span(),
        })
    }

    pub fn stored(&self) -> impl Iterator<Item = &StoredMember> {
        self.members.iter().filter_map(|member| match member {
            Member::Stored(stored) => Some(stored),
            _ => None,
        })
    }

    pub fn cases(&self) -> impl Iterator<Item = &CaseMember> {
        self.members.iter().filter_map(|member| match member {
            Member::Case(case) => Some(case),
            _ => None,
        })
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodMember> {
        self.members.iter().filter_map(|member| match member {
            Member::Method(method) => Some(method),
            _ => None,
        })
    }

    /// Whether the type appears to extend a supertype.
    ///
    /// Approximated by a non-empty inheritance clause; the first entry is
    /// taken as the supertype without checking what it is.
    pub fn has_supertype(&self) -> bool {
        self.shape == Shape::Reference
    }
}

fn stored_field(field: &syn::Field, ident: Ident) -> StoredMember {
    StoredMember {
        bindings: vec![Binding {
            ident,
            ty: Some(field.ty.clone()),
            default: None,
        }],
        attrs: field.attrs.clone(),
        vis: field.vis.clone(),
        is_static: false,
        is_computed: false,
        span: field.span(),
    }
}

#[cfg(test)]
mod tests {
    use syn::parse_quote;

    use super::*;

    #[test]
    fn super_field_moves_into_inheritance() {
        let item: ItemStruct = parse_quote! {
            struct Admin {
                #[coding_super]
                user: User,
                level: u8,
            }
        };
        let decl = Declaration::from_struct(&item).unwrap();
        assert_eq!(decl.shape, Shape::Reference);
        assert!(decl.has_supertype());
        assert_eq!(decl.inheritance[0].storage.as_ref().unwrap(), "user");
        assert_eq!(decl.stored().count(), 1);
    }

    #[test]
    fn enum_payloads() {
        let item: ItemEnum = parse_quote! {
            enum Shape {
                Empty,
                Circle(f64),
                Rect { w: f64, h: f64 },
                Pair(u8, u8),
            }
        };
        let decl = Declaration::from_enum(&item).unwrap();
        assert_eq!(decl.shape, Shape::Union);
        assert!(!decl.has_supertype());
        let payloads: Vec<_> = decl.cases().map(|case| &case.payload).collect();
        assert!(matches!(payloads[0], CasePayload::Unit));
        assert!(matches!(payloads[1], CasePayload::Single(_)));
        assert!(matches!(payloads[2], CasePayload::Fields(fields) if fields.len() == 2));
        assert!(matches!(payloads[3], CasePayload::Unsupported { arity: 2 }));
    }

    #[test]
    fn impl_blocks_lower_methods_and_consts() {
        let item: ItemImpl = parse_quote! {
            impl User {
                const VERSION: u8 = 1;
                fn check(decoder: &Decoder<'_>) {}
                fn finish(&mut self) {}
            }
        };
        let decl = Declaration::from_impl(&item).unwrap();
        assert_eq!(decl.ident, "User");
        assert!(decl.stored().all(|stored| stored.is_static));
        let methods: Vec<_> = decl.methods().collect();
        assert_eq!(methods[0].receiver, Receiver::None);
        assert_eq!(methods[0].arguments, 1);
        assert_eq!(methods[1].receiver, Receiver::RefMut);
    }
}
