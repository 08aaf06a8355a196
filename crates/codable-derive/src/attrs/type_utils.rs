//! Type analysis utilities.

use syn::{GenericArgument, PathArguments, Type, TypePath};

/// Coarse shape of a field type, as far as it can be read from syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape {
    Primitive,
    Optional(Box<TypeShape>),
    Array,
    Set,
    Dictionary,
    Named,
}

impl TypeShape {
    pub fn of(ty: &Type) -> TypeShape {
        if let Some(inner) = option_inner(ty) {
            return TypeShape::Optional(Box::new(TypeShape::of(inner)));
        }
        match ty {
            Type::Array(_) | Type::Slice(_) => TypeShape::Array,
            Type::Reference(reference) => TypeShape::of(&reference.elem),
            Type::Paren(paren) => TypeShape::of(&paren.elem),
            Type::Group(group) => TypeShape::of(&group.elem),
            Type::Path(TypePath { qself: None, path }) => {
                let Some(last) = path.segments.last() else {
                    return TypeShape::Named;
                };
                match last.ident.to_string().as_str() {
                    "bool" | "char" | "str" | "String" | "i8" | "i16" | "i32" | "i64" | "i128"
                    | "isize" | "u8" | "u16" | "u32" | "u64" | "u128" | "usize" | "f32"
                    | "f64" => TypeShape::Primitive,
                    "Vec" | "VecDeque" | "LinkedList" => TypeShape::Array,
                    "HashSet" | "BTreeSet" | "IndexSet" => TypeShape::Set,
                    "HashMap" | "BTreeMap" | "IndexMap" => TypeShape::Dictionary,
                    _ => TypeShape::Named,
                }
            }
            _ => TypeShape::Named,
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, TypeShape::Optional(_))
    }

    /// Array, set or dictionary, looking through one `Option`.
    pub fn is_collection(&self) -> bool {
        match self {
            TypeShape::Array | TypeShape::Set | TypeShape::Dictionary => true,
            TypeShape::Optional(inner) => inner.is_collection(),
            TypeShape::Primitive | TypeShape::Named => false,
        }
    }
}

/// `T` for `Option<T>` (also `std::option::Option<T>`).
pub fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(TypePath { qself: None, path }) = ty else {
        return None;
    };
    let segment = path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    match &segment.arguments {
        PathArguments::AngleBracketed(args) if args.args.len() == 1 => match args.args.first() {
            Some(GenericArgument::Type(inner)) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}
