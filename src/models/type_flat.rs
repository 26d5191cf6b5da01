//! Unresolved ("flat") type trees
//!
//! A flat tree is exactly what the IDL JSON said: named references and
//! generic symbols are still present. It is produced once at parse time
//! and never mutated; hydration expands it into a full tree.

use crate::models::type_prefix::TypePrefix;
use crate::models::type_primitive::TypePrimitive;

/// A type tree as parsed from IDL JSON, before resolution
#[derive(Debug, Clone, PartialEq)]
pub enum TypeFlat {
    /// Reference to a typedef by name, with generic arguments
    Defined {
        name: String,
        generics: Vec<TypeFlat>,
    },
    /// A generic parameter symbol, bound during hydration
    Generic { symbol: String },
    /// Optional value: flag at `prefix` width, then content when present
    Option {
        prefix: TypePrefix,
        content: Box<TypeFlat>,
    },
    /// Variable-length sequence: length at `prefix` width, then items
    Vec {
        prefix: TypePrefix,
        items: Box<TypeFlat>,
    },
    /// Fixed-length sequence; the length is itself a flat type so it can
    /// be a generic parameter until hydration
    Array {
        items: Box<TypeFlat>,
        length: Box<TypeFlat>,
    },
    /// UTF-8 text, length at `prefix` width
    String { prefix: TypePrefix },
    /// Product type
    Struct { fields: TypeFlatFields },
    /// Sum type: tag at `prefix` width selects a variant
    Enum {
        prefix: TypePrefix,
        variants: Vec<TypeFlatEnumVariant>,
    },
    /// Explicit zero padding around a content type
    Padded {
        before: usize,
        min_size: usize,
        after: usize,
        content: Box<TypeFlat>,
    },
    /// A compile-time integer literal (array lengths)
    Const { literal: u64 },
    /// A leaf primitive
    Primitive { primitive: TypePrimitive },
}

impl TypeFlat {
    /// Shorthand for a primitive node
    pub fn primitive(primitive: TypePrimitive) -> Self {
        TypeFlat::Primitive { primitive }
    }

    /// Short description used in error messages
    pub fn describe(&self) -> String {
        match self {
            TypeFlat::Defined { name, .. } => format!("defined({})", name),
            TypeFlat::Generic { symbol } => format!("generic({})", symbol),
            TypeFlat::Option { .. } => "option".to_string(),
            TypeFlat::Vec { .. } => "vec".to_string(),
            TypeFlat::Array { .. } => "array".to_string(),
            TypeFlat::String { .. } => "string".to_string(),
            TypeFlat::Struct { .. } => "struct".to_string(),
            TypeFlat::Enum { .. } => "enum".to_string(),
            TypeFlat::Padded { .. } => "padded".to_string(),
            TypeFlat::Const { literal } => format!("const({})", literal),
            TypeFlat::Primitive { primitive } => primitive.name().to_string(),
        }
    }
}

/// Fields of a flat struct or enum variant
#[derive(Debug, Clone, PartialEq)]
pub enum TypeFlatFields {
    /// No payload at all
    Nothing,
    /// Named fields, encoded in declaration order
    Named(Vec<TypeFlatFieldNamed>),
    /// Tuple fields, position is the vector index
    Unnamed(Vec<TypeFlat>),
}

/// One named field of a flat struct/variant
#[derive(Debug, Clone, PartialEq)]
pub struct TypeFlatFieldNamed {
    pub name: String,
    pub content: TypeFlat,
}

/// One variant of a flat enum
#[derive(Debug, Clone, PartialEq)]
pub struct TypeFlatEnumVariant {
    pub name: String,
    /// Tag value written at the enum's prefix width
    pub code: u128,
    pub fields: TypeFlatFields,
}
