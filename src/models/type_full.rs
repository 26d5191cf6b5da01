//! Resolved ("full") type trees
//!
//! A full tree contains no `Defined` or `Generic` nodes: hydration either
//! expanded them or failed. Every resolved named type keeps its name and
//! repr inside a `Typedef` wrapper so layout and error messages can refer
//! back to it. Enum nodes precompute their lookup maps and tag mask.

use std::collections::HashMap;

use crate::models::type_prefix::TypePrefix;
use crate::models::type_primitive::TypePrimitive;

/// Native representation declared on a typedef
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRepr {
    C,
    Rust,
    Transparent,
}

impl TypeRepr {
    /// Parse a repr kind from its IDL name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "c" | "C" => Some(Self::C),
            "rust" => Some(Self::Rust),
            "transparent" => Some(Self::Transparent),
            _ => None,
        }
    }
}

/// A fully resolved type tree
#[derive(Debug, Clone, PartialEq)]
pub enum TypeFull {
    /// A resolved named type, wrapping its expanded content
    Typedef {
        name: String,
        repr: Option<TypeRepr>,
        content: Box<TypeFull>,
    },
    /// Optional value: flag at `prefix` width, then content when present
    Option {
        prefix: TypePrefix,
        content: Box<TypeFull>,
    },
    /// Variable-length sequence: length at `prefix` width, then items
    Vec {
        prefix: TypePrefix,
        items: Box<TypeFull>,
    },
    /// Fixed-length sequence
    Array { items: Box<TypeFull>, length: usize },
    /// UTF-8 text, length at `prefix` width
    String { prefix: TypePrefix },
    /// Product type
    Struct { fields: TypeFullFields },
    /// Sum type with precomputed variant lookup tables
    Enum {
        prefix: TypePrefix,
        variants: Vec<TypeFullEnumVariant>,
        /// Bitwise OR of every variant code; decoded raw tags are masked
        /// with this before lookup to strip bits no variant uses
        mask: u128,
        /// Variant index by name
        index_by_name: HashMap<String, usize>,
        /// Variant index by (masked) code
        index_by_code: HashMap<u128, usize>,
    },
    /// Explicit zero padding around a content type
    Padded {
        before: usize,
        min_size: usize,
        after: usize,
        content: Box<TypeFull>,
    },
    /// A resolved integer literal (array lengths)
    Const { literal: u64 },
    /// A leaf primitive
    Primitive { primitive: TypePrimitive },
}

/// Fields of a full struct or enum variant
#[derive(Debug, Clone, PartialEq)]
pub enum TypeFullFields {
    Nothing,
    Named(Vec<TypeFullFieldNamed>),
    Unnamed(Vec<TypeFull>),
}

/// One named field of a full struct/variant
#[derive(Debug, Clone, PartialEq)]
pub struct TypeFullFieldNamed {
    pub name: String,
    pub content: TypeFull,
}

/// One variant of a full enum
#[derive(Debug, Clone, PartialEq)]
pub struct TypeFullEnumVariant {
    pub name: String,
    pub code: u128,
    pub fields: TypeFullFields,
}

impl TypeFull {
    /// Shorthand for a primitive node
    pub fn primitive(primitive: TypePrimitive) -> Self {
        TypeFull::Primitive { primitive }
    }

    /// Build an enum node, computing the lookup maps and mask
    pub fn enumeration(prefix: TypePrefix, variants: Vec<TypeFullEnumVariant>) -> Self {
        let mut mask = 0u128;
        let mut index_by_name = HashMap::with_capacity(variants.len());
        let mut index_by_code = HashMap::with_capacity(variants.len());
        for (index, variant) in variants.iter().enumerate() {
            mask |= variant.code;
            index_by_name.insert(variant.name.clone(), index);
            index_by_code.insert(variant.code, index);
        }
        TypeFull::Enum {
            prefix,
            variants,
            mask,
            index_by_name,
            index_by_code,
        }
    }

    /// Peel `Typedef` wrappers down to the structural content
    pub fn content(&self) -> &TypeFull {
        match self {
            TypeFull::Typedef { content, .. } => content.content(),
            other => other,
        }
    }

    /// True when this is the u8 primitive (the vec-of-bytes fast path)
    pub fn is_u8(&self) -> bool {
        matches!(
            self.content(),
            TypeFull::Primitive {
                primitive: TypePrimitive::U8
            }
        )
    }

    /// Short description used in error messages
    pub fn describe(&self) -> String {
        match self {
            TypeFull::Typedef { name, .. } => name.clone(),
            TypeFull::Option { .. } => "option".to_string(),
            TypeFull::Vec { .. } => "vec".to_string(),
            TypeFull::Array { length, .. } => format!("array[{}]", length),
            TypeFull::String { .. } => "string".to_string(),
            TypeFull::Struct { .. } => "struct".to_string(),
            TypeFull::Enum { .. } => "enum".to_string(),
            TypeFull::Padded { .. } => "padded".to_string(),
            TypeFull::Const { literal } => format!("const({})", literal),
            TypeFull::Primitive { primitive } => primitive.name().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_indexing() {
        let variants = vec![
            TypeFullEnumVariant {
                name: "left".to_string(),
                code: 1,
                fields: TypeFullFields::Nothing,
            },
            TypeFullEnumVariant {
                name: "right".to_string(),
                code: 4,
                fields: TypeFullFields::Nothing,
            },
        ];
        let enumeration = TypeFull::enumeration(TypePrefix::U8, variants);
        match &enumeration {
            TypeFull::Enum {
                mask,
                index_by_name,
                index_by_code,
                ..
            } => {
                assert_eq!(*mask, 5);
                assert_eq!(index_by_name.get("right"), Some(&1));
                assert_eq!(index_by_code.get(&1), Some(&0));
                assert_eq!(index_by_code.get(&4), Some(&1));
            }
            _ => panic!("expected enum"),
        }
    }

    #[test]
    fn test_content_strips_typedefs() {
        let wrapped = TypeFull::Typedef {
            name: "Amount".to_string(),
            repr: None,
            content: Box::new(TypeFull::primitive(TypePrimitive::U64)),
        };
        assert_eq!(
            wrapped.content(),
            &TypeFull::primitive(TypePrimitive::U64)
        );
        assert!(TypeFull::primitive(TypePrimitive::U8).is_u8());
        assert!(!wrapped.is_u8());
    }
}
