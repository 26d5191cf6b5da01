//! Bytemuck layout engine
//!
//! Computes the native in-memory layout (alignment, size, padding) of a
//! full type under a C or Rust representation, and rewrites the type so
//! every padding byte is an explicit `Padded` node. The ordinary codec
//! then encodes/decodes the in-memory image with no extra machinery:
//! option flags widen to the alignment, enum tags widen to the payload
//! alignment, and whole-node `Padded{min_size}` wrappers account for
//! union sizing and trailing padding.
//!
//! Types with no fixed native size (vec, string, hand-written padding)
//! have no layout. Under the Rust repr the compiler is free to reorder
//! fields, so shapes where that freedom matters are rejected outright
//! rather than guessed at.

use crate::errors::LayoutError;
use crate::models::type_full::{
    TypeFull, TypeFullEnumVariant, TypeFullFieldNamed, TypeFullFields, TypeRepr,
};
use crate::models::type_prefix::TypePrefix;

/// A computed native layout
#[derive(Debug, Clone, PartialEq)]
pub struct PodLayout {
    /// Native alignment in bytes
    pub alignment: usize,
    /// Native size in bytes (a multiple of the alignment for structs/enums)
    pub size: usize,
    /// The input type with all padding made explicit
    pub type_full: TypeFull,
}

/// Compute the native layout, taking the repr from the outermost typedef
/// (Rust when none is declared)
pub fn bytemuck(type_full: &TypeFull) -> Result<PodLayout, LayoutError> {
    bytemuck_with_repr(type_full, TypeRepr::Rust)
}

/// Compute the native layout under an explicit default repr
pub fn bytemuck_with_repr(
    type_full: &TypeFull,
    repr: TypeRepr,
) -> Result<PodLayout, LayoutError> {
    let (alignment, size, pod) = pod_type(type_full, effective_repr(repr))?;
    Ok(PodLayout {
        alignment,
        size,
        type_full: pod,
    })
}

/// Transparent is layout-equivalent to Rust here
fn effective_repr(repr: TypeRepr) -> TypeRepr {
    match repr {
        TypeRepr::Transparent => TypeRepr::Rust,
        other => other,
    }
}

fn pod_type(
    type_full: &TypeFull,
    repr: TypeRepr,
) -> Result<(usize, usize, TypeFull), LayoutError> {
    match type_full {
        TypeFull::Typedef {
            name,
            repr: declared,
            content,
        } => {
            let inner_repr = declared.map(effective_repr).unwrap_or(repr);
            let (alignment, size, pod) = pod_type(content, inner_repr)?;
            Ok((
                alignment,
                size,
                TypeFull::Typedef {
                    name: name.clone(),
                    repr: *declared,
                    content: Box::new(pod),
                },
            ))
        }
        TypeFull::Primitive { primitive } => {
            Ok((primitive.alignment(), primitive.size(), type_full.clone()))
        }
        TypeFull::Array { items, length } => {
            let (alignment, item_size, pod_items) = pod_type(items, repr)?;
            Ok((
                alignment,
                item_size * length,
                TypeFull::Array {
                    items: Box::new(pod_items),
                    length: *length,
                },
            ))
        }
        TypeFull::Option { prefix, content } => {
            let (content_alignment, content_size, pod_content) = pod_type(content, repr)?;
            // The flag occupies one whole alignment unit before the content
            let alignment = prefix.size().max(content_alignment);
            let flag_prefix = TypePrefix::from_size(alignment)
                .ok_or(LayoutError::UnsupportedAlignment { alignment })?;
            let size = alignment + content_size;
            Ok((
                alignment,
                size,
                TypeFull::Padded {
                    before: 0,
                    min_size: size,
                    after: 0,
                    content: Box::new(TypeFull::Option {
                        prefix: flag_prefix,
                        content: Box::new(pod_content),
                    }),
                },
            ))
        }
        TypeFull::Struct { fields } => {
            if repr == TypeRepr::Rust && field_count(fields) > 1 {
                return Err(LayoutError::UnstableFieldOrder {
                    detail: "struct with more than one field".to_string(),
                });
            }
            let (alignment, size, pod_fields) = pod_fields(fields, repr)?;
            Ok((alignment, size, TypeFull::Struct { fields: pod_fields }))
        }
        TypeFull::Enum {
            prefix, variants, ..
        } => {
            let mut payload_alignment = 1;
            let mut union_size = 0;
            let mut pod_variants = Vec::with_capacity(variants.len());
            for variant in variants {
                if repr == TypeRepr::Rust && field_count(&variant.fields) > 2 {
                    return Err(LayoutError::UnstableFieldOrder {
                        detail: format!("variant \"{}\" with more than two fields", variant.name),
                    });
                }
                let (variant_alignment, variant_size, variant_fields) =
                    pod_fields(&variant.fields, repr)?;
                payload_alignment = payload_alignment.max(variant_alignment);
                union_size = union_size.max(variant_size);
                pod_variants.push(TypeFullEnumVariant {
                    name: variant.name.clone(),
                    code: variant.code,
                    fields: variant_fields,
                });
            }
            // C promotes the tag to at least an int; both reprs widen it
            // to the payload alignment so the payload starts aligned
            let tag_base = match repr {
                TypeRepr::C => prefix.size().max(4),
                _ => prefix.size(),
            };
            let alignment = tag_base.max(payload_alignment);
            let tag_prefix = TypePrefix::from_size(alignment)
                .ok_or(LayoutError::UnsupportedAlignment { alignment })?;
            let size = round_up(alignment + union_size, alignment);
            Ok((
                alignment,
                size,
                TypeFull::Padded {
                    before: 0,
                    min_size: size,
                    after: 0,
                    content: Box::new(TypeFull::enumeration(tag_prefix, pod_variants)),
                },
            ))
        }
        TypeFull::Vec { .. } => Err(LayoutError::UnsupportedForRepr {
            type_name: "vec".to_string(),
        }),
        TypeFull::String { .. } => Err(LayoutError::UnsupportedForRepr {
            type_name: "string".to_string(),
        }),
        TypeFull::Padded { .. } => Err(LayoutError::UnsupportedForRepr {
            type_name: "padded".to_string(),
        }),
        TypeFull::Const { literal } => Err(LayoutError::UnsupportedForRepr {
            type_name: format!("const({})", literal),
        }),
    }
}

/// Pack a field set in declaration order with C rules: pad each field up
/// to its alignment, then the whole set up to the set's alignment
fn pod_fields(
    fields: &TypeFullFields,
    repr: TypeRepr,
) -> Result<(usize, usize, TypeFullFields), LayoutError> {
    let contents: Vec<(Option<&str>, &TypeFull)> = match fields {
        TypeFullFields::Nothing => vec![],
        TypeFullFields::Named(named) => named
            .iter()
            .map(|field| (Some(field.name.as_str()), &field.content))
            .collect(),
        TypeFullFields::Unnamed(unnamed) => unnamed.iter().map(|content| (None, content)).collect(),
    };

    let mut alignment = 1;
    let mut offset = 0;
    let mut packed = Vec::with_capacity(contents.len());
    for (name, content) in contents {
        let (field_alignment, field_size, pod) = pod_type(content, repr)?;
        let pad_before = round_up(offset, field_alignment) - offset;
        offset += pad_before + field_size;
        alignment = alignment.max(field_alignment);
        packed.push((name, pad_before, pod));
    }
    let size = round_up(offset, alignment);
    let pad_after = size - offset;

    let last = packed.len().checked_sub(1);
    let wrapped: Vec<(Option<&str>, TypeFull)> = packed
        .into_iter()
        .enumerate()
        .map(|(index, (name, pad_before, pod))| {
            let pad_after = if Some(index) == last { pad_after } else { 0 };
            let content = if pad_before > 0 || pad_after > 0 {
                TypeFull::Padded {
                    before: pad_before,
                    min_size: 0,
                    after: pad_after,
                    content: Box::new(pod),
                }
            } else {
                pod
            };
            (name, content)
        })
        .collect();

    let pod_fields = match fields {
        TypeFullFields::Nothing => TypeFullFields::Nothing,
        TypeFullFields::Named(_) => TypeFullFields::Named(
            wrapped
                .into_iter()
                .map(|(name, content)| TypeFullFieldNamed {
                    name: name.unwrap_or_default().to_string(),
                    content,
                })
                .collect(),
        ),
        TypeFullFields::Unnamed(_) => {
            TypeFullFields::Unnamed(wrapped.into_iter().map(|(_, content)| content).collect())
        }
    };
    Ok((alignment, size, pod_fields))
}

fn field_count(fields: &TypeFullFields) -> usize {
    match fields {
        TypeFullFields::Nothing => 0,
        TypeFullFields::Named(named) => named.len(),
        TypeFullFields::Unnamed(unnamed) => unnamed.len(),
    }
}

fn round_up(value: usize, alignment: usize) -> usize {
    value.div_ceil(alignment) * alignment
}
