//! Typedef registry entries

use crate::models::type_flat::TypeFlat;
use crate::models::type_full::TypeRepr;

/// A named type definition from the IDL `types` section
#[derive(Debug, Clone, PartialEq)]
pub struct IdlTypedef {
    /// Type name, the key under which `defined` references resolve
    pub name: String,
    /// Documentation
    pub docs: Option<Vec<String>>,
    /// Generic parameter symbols, in declaration order
    pub generics: Vec<String>,
    /// Native representation, when declared
    pub repr: Option<TypeRepr>,
    /// Unresolved content; hydrated on demand at each use site
    pub content_type_flat: TypeFlat,
}
