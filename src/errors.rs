//! Error handling for the IDL codec.
//!
//! Each core component has its own error enum so callers can match on the
//! precise failure; `IdlError` is the umbrella type returned by the
//! top-level entry points. Codec failures additionally carry a breadcrumb
//! path (field/variant/index chain) pointing at the offending spot in the
//! value tree, so a deep mismatch can be diagnosed without re-running.

use std::fmt;
use thiserror::Error;

/// Errors raised while walking IDL JSON into the flat model.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The document was not valid JSON at all.
    #[error("invalid JSON: {detail}")]
    InvalidJson { detail: String },

    /// A JSON value had the wrong kind (object where a string was expected, etc.).
    #[error("expected {expected}, found {found} in {context}")]
    WrongKind {
        expected: &'static str,
        found: &'static str,
        context: String,
    },

    /// A required key was absent from a JSON object.
    #[error("missing key \"{key}\" in {context}")]
    MissingKey { key: String, context: String },

    /// A type node used a form the dialect does not know.
    #[error("unsupported type form in {context}: {detail}")]
    UnsupportedType { context: String, detail: String },

    /// A base58 address string did not decode to 32 bytes.
    #[error("invalid address \"{value}\" in {context}")]
    InvalidAddress { value: String, context: String },

    /// A dotted path in a seed blob could not be followed at parse time.
    #[error("invalid path \"{path}\" in {context}: {detail}")]
    InvalidPath {
        path: String,
        context: String,
        detail: String,
    },

    /// A seed blob definition was malformed.
    #[error("invalid blob in {context}: {detail}")]
    InvalidBlob { context: String, detail: String },
}

/// Errors raised while resolving a flat type tree into a full one.
#[derive(Error, Debug)]
pub enum HydrationError {
    /// A `defined` node referenced a name absent from the typedef registry.
    #[error("unknown typedef \"{name}\"")]
    UnknownTypedef { name: String },

    /// A `generic` symbol had no binding in the current environment.
    #[error("unresolved generic \"{symbol}\"")]
    UnresolvedGeneric { symbol: String },

    /// An array length did not hydrate to a constant.
    #[error("array length for \"{context}\" did not resolve to a constant")]
    NonConstantArrayLength { context: String },

    /// The type tree nested past the recursion bound (self-referential typedef).
    #[error("type nesting exceeded depth {depth} (self-referential typedef?)")]
    TypeTooDeep { depth: usize },
}

/// A chain of field names / variant names / indices locating a codec failure.
#[derive(Debug, Clone, Default)]
pub struct Breadcrumbs(Vec<String>);

impl Breadcrumbs {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Prepend a segment; called as errors bubble up so the final order is
    /// outermost-first.
    pub fn unshift(&mut self, segment: String) {
        self.0.insert(0, segment);
    }
}

impl fmt::Display for Breadcrumbs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// The kind of a codec failure, without location info.
#[derive(Error, Debug)]
pub enum CodecErrorKind {
    /// The JSON value did not have the shape the type requires.
    #[error("expected {expected}, found {found}")]
    ShapeMismatch { expected: String, found: String },

    /// A fixed-length array or field tuple had the wrong number of entries.
    #[error("expected length {expected}, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    /// An enum value named or numbered a variant the type does not declare.
    #[error("unknown variant {variant}")]
    UnknownVariant { variant: String },

    /// A decode read past the end of the buffer.
    #[error("buffer underrun at offset {offset}: needed {needed} bytes, {available} available")]
    BufferUnderrun {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A pubkey string was not valid base58 of 32 bytes.
    #[error("invalid pubkey \"{value}\"")]
    InvalidPubkey { value: String },

    /// Decoded string bytes were not valid UTF-8.
    #[error("invalid utf-8 string bytes")]
    InvalidUtf8,

    /// Account/instruction/event data did not start with the expected discriminator.
    #[error("data does not match the discriminator of \"{name}\"")]
    DiscriminatorMismatch { name: String },

    /// Account data did not carry the expected blob bytes at their offset.
    #[error("data does not match the blob of \"{name}\" at offset {offset}")]
    BlobMismatch { name: String, offset: usize },
}

/// A codec failure plus the breadcrumb path to where it happened.
#[derive(Debug)]
pub struct CodecError {
    pub kind: CodecErrorKind,
    pub path: Breadcrumbs,
}

impl CodecError {
    pub fn new(kind: CodecErrorKind) -> Self {
        Self {
            kind,
            path: Breadcrumbs::default(),
        }
    }

    /// Wrap with one more breadcrumb segment on the way out of a recursive call.
    pub fn context(mut self, segment: impl Into<String>) -> Self {
        self.path.unshift(segment.into());
        self
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{} at `{}`", self.kind, self.path)
        }
    }
}

impl std::error::Error for CodecError {}

impl From<CodecErrorKind> for CodecError {
    fn from(kind: CodecErrorKind) -> Self {
        CodecError::new(kind)
    }
}

/// Extension trait adding breadcrumb context to codec results.
pub trait CodecResultExt<T> {
    /// Add a path segment to the error, if any. The segment closure only
    /// runs on the failure path.
    fn breadcrumb(self, segment: impl FnOnce() -> String) -> Result<T, CodecError>;
}

impl<T> CodecResultExt<T> for Result<T, CodecError> {
    fn breadcrumb(self, segment: impl FnOnce() -> String) -> Result<T, CodecError> {
        self.map_err(|error| error.context(segment()))
    }
}

/// Errors raised by the bytemuck layout engine.
#[derive(Error, Debug)]
pub enum LayoutError {
    /// The type has no fixed native layout (vec, string, hand-written padding).
    #[error("type {type_name} has no native layout")]
    UnsupportedForRepr { type_name: String },

    /// A tag/flag slot would need a width outside {1,2,4,8,16}.
    #[error("unsupported native alignment {alignment}")]
    UnsupportedAlignment { alignment: usize },

    /// Rust repr leaves the field order to the compiler for this shape.
    #[error("field order is compiler-dependent under rust repr: {detail}")]
    UnstableFieldOrder { detail: String },
}

/// Errors raised during PDA derivation.
#[derive(Error, Debug)]
pub enum PdaError {
    /// More seeds than the runtime permits.
    #[error("too many seeds: {count} (max {max})")]
    TooManySeeds { count: usize, max: usize },

    /// A single seed longer than the runtime permits.
    #[error("seed too long: {length} bytes (max {max})")]
    SeedTooLong { length: usize, max: usize },

    /// Every bump from 255 down to 0 produced an on-curve candidate.
    #[error("no viable program derived address for the given seeds")]
    NoViablePda,
}

/// Errors raised when materializing instruction accounts.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// A non-optional instruction account ended up without an address.
    #[error("missing address for required account \"{name}\"")]
    MissingRequiredAccount { name: String },

    /// A seed blob referenced an account address that is not known yet.
    #[error("unknown account \"{name}\" referenced by a seed")]
    UnknownAccount { name: String },

    /// A seed blob referenced account state that was not supplied.
    #[error("no decoded state supplied for account \"{name}\"")]
    UnknownAccountState { name: String },

    /// A dotted path did not lead to a value.
    #[error("path \"{path}\" not found in {context}")]
    UnknownPathValue { path: String, context: String },

    /// A seed blob required a type the IDL did not declare.
    #[error("no type declared for the seed path \"{path}\"")]
    UntypedSeed { path: String },

    /// A pda program blob produced something other than 32 bytes.
    #[error("pda program blob produced {length} bytes instead of a 32-byte address")]
    InvalidProgramBlob { length: usize },

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Pda(#[from] PdaError),
}

/// Umbrella error for the top-level entry points.
#[derive(Error, Debug)]
pub enum IdlError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Hydration(#[from] HydrationError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Pda(#[from] PdaError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Result type alias for the umbrella error.
pub type IdlResult<T> = Result<T, IdlError>;
