//! Discriminator namespaces
//!
//! Anchor-style discriminators are the first 8 bytes of
//! `sha256("<namespace>:<name>")`. The namespace picks the entity kind.

/// Namespace for account discriminators
pub const ACCOUNT_DISCRIMINATOR_NAMESPACE: &str = "account";

/// Namespace for instruction discriminators
pub const INSTRUCTION_DISCRIMINATOR_NAMESPACE: &str = "global";

/// Namespace for event discriminators
pub const EVENT_DISCRIMINATOR_NAMESPACE: &str = "event";

/// Byte length of a default discriminator
pub const DISCRIMINATOR_LENGTH: usize = 8;
