//! Authentication and authorization for Greenroom
//!
//! Provides:
//! - Passphrase resolution to a channel and role
//! - Optional bearer-token identity validation (OAuth mode)

pub mod directory;
pub mod identity;

pub use directory::{PassphraseDirectory, Role};
pub use identity::{extract_bearer_token, AuthUser, IdentityClaims, IdentityValidator};
