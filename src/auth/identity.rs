//! Optional bearer-token identity (OAuth mode)
//!
//! When OAuth mode is enabled, channel creation requires a valid bearer
//! identity and recording storage prefixes prefer the caller's display
//! name. When disabled, every request is anonymous and validation is a
//! no-op.

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{Error, Result};

/// Claims carried by an identity token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Stable identifier of the user
    pub sub: String,
    /// Display name, if the provider supplied one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Expiry (unix seconds)
    pub exp: u64,
}

/// Authenticated caller identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub identifier: String,
    pub name: Option<String>,
}

/// Validates bearer identities when OAuth mode is on
pub struct IdentityValidator {
    enabled: bool,
    decoding_key: Option<DecodingKey>,
}

impl IdentityValidator {
    /// Build from config. `secret` must be present when `enabled` is true
    /// (enforced by `Args::validate`).
    pub fn new(enabled: bool, secret: Option<&str>) -> Self {
        Self {
            enabled,
            decoding_key: secret.map(|s| DecodingKey::from_secret(s.as_bytes())),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Resolve the caller identity from a bearer token.
    ///
    /// Disabled mode always yields `Ok(None)`. Enabled mode requires a
    /// valid, unexpired token.
    pub fn user_from_bearer(&self, token: Option<&str>) -> Result<Option<AuthUser>> {
        if !self.enabled {
            return Ok(None);
        }

        let token = token.ok_or_else(|| Error::Unauthorized("missing bearer token".into()))?;
        let key = self
            .decoding_key
            .as_ref()
            .ok_or_else(|| Error::Config("OAuth enabled without a JWT secret".into()))?;

        let data = decode::<IdentityClaims>(token, key, &Validation::default()).map_err(|e| {
            debug!("Bearer token rejected: {}", e);
            Error::Unauthorized(format!("invalid bearer token: {}", e))
        })?;

        Ok(Some(AuthUser {
            identifier: data.claims.sub,
            name: data.claims.name,
        }))
    }
}

/// Extract the token from an `Authorization: Bearer ...` header value
pub fn extract_bearer_token(header: Option<&str>) -> Option<&str> {
    header?.strip_prefix("Bearer ").map(str::trim)
}
