//! Credential generator
//!
//! Derives signed, time-bounded join credentials for a channel, plus the
//! opaque identifiers used for channel names, secrets, and passphrases.
//! Pure apart from the randomness source; no I/O.

use jsonwebtoken::{encode, EncodingKey, Header};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::types::{Error, Result};

/// Short-lived signed credential for one participant identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinCredential {
    /// Per-participant numeric id (non-zero, fresh per generation)
    pub uid: u32,
    /// Signed access token
    pub token: String,
    /// Channel name the token is valid for
    pub channel: String,
}

/// Claims bound into a join token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinClaims {
    /// Channel name
    pub cname: String,
    /// Participant numeric id
    pub uid: u32,
    /// Whether this identity is the main audio/video stream
    /// (false for the screen-share identity and the recording bot)
    pub primary: bool,
    /// Expiry (unix seconds)
    pub exp: u64,
}

/// Generates join credentials and opaque identifiers
#[derive(Clone)]
pub struct CredentialGenerator {
    encoding_key: EncodingKey,
    expiry_seconds: u64,
}

impl CredentialGenerator {
    /// Create a generator from the deployment's shared signing secret
    pub fn new(signing_secret: &str, expiry_seconds: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(signing_secret.as_bytes()),
            expiry_seconds,
        }
    }

    /// Generate a fresh credential for the given channel.
    ///
    /// `primary` distinguishes the main audio/video identity from auxiliary
    /// identities (screen share, recording bot) sharing the channel. Each
    /// call draws an independent uid, so the two identities of one join
    /// never collide.
    pub fn generate(&self, channel: &str, primary: bool) -> Result<JoinCredential> {
        let uid = fresh_uid();
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_err(|e| Error::Credential(format!("clock error: {}", e)))?
            .as_secs();

        let claims = JoinClaims {
            cname: channel.to_string(),
            uid,
            primary,
            exp: now + self.expiry_seconds,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| Error::Credential(format!("token signing failed: {}", e)))?;

        Ok(JoinCredential {
            uid,
            token,
            channel: channel.to_string(),
        })
    }

    /// Fresh opaque identifier: UUID v4 with the dashes stripped (32 hex
    /// chars). Used for channel names, secrets, and passphrases.
    pub fn opaque_id(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }

    /// Fresh DTMF dial-in code: 8 digits, non-zero leading digit
    pub fn dtmf(&self) -> String {
        let mut rng = rand::thread_rng();
        let mut code = String::with_capacity(8);
        code.push(char::from(b'1' + rng.gen_range(0..9)));
        for _ in 0..7 {
            code.push(char::from(b'0' + rng.gen_range(0..10)));
        }
        code
    }
}

/// Non-zero random participant id (at least 32 bits of entropy)
fn fresh_uid() -> u32 {
    loop {
        let uid: u32 = rand::thread_rng().gen();
        if uid != 0 {
            return uid;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};

    const SECRET: &str = "test-signing-secret";

    fn generator() -> CredentialGenerator {
        CredentialGenerator::new(SECRET, 3600)
    }

    #[test]
    fn test_generate_binds_channel_and_uid() {
        let creds = generator().generate("chan1", true).unwrap();
        assert_ne!(creds.uid, 0);
        assert_eq!(creds.channel, "chan1");

        let data = decode::<JoinClaims>(
            &creds.token,
            &DecodingKey::from_secret(SECRET.as_bytes()),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(data.claims.cname, "chan1");
        assert_eq!(data.claims.uid, creds.uid);
        assert!(data.claims.primary);
    }

    #[test]
    fn test_primary_and_screen_share_get_distinct_uids() {
        let generator = generator();
        let main = generator.generate("chan1", true).unwrap();
        let screen = generator.generate("chan1", false).unwrap();
        assert_ne!(main.uid, screen.uid);
        assert_ne!(main.token, screen.token);
    }

    #[test]
    fn test_opaque_ids_are_unique_and_dash_free() {
        let generator = generator();
        let a = generator.opaque_id();
        let b = generator.opaque_id();
        assert_eq!(a.len(), 32);
        assert!(!a.contains('-'));
        assert_ne!(a, b);
    }

    #[test]
    fn test_dtmf_shape() {
        let generator = generator();
        for _ in 0..20 {
            let code = generator.dtmf();
            assert_eq!(code.len(), 8);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert_ne!(code.chars().next(), Some('0'));
        }
    }
}
