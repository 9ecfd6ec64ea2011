//! Configuration for Greenroom
//!
//! CLI arguments and environment variable handling using clap. Every
//! component receives the settings it needs through its constructor; there
//! are no ad hoc configuration lookups at call sites.

use clap::Parser;
use std::net::SocketAddr;

/// Greenroom - passphrase-gated conferencing backend
#[derive(Parser, Debug, Clone)]
#[command(name = "greenroom")]
#[command(about = "Channel sessions and cloud recording orchestration")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "greenroom")]
    pub mongodb_db: String,

    /// Enable development mode (in-memory store, relaxed credential checks)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Real-time provider application ID
    #[arg(long, env = "APP_ID")]
    pub app_id: Option<String>,

    /// Shared signing secret for join tokens
    #[arg(long, env = "APP_CERTIFICATE")]
    pub app_certificate: Option<String>,

    /// Cloud recording API customer ID (basic auth username)
    #[arg(long, env = "CUSTOMER_ID")]
    pub customer_id: Option<String>,

    /// Cloud recording API customer certificate (basic auth password)
    #[arg(long, env = "CUSTOMER_CERTIFICATE")]
    pub customer_certificate: Option<String>,

    /// Base URL of the cloud recording API
    #[arg(long, env = "RECORDING_API_URL", default_value = "https://api.agora.io")]
    pub recording_api_url: String,

    /// Storage vendor code for recording uploads
    #[arg(long, env = "RECORDING_VENDOR", default_value = "1")]
    pub recording_vendor: i32,

    /// Storage region code for recording uploads
    #[arg(long, env = "RECORDING_REGION", default_value = "0")]
    pub recording_region: i32,

    /// Storage bucket for recording uploads
    #[arg(long, env = "BUCKET_NAME", default_value = "")]
    pub bucket_name: String,

    /// Storage bucket access key
    #[arg(long, env = "BUCKET_ACCESS_KEY", default_value = "")]
    pub bucket_access_key: String,

    /// Storage bucket access secret
    #[arg(long, env = "BUCKET_ACCESS_SECRET", default_value = "")]
    pub bucket_access_secret: String,

    /// Dial-in number handed out with PSTN-enabled channels
    #[arg(long, env = "PSTN_NUMBER", default_value = "")]
    pub pstn_number: String,

    /// Require an authenticated identity for channel creation
    #[arg(long, env = "ENABLE_OAUTH", default_value = "false")]
    pub enable_oauth: bool,

    /// JWT secret for validating bearer identities (required with ENABLE_OAUTH)
    #[arg(long, env = "OAUTH_JWT_SECRET")]
    pub oauth_jwt_secret: Option<String>,

    /// Join token expiry in seconds
    #[arg(long, env = "TOKEN_EXPIRY_SECONDS", default_value = "86400")]
    pub token_expiry_seconds: u64,

    /// Outbound request timeout in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,
}

impl Args {
    /// Get effective join-token signing secret (uses a default in dev mode)
    pub fn app_certificate(&self) -> String {
        if self.dev_mode {
            self.app_certificate
                .clone()
                .unwrap_or_else(|| "dev-only-insecure-certificate".to_string())
        } else {
            self.app_certificate
                .clone()
                .expect("APP_CERTIFICATE is required in production mode")
        }
    }

    /// Get effective application ID (uses a placeholder in dev mode)
    pub fn app_id(&self) -> String {
        if self.dev_mode {
            self.app_id.clone().unwrap_or_else(|| "dev-app".to_string())
        } else {
            self.app_id
                .clone()
                .expect("APP_ID is required in production mode")
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode {
            if self.app_id.is_none() {
                return Err("APP_ID is required in production mode".to_string());
            }
            if self.app_certificate.is_none() {
                return Err("APP_CERTIFICATE is required in production mode".to_string());
            }
            if self.customer_id.is_none() || self.customer_certificate.is_none() {
                return Err(
                    "CUSTOMER_ID and CUSTOMER_CERTIFICATE are required in production mode"
                        .to_string(),
                );
            }
        }

        if self.enable_oauth && self.oauth_jwt_secret.is_none() {
            return Err("OAUTH_JWT_SECRET is required when ENABLE_OAUTH is set".to_string());
        }

        if self.token_expiry_seconds == 0 {
            return Err("TOKEN_EXPIRY_SECONDS must be greater than zero".to_string());
        }

        Ok(())
    }
}
