//! Greenroom - passphrase-gated conferencing backend
//!
//! Authenticates participants into shared communication channels via opaque
//! passphrases and orchestrates the acquire/start/stop lifecycle of an
//! external cloud recording service for those channels.

pub mod auth;
pub mod config;
pub mod credentials;
pub mod db;
pub mod recording;
pub mod routes;
pub mod server;
pub mod services;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{Error, Result};
