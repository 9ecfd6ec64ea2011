//! Shared types for Greenroom

pub mod error;

pub use error::{Error, Result};
