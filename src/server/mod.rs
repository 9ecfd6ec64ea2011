//! HTTP server for Greenroom

pub mod http;

pub use http::{run, AppState};
