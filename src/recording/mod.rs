//! Cloud recording: wire contract, HTTP client, and orchestration

pub mod api;
pub mod orchestrator;

pub use api::{CloudRecordingClient, RecordingApi, RecordingApiConfig};
pub use orchestrator::{sanitize_title, RecordingOrchestrator, RecordingSettings};
