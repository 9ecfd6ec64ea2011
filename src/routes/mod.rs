//! HTTP routes for Greenroom

pub mod channels;
pub mod health;

pub use channels::{
    error_response, handle_create_channel, handle_join, handle_share, handle_start_recording,
    handle_stop_recording, json_response,
};
pub use health::{health_check, version_info};
