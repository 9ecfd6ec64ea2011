//! Database schemas for Greenroom
//!
//! Defines the MongoDB document structure for channels.

mod channel;
mod metadata;

pub use channel::{ChannelDoc, RecordingState, RecordingStateParts, CHANNEL_COLLECTION};
pub use metadata::Metadata;
