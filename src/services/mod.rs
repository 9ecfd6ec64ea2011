//! Service layer

pub mod channels;

pub use channels::{
    ChannelSessionService, PstnInfo, RecordingStatusResponse, SessionResponse, ShareResponse,
};
