//! Channel document schema
//!
//! One document per communication session. The two passphrases are the only
//! lookup keys and carry unique indexes; the recording identifiers are a
//! single all-or-nothing composite.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for channels
pub const CHANNEL_COLLECTION: &str = "channels";

/// Identifiers of an in-progress cloud recording.
///
/// Resource id and session id are issued by the external recording service
/// during acquire/start; the uid is the recording bot's participant id. All
/// three are required verbatim to stop that same recording, so they only
/// ever exist together.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RecordingState {
    /// Resource id from the acquire phase
    pub resource_id: String,
    /// Session id from the start phase
    pub session_id: String,
    /// Recording bot participant id
    pub uid: u32,
}

/// Raw persisted shape of the recording identifiers.
///
/// Older rows may carry a partial triple; the store reads this shape and
/// collapses it through [`RecordingState::from_parts`] so the rest of the
/// code only ever sees a complete composite or nothing.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct RecordingStateParts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<u32>,
}

impl RecordingState {
    /// Collapse a possibly-partial triple. Returns `Some` only when all
    /// three identifiers are present.
    pub fn from_parts(parts: &RecordingStateParts) -> Option<Self> {
        match (&parts.resource_id, &parts.session_id, parts.uid) {
            (Some(resource_id), Some(session_id), Some(uid)) => Some(Self {
                resource_id: resource_id.clone(),
                session_id: session_id.clone(),
                uid,
            }),
            _ => None,
        }
    }

    /// Expand into the persisted shape
    pub fn to_parts(&self) -> RecordingStateParts {
        RecordingStateParts {
            resource_id: Some(self.resource_id.clone()),
            session_id: Some(self.session_id.clone()),
            uid: Some(self.uid),
        }
    }
}

/// Channel document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ChannelDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Human-readable channel title
    pub title: String,

    /// Opaque channel name, used as the provider-side room identifier
    pub name: String,

    /// Channel secret for media-path encryption
    pub secret: String,

    /// Host passphrase (unique across all channels)
    pub host_passphrase: String,

    /// Viewer passphrase (unique across all channels)
    pub viewer_passphrase: String,

    /// DTMF code for PSTN dial-in, when provisioned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dtmf: Option<String>,

    /// Recording identifiers, persisted as a possibly-partial raw triple
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recording: Option<RecordingStateParts>,
}

impl ChannelDoc {
    /// Create a new channel document
    pub fn new(
        title: String,
        name: String,
        secret: String,
        host_passphrase: String,
        viewer_passphrase: String,
        dtmf: Option<String>,
    ) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            title,
            name,
            secret,
            host_passphrase,
            viewer_passphrase,
            dtmf,
            recording: None,
        }
    }

    /// Complete recording composite, or `None` if absent or partial
    pub fn recording_state(&self) -> Option<RecordingState> {
        self.recording.as_ref().and_then(RecordingState::from_parts)
    }
}

impl IntoIndexes for ChannelDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "host_passphrase": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("host_passphrase_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "viewer_passphrase": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("viewer_passphrase_unique".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for ChannelDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
