//! Persistence for Greenroom
//!
//! The core talks to storage through the [`ChannelStore`] trait. Production
//! uses the Mongo-backed store; dev mode and tests use the in-memory store.

pub mod mongo;
pub mod schemas;

use bson::oid::ObjectId;
use tokio::sync::RwLock;

use crate::db::schemas::{ChannelDoc, RecordingState};
use crate::types::{Error, Result};

pub use mongo::{MongoChannelStore, MongoClient};

/// Storage collaborator for channel records
#[async_trait::async_trait]
pub trait ChannelStore: Send + Sync {
    /// Find the channel whose host or viewer passphrase equals the input
    /// exactly. Returns `None` when no channel matches.
    async fn get_by_passphrase(&self, passphrase: &str) -> Result<Option<ChannelDoc>>;

    /// Insert a new channel record
    async fn insert(&self, channel: ChannelDoc) -> Result<ObjectId>;

    /// Replace the channel's recording composite (`None` clears it)
    async fn update_recording(
        &self,
        channel_id: ObjectId,
        state: Option<&RecordingState>,
    ) -> Result<()>;
}

/// In-memory channel store for dev mode and tests
#[derive(Default)]
pub struct MemoryChannelStore {
    channels: RwLock<Vec<ChannelDoc>>,
}

impl MemoryChannelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot a channel by id (test inspection)
    pub async fn get_by_id(&self, channel_id: ObjectId) -> Option<ChannelDoc> {
        let channels = self.channels.read().await;
        channels.iter().find(|c| c._id == Some(channel_id)).cloned()
    }

    /// Overwrite the raw persisted recording shape, bypassing the composite
    /// contract (simulates legacy partial rows in tests)
    #[cfg(test)]
    pub async fn set_raw_recording(
        &self,
        channel_id: ObjectId,
        parts: Option<crate::db::schemas::RecordingStateParts>,
    ) {
        let mut channels = self.channels.write().await;
        if let Some(channel) = channels.iter_mut().find(|c| c._id == Some(channel_id)) {
            channel.recording = parts;
        }
    }
}

#[async_trait::async_trait]
impl ChannelStore for MemoryChannelStore {
    async fn get_by_passphrase(&self, passphrase: &str) -> Result<Option<ChannelDoc>> {
        let channels = self.channels.read().await;
        Ok(channels
            .iter()
            .find(|c| c.host_passphrase == passphrase || c.viewer_passphrase == passphrase)
            .cloned())
    }

    async fn insert(&self, mut channel: ChannelDoc) -> Result<ObjectId> {
        let mut channels = self.channels.write().await;

        // Mirror the unique indexes of the Mongo store
        let collision = channels.iter().any(|c| {
            c.host_passphrase == channel.host_passphrase
                || c.viewer_passphrase == channel.viewer_passphrase
                || c.host_passphrase == channel.viewer_passphrase
                || c.viewer_passphrase == channel.host_passphrase
        });
        if collision {
            return Err(Error::Database("duplicate passphrase".into()));
        }

        let id = ObjectId::new();
        channel._id = Some(id);
        channels.push(channel);
        Ok(id)
    }

    async fn update_recording(
        &self,
        channel_id: ObjectId,
        state: Option<&RecordingState>,
    ) -> Result<()> {
        let mut channels = self.channels.write().await;
        let channel = channels
            .iter_mut()
            .find(|c| c._id == Some(channel_id))
            .ok_or_else(|| Error::Database(format!("No channel with id {} to update", channel_id)))?;

        channel.recording = state.map(|s| s.to_parts());
        Ok(())
    }
}
