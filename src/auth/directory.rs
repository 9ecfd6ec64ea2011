//! Passphrase directory
//!
//! Resolves an opaque passphrase to a channel record and a role. This is the
//! only place where a passphrase is compared against the stored host and
//! viewer fields; every caller derives its role from the result instead of
//! re-running the comparison.

use std::sync::Arc;

use tracing::{debug, error};

use crate::db::schemas::ChannelDoc;
use crate::db::ChannelStore;
use crate::types::{Error, Result};

/// Role derived from which passphrase matched. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Host,
    Viewer,
}

impl Role {
    pub fn is_host(&self) -> bool {
        matches!(self, Role::Host)
    }
}

/// Resolves passphrases against the channel store
pub struct PassphraseDirectory {
    store: Arc<dyn ChannelStore>,
}

impl PassphraseDirectory {
    pub fn new(store: Arc<dyn ChannelStore>) -> Self {
        Self { store }
    }

    /// Resolve a passphrase to its channel and role.
    ///
    /// Lookup is exact and case-sensitive. A row that matches neither field
    /// means the store violated the lookup contract and is reported as an
    /// inconsistency rather than a normal miss.
    pub async fn resolve(&self, passphrase: &str) -> Result<(ChannelDoc, Role)> {
        if passphrase.is_empty() {
            return Err(Error::BadRequest("passphrase cannot be empty".into()));
        }

        let channel = match self.store.get_by_passphrase(passphrase).await? {
            Some(channel) => channel,
            None => {
                debug!("No channel for supplied passphrase");
                return Err(Error::NotFound("no channel for passphrase".into()));
            }
        };

        let role = if passphrase == channel.host_passphrase {
            Role::Host
        } else if passphrase == channel.viewer_passphrase {
            Role::Viewer
        } else {
            error!(
                channel = %channel.name,
                "Store returned a channel matching neither passphrase field"
            );
            return Err(Error::Inconsistency(
                "passphrase lookup returned a non-matching channel".into(),
            ));
        };

        Ok((channel, role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryChannelStore;

    struct BrokenStore;

    #[async_trait::async_trait]
    impl ChannelStore for BrokenStore {
        async fn get_by_passphrase(&self, _passphrase: &str) -> Result<Option<ChannelDoc>> {
            // Returns a channel matching neither field
            Ok(Some(ChannelDoc::new(
                "Broken".to_string(),
                "chanX".to_string(),
                "secX".to_string(),
                "other-host".to_string(),
                "other-view".to_string(),
                None,
            )))
        }

        async fn insert(&self, _channel: ChannelDoc) -> Result<bson::oid::ObjectId> {
            unimplemented!()
        }

        async fn update_recording(
            &self,
            _channel_id: bson::oid::ObjectId,
            _state: Option<&crate::db::schemas::RecordingState>,
        ) -> Result<()> {
            unimplemented!()
        }
    }

    async fn directory_with_channel() -> PassphraseDirectory {
        let store = Arc::new(MemoryChannelStore::new());
        store
            .insert(ChannelDoc::new(
                "Standup".to_string(),
                "chan1".to_string(),
                "sec1".to_string(),
                "host-pass".to_string(),
                "view-pass".to_string(),
                None,
            ))
            .await
            .unwrap();
        PassphraseDirectory::new(store)
    }

    #[tokio::test]
    async fn test_host_passphrase_resolves_host_role() {
        let directory = directory_with_channel().await;
        let (channel, role) = directory.resolve("host-pass").await.unwrap();
        assert_eq!(role, Role::Host);
        assert_eq!(channel.name, "chan1");
    }

    #[tokio::test]
    async fn test_viewer_passphrase_resolves_viewer_role() {
        let directory = directory_with_channel().await;
        let (_, role) = directory.resolve("view-pass").await.unwrap();
        assert_eq!(role, Role::Viewer);
        assert!(!role.is_host());
    }

    #[tokio::test]
    async fn test_unknown_passphrase_is_not_found() {
        let directory = directory_with_channel().await;
        let result = directory.resolve("wrong").await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_empty_passphrase_is_bad_request() {
        let directory = directory_with_channel().await;
        let result = directory.resolve("").await;
        assert!(matches!(result, Err(Error::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_lookup_is_case_sensitive() {
        let directory = directory_with_channel().await;
        let result = directory.resolve("HOST-PASS").await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_non_matching_row_is_inconsistency() {
        let directory = PassphraseDirectory::new(Arc::new(BrokenStore));
        let result = directory.resolve("host-pass").await;
        assert!(matches!(result, Err(Error::Inconsistency(_))));
    }
}
