//! Channel session service
//!
//! Composes the passphrase directory, credential generator, and recording
//! orchestrator into the operations the transport layer exposes: create,
//! join, share, and start/stop recording.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::directory::PassphraseDirectory;
use crate::auth::identity::IdentityValidator;
use crate::credentials::{CredentialGenerator, JoinCredential};
use crate::db::schemas::ChannelDoc;
use crate::db::ChannelStore;
use crate::recording::orchestrator::{sanitize_title, RecordingOrchestrator};
use crate::types::{Error, Result};

/// PSTN dial-in details handed out with a channel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PstnInfo {
    pub number: String,
    pub dtmf: String,
}

/// Channel access details returned by create and share
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareResponse {
    pub title: String,
    pub channel: String,
    /// Omitted for viewer-role callers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_passphrase: Option<String>,
    pub viewer_passphrase: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pstn: Option<PstnInfo>,
}

/// Join response: two independent identities plus the media secret
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub title: String,
    pub channel: String,
    pub is_host: bool,
    pub main_user: JoinCredential,
    pub screen_share: JoinCredential,
    pub secret: String,
}

/// Result of a recording start or stop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingStatusResponse {
    pub recording: bool,
}

/// Implements the exposed channel operations
pub struct ChannelSessionService {
    store: Arc<dyn ChannelStore>,
    directory: PassphraseDirectory,
    credentials: CredentialGenerator,
    orchestrator: RecordingOrchestrator,
    identity: IdentityValidator,
    pstn_number: String,
}

impl ChannelSessionService {
    pub fn new(
        store: Arc<dyn ChannelStore>,
        credentials: CredentialGenerator,
        orchestrator: RecordingOrchestrator,
        identity: IdentityValidator,
        pstn_number: String,
    ) -> Self {
        Self {
            directory: PassphraseDirectory::new(Arc::clone(&store)),
            store,
            credentials,
            orchestrator,
            identity,
            pstn_number,
        }
    }

    /// Create a channel: fresh opaque name, secret, and passphrases, plus a
    /// DTMF dial-in code when PSTN is requested.
    pub async fn create_channel(
        &self,
        title: &str,
        enable_pstn: bool,
        bearer: Option<&str>,
    ) -> Result<ShareResponse> {
        if title.trim().is_empty() {
            return Err(Error::BadRequest("title cannot be empty".into()));
        }

        // No-op unless OAuth mode is on
        let user = self.identity.user_from_bearer(bearer)?;

        let name = self.credentials.opaque_id();
        let secret = self.credentials.opaque_id();
        let host_passphrase = self.credentials.opaque_id();
        let viewer_passphrase = self.credentials.opaque_id();
        let dtmf = enable_pstn.then(|| self.credentials.dtmf());

        let channel = ChannelDoc::new(
            title.to_string(),
            name.clone(),
            secret,
            host_passphrase.clone(),
            viewer_passphrase.clone(),
            dtmf.clone(),
        );
        self.store.insert(channel).await?;

        info!(
            channel = %name,
            pstn = enable_pstn,
            creator = user.as_ref().map(|u| u.identifier.as_str()).unwrap_or("anonymous"),
            "Created channel"
        );

        Ok(ShareResponse {
            title: title.to_string(),
            channel: name,
            host_passphrase: Some(host_passphrase),
            viewer_passphrase,
            pstn: dtmf.map(|dtmf| PstnInfo {
                number: self.pstn_number.clone(),
                dtmf,
            }),
        })
    }

    /// Join a channel: resolve the passphrase and issue two independent
    /// identities, one for the main stream and one for screen share.
    pub async fn join_channel(&self, passphrase: &str) -> Result<SessionResponse> {
        let (channel, role) = self.directory.resolve(passphrase).await?;

        let main_user = self.credentials.generate(&channel.name, true)?;
        let screen_share = self.credentials.generate(&channel.name, false)?;

        info!(
            channel = %channel.name,
            is_host = role.is_host(),
            "Issued join credentials"
        );

        Ok(SessionResponse {
            title: channel.title,
            channel: channel.name,
            is_host: role.is_host(),
            main_user,
            screen_share,
            secret: channel.secret,
        })
    }

    /// Re-expose a channel's access details without minting credentials.
    /// Viewer-role callers never see the host passphrase.
    pub async fn share(&self, passphrase: &str) -> Result<ShareResponse> {
        let (channel, role) = self.directory.resolve(passphrase).await?;

        Ok(ShareResponse {
            title: channel.title,
            channel: channel.name,
            host_passphrase: role.is_host().then_some(channel.host_passphrase),
            viewer_passphrase: channel.viewer_passphrase,
            pstn: channel.dtmf.map(|dtmf| PstnInfo {
                number: self.pstn_number.clone(),
                dtmf,
            }),
        })
    }

    /// Start a cloud recording for the channel behind the passphrase.
    ///
    /// Host only. The storage prefix prefers the authenticated caller's
    /// display name over the channel title. The resulting identifier triple
    /// is persisted onto the channel record.
    ///
    /// Decryption uses the channel's own media secret unless `secret`
    /// overrides it; passing an explicit empty string records the channel
    /// as unencrypted.
    pub async fn start_recording(
        &self,
        passphrase: &str,
        secret: Option<&str>,
        bearer: Option<&str>,
    ) -> Result<RecordingStatusResponse> {
        let (channel, role) = self.directory.resolve(passphrase).await?;
        let channel_id = channel
            ._id
            .ok_or_else(|| Error::Internal("stored channel missing id".into()))?;

        let user = self.identity.user_from_bearer(bearer)?;
        let display_name = user.and_then(|u| u.name);
        let prefix = sanitize_title(display_name.as_deref().unwrap_or(&channel.title));

        // The channel's own media secret unless the caller supplied one
        let effective_secret = secret.unwrap_or(&channel.secret);

        let mut attempt = self.orchestrator.new_attempt(&channel.name);
        self.orchestrator.acquire(role, &mut attempt).await?;
        let state = self
            .orchestrator
            .start(role, &mut attempt, &prefix, Some(effective_secret))
            .await?;

        self.store
            .update_recording(channel_id, Some(&state))
            .await?;

        Ok(RecordingStatusResponse { recording: true })
    }

    /// Stop the channel's recording and clear the persisted identifier
    /// triple. Host only; a channel without a complete triple has no active
    /// recording to stop.
    pub async fn stop_recording(&self, passphrase: &str) -> Result<RecordingStatusResponse> {
        let (channel, role) = self.directory.resolve(passphrase).await?;
        if !role.is_host() {
            return Err(Error::Unauthorized(
                "only the host may control recording".into(),
            ));
        }
        let channel_id = channel
            ._id
            .ok_or_else(|| Error::Internal("stored channel missing id".into()))?;

        let state = channel
            .recording_state()
            .ok_or_else(|| Error::RecordingNotActive("no recording on channel".into()))?;

        let mut attempt = self.orchestrator.resume(&channel.name, state);
        self.orchestrator.stop(role, &mut attempt).await?;

        // A stopped recording cannot be stopped again; clearing the triple
        // makes the record unambiguous for the next start.
        self.store.update_recording(channel_id, None).await?;

        Ok(RecordingStatusResponse { recording: false })
    }
}
