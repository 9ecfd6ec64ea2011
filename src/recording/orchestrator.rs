//! Recording orchestrator
//!
//! Drives the acquire → start → stop sequence against the cloud recording
//! service for one channel. An attempt lives for a single request; there is
//! no cross-request coordination, so two concurrent starts on one channel
//! can both succeed upstream and the last persisted write wins. That race
//! is an accepted caller error class, not one this module prevents.

use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::Role;
use crate::config::Args;
use crate::credentials::{CredentialGenerator, JoinCredential};
use crate::db::schemas::RecordingState;
use crate::recording::api::{
    AcquireClientRequest, AcquireRequest, RecordingApi, RecordingConfig, StartClientRequest,
    StartRequest, StorageConfig, TranscodingConfig,
};
use crate::types::{Error, Result};

/// Orchestration phase of one recording attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Acquiring,
    Acquired,
    Starting,
    Recording,
    Stopping,
    Stopped,
}

/// Storage and recording settings applied to every start call
#[derive(Debug, Clone)]
pub struct RecordingSettings {
    pub vendor: i32,
    pub region: i32,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    /// Hours before an unused acquired resource expires upstream
    pub resource_expired_hours: i32,
    /// Seconds of channel silence before the service stops on its own
    pub max_idle_time: i32,
}

impl RecordingSettings {
    pub fn from_args(args: &Args) -> Self {
        Self {
            vendor: args.recording_vendor,
            region: args.recording_region,
            bucket: args.bucket_name.clone(),
            access_key: args.bucket_access_key.clone(),
            secret_key: args.bucket_access_secret.clone(),
            resource_expired_hours: 24,
            max_idle_time: 30,
        }
    }
}

/// State of one in-flight recording attempt, scoped to a single request
#[derive(Debug)]
pub struct RecordingAttempt {
    channel: String,
    phase: Phase,
    credential: Option<JoinCredential>,
    resource_id: Option<String>,
    /// Full identifier triple, present once the attempt reaches `Recording`
    state: Option<RecordingState>,
}

impl RecordingAttempt {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn resource_id(&self) -> Option<&str> {
        self.resource_id.as_deref()
    }
}

/// Drives recording operations against the external service
pub struct RecordingOrchestrator {
    api: Arc<dyn RecordingApi>,
    credentials: CredentialGenerator,
    settings: RecordingSettings,
}

impl RecordingOrchestrator {
    pub fn new(
        api: Arc<dyn RecordingApi>,
        credentials: CredentialGenerator,
        settings: RecordingSettings,
    ) -> Self {
        Self {
            api,
            credentials,
            settings,
        }
    }

    /// Start a fresh attempt for a channel
    pub fn new_attempt(&self, channel: &str) -> RecordingAttempt {
        RecordingAttempt {
            channel: channel.to_string(),
            phase: Phase::Idle,
            credential: None,
            resource_id: None,
            state: None,
        }
    }

    /// Resume an attempt at `Recording` from a persisted identifier triple,
    /// so a later request can drive the stop transition.
    pub fn resume(&self, channel: &str, state: RecordingState) -> RecordingAttempt {
        RecordingAttempt {
            channel: channel.to_string(),
            phase: Phase::Recording,
            credential: None,
            resource_id: Some(state.resource_id.clone()),
            state: Some(state),
        }
    }

    /// Only the host may drive recording; checked before any credential or
    /// network work.
    fn authorize(role: Role) -> Result<()> {
        if !role.is_host() {
            return Err(Error::Unauthorized(
                "only the host may control recording".into(),
            ));
        }
        Ok(())
    }

    /// Acquire a recording resource (`Idle → Acquiring → Acquired`).
    ///
    /// Generates a fresh recording-bot credential and asks the service for
    /// a resource. Any failure rolls the attempt back to `Idle` with no
    /// partial state kept.
    pub async fn acquire(&self, role: Role, attempt: &mut RecordingAttempt) -> Result<()> {
        Self::authorize(role)?;

        if attempt.phase != Phase::Idle {
            return Err(Error::Internal(format!(
                "acquire called in phase {:?}",
                attempt.phase
            )));
        }
        attempt.phase = Phase::Acquiring;

        let result = self.do_acquire(attempt).await;
        if result.is_err() {
            attempt.phase = Phase::Idle;
            attempt.credential = None;
            attempt.resource_id = None;
        }
        result
    }

    async fn do_acquire(&self, attempt: &mut RecordingAttempt) -> Result<()> {
        let credential = self.credentials.generate(&attempt.channel, false)?;

        let request = AcquireRequest {
            cname: attempt.channel.clone(),
            uid: credential.uid.to_string(),
            client_request: AcquireClientRequest {
                resource_expired_hour: self.settings.resource_expired_hours,
            },
        };

        let response = self.api.acquire(&request).await?;

        info!(
            channel = %attempt.channel,
            uid = credential.uid,
            "Acquired recording resource"
        );

        attempt.credential = Some(credential);
        attempt.resource_id = Some(response.resource_id);
        attempt.phase = Phase::Acquired;
        Ok(())
    }

    /// Start the recording (`Acquired → Starting → Recording`).
    ///
    /// On success the resource id, session id, and bot uid become the
    /// durable [`RecordingState`] the caller persists. On failure the
    /// attempt returns to `Acquired`: the resource is not released (the
    /// service reclaims it via its own idle timeout) and the caller may
    /// retry start against it or re-acquire.
    pub async fn start(
        &self,
        role: Role,
        attempt: &mut RecordingAttempt,
        file_prefix: &str,
        secret: Option<&str>,
    ) -> Result<RecordingState> {
        Self::authorize(role)?;

        if attempt.phase != Phase::Acquired {
            return Err(Error::Internal(format!(
                "start called in phase {:?}",
                attempt.phase
            )));
        }
        attempt.phase = Phase::Starting;

        match self.do_start(attempt, file_prefix, secret).await {
            Ok(state) => {
                attempt.state = Some(state.clone());
                attempt.phase = Phase::Recording;
                Ok(state)
            }
            Err(e) => {
                warn!(channel = %attempt.channel, "Start failed, resource left for retry");
                attempt.phase = Phase::Acquired;
                Err(e)
            }
        }
    }

    async fn do_start(
        &self,
        attempt: &RecordingAttempt,
        file_prefix: &str,
        secret: Option<&str>,
    ) -> Result<RecordingState> {
        let credential = attempt
            .credential
            .as_ref()
            .ok_or_else(|| Error::Internal("acquired attempt missing credential".into()))?;
        let resource_id = attempt
            .resource_id
            .as_ref()
            .ok_or_else(|| Error::Internal("acquired attempt missing resource id".into()))?;

        let now = chrono::Utc::now();
        let date = now.format("%Y%m%d").to_string();
        let time = now.format("%H%M%S").to_string();

        let transcoding_config = TranscodingConfig {
            height: 720,
            width: 1280,
            bitrate: 2260,
            fps: 15,
            mixed_video_layout: 1,
            background_color: "#000000".to_string(),
        };

        // Decryption fields only when the channel media path is encrypted
        let (decryption_mode, secret) = match secret {
            Some(s) if !s.is_empty() => (Some(1), Some(s.to_string())),
            _ => (None, None),
        };

        let request = StartRequest {
            cname: attempt.channel.clone(),
            uid: credential.uid.to_string(),
            client_request: StartClientRequest {
                token: credential.token.clone(),
                recording_config: RecordingConfig {
                    max_idle_time: self.settings.max_idle_time,
                    stream_types: 2,
                    channel_type: 1,
                    decryption_mode,
                    secret,
                    transcoding_config,
                },
                storage_config: StorageConfig {
                    vendor: self.settings.vendor,
                    region: self.settings.region,
                    bucket: self.settings.bucket.clone(),
                    access_key: self.settings.access_key.clone(),
                    secret_key: self.settings.secret_key.clone(),
                    file_name_prefix: vec![file_prefix.to_string(), date, time],
                },
            },
        };

        let response = self.api.start(resource_id, &request).await?;

        info!(
            channel = %attempt.channel,
            resource_id = %resource_id,
            session_id = %response.sid,
            "Recording started"
        );

        Ok(RecordingState {
            resource_id: resource_id.clone(),
            session_id: response.sid,
            uid: credential.uid,
        })
    }

    /// Stop a recording (`Recording → Stopping → Stopped`).
    ///
    /// The attempt must carry the full identifier triple; the composite type
    /// enforces that. The service's status payload is logged and returned
    /// verbatim; persisted state changes are the caller's concern. On
    /// failure the attempt returns to `Recording` so the caller may retry.
    pub async fn stop(
        &self,
        role: Role,
        attempt: &mut RecordingAttempt,
    ) -> Result<serde_json::Value> {
        Self::authorize(role)?;

        if attempt.phase != Phase::Recording {
            return Err(Error::Internal(format!(
                "stop called in phase {:?}",
                attempt.phase
            )));
        }
        let state = attempt
            .state
            .clone()
            .ok_or_else(|| Error::Internal("recording attempt missing identifiers".into()))?;
        attempt.phase = Phase::Stopping;

        let request = AcquireRequest {
            cname: attempt.channel.clone(),
            uid: state.uid.to_string(),
            client_request: AcquireClientRequest::default(),
        };

        let response = match self
            .api
            .stop(&state.resource_id, &state.session_id, &request)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                attempt.phase = Phase::Recording;
                return Err(e);
            }
        };

        info!(
            channel = %attempt.channel,
            resource_id = %state.resource_id,
            session_id = %state.session_id,
            response = %response,
            "Recording stopped"
        );

        attempt.phase = Phase::Stopped;
        Ok(response)
    }
}

/// Sanitize a human title for use as a storage file-name prefix: strip
/// everything outside `[A-Za-z0-9]` and truncate to 100 characters.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(100)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::api::{AcquireResponse, StartResponse};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    /// Counting mock of the recording service
    #[derive(Default)]
    struct MockApi {
        acquire_calls: AtomicUsize,
        start_calls: AtomicUsize,
        stop_calls: AtomicUsize,
        fail_acquire: bool,
        fail_start: bool,
        last_start: Mutex<Option<StartRequest>>,
        last_stop: Mutex<Option<(String, String, AcquireRequest)>>,
    }

    #[async_trait::async_trait]
    impl RecordingApi for MockApi {
        async fn acquire(&self, _request: &AcquireRequest) -> Result<AcquireResponse> {
            self.acquire_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_acquire {
                return Err(Error::Upstream("acquire refused".into()));
            }
            Ok(AcquireResponse {
                resource_id: "R1".to_string(),
            })
        }

        async fn start(&self, _resource_id: &str, request: &StartRequest) -> Result<StartResponse> {
            self.start_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_start {
                return Err(Error::Upstream("start refused".into()));
            }
            *self.last_start.lock().await = Some(request.clone());
            Ok(StartResponse {
                sid: "S1".to_string(),
            })
        }

        async fn stop(
            &self,
            resource_id: &str,
            session_id: &str,
            request: &AcquireRequest,
        ) -> Result<serde_json::Value> {
            self.stop_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_stop.lock().await = Some((
                resource_id.to_string(),
                session_id.to_string(),
                request.clone(),
            ));
            Ok(serde_json::json!({ "status": 0 }))
        }
    }

    fn orchestrator(api: Arc<MockApi>) -> RecordingOrchestrator {
        RecordingOrchestrator::new(
            api,
            CredentialGenerator::new("test-secret", 3600),
            RecordingSettings {
                vendor: 1,
                region: 0,
                bucket: "recordings".to_string(),
                access_key: "ak".to_string(),
                secret_key: "sk".to_string(),
                resource_expired_hours: 24,
                max_idle_time: 30,
            },
        )
    }

    #[tokio::test]
    async fn test_acquire_then_start_yields_full_state() {
        let api = Arc::new(MockApi::default());
        let orchestrator = orchestrator(Arc::clone(&api));

        let mut attempt = orchestrator.new_attempt("chan1");
        assert_eq!(attempt.phase(), Phase::Idle);

        orchestrator.acquire(Role::Host, &mut attempt).await.unwrap();
        assert_eq!(attempt.phase(), Phase::Acquired);
        assert_eq!(attempt.resource_id(), Some("R1"));

        let state = orchestrator
            .start(Role::Host, &mut attempt, "Standup", None)
            .await
            .unwrap();
        assert_eq!(attempt.phase(), Phase::Recording);
        assert_eq!(state.resource_id, "R1");
        assert_eq!(state.session_id, "S1");
        assert_ne!(state.uid, 0);
    }

    #[tokio::test]
    async fn test_viewer_is_rejected_before_any_call() {
        let api = Arc::new(MockApi::default());
        let orchestrator = orchestrator(Arc::clone(&api));

        let mut attempt = orchestrator.new_attempt("chan1");
        let result = orchestrator.acquire(Role::Viewer, &mut attempt).await;
        assert!(matches!(result, Err(Error::Unauthorized(_))));

        let state = RecordingState {
            resource_id: "R1".to_string(),
            session_id: "S1".to_string(),
            uid: 7,
        };
        let mut attempt = orchestrator.resume("chan1", state);
        let result = orchestrator.stop(Role::Viewer, &mut attempt).await;
        assert!(matches!(result, Err(Error::Unauthorized(_))));

        assert_eq!(api.acquire_calls.load(Ordering::SeqCst), 0);
        assert_eq!(api.start_calls.load(Ordering::SeqCst), 0);
        assert_eq!(api.stop_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_acquire_failure_resets_to_idle() {
        let api = Arc::new(MockApi {
            fail_acquire: true,
            ..Default::default()
        });
        let orchestrator = orchestrator(Arc::clone(&api));

        let mut attempt = orchestrator.new_attempt("chan1");
        let result = orchestrator.acquire(Role::Host, &mut attempt).await;
        assert!(matches!(result, Err(Error::Upstream(_))));
        assert_eq!(attempt.phase(), Phase::Idle);
        assert!(attempt.resource_id().is_none());
    }

    #[tokio::test]
    async fn test_start_failure_keeps_acquired_resource() {
        let api = Arc::new(MockApi {
            fail_start: true,
            ..Default::default()
        });
        let orchestrator = orchestrator(Arc::clone(&api));

        let mut attempt = orchestrator.new_attempt("chan1");
        orchestrator.acquire(Role::Host, &mut attempt).await.unwrap();

        let result = orchestrator
            .start(Role::Host, &mut attempt, "Standup", None)
            .await;
        assert!(matches!(result, Err(Error::Upstream(_))));
        // Resource is not released; the caller may retry start
        assert_eq!(attempt.phase(), Phase::Acquired);
        assert_eq!(attempt.resource_id(), Some("R1"));
    }

    #[tokio::test]
    async fn test_start_out_of_order_is_rejected() {
        let api = Arc::new(MockApi::default());
        let orchestrator = orchestrator(Arc::clone(&api));

        let mut attempt = orchestrator.new_attempt("chan1");
        let result = orchestrator
            .start(Role::Host, &mut attempt, "Standup", None)
            .await;
        assert!(matches!(result, Err(Error::Internal(_))));
        assert_eq!(api.start_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_secret_enables_decryption_config() {
        let api = Arc::new(MockApi::default());
        let orchestrator = orchestrator(Arc::clone(&api));

        let mut attempt = orchestrator.new_attempt("chan1");
        orchestrator.acquire(Role::Host, &mut attempt).await.unwrap();
        orchestrator
            .start(Role::Host, &mut attempt, "Standup", Some("media-secret"))
            .await
            .unwrap();

        let request = api.last_start.lock().await.clone().unwrap();
        let config = &request.client_request.recording_config;
        assert_eq!(config.decryption_mode, Some(1));
        assert_eq!(config.secret.as_deref(), Some("media-secret"));

        // Empty secret means an unencrypted channel
        let mut attempt = orchestrator.new_attempt("chan2");
        orchestrator.acquire(Role::Host, &mut attempt).await.unwrap();
        orchestrator
            .start(Role::Host, &mut attempt, "Standup", Some(""))
            .await
            .unwrap();

        let request = api.last_start.lock().await.clone().unwrap();
        let config = &request.client_request.recording_config;
        assert_eq!(config.decryption_mode, None);
        assert_eq!(config.secret, None);
    }

    #[tokio::test]
    async fn test_file_prefix_carries_sanitized_title_and_timestamp() {
        let api = Arc::new(MockApi::default());
        let orchestrator = orchestrator(Arc::clone(&api));

        let mut attempt = orchestrator.new_attempt("chan1");
        orchestrator.acquire(Role::Host, &mut attempt).await.unwrap();
        orchestrator
            .start(Role::Host, &mut attempt, "MyChannel1", None)
            .await
            .unwrap();

        let request = api.last_start.lock().await.clone().unwrap();
        let prefix = &request.client_request.storage_config.file_name_prefix;
        assert_eq!(prefix.len(), 3);
        assert_eq!(prefix[0], "MyChannel1");
        assert_eq!(prefix[1].len(), 8); // YYYYMMDD
        assert_eq!(prefix[2].len(), 6); // HHMMSS
    }

    #[tokio::test]
    async fn test_stop_sends_exact_triple() {
        let api = Arc::new(MockApi::default());
        let orchestrator = orchestrator(Arc::clone(&api));

        let state = RecordingState {
            resource_id: "R1".to_string(),
            session_id: "S1".to_string(),
            uid: 424242,
        };
        let mut attempt = orchestrator.resume("chan1", state);
        assert_eq!(attempt.phase(), Phase::Recording);
        orchestrator.stop(Role::Host, &mut attempt).await.unwrap();
        assert_eq!(attempt.phase(), Phase::Stopped);

        let (resource_id, session_id, request) = api.last_stop.lock().await.clone().unwrap();
        assert_eq!(resource_id, "R1");
        assert_eq!(session_id, "S1");
        assert_eq!(request.cname, "chan1");
        assert_eq!(request.uid, "424242");
    }

    #[test]
    fn test_sanitize_title_strips_and_truncates() {
        assert_eq!(sanitize_title("My Channel! #1"), "MyChannel1");

        let long: String = "a!".repeat(150);
        let sanitized = sanitize_title(&long);
        assert_eq!(sanitized.len(), 100);
        assert!(sanitized.chars().all(|c| c == 'a'));

        assert_eq!(sanitize_title(""), "");
        assert_eq!(sanitize_title("!!!"), "");
    }
}
