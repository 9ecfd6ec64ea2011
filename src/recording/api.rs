//! Cloud recording API client
//!
//! Typed wire contract for the external recording service plus the HTTP
//! client that speaks it. The JSON field names are the external service's
//! contract and are preserved byte-for-byte; schema drift shows up here as
//! a compile error instead of a silently wrong string key.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::{Error, Result};

// =============================================================================
// Wire contract (matches the cloud recording REST API exactly)
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AcquireClientRequest {
    #[serde(rename = "resourceExpiredHour", skip_serializing_if = "is_zero")]
    pub resource_expired_hour: i32,
}

fn is_zero(value: &i32) -> bool {
    *value == 0
}

/// Body for the acquire endpoint; also the body shape for stop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquireRequest {
    pub cname: String,
    pub uid: String,
    #[serde(rename = "clientRequest")]
    pub client_request: AcquireClientRequest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodingConfig {
    pub height: i32,
    pub width: i32,
    pub bitrate: i32,
    pub fps: i32,
    #[serde(rename = "mixedVideoLayout")]
    pub mixed_video_layout: i32,
    #[serde(rename = "backgroundColor")]
    pub background_color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    #[serde(rename = "maxIdleTime")]
    pub max_idle_time: i32,
    #[serde(rename = "streamTypes")]
    pub stream_types: i32,
    #[serde(rename = "channelType")]
    pub channel_type: i32,
    #[serde(rename = "decryptionMode", skip_serializing_if = "Option::is_none")]
    pub decryption_mode: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(rename = "transcodingConfig")]
    pub transcoding_config: TranscodingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub vendor: i32,
    pub region: i32,
    pub bucket: String,
    #[serde(rename = "accessKey")]
    pub access_key: String,
    #[serde(rename = "secretKey")]
    pub secret_key: String,
    #[serde(rename = "fileNamePrefix")]
    pub file_name_prefix: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartClientRequest {
    pub token: String,
    #[serde(rename = "recordingConfig")]
    pub recording_config: RecordingConfig,
    #[serde(rename = "storageConfig")]
    pub storage_config: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartRequest {
    pub cname: String,
    pub uid: String,
    #[serde(rename = "clientRequest")]
    pub client_request: StartClientRequest,
}

/// Acquire response; the resource id is required to start
#[derive(Debug, Clone, Deserialize)]
pub struct AcquireResponse {
    #[serde(rename = "resourceId")]
    pub resource_id: String,
}

/// Start response; the session id is required to stop
#[derive(Debug, Clone, Deserialize)]
pub struct StartResponse {
    pub sid: String,
}

// =============================================================================
// Client
// =============================================================================

/// Recording service collaborator. The orchestrator talks to this trait so
/// tests can substitute a counting mock.
#[async_trait::async_trait]
pub trait RecordingApi: Send + Sync {
    async fn acquire(&self, request: &AcquireRequest) -> Result<AcquireResponse>;

    async fn start(&self, resource_id: &str, request: &StartRequest) -> Result<StartResponse>;

    /// Stop returns the service's status payload verbatim; callers log it
    /// but do not interpret it.
    async fn stop(
        &self,
        resource_id: &str,
        session_id: &str,
        request: &AcquireRequest,
    ) -> Result<serde_json::Value>;
}

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct RecordingApiConfig {
    /// Base URL of the recording API
    pub base_url: String,
    /// Provider application id (part of the URL path)
    pub app_id: String,
    /// Basic auth username
    pub customer_id: String,
    /// Basic auth password
    pub customer_certificate: String,
    /// Bounded request timeout in milliseconds
    pub timeout_ms: u64,
}

/// HTTP client for the cloud recording service.
///
/// All calls are single-shot with a bounded timeout; nothing is retried
/// here because acquire and start are not guaranteed idempotent.
pub struct CloudRecordingClient {
    config: RecordingApiConfig,
    http: reqwest::Client,
}

impl CloudRecordingClient {
    pub fn new(config: RecordingApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    async fn post_json<B, T>(&self, url: String, body: &B, what: &str) -> Result<T>
    where
        B: Serialize,
        T: serde::de::DeserializeOwned,
    {
        debug!(url = %url, "Calling recording API: {}", what);

        let response = self
            .http
            .post(&url)
            .basic_auth(
                &self.config.customer_id,
                Some(&self.config.customer_certificate),
            )
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("{} request failed: {}", what, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Recording API {} returned non-success", what);
            return Err(Error::Upstream(format!(
                "{} returned status {}",
                what, status
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::Upstream(format!("{} response malformed: {}", what, e)))
    }
}

#[async_trait::async_trait]
impl RecordingApi for CloudRecordingClient {
    async fn acquire(&self, request: &AcquireRequest) -> Result<AcquireResponse> {
        let url = format!(
            "{}/v1/apps/{}/cloud_recording/acquire",
            self.config.base_url, self.config.app_id
        );
        self.post_json(url, request, "acquire").await
    }

    async fn start(&self, resource_id: &str, request: &StartRequest) -> Result<StartResponse> {
        let url = format!(
            "{}/v1/apps/{}/cloud_recording/resourceid/{}/mode/mix/start",
            self.config.base_url, self.config.app_id, resource_id
        );
        self.post_json(url, request, "start").await
    }

    async fn stop(
        &self,
        resource_id: &str,
        session_id: &str,
        request: &AcquireRequest,
    ) -> Result<serde_json::Value> {
        let url = format!(
            "{}/v1/apps/{}/cloud_recording/resourceid/{}/sid/{}/mode/mix/stop",
            self.config.base_url, self.config.app_id, resource_id, session_id
        );
        self.post_json(url, request, "stop").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_acquire_request_field_names() {
        let request = AcquireRequest {
            cname: "chan1".to_string(),
            uid: "123".to_string(),
            client_request: AcquireClientRequest {
                resource_expired_hour: 24,
            },
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "cname": "chan1",
                "uid": "123",
                "clientRequest": { "resourceExpiredHour": 24 }
            })
        );
    }

    #[test]
    fn test_stop_body_omits_zero_expiry() {
        let request = AcquireRequest {
            cname: "chan1".to_string(),
            uid: "123".to_string(),
            client_request: AcquireClientRequest::default(),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["clientRequest"], json!({}));
    }

    #[test]
    fn test_start_request_field_names() {
        let request = StartRequest {
            cname: "chan1".to_string(),
            uid: "123".to_string(),
            client_request: StartClientRequest {
                token: "tok".to_string(),
                recording_config: RecordingConfig {
                    max_idle_time: 30,
                    stream_types: 2,
                    channel_type: 1,
                    decryption_mode: Some(1),
                    secret: Some("s3cret".to_string()),
                    transcoding_config: TranscodingConfig {
                        height: 720,
                        width: 1280,
                        bitrate: 2260,
                        fps: 15,
                        mixed_video_layout: 1,
                        background_color: "#000000".to_string(),
                    },
                },
                storage_config: StorageConfig {
                    vendor: 1,
                    region: 0,
                    bucket: "recordings".to_string(),
                    access_key: "ak".to_string(),
                    secret_key: "sk".to_string(),
                    file_name_prefix: vec!["Title".to_string(), "20260829".to_string()],
                },
            },
        };

        let value = serde_json::to_value(&request).unwrap();
        let client_request = &value["clientRequest"];
        assert_eq!(client_request["token"], "tok");
        assert_eq!(client_request["recordingConfig"]["maxIdleTime"], 30);
        assert_eq!(client_request["recordingConfig"]["streamTypes"], 2);
        assert_eq!(client_request["recordingConfig"]["channelType"], 1);
        assert_eq!(client_request["recordingConfig"]["decryptionMode"], 1);
        assert_eq!(client_request["recordingConfig"]["secret"], "s3cret");
        assert_eq!(
            client_request["recordingConfig"]["transcodingConfig"]["mixedVideoLayout"],
            1
        );
        assert_eq!(
            client_request["recordingConfig"]["transcodingConfig"]["backgroundColor"],
            "#000000"
        );
        assert_eq!(client_request["storageConfig"]["accessKey"], "ak");
        assert_eq!(client_request["storageConfig"]["secretKey"], "sk");
        assert_eq!(
            client_request["storageConfig"]["fileNamePrefix"],
            json!(["Title", "20260829"])
        );
    }

    #[test]
    fn test_unencrypted_start_omits_decryption_fields() {
        let config = RecordingConfig {
            max_idle_time: 30,
            stream_types: 2,
            channel_type: 1,
            decryption_mode: None,
            secret: None,
            transcoding_config: TranscodingConfig {
                height: 720,
                width: 1280,
                bitrate: 2260,
                fps: 15,
                mixed_video_layout: 1,
                background_color: "#000000".to_string(),
            },
        };

        let value = serde_json::to_value(&config).unwrap();
        assert!(value.get("decryptionMode").is_none());
        assert!(value.get("secret").is_none());
    }

    #[test]
    fn test_response_parsing() {
        let acquire: AcquireResponse =
            serde_json::from_value(json!({ "resourceId": "R1" })).unwrap();
        assert_eq!(acquire.resource_id, "R1");

        let start: StartResponse = serde_json::from_value(json!({ "sid": "S1" })).unwrap();
        assert_eq!(start.sid, "S1");

        // Missing required identifiers must fail to parse
        assert!(serde_json::from_value::<AcquireResponse>(json!({})).is_err());
        assert!(serde_json::from_value::<StartResponse>(json!({ "other": 1 })).is_err());
    }
}
