//! HTTP handlers for channel and recording operations

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::auth::extract_bearer_token;
use crate::server::AppState;
use crate::types::{Error, Result};

#[derive(Deserialize)]
pub struct CreateChannelRequest {
    pub title: String,
    #[serde(default)]
    pub enable_pstn: bool,
}

#[derive(Deserialize)]
pub struct StartRecordingRequest {
    pub passphrase: String,
    /// Decryption secret override. Omitted means the channel's own media
    /// secret; an explicit `""` means the channel is unencrypted.
    #[serde(default)]
    pub secret: Option<String>,
}

#[derive(Deserialize)]
pub struct StopRecordingRequest {
    pub passphrase: String,
}

/// Serialize a value as a JSON response
pub fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response<Full<Bytes>> {
    let body = serde_json::to_string(value)
        .unwrap_or_else(|_| r#"{"error":"serialization failed"}"#.to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

/// Render an error with its sanitized caller-facing message
pub fn error_response(err: Error) -> Response<Full<Bytes>> {
    debug!(status = %err.status_code(), "Request failed: {}", err);
    let (status, message) = err.into_status_code_and_body();
    json_response(status, &serde_json::json!({ "error": message }))
}

fn render<T: Serialize>(result: Result<T>) -> Response<Full<Bytes>> {
    match result {
        Ok(value) => json_response(StatusCode::OK, &value),
        Err(err) => error_response(err),
    }
}

/// Extract a query parameter value (no percent-decoding; all values handed
/// out by this service are plain alphanumerics)
fn query_param(query: Option<&str>, key: &str) -> Option<String> {
    query?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.to_string())
}

/// Read the bearer token, then consume the body as JSON
async fn read_json<T: serde::de::DeserializeOwned>(
    req: Request<Incoming>,
) -> Result<(T, Option<String>)> {
    let bearer = extract_bearer_token(
        req.headers()
            .get("authorization")
            .and_then(|h| h.to_str().ok()),
    )
    .map(String::from);

    let body = req
        .collect()
        .await
        .map_err(|e| Error::BadRequest(format!("failed to read request body: {}", e)))?
        .to_bytes();
    let parsed = serde_json::from_slice::<T>(&body)
        .map_err(|e| Error::BadRequest(format!("invalid JSON body: {}", e)))?;

    Ok((parsed, bearer))
}

/// POST /api/channel
pub async fn handle_create_channel(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<Full<Bytes>> {
    let (request, bearer) = match read_json::<CreateChannelRequest>(req).await {
        Ok(parsed) => parsed,
        Err(err) => return error_response(err),
    };

    render(
        state
            .channels
            .create_channel(&request.title, request.enable_pstn, bearer.as_deref())
            .await,
    )
}

/// GET /api/join?passphrase=
pub async fn handle_join(state: Arc<AppState>, query: Option<&str>) -> Response<Full<Bytes>> {
    let passphrase = query_param(query, "passphrase").unwrap_or_default();
    render(state.channels.join_channel(&passphrase).await)
}

/// GET /api/share?passphrase=
pub async fn handle_share(state: Arc<AppState>, query: Option<&str>) -> Response<Full<Bytes>> {
    let passphrase = query_param(query, "passphrase").unwrap_or_default();
    render(state.channels.share(&passphrase).await)
}

/// POST /api/recording/start
pub async fn handle_start_recording(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<Full<Bytes>> {
    let (request, bearer) = match read_json::<StartRecordingRequest>(req).await {
        Ok(parsed) => parsed,
        Err(err) => return error_response(err),
    };

    render(
        state
            .channels
            .start_recording(
                &request.passphrase,
                request.secret.as_deref(),
                bearer.as_deref(),
            )
            .await,
    )
}

/// POST /api/recording/stop
pub async fn handle_stop_recording(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<Full<Bytes>> {
    let (request, _) = match read_json::<StopRecordingRequest>(req).await {
        Ok(parsed) => parsed,
        Err(err) => return error_response(err),
    };

    render(state.channels.stop_recording(&request.passphrase).await)
}
