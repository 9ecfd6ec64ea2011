//! HTTP server
//!
//! hyper http1 with TokioIo; one spawned task per connection, route dispatch
//! on (method, path).

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::auth::IdentityValidator;
use crate::config::Args;
use crate::credentials::CredentialGenerator;
use crate::db::ChannelStore;
use crate::recording::{RecordingApi, RecordingOrchestrator, RecordingSettings};
use crate::routes;
use crate::services::ChannelSessionService;
use crate::types::Result;

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub channels: ChannelSessionService,
}

impl AppState {
    /// Wire the service graph from config plus the two injectable
    /// collaborators (store and recording API)
    pub fn new(args: Args, store: Arc<dyn ChannelStore>, api: Arc<dyn RecordingApi>) -> Self {
        let credentials =
            CredentialGenerator::new(&args.app_certificate(), args.token_expiry_seconds);
        let orchestrator = RecordingOrchestrator::new(
            api,
            credentials.clone(),
            RecordingSettings::from_args(&args),
        );
        let identity =
            IdentityValidator::new(args.enable_oauth, args.oauth_jwt_secret.as_deref());
        let channels = ChannelSessionService::new(
            store,
            credentials,
            orchestrator,
            identity,
            args.pstn_number.clone(),
        );

        Self { args, channels }
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!("Greenroom listening on {}", state.args.listen);
    if state.args.dev_mode {
        warn!("Development mode enabled - using in-memory store and dev credentials");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, req).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    req: Request<Incoming>,
) -> std::result::Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);

    info!("{} {}", method, path);

    let response = match (method, path.as_str()) {
        (Method::GET, "/health") | (Method::GET, "/healthz") => {
            routes::health_check(Arc::clone(&state))
        }

        (Method::GET, "/version") => routes::version_info(),

        (Method::OPTIONS, _) => preflight_response(),

        (Method::POST, "/api/channel") => {
            routes::handle_create_channel(req, Arc::clone(&state)).await
        }

        (Method::GET, "/api/join") => {
            routes::handle_join(Arc::clone(&state), query.as_deref()).await
        }

        (Method::GET, "/api/share") => {
            routes::handle_share(Arc::clone(&state), query.as_deref()).await
        }

        (Method::POST, "/api/recording/start") => {
            routes::handle_start_recording(req, Arc::clone(&state)).await
        }

        (Method::POST, "/api/recording/stop") => {
            routes::handle_stop_recording(req, Arc::clone(&state)).await
        }

        _ => not_found_response(&path),
    };

    Ok(response)
}

/// CORS preflight response
fn preflight_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Headers", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// Not found response
fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": "Not Found",
        "path": path,
    });

    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}
