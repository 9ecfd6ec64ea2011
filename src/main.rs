//! Greenroom - passphrase-gated conferencing backend

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use greenroom::{
    config::Args,
    db::{ChannelStore, MemoryChannelStore, MongoChannelStore, MongoClient},
    recording::{CloudRecordingClient, RecordingApi, RecordingApiConfig},
    server::{self, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("greenroom={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // Print startup banner
    info!("======================================");
    info!("  Greenroom - channel sessions");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("Recording API: {}", args.recording_api_url);
    info!("OAuth: {}", if args.enable_oauth { "enabled" } else { "disabled" });
    info!("======================================");

    // Channel store: MongoDB in production, in-memory in dev mode when
    // MongoDB is unreachable
    let store: Arc<dyn ChannelStore> = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db)
        .await
    {
        Ok(client) => {
            info!("MongoDB connected successfully");
            Arc::new(MongoChannelStore::new(&client).await?)
        }
        Err(e) => {
            if args.dev_mode {
                warn!("MongoDB connection failed (dev mode, using in-memory store): {}", e);
                Arc::new(MemoryChannelStore::new())
            } else {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        }
    };

    // Recording API client; dev mode runs with placeholder credentials
    let api: Arc<dyn RecordingApi> = Arc::new(CloudRecordingClient::new(RecordingApiConfig {
        base_url: args.recording_api_url.clone(),
        app_id: args.app_id(),
        customer_id: args.customer_id.clone().unwrap_or_else(|| "dev".to_string()),
        customer_certificate: args
            .customer_certificate
            .clone()
            .unwrap_or_else(|| "dev".to_string()),
        timeout_ms: args.request_timeout_ms,
    })?);

    let state = Arc::new(AppState::new(args, store, api));
    server::run(state).await?;

    Ok(())
}
