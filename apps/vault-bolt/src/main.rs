//! VaultBolt - Chunk Archiving Service
//!
//! HTTP service that groups incoming log records into time-bucketed chunks
//! and archives each chunk as one object in S3.

mod buffer;
mod config;
mod dto;
mod format;
mod handlers;
mod routes;

use anyhow::Result;
use chunkvault_domain::ChunkUploader;
use chunkvault_s3::{build_client, S3ObjectStore};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{config::AppConfig, format::LineFormat};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub uploader: Arc<ChunkUploader<S3ObjectStore>>,
    pub format: LineFormat,
    pub timekey_secs: u64,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    info!("Starting VaultBolt archiving service");

    let config = AppConfig::from_env()?;

    let s3_client = build_client(&config.s3).await;

    info!(bucket = %config.output.bucket, "Initializing S3 object store");
    let store = S3ObjectStore::new(s3_client, config.output.bucket.clone());

    let uploader = ChunkUploader::new(store, config.output)?;

    // Fail fast when the bucket is missing
    uploader.start().await?;

    let state = AppState {
        uploader: Arc::new(uploader),
        format: config.format,
        timekey_secs: config.timekey_secs,
    };

    // Build HTTP router
    let app = routes::create_router(state);

    info!(addr = %config.bind_addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
