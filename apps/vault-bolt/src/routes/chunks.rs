//! Chunk routes

use axum::{routing::post, Router};

use crate::{handlers::chunks::write_chunks_handler, AppState};

/// Create chunk routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/chunks/:tag", post(write_chunks_handler))
}
