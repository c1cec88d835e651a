//! API routes

pub mod chunks;

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    dto::chunks::{ErrorResponse, RecordDto, WriteChunksRequest, WriteChunksResponse},
    handlers, AppState,
};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::chunks::write_chunks_handler,
        health_handler
    ),
    components(
        schemas(RecordDto, WriteChunksRequest, WriteChunksResponse, ErrorResponse)
    ),
    tags(
        (name = "chunks", description = "Log chunk archiving endpoints"),
        (name = "health", description = "Health check endpoints")
    ),
    info(
        title = "VaultBolt API",
        version = "0.1.0",
        description = "Batches log records into chunks and archives them in object storage",
        contact(
            name = "ChunkVault Team"
        )
    )
)]
pub struct ApiDoc;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(chunks::routes())
        .route("/health", axum::routing::get(health_handler))
        .with_state(state)
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = String)
    ),
    tag = "health"
)]
async fn health_handler() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_documents_chunk_endpoint() {
        let json = ApiDoc::openapi().to_json().unwrap();

        assert!(json.contains("/chunks/{tag}"));
        assert!(json.contains("/health"));
        assert!(json.contains("substituted for `${tag}` in the key path"));
        // `%{tag}` is not a key placeholder
        assert!(!json.contains("%{tag}"));
    }
}
