//! Chunk handler

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use chunkvault_domain::UploadError;
use tracing::{error, info, warn};

use crate::{
    buffer::{build_chunks, TimedRecord},
    dto::chunks::{ErrorResponse, WriteChunksRequest, WriteChunksResponse},
    AppState,
};

/// Archive a batch of records under `tag`
///
/// Records are grouped by time bucket and each bucket is written as one
/// object. Buckets are written in order; the first failure aborts the rest.
#[utoipa::path(
    post,
    path = "/chunks/{tag}",
    params(
        ("tag" = String, Path, description = "Event tag, substituted for `${tag}` in the key path")
    ),
    request_body = WriteChunksRequest,
    responses(
        (status = 201, description = "Chunks archived successfully", body = WriteChunksResponse),
        (status = 400, description = "Bad request - no records", body = ErrorResponse),
        (status = 409, description = "Conflict - no free object key", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
        (status = 502, description = "Object store failure", body = ErrorResponse)
    ),
    tag = "chunks"
)]
pub async fn write_chunks_handler(
    State(state): State<AppState>,
    Path(tag): Path<String>,
    Json(payload): Json<WriteChunksRequest>,
) -> impl IntoResponse {
    info!(tag = %tag, records = payload.records.len(), "Received chunk write request");

    if payload.records.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Records cannot be empty".to_string(),
            }),
        )
            .into_response();
    }

    let records: Vec<TimedRecord> = payload.records.into_iter().map(Into::into).collect();
    let chunks = build_chunks(&tag, &records, state.format, state.timekey_secs, Utc::now());

    let mut keys = Vec::with_capacity(chunks.len());
    for chunk in &chunks {
        match state.uploader.write(chunk).await {
            Ok(key) => keys.push(key),
            Err(err) => {
                if !keys.is_empty() {
                    warn!(written = ?keys, "Aborting batch after partial write");
                }
                error!(tag = %tag, chunk_id = %chunk.id(), error = ?err, "Failed to archive chunk");
                let status = status_for(&err);
                return (
                    status,
                    Json(ErrorResponse {
                        error: err.to_string(),
                    }),
                )
                    .into_response();
            }
        }
    }

    info!(tag = %tag, keys = ?keys, "Successfully archived chunks");
    let message = format!("{} chunk(s) archived", keys.len());
    (StatusCode::CREATED, Json(WriteChunksResponse { keys, message })).into_response()
}

/// HTTP status for an upload failure
pub fn status_for(err: &UploadError) -> StatusCode {
    if err.is_key_failure() {
        return StatusCode::CONFLICT;
    }
    match err {
        UploadError::Transport(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_failures_map_to_conflict() {
        assert_eq!(
            status_for(&UploadError::key_conflict("log/20160101.gz")),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&UploadError::key_exhausted(3, "log/2")),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_transport_maps_to_bad_gateway() {
        assert_eq!(
            status_for(&UploadError::transport("connection reset")),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_other_errors_map_to_internal() {
        assert_eq!(
            status_for(&UploadError::config("bad")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&UploadError::bucket_not_found("logs")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&UploadError::Encoding(std::io::Error::other("disk full"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
