//! DTOs for chunk endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::buffer::TimedRecord;

/// One log record
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordDto {
    /// Event time; the time of arrival when omitted
    #[schema(example = "2016-01-01T12:00:00Z")]
    pub time: Option<DateTime<Utc>>,
    /// Record fields
    #[schema(value_type = Object, example = json!({"a": 1}))]
    pub record: Map<String, Value>,
}

impl From<RecordDto> for TimedRecord {
    fn from(dto: RecordDto) -> Self {
        TimedRecord {
            time: dto.time,
            record: dto.record,
        }
    }
}

/// Request body for the chunk endpoint
#[derive(Debug, Deserialize, ToSchema)]
pub struct WriteChunksRequest {
    /// Records to archive
    pub records: Vec<RecordDto>,
}

/// Response body for a successful write
#[derive(Debug, Serialize, ToSchema)]
pub struct WriteChunksResponse {
    /// Object keys written, one per time bucket
    #[schema(example = json!(["log/20160101_0.gz"]))]
    pub keys: Vec<String>,
    /// Success message
    #[schema(example = "1 chunk(s) archived")]
    pub message: String,
}

/// Error response body
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error description
    #[schema(example = "Object `log/20160101.gz` already exists")]
    pub error: String,
}
