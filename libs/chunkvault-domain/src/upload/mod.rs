//! Upload domain module
//!
//! This module contains the chunk entity, the domain errors, the output
//! configuration and the orchestrator that turns one chunk into one object.

mod config;
mod entity;
mod error;
mod ids;
mod service;

pub use config::{
    OutputConfig, DEFAULT_HEX_RANDOM_LENGTH, DEFAULT_OBJECT_KEY_FORMAT, DEFAULT_TIME_SLICE_FORMAT,
    MAX_HEX_RANDOM_LENGTH,
};
pub use entity::Chunk;
pub use error::UploadError;
pub use ids::ChunkId;
pub use service::ChunkUploader;
