//! # ChunkVault Domain Layer
//!
//! This crate contains the pure business logic for archiving buffered log
//! chunks into object storage. It follows hexagonal architecture principles:
//!
//! - **Entities**: Core domain models (Chunk)
//! - **Encoders**: Strategies turning chunk bytes into a content-typed stream
//! - **Keys**: Object key templates and the collision-avoiding resolver
//! - **Ports**: Trait definitions for external dependencies (ObjectStore)
//! - **Services**: The upload orchestrator tying everything together
//!
//! ## Architecture
//!
//! This layer has NO dependencies on a concrete object store (S3, GCS, ...).
//! The store is expressed as a trait (port) implemented by adapter crates.
//!
//! ## Example
//!
//! ```rust
//! use chunkvault_domain::upload::{Chunk, ChunkUploader};
//! use chunkvault_domain::ports::ObjectStore;
//!
//! // The uploader is generic over any ObjectStore implementation
//! async fn example<S: ObjectStore>(uploader: ChunkUploader<S>) {
//!     let chunk = Chunk::new(b"2016-01-01T12:00:00Z\ttest\t{\"a\":1}\n".to_vec());
//!     let key = uploader.write(&chunk).await.unwrap();
//!     println!("Uploaded chunk to: {}", key);
//! }
//! ```

pub mod encoding;
pub mod keys;
pub mod storage;
pub mod upload;

pub use storage::ports;

// Re-export commonly used types
pub use encoding::{EncodedObject, ObjectEncoder, StoreAs};
pub use keys::{KeyTemplate, PathResolver};
pub use ports::ObjectStore;
pub use upload::{Chunk, ChunkId, ChunkUploader, OutputConfig, UploadError};
