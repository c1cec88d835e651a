//! # ChunkVault S3 Adapter
//!
//! Implements the domain `ObjectStore` port on Amazon S3 and S3-compatible
//! stores such as MinIO.

pub mod infrastructure;

pub use infrastructure::{build_client, S3ObjectStore, S3Settings};
