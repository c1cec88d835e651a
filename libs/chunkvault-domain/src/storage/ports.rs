//! Ports (trait definitions) for external dependencies
//!
//! This module defines the contract that object store adapters must
//! implement. Following hexagonal architecture, the domain defines what it
//! needs, and the infrastructure provides implementations.
//!
//! ## Static Dispatch
//!
//! We use native Rust async traits with `impl Future` return types instead of
//! `async_trait` to ensure zero-cost abstractions and static dispatch.

use std::future::Future;
use std::path::Path;

use crate::storage::{EncryptionOptions, UploadOptions};
use crate::upload::UploadError;

/// Port for the destination object store
///
/// Implementations must:
/// - Answer existence probes for a full object key
/// - Upload a local file under a key with the given options
/// - Check (and optionally create) the destination bucket
/// - Convert infrastructure errors to `UploadError::Transport`, without
///   retrying; the host pipeline owns retries
pub trait ObjectStore: Send + Sync {
    /// Check whether an object exists under `key`
    ///
    /// # Arguments
    ///
    /// * `key` - Full object key
    /// * `encryption` - Customer-supplied key needed to probe encrypted objects
    ///
    /// # Returns
    ///
    /// `true` if the object exists, `false` otherwise
    fn exists(
        &self,
        key: &str,
        encryption: &EncryptionOptions,
    ) -> impl Future<Output = Result<bool, UploadError>> + Send;

    /// Upload the file at `source` as `key`
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Transport` if the upload fails
    fn upload(
        &self,
        source: &Path,
        key: &str,
        options: &UploadOptions,
    ) -> impl Future<Output = Result<(), UploadError>> + Send;

    /// Make sure the destination bucket exists
    ///
    /// # Errors
    ///
    /// - `UploadError::BucketNotFound` if the bucket is missing and
    ///   `auto_create` is false
    /// - `UploadError::Transport` if a store call fails
    fn ensure_bucket(&self, auto_create: bool)
        -> impl Future<Output = Result<(), UploadError>> + Send;

    /// Reject encryption settings this store cannot use
    ///
    /// Called once at startup so a bad key fails before the first chunk.
    /// Stores without encryption requirements accept anything.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Config` if the settings are unusable
    fn check_encryption(&self, _encryption: &EncryptionOptions) -> Result<(), UploadError> {
        Ok(())
    }
}
