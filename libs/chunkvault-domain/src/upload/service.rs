//! Upload service - Business logic orchestration
//!
//! This module contains the orchestrator that writes one chunk: it resolves
//! the destination key, encodes the chunk into a scoped temporary file and
//! hands both to the object store port.

use std::path::PathBuf;

use tracing::{debug, info, instrument, warn};

use super::{Chunk, OutputConfig, UploadError};
use crate::encoding::{EncodedObject, ObjectEncoder};
use crate::keys::PathResolver;
use crate::ports::ObjectStore;
use crate::storage::{EncryptionOptions, UploadOptions};

/// Service archiving chunks into an object store
///
/// The uploader owns everything fixed at configuration time (encoder, key
/// template, encryption key) and is shared read-only between concurrent
/// `write` calls; each call builds its own key and temporary file.
///
/// ## Static Dispatch
///
/// The service is generic over any `ObjectStore` implementation.
/// The compiler will generate specialized versions for each concrete type,
/// resulting in zero-cost abstractions.
pub struct ChunkUploader<S> {
    store: S,
    config: OutputConfig,
    encoder: ObjectEncoder,
    resolver: PathResolver,
    encryption: EncryptionOptions,
    temp_dir: Option<PathBuf>,
}

impl<S> ChunkUploader<S>
where
    S: ObjectStore,
{
    /// Create a new ChunkUploader from a store and a configuration
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Config` if the configuration is invalid
    pub fn new(store: S, config: OutputConfig) -> Result<Self, UploadError> {
        config.validate()?;

        let encoder = config.encoder()?;
        let resolver = PathResolver::from_config(&config, encoder.file_extension())?;
        let encryption = config.encryption();

        if !resolver.template().is_index_sensitive() && !config.overwrite && !config.blind_write {
            warn!(
                object_key_format = %config.object_key_format,
                "Key format has no %{{index}} or %{{uuid_flush}}; a taken key fails the chunk"
            );
        }

        info!(
            bucket = %config.bucket,
            store_as = %config.store_as,
            object_key_format = %config.object_key_format,
            "Initializing ChunkUploader"
        );

        Ok(Self {
            store,
            config,
            encoder,
            resolver,
            encryption,
            temp_dir: None,
        })
    }

    /// Write temporary containers into `dir` instead of the system temp dir
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Adjust the key resolver, e.g. to cap the retry counter
    pub fn map_resolver(mut self, f: impl FnOnce(PathResolver) -> PathResolver) -> Self {
        self.resolver = f(self.resolver);
        self
    }

    /// Check the encryption settings and the destination bucket, creating
    /// the bucket if configured to
    ///
    /// # Errors
    ///
    /// - `UploadError::Config` if the store rejects the encryption settings
    /// - `UploadError::BucketNotFound` if it is missing and auto-creation is off
    /// - `UploadError::Transport` if the store call fails
    pub async fn start(&self) -> Result<(), UploadError> {
        self.store.check_encryption(&self.encryption)?;
        self.store
            .ensure_bucket(self.config.auto_create_bucket)
            .await
    }

    /// Archive one chunk and return the object key it was stored under
    ///
    /// This is the main entry point. It:
    /// 1. Resolves a free object key
    /// 2. Encodes the chunk into a temporary file
    /// 3. Uploads the file with the configured options
    ///
    /// The temporary file is removed on every exit path.
    ///
    /// # Errors
    ///
    /// - `UploadError::KeyConflict` / `UploadError::KeyExhausted` if no key
    ///   can be chosen
    /// - `UploadError::Encoding` if writing the temporary file fails
    /// - `UploadError::Transport` if a store call fails
    #[instrument(skip(self, chunk), fields(chunk_id = %chunk.id(), chunk_size = chunk.size()))]
    pub async fn write(&self, chunk: &Chunk) -> Result<String, UploadError> {
        let resolution = self
            .resolver
            .resolve(chunk, &self.store, &self.encryption)
            .await?;

        let object = self.encode(chunk).await?;
        let options = self.upload_options();

        debug!(
            time_key = ?chunk.time_key(),
            bucket = %self.config.bucket,
            key = %resolution.key,
            encoded_size = object.len(),
            options = ?options,
            "Uploading chunk"
        );

        self.store
            .upload(object.path(), &resolution.key, &options)
            .await?;

        info!(
            key = %resolution.key,
            probes = resolution.probes,
            overwritten = resolution.overwritten,
            "Successfully uploaded chunk"
        );

        Ok(resolution.key)
    }

    /// Options sent with every upload
    pub fn upload_options(&self) -> UploadOptions {
        UploadOptions {
            metadata: self.config.object_metadata.clone(),
            acl: self.config.acl.clone(),
            storage_class: self.config.storage_class.clone(),
            content_type: self.encoder.content_type().to_string(),
            content_encoding: self.encoder.content_encoding().map(str::to_string),
            encryption: self.encryption.clone(),
        }
    }

    async fn encode(&self, chunk: &Chunk) -> Result<EncodedObject, UploadError> {
        let encoder = self.encoder;
        let chunk = chunk.clone();
        let temp_dir = self.temp_dir.clone();

        // If the caller goes away mid-encode, the finished object is dropped
        // with the join handle and its file removed.
        let encoded = tokio::task::spawn_blocking(move || match temp_dir {
            Some(dir) => encoder.create_in(&chunk, dir),
            None => encoder.create(&chunk),
        })
        .await
        .map_err(|e| UploadError::internal(format!("encode task failed: {}", e)))??;

        Ok(encoded)
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
