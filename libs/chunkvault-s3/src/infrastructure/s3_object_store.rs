//! S3 Object Store Implementation
//!
//! This module implements the `ObjectStore` port using AWS S3 as the backend.
//! It handles all S3 operations and converts AWS errors to domain errors.

use std::path::Path;

use aws_sdk_s3::{
    primitives::ByteStream,
    types::{BucketLocationConstraint, CreateBucketConfiguration, ObjectCannedAcl, StorageClass},
    Client,
};
use chunkvault_domain::{
    ports::ObjectStore,
    storage::{EncryptionOptions, UploadOptions},
    UploadError,
};
use tracing::{debug, error, info, instrument, warn};

use super::sse::SseCustomer;

/// Region where `CreateBucket` must not carry a location constraint
const DEFAULT_REGION: &str = "us-east-1";

/// S3-based implementation of the ObjectStore port
///
/// This adapter translates domain store operations into AWS S3 API calls.
/// Keys are used exactly as resolved by the domain; the adapter adds no
/// prefix of its own.
///
/// ## Configuration
///
/// The store requires:
/// - An S3 bucket name
/// - An AWS SDK S3 Client (configured with region, credentials, endpoint)
///
/// ## Error Handling
///
/// All AWS SDK errors are converted to `UploadError::Transport` with
/// descriptive error messages and are never retried here.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Create a new S3 object store
    ///
    /// # Arguments
    ///
    /// * `client` - Configured AWS S3 client
    /// * `bucket` - Name of the S3 bucket to use
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use chunkvault_s3::{build_client, S3ObjectStore, S3Settings};
    ///
    /// # async fn example() {
    /// let client = build_client(&S3Settings::default()).await;
    /// let store = S3ObjectStore::new(client, "my-bucket".to_string());
    /// # }
    /// ```
    pub fn new(client: Client, bucket: String) -> Self {
        info!(bucket = %bucket, "Initializing S3ObjectStore");
        Self { client, bucket }
    }

    /// Get the bucket name
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn location_constraint(&self) -> Option<CreateBucketConfiguration> {
        let region = self.client.config().region()?.as_ref().to_string();
        if region == DEFAULT_REGION {
            return None;
        }
        Some(
            CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(region.as_str()))
                .build(),
        )
    }
}

/// A typed `NotFound`, or a bare HTTP 404 from an S3-compatible store
///
/// Only the response status is trusted; error text is never inspected.
fn is_not_found(typed: bool, status: Option<u16>) -> bool {
    typed || status == Some(404)
}

impl ObjectStore for S3ObjectStore {
    fn check_encryption(&self, encryption: &EncryptionOptions) -> Result<(), UploadError> {
        SseCustomer::from_options(encryption)?;
        Ok(())
    }

    #[instrument(skip(self, encryption), fields(bucket = %self.bucket))]
    fn exists(
        &self,
        key: &str,
        encryption: &EncryptionOptions,
    ) -> impl std::future::Future<Output = Result<bool, UploadError>> + Send {
        let client = self.client.clone();
        let bucket = self.bucket.clone();
        let key = key.to_string();
        let sse = SseCustomer::from_options(encryption);

        async move {
            let sse = sse?;
            debug!(key = %key, bucket = %bucket, "Checking if object exists in S3");

            match client
                .head_object()
                .bucket(&bucket)
                .key(&key)
                .set_sse_customer_algorithm(sse.as_ref().map(|s| s.algorithm.to_string()))
                .set_sse_customer_key(sse.as_ref().map(|s| s.key.clone()))
                .set_sse_customer_key_md5(sse.as_ref().map(|s| s.key_md5.clone()))
                .send()
                .await
            {
                Ok(_) => {
                    debug!(key = %key, "Object exists in S3");
                    Ok(true)
                }
                Err(err) => {
                    let typed = err
                        .as_service_error()
                        .map(|e| e.is_not_found())
                        .unwrap_or(false);
                    let status = err.raw_response().map(|r| r.status().as_u16());
                    if is_not_found(typed, status) {
                        debug!(key = %key, "Object does not exist in S3");
                        Ok(false)
                    } else {
                        error!(key = %key, error = ?err, "Failed to check object existence in S3");
                        Err(UploadError::transport(format!(
                            "S3 head_object failed for key '{}': {}",
                            key, err
                        )))
                    }
                }
            }
        }
    }

    #[instrument(skip(self, source, options), fields(bucket = %self.bucket))]
    fn upload(
        &self,
        source: &Path,
        key: &str,
        options: &UploadOptions,
    ) -> impl std::future::Future<Output = Result<(), UploadError>> + Send {
        let client = self.client.clone();
        let bucket = self.bucket.clone();
        let key = key.to_string();
        let source = source.to_path_buf();
        let options = options.clone();

        async move {
            let sse = SseCustomer::from_options(&options.encryption)?;
            debug!(key = %key, bucket = %bucket, source = %source.display(), "Uploading object to S3");

            let body = ByteStream::from_path(&source).await.map_err(|err| {
                error!(key = %key, error = ?err, "Failed to open encoded chunk");
                UploadError::transport(format!(
                    "Failed to read '{}' for key '{}': {}",
                    source.display(),
                    key,
                    err
                ))
            })?;

            let metadata = (!options.metadata.is_empty())
                .then(|| options.metadata.clone().into_iter().collect());

            match client
                .put_object()
                .bucket(&bucket)
                .key(&key)
                .body(body)
                .content_type(&options.content_type)
                .set_content_encoding(options.content_encoding.clone())
                .set_metadata(metadata)
                .set_acl(options.acl.as_deref().map(ObjectCannedAcl::from))
                .set_storage_class(options.storage_class.as_deref().map(StorageClass::from))
                .set_sse_customer_algorithm(sse.as_ref().map(|s| s.algorithm.to_string()))
                .set_sse_customer_key(sse.as_ref().map(|s| s.key.clone()))
                .set_sse_customer_key_md5(sse.as_ref().map(|s| s.key_md5.clone()))
                .send()
                .await
            {
                Ok(_) => {
                    info!(key = %key, "Successfully uploaded object to S3");
                    Ok(())
                }
                Err(err) => {
                    error!(key = %key, error = ?err, "Failed to upload object to S3");
                    Err(UploadError::transport(format!(
                        "S3 put_object failed for key '{}': {}",
                        key, err
                    )))
                }
            }
        }
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    fn ensure_bucket(
        &self,
        auto_create: bool,
    ) -> impl std::future::Future<Output = Result<(), UploadError>> + Send {
        let client = self.client.clone();
        let bucket = self.bucket.clone();
        let location = self.location_constraint();

        async move {
            debug!(bucket = %bucket, "Checking that bucket exists");

            match client.head_bucket().bucket(&bucket).send().await {
                Ok(_) => return Ok(()),
                Err(err) => {
                    let typed = err
                        .as_service_error()
                        .map(|e| e.is_not_found())
                        .unwrap_or(false);
                    let status = err.raw_response().map(|r| r.status().as_u16());
                    if !is_not_found(typed, status) {
                        error!(bucket = %bucket, error = ?err, "Failed to check bucket in S3");
                        return Err(UploadError::transport(format!(
                            "S3 head_bucket failed for bucket '{}': {}",
                            bucket, err
                        )));
                    }
                }
            }

            if !auto_create {
                warn!(bucket = %bucket, "Bucket does not exist and auto_create_bucket is off");
                return Err(UploadError::bucket_not_found(bucket));
            }

            info!(bucket = %bucket, "Creating bucket");
            match client
                .create_bucket()
                .bucket(&bucket)
                .set_create_bucket_configuration(location)
                .send()
                .await
            {
                Ok(_) => {
                    info!(bucket = %bucket, "Successfully created bucket");
                    Ok(())
                }
                Err(err) => {
                    error!(bucket = %bucket, error = ?err, "Failed to create bucket");
                    Err(UploadError::transport(format!(
                        "S3 create_bucket failed for bucket '{}': {}",
                        bucket, err
                    )))
                }
            }
        }
    }
}
