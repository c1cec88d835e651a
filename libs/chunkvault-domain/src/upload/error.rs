//! Domain errors for chunk uploads
//!
//! This module defines all possible errors that can occur while configuring
//! the uploader or writing a chunk. Store adapters convert their own errors
//! into `Transport` so no SDK type leaks into the domain.

use thiserror::Error;

/// Errors that can occur while archiving a chunk
#[derive(Error, Debug)]
pub enum UploadError {
    /// Invalid configuration, surfaced at startup
    #[error("Configuration error: {0}")]
    Config(String),

    /// Destination bucket is absent and auto-creation is disabled
    #[error("Bucket `{0}` does not exist")]
    BucketNotFound(String),

    /// The resolved key already exists and the template cannot disambiguate it
    #[error("Object `{0}` already exists")]
    KeyConflict(String),

    /// The collision-retry counter ran out before a free key was found
    #[error("No free object key after {attempts} attempts (last candidate `{last}`)")]
    KeyExhausted { attempts: u64, last: String },

    /// I/O failure while encoding the chunk into its temporary container
    #[error("Encoding failed: {0}")]
    Encoding(#[from] std::io::Error),

    /// Failure reported by the object store, passed through untouched
    #[error("Transport error: {0}")]
    Transport(String),

    /// An unexpected internal error occurred
    #[error("Internal error: {0}")]
    Internal(String),
}

impl UploadError {
    /// Create a configuration error with a message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a bucket-not-found error
    pub fn bucket_not_found(bucket: impl Into<String>) -> Self {
        Self::BucketNotFound(bucket.into())
    }

    /// Create a key conflict error for the given object key
    pub fn key_conflict(key: impl Into<String>) -> Self {
        Self::KeyConflict(key.into())
    }

    /// Create a key exhausted error
    pub fn key_exhausted(attempts: u64, last: impl Into<String>) -> Self {
        Self::KeyExhausted {
            attempts,
            last: last.into(),
        }
    }

    /// Create a transport error with a message
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create an internal error with a message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// True for the per-chunk key resolution failures
    ///
    /// Callers treat a conflict and an exhausted counter the same way.
    pub fn is_key_failure(&self) -> bool {
        matches!(self, Self::KeyConflict(_) | Self::KeyExhausted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = UploadError::config("hex_random_length must be 1..=32");
        assert!(matches!(err, UploadError::Config(_)));
        assert_eq!(
            err.to_string(),
            "Configuration error: hex_random_length must be 1..=32"
        );
    }

    #[test]
    fn test_key_conflict_error() {
        let err = UploadError::key_conflict("log/20160101.gz");
        assert_eq!(err.to_string(), "Object `log/20160101.gz` already exists");
        assert!(err.is_key_failure());
    }

    #[test]
    fn test_key_exhausted_error() {
        let err = UploadError::key_exhausted(4, "log/3.gz");
        assert!(err.to_string().contains('4'));
        assert!(err.to_string().contains("log/3.gz"));
        assert!(err.is_key_failure());
    }

    #[test]
    fn test_io_error_converts_to_encoding() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err: UploadError = io.into();
        assert!(matches!(err, UploadError::Encoding(_)));
        assert!(!err.is_key_failure());
    }

    #[test]
    fn test_bucket_not_found_error() {
        let err = UploadError::bucket_not_found("logs");
        assert_eq!(err.to_string(), "Bucket `logs` does not exist");
    }
}
