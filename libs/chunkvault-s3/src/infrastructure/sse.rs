//! SSE-C (customer-provided key) request parameters

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use md5::{Digest, Md5};
use thiserror::Error;

use chunkvault_domain::storage::EncryptionOptions;
use chunkvault_domain::UploadError;

/// Algorithm S3 accepts for customer-provided keys
pub const SSE_CUSTOMER_ALGORITHM: &str = "AES256";

const AES256_KEY_LEN: usize = 32;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SseCustomerError {
    #[error("encryption_key is not valid base64")]
    InvalidBase64,

    #[error("encryption_key must decode to {expected} bytes, got {actual}")]
    WrongLength { expected: usize, actual: usize },
}

impl From<SseCustomerError> for UploadError {
    fn from(err: SseCustomerError) -> Self {
        UploadError::config(err.to_string())
    }
}

/// The three SSE-C headers for one request
#[derive(Clone, PartialEq, Eq)]
pub struct SseCustomer {
    pub algorithm: &'static str,
    pub key: String,
    pub key_md5: String,
}

impl SseCustomer {
    /// Build headers from a base64 AES-256 key
    pub fn from_key(key: &str) -> Result<Self, SseCustomerError> {
        let raw = STANDARD
            .decode(key.trim())
            .map_err(|_| SseCustomerError::InvalidBase64)?;
        if raw.len() != AES256_KEY_LEN {
            return Err(SseCustomerError::WrongLength {
                expected: AES256_KEY_LEN,
                actual: raw.len(),
            });
        }

        Ok(Self {
            algorithm: SSE_CUSTOMER_ALGORITHM,
            key: key.trim().to_string(),
            key_md5: STANDARD.encode(Md5::digest(&raw)),
        })
    }

    /// Headers for the configured key, if any
    pub fn from_options(options: &EncryptionOptions) -> Result<Option<Self>, SseCustomerError> {
        options
            .encryption_key
            .as_deref()
            .map(Self::from_key)
            .transpose()
    }
}

impl std::fmt::Debug for SseCustomer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SseCustomer")
            .field("algorithm", &self.algorithm)
            .field("key_md5", &self.key_md5)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY=";

    #[test]
    fn test_key_md5_is_computed_from_raw_key() {
        let sse = SseCustomer::from_key(KEY).unwrap();
        assert_eq!(sse.algorithm, "AES256");
        assert_eq!(sse.key, KEY);
        assert_eq!(sse.key_md5, "hRasmdxgYDKV3nvbahU1MA==");
    }

    #[test]
    fn test_invalid_base64_rejected() {
        assert_eq!(
            SseCustomer::from_key("not base64!").unwrap_err(),
            SseCustomerError::InvalidBase64
        );
    }

    #[test]
    fn test_short_key_rejected() {
        let err = SseCustomer::from_key("YWFh").unwrap_err();
        assert_eq!(
            err,
            SseCustomerError::WrongLength {
                expected: 32,
                actual: 3
            }
        );
        assert!(matches!(UploadError::from(err), UploadError::Config(_)));
    }

    #[test]
    fn test_no_key_no_headers() {
        let none = SseCustomer::from_options(&EncryptionOptions::default()).unwrap();
        assert!(none.is_none());

        let some =
            SseCustomer::from_options(&EncryptionOptions::new(Some(KEY.to_string()))).unwrap();
        assert!(some.is_some());
    }

    #[test]
    fn test_debug_hides_key() {
        let sse = SseCustomer::from_key(KEY).unwrap();
        assert!(!format!("{:?}", sse).contains(KEY));
    }
}
