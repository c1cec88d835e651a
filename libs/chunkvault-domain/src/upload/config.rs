//! Output configuration
//!
//! Parsed once at startup, validated, then only read.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

use crate::encoding::{ObjectEncoder, StoreAs};
use crate::keys::{validate_strftime, KeyTemplate};
use crate::storage::EncryptionOptions;
use crate::upload::UploadError;

pub const DEFAULT_OBJECT_KEY_FORMAT: &str = "%{path}%{time_slice}_%{index}.%{file_extension}";
pub const DEFAULT_TIME_SLICE_FORMAT: &str = "%Y%m%d";
pub const DEFAULT_HEX_RANDOM_LENGTH: usize = 4;
pub const MAX_HEX_RANDOM_LENGTH: usize = 32;

/// Options recognised by the uploader
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Destination bucket name
    pub bucket: String,
    /// Key template, see [`KeyTemplate`]
    pub object_key_format: String,
    /// Prefix substituted for `%{path}`
    pub path: String,
    pub store_as: StoreAs,
    /// Label compressed objects for decompressive transcoding
    pub transcoding: bool,
    pub auto_create_bucket: bool,
    /// Length of `%{hex_random}`, 1..=32
    pub hex_random_length: usize,
    /// Reuse an existing key when the template cannot disambiguate
    pub overwrite: bool,
    /// Skip the existence probe
    pub blind_write: bool,
    pub acl: Option<String>,
    pub storage_class: Option<String>,
    pub encryption_key: Option<String>,
    pub object_metadata: BTreeMap<String, String>,
    /// strftime pattern for `%{time_slice}`
    pub time_slice_format: String,
    /// Render time components in local time instead of UTC
    pub localtime: bool,
    /// Override for `%{hostname}`
    pub hostname: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            object_key_format: DEFAULT_OBJECT_KEY_FORMAT.to_string(),
            path: String::new(),
            store_as: StoreAs::default(),
            transcoding: false,
            auto_create_bucket: true,
            hex_random_length: DEFAULT_HEX_RANDOM_LENGTH,
            overwrite: false,
            blind_write: false,
            acl: None,
            storage_class: None,
            encryption_key: None,
            object_metadata: BTreeMap::new(),
            time_slice_format: DEFAULT_TIME_SLICE_FORMAT.to_string(),
            localtime: false,
            hostname: None,
        }
    }
}

impl OutputConfig {
    /// Config for `bucket` with every other option at its default
    pub fn for_bucket(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Self::default()
        }
    }

    /// Check every option that can be checked without the store
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Config` describing the first invalid option.
    pub fn validate(&self) -> Result<(), UploadError> {
        if self.bucket.trim().is_empty() {
            return Err(UploadError::config("bucket must be set"));
        }

        if !(1..=MAX_HEX_RANDOM_LENGTH).contains(&self.hex_random_length) {
            return Err(UploadError::config(format!(
                "hex_random_length parameter should be between 1 and {} characters, got {}",
                MAX_HEX_RANDOM_LENGTH, self.hex_random_length
            )));
        }

        self.key_template()?;
        self.encoder()?;
        validate_strftime("time_slice_format", &self.time_slice_format)?;
        validate_strftime("path", &self.path)?;

        Ok(())
    }

    pub fn key_template(&self) -> Result<KeyTemplate, UploadError> {
        KeyTemplate::parse(self.object_key_format.clone())
    }

    pub fn encoder(&self) -> Result<ObjectEncoder, UploadError> {
        ObjectEncoder::discover(self.store_as, self.transcoding)
    }

    pub fn encryption(&self) -> EncryptionOptions {
        EncryptionOptions::new(self.encryption_key.clone())
    }
}

impl fmt::Debug for OutputConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputConfig")
            .field("bucket", &self.bucket)
            .field("object_key_format", &self.object_key_format)
            .field("path", &self.path)
            .field("store_as", &self.store_as)
            .field("transcoding", &self.transcoding)
            .field("auto_create_bucket", &self.auto_create_bucket)
            .field("hex_random_length", &self.hex_random_length)
            .field("overwrite", &self.overwrite)
            .field("blind_write", &self.blind_write)
            .field("acl", &self.acl)
            .field("storage_class", &self.storage_class)
            .field("encryption", &self.encryption())
            .field("object_metadata", &self.object_metadata)
            .field("time_slice_format", &self.time_slice_format)
            .field("localtime", &self.localtime)
            .field("hostname", &self.hostname)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OutputConfig::for_bucket("test_bucket");

        assert_eq!(config.bucket, "test_bucket");
        assert_eq!(config.object_key_format, "%{path}%{time_slice}_%{index}.%{file_extension}");
        assert_eq!(config.path, "");
        assert_eq!(config.store_as, StoreAs::Gzip);
        assert!(!config.transcoding);
        assert!(config.auto_create_bucket);
        assert_eq!(config.hex_random_length, 4);
        assert!(!config.overwrite);
        assert!(!config.blind_write);
        assert!(config.acl.is_none());
        assert!(config.storage_class.is_none());
        assert!(config.encryption_key.is_none());
        assert!(config.object_metadata.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_hex_random_length_bounds() {
        let mut config = OutputConfig::for_bucket("b");

        config.hex_random_length = 33;
        assert!(matches!(config.validate(), Err(UploadError::Config(_))));

        config.hex_random_length = 0;
        assert!(matches!(config.validate(), Err(UploadError::Config(_))));

        config.hex_random_length = 32;
        assert!(config.validate().is_ok());

        config.hex_random_length = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_bucket_rejected() {
        let config = OutputConfig::default();
        assert!(matches!(config.validate(), Err(UploadError::Config(_))));
    }

    #[test]
    fn test_malformed_key_format_rejected() {
        let mut config = OutputConfig::for_bucket("b");
        config.object_key_format = "%{path}%{index".to_string();
        assert!(matches!(config.validate(), Err(UploadError::Config(_))));
    }

    #[test]
    fn test_invalid_time_slice_format_rejected() {
        let mut config = OutputConfig::for_bucket("b");
        config.time_slice_format = "%Y%Q".to_string();
        assert!(matches!(config.validate(), Err(UploadError::Config(_))));
    }

    #[test]
    fn test_deserialize_from_json() {
        let config: OutputConfig = serde_json::from_str(
            r#"{
                "bucket": "logs",
                "path": "log/",
                "store_as": "json",
                "overwrite": true,
                "object_metadata": {"team": "infra"}
            }"#,
        )
        .unwrap();

        assert_eq!(config.bucket, "logs");
        assert_eq!(config.store_as, StoreAs::Json);
        assert!(config.overwrite);
        assert_eq!(config.object_metadata.get("team").map(String::as_str), Some("infra"));
        assert_eq!(config.hex_random_length, DEFAULT_HEX_RANDOM_LENGTH);
        assert_eq!(config.encoder().unwrap(), ObjectEncoder::Json);
    }

    #[test]
    fn test_unknown_store_as_rejected_by_serde() {
        let result: Result<OutputConfig, _> =
            serde_json::from_str(r#"{"bucket": "logs", "store_as": "zip"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_redacts_encryption_key() {
        let mut config = OutputConfig::for_bucket("b");
        config.encryption_key = Some("super-secret".to_string());
        assert!(!format!("{:?}", config).contains("super-secret"));
    }
}
