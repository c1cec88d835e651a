use std::collections::BTreeMap;
use std::fmt;

/// Customer-supplied encryption parameters
///
/// Sent with both the existence probe and the upload so they use the same
/// encryption context.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct EncryptionOptions {
    /// Base64 AES-256 key, forwarded verbatim
    pub encryption_key: Option<String>,
}

impl EncryptionOptions {
    pub fn new(encryption_key: Option<String>) -> Self {
        Self { encryption_key }
    }

    pub fn is_enabled(&self) -> bool {
        self.encryption_key.is_some()
    }
}

// The key is a secret; keep it out of logs.
impl fmt::Debug for EncryptionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionOptions")
            .field(
                "encryption_key",
                &self.encryption_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Everything the store needs besides the bytes and the key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOptions {
    pub metadata: BTreeMap<String, String>,
    pub acl: Option<String>,
    pub storage_class: Option<String>,
    pub content_type: String,
    pub content_encoding: Option<String>,
    pub encryption: EncryptionOptions,
}
