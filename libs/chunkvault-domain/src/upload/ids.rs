use std::fmt;

use md5::{Digest, Md5};
use uuid::Uuid;

/// Stable identifier of a buffered chunk
///
/// The host buffer hands out arbitrary byte strings as chunk ids; ChunkId
/// keeps them opaque and only knows how to hash them for `%{hex_random}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChunkId(Vec<u8>);

impl ChunkId {
    /// Generate a new random ChunkId
    pub fn new() -> Self {
        Self(Uuid::new_v4().as_bytes().to_vec())
    }

    /// Wrap an id supplied by the host buffer
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Lowercase hex MD5 digest of the id
    pub fn md5_hex(&self) -> String {
        hex::encode(Md5::digest(&self.0))
    }
}

impl Default for ChunkId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl From<&str> for ChunkId {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_md5_hex_of_known_id() {
        let id = ChunkId::from("unique_id");
        assert_eq!(id.md5_hex(), "69080cee5b6d4c35a8bbf5c48335fe08");
    }

    #[test]
    fn test_generated_ids_differ() {
        assert_ne!(ChunkId::new(), ChunkId::new());
    }

    #[test]
    fn test_display_is_hex() {
        let id = ChunkId::from_bytes(vec![0xde, 0xad]);
        assert_eq!(id.to_string(), "dead");
    }
}
