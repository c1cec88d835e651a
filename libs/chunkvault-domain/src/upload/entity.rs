//! Domain entities for chunk uploads
//!
//! A Chunk is the unit handed over by the host buffering layer: an already
//! formatted run of record lines plus the metadata needed to name it.

use bytes::Bytes;
use chrono::{DateTime, Utc};

use super::ChunkId;

/// An immutable batch of pre-formatted record bytes awaiting upload
///
/// Chunks are:
/// - **Opaque**: the payload is never parsed, only copied or compressed
/// - **Cheap to clone**: the payload is a shared `Bytes` buffer
/// - **Read-only**: nothing in the upload path mutates them
///
/// # Example
///
/// ```rust
/// use chunkvault_domain::upload::Chunk;
///
/// let chunk = Chunk::new(b"line 1\nline 2\n".to_vec()).with_tag("app.access");
/// println!("Chunk {} holds {} bytes", chunk.id(), chunk.size());
/// ```
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Stable identifier assigned by the buffer
    id: ChunkId,

    /// Routing tag of the records, if the buffer is keyed by tag
    tag: Option<String>,

    /// Start of the time bucket this chunk was flushed for
    time_key: Option<DateTime<Utc>>,

    /// Formatted record bytes
    data: Bytes,
}

impl Chunk {
    /// Create a chunk with a fresh id and no tag or time key
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            id: ChunkId::new(),
            tag: None,
            time_key: None,
            data: data.into(),
        }
    }

    /// Replace the chunk id
    pub fn with_id(mut self, id: impl Into<ChunkId>) -> Self {
        self.id = id.into();
        self
    }

    /// Attach a routing tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Attach the time bucket key
    pub fn with_time_key(mut self, time_key: DateTime<Utc>) -> Self {
        self.time_key = Some(time_key);
        self
    }

    pub fn id(&self) -> &ChunkId {
        &self.id
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn time_key(&self) -> Option<&DateTime<Utc>> {
        self.time_key.as_ref()
    }

    /// Get the formatted record bytes
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Size of the payload in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Copy the payload into a writer
    pub fn write_to<W: std::io::Write>(&self, mut sink: W) -> std::io::Result<()> {
        sink.write_all(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_chunk_creation() {
        let chunk = Chunk::new(vec![1, 2, 3]);

        assert_eq!(chunk.size(), 3);
        assert!(chunk.tag().is_none());
        assert!(chunk.time_key().is_none());
        assert!(!chunk.is_empty());
    }

    #[test]
    fn test_chunk_builders() {
        let time = Utc.with_ymd_and_hms(2016, 1, 1, 0, 0, 0).unwrap();
        let chunk = Chunk::new("abc")
            .with_id("unique_id")
            .with_tag("test")
            .with_time_key(time);

        assert_eq!(chunk.id(), &ChunkId::from("unique_id"));
        assert_eq!(chunk.tag(), Some("test"));
        assert_eq!(chunk.time_key(), Some(&time));
    }

    #[test]
    fn test_chunk_write_to() {
        let chunk = Chunk::new("hello\n");
        let mut out = Vec::new();
        chunk.write_to(&mut out).unwrap();
        assert_eq!(out, b"hello\n");
    }

    #[test]
    fn test_chunk_clone_shares_payload() {
        let chunk = Chunk::new(vec![7; 1024]);
        let copy = chunk.clone();
        assert_eq!(chunk.data().as_ptr(), copy.data().as_ptr());
        assert_eq!(chunk.id(), copy.id());
    }
}
