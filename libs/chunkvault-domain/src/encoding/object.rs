use std::fs::File;
use std::path::Path;

use tempfile::NamedTempFile;

/// Encoded chunk held in a temporary file
///
/// The file lives exactly as long as this value: dropping it (after a
/// successful upload, on an error, or when the owning task is cancelled)
/// removes the file from disk.
#[derive(Debug)]
pub struct EncodedObject {
    file: NamedTempFile,
    len: u64,
}

impl EncodedObject {
    pub(crate) fn new(file: NamedTempFile, len: u64) -> Self {
        Self { file, len }
    }

    /// Path of the backing file, valid until the object is dropped
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Encoded size in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The open handle, positioned at the start of the encoded bytes
    pub fn file_mut(&mut self) -> &mut File {
        self.file.as_file_mut()
    }
}
