//! Object encoders
//!
//! An encoder turns the raw bytes of a chunk into the byte stream that is
//! uploaded, and reports how the store should label that stream. The set of
//! strategies is closed and picked once from configuration.

#[cfg(feature = "lzo")]
pub mod lzop;
mod object;

use std::fmt;
use std::io::{self, Seek, SeekFrom, Write};
use std::path::Path;
use std::str::FromStr;

use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Deserialize;

use crate::upload::{Chunk, UploadError};

pub use object::EncodedObject;

const TEMPFILE_PREFIX: &str = "chunkvault-";

/// Archive format selected by the `store_as` option
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreAs {
    #[default]
    Gzip,
    Json,
    Text,
    Lzo,
}

impl StoreAs {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Json => "json",
            Self::Text => "text",
            Self::Lzo => "lzo",
        }
    }
}

impl fmt::Display for StoreAs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreAs {
    type Err = UploadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gzip" => Ok(Self::Gzip),
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            "lzo" => Ok(Self::Lzo),
            other => Err(UploadError::config(format!(
                "unsupported store_as '{}'. Supported: gzip, json, text, lzo",
                other
            ))),
        }
    }
}

/// Encoding strategy for chunk payloads
///
/// `transcoding` only exists on the compressing variants: when set, the
/// object is labelled as plain text with a `Content-Encoding` so the store
/// serves it decompressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectEncoder {
    /// Bytes copied unchanged
    Text,
    /// Bytes copied unchanged, labelled as JSON lines
    Json,
    /// gzip member wrapping the bytes
    Gzip { transcoding: bool },
    /// lzop container of LZO1X-1 blocks
    #[cfg(feature = "lzo")]
    Lzo { transcoding: bool },
}

impl ObjectEncoder {
    /// Pick the encoder for a `store_as` value
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Config` for `lzo` when the crate was built
    /// without the `lzo` feature.
    pub fn discover(store_as: StoreAs, transcoding: bool) -> Result<Self, UploadError> {
        match store_as {
            StoreAs::Gzip => Ok(Self::Gzip { transcoding }),
            StoreAs::Json => Ok(Self::Json),
            StoreAs::Text => Ok(Self::Text),
            #[cfg(feature = "lzo")]
            StoreAs::Lzo => Ok(Self::Lzo { transcoding }),
            #[cfg(not(feature = "lzo"))]
            StoreAs::Lzo => Err(UploadError::config(
                "store_as lzo requires the `lzo` feature",
            )),
        }
    }

    /// MIME type reported to the store
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Text => "text/plain",
            Self::Json => "application/json",
            Self::Gzip { transcoding: true } => "text/plain",
            Self::Gzip { transcoding: false } => "application/gzip",
            #[cfg(feature = "lzo")]
            Self::Lzo { transcoding: true } => "text/plain",
            #[cfg(feature = "lzo")]
            Self::Lzo { transcoding: false } => "application/x-lzo",
        }
    }

    /// `Content-Encoding` to advertise, only set when transcoding
    pub fn content_encoding(&self) -> Option<&'static str> {
        match self {
            Self::Gzip { transcoding: true } => Some("gzip"),
            #[cfg(feature = "lzo")]
            Self::Lzo { transcoding: true } => Some("lzop"),
            _ => None,
        }
    }

    /// Extension substituted for `%{file_extension}`
    pub fn file_extension(&self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Json => "json",
            Self::Gzip { .. } => "gz",
            #[cfg(feature = "lzo")]
            Self::Lzo { .. } => "lzo",
        }
    }

    /// Encode the chunk payload into `sink`
    ///
    /// Compressing variants are finalized (trailer or end-of-stream marker
    /// written) before this returns.
    pub fn write<W: Write>(&self, chunk: &Chunk, sink: W) -> io::Result<()> {
        match self {
            Self::Text | Self::Json => chunk.write_to(sink),
            Self::Gzip { .. } => {
                let mut encoder = GzEncoder::new(sink, Compression::default());
                chunk.write_to(&mut encoder)?;
                encoder.finish()?;
                Ok(())
            }
            #[cfg(feature = "lzo")]
            Self::Lzo { .. } => {
                let mut encoder = lzop::LzopWriter::new(sink);
                chunk.write_to(&mut encoder)?;
                encoder.finish()?;
                Ok(())
            }
        }
    }

    /// Encode the chunk into a temporary file in the system temp directory
    ///
    /// The returned guard deletes the file when dropped.
    pub fn create(&self, chunk: &Chunk) -> io::Result<EncodedObject> {
        self.create_in(chunk, std::env::temp_dir())
    }

    /// Encode the chunk into a temporary file inside `dir`
    pub fn create_in(&self, chunk: &Chunk, dir: impl AsRef<Path>) -> io::Result<EncodedObject> {
        let mut tmp = tempfile::Builder::new()
            .prefix(TEMPFILE_PREFIX)
            .tempfile_in(dir)?;

        let file = tmp.as_file_mut();
        self.write(chunk, &mut *file)?;
        file.sync_all()?;
        file.seek(SeekFrom::Start(0))?;

        let len = tmp.as_file().metadata()?.len();
        Ok(EncodedObject::new(tmp, len))
    }
}
