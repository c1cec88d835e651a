//! Collision-avoiding object key resolution
//!
//! Candidates are generated with `index = 0, 1, 2, ...` and probed against
//! the store until one is free. A template without `%{index}` or
//! `%{uuid_flush}` yields the same candidate twice in a row; that repeat is
//! where the overwrite policy decides between reusing the key and failing.

use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::keys::template::{KeyTemplate, Placeholder, TagMap};
use crate::ports::ObjectStore;
use crate::storage::EncryptionOptions;
use crate::upload::{DEFAULT_HEX_RANDOM_LENGTH, DEFAULT_TIME_SLICE_FORMAT, MAX_HEX_RANDOM_LENGTH};
use crate::upload::{Chunk, OutputConfig, UploadError};

/// Largest `%{index}` the resolver will try
pub const DEFAULT_MAX_INDEX: u32 = u32::MAX;

const TAG_PLACEHOLDER: &str = "${tag}";

/// Outcome of a successful resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyResolution {
    /// The object key to upload to
    pub key: String,
    /// `%{index}` value of the chosen candidate
    pub index: u32,
    /// Number of existence probes sent
    pub probes: u64,
    /// True when an existing object will be replaced
    pub overwritten: bool,
}

/// Resolves the destination key of a chunk
#[derive(Debug, Clone)]
pub struct PathResolver {
    template: KeyTemplate,
    file_extension: &'static str,
    path: String,
    time_slice_format: String,
    localtime: bool,
    hex_random_length: usize,
    hostname: String,
    overwrite: bool,
    blind_write: bool,
    max_index: u32,
    uuid_source: fn() -> Uuid,
}

impl PathResolver {
    /// Resolver with an empty path prefix and default options
    pub fn new(template: KeyTemplate, file_extension: &'static str) -> Self {
        Self {
            template,
            file_extension,
            path: String::new(),
            time_slice_format: DEFAULT_TIME_SLICE_FORMAT.to_string(),
            localtime: false,
            hex_random_length: DEFAULT_HEX_RANDOM_LENGTH,
            hostname: local_hostname(),
            overwrite: false,
            blind_write: false,
            max_index: DEFAULT_MAX_INDEX,
            uuid_source: Uuid::new_v4,
        }
    }

    /// Build the resolver described by a validated config
    pub fn from_config(config: &OutputConfig, file_extension: &'static str) -> Result<Self, UploadError> {
        let mut resolver = Self::new(config.key_template()?, file_extension)
            .with_path(config.path.clone())
            .with_time_slice_format(config.time_slice_format.clone())
            .with_localtime(config.localtime)
            .with_hex_random_length(config.hex_random_length)
            .with_overwrite(config.overwrite)
            .with_blind_write(config.blind_write);
        if let Some(hostname) = &config.hostname {
            resolver = resolver.with_hostname(hostname.clone());
        }
        Ok(resolver)
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_time_slice_format(mut self, format: impl Into<String>) -> Self {
        self.time_slice_format = format.into();
        self
    }

    pub fn with_localtime(mut self, localtime: bool) -> Self {
        self.localtime = localtime;
        self
    }

    pub fn with_hex_random_length(mut self, length: usize) -> Self {
        self.hex_random_length = length.clamp(1, MAX_HEX_RANDOM_LENGTH);
        self
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_blind_write(mut self, blind_write: bool) -> Self {
        self.blind_write = blind_write;
        self
    }

    /// Cap the retry counter; the resolver gives up after probing `max_index`
    pub fn with_max_index(mut self, max_index: u32) -> Self {
        self.max_index = max_index;
        self
    }

    /// Replace the generator behind `%{uuid_flush}`
    pub fn with_uuid_source(mut self, uuid_source: fn() -> Uuid) -> Self {
        self.uuid_source = uuid_source;
        self
    }

    pub fn template(&self) -> &KeyTemplate {
        &self.template
    }

    /// `%{hex_random}` for a chunk
    pub fn hex_random(&self, chunk: &Chunk) -> String {
        let mut digest = chunk.id().md5_hex();
        digest.truncate(self.hex_random_length);
        digest
    }

    /// `%{time_slice}` for a chunk, empty when it has no time key
    pub fn time_slice(&self, chunk: &Chunk) -> String {
        match chunk.time_key() {
            Some(time) => self.format_time(time, &self.time_slice_format),
            None => String::new(),
        }
    }

    /// `%{path}` for a chunk: strftime directives and `${tag}` filled in
    ///
    /// Directives are rendered on the configured prefix only; the tag is
    /// inserted afterwards and never read as a time pattern.
    pub fn render_path(&self, chunk: &Chunk) -> String {
        let mut path = match chunk.time_key() {
            Some(time) if self.path.contains('%') => self.format_time(time, &self.path),
            _ => self.path.clone(),
        };
        if let Some(tag) = chunk.tag() {
            path = path.replace(TAG_PLACEHOLDER, tag);
        }
        path
    }

    fn format_time(&self, time: &DateTime<Utc>, format: &str) -> String {
        let mut out = String::new();
        let written = if self.localtime {
            write!(out, "{}", time.with_timezone(&Local).format(format))
        } else {
            write!(out, "{}", time.format(format))
        };
        match written {
            Ok(()) => out,
            Err(_) => {
                warn!(format = %format, "Invalid strftime pattern, using it verbatim");
                format.to_string()
            }
        }
    }

    /// Tags that stay the same for every attempt on one chunk
    pub fn stable_tags(&self, chunk: &Chunk) -> TagMap {
        TagMap::new()
            .with(Placeholder::Path, self.render_path(chunk))
            .with(Placeholder::TimeSlice, self.time_slice(chunk))
            .with(Placeholder::FileExtension, self.file_extension)
            .with(Placeholder::HexRandom, self.hex_random(chunk))
            .with(Placeholder::Hostname, self.hostname.clone())
    }

    /// Expand the candidate for attempt `index`, with a fresh `%{uuid_flush}`
    pub fn candidate(&self, stable: &TagMap, index: u32) -> String {
        let tags = stable
            .clone()
            .with(Placeholder::Index, index.to_string())
            .with(Placeholder::UuidFlush, (self.uuid_source)().to_string());
        self.template.expand(&tags)
    }

    /// Find a key for `chunk` that is free in `store`
    ///
    /// # Errors
    ///
    /// - `UploadError::KeyConflict` when the key exists, the template cannot
    ///   disambiguate, and overwrite is off
    /// - `UploadError::KeyExhausted` when the counter passes `max_index`
    /// - whatever the store's existence probe returns
    pub async fn resolve<S: ObjectStore>(
        &self,
        chunk: &Chunk,
        store: &S,
        encryption: &EncryptionOptions,
    ) -> Result<KeyResolution, UploadError> {
        let stable = self.stable_tags(chunk);
        let mut index: u32 = 0;
        let mut probes: u64 = 0;
        let mut prev: Option<String> = None;

        loop {
            let key = self.candidate(&stable, index);

            if self.blind_write {
                return Ok(KeyResolution {
                    key,
                    index,
                    probes,
                    overwritten: false,
                });
            }

            probes += 1;
            if !store.exists(&key, encryption).await? {
                debug!(key = %key, index, probes, "Resolved object key");
                return Ok(KeyResolution {
                    key,
                    index,
                    probes,
                    overwritten: false,
                });
            }
            debug!(key = %key, index, "Object key already taken");

            if prev.as_deref() == Some(key.as_str()) {
                if self.overwrite {
                    warn!(key = %key, "Object already exists but overwrites it");
                    return Ok(KeyResolution {
                        key,
                        index,
                        probes,
                        overwritten: true,
                    });
                }
                return Err(UploadError::key_conflict(key));
            }

            index = match index.checked_add(1) {
                Some(next) if next <= self.max_index => next,
                _ => return Err(UploadError::key_exhausted(probes, key)),
            };
            prev = Some(key);
        }
    }
}

/// Name of this host, lossily converted to UTF-8
pub fn local_hostname() -> String {
    gethostname::gethostname().to_string_lossy().into_owned()
}

/// Reject strftime patterns chrono cannot render
pub(crate) fn validate_strftime(option: &str, format: &str) -> Result<(), UploadError> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(UploadError::config(format!(
            "{} contains an invalid time directive: '{}'",
            option, format
        )));
    }
    Ok(())
}
