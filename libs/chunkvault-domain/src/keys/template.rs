//! Key templates and their placeholders

use std::collections::HashMap;
use std::fmt;

use regex::{Captures, Regex};

use crate::upload::UploadError;

/// Placeholders recognised in an object key template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    Path,
    TimeSlice,
    Index,
    FileExtension,
    HexRandom,
    Hostname,
    UuidFlush,
}

impl Placeholder {
    pub const ALL: [Placeholder; 7] = [
        Self::Path,
        Self::TimeSlice,
        Self::Index,
        Self::FileExtension,
        Self::HexRandom,
        Self::Hostname,
        Self::UuidFlush,
    ];

    /// Name between the braces, e.g. `time_slice`
    pub fn name(&self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::TimeSlice => "time_slice",
            Self::Index => "index",
            Self::FileExtension => "file_extension",
            Self::HexRandom => "hex_random",
            Self::Hostname => "hostname",
            Self::UuidFlush => "uuid_flush",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Literal token as written in templates, e.g. `%{time_slice}`
    pub fn token(&self) -> String {
        format!("%{{{}}}", self.name())
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{{{}}}", self.name())
    }
}

/// Values for one expansion attempt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagMap(HashMap<Placeholder, String>);

impl TagMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, placeholder: Placeholder, value: impl Into<String>) {
        self.0.insert(placeholder, value.into());
    }

    pub fn with(mut self, placeholder: Placeholder, value: impl Into<String>) -> Self {
        self.insert(placeholder, value);
        self
    }

    pub fn get(&self, placeholder: Placeholder) -> Option<&str> {
        self.0.get(&placeholder).map(String::as_str)
    }
}

/// A parsed object key format such as `%{path}%{time_slice}_%{index}.%{file_extension}`
///
/// Expansion is a single pass over the original string: every `%{name}`
/// token is matched once and replaced by its value, so a value that happens
/// to contain a token is never expanded again. Tokens with an unknown name,
/// or with no value in the map, are kept verbatim.
#[derive(Debug, Clone)]
pub struct KeyTemplate {
    source: String,
    pattern: Regex,
}

impl KeyTemplate {
    /// Parse a template string
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Config` when a `%{` is never closed.
    pub fn parse(source: impl Into<String>) -> Result<Self, UploadError> {
        let source = source.into();

        for (start, _) in source.match_indices("%{") {
            if !source[start + 2..].contains('}') {
                return Err(UploadError::config(format!(
                    "object_key_format has an unterminated placeholder at byte {}: '{}'",
                    start, source
                )));
            }
        }

        let pattern = Regex::new(r"%\{([^{}]*)\}")
            .map_err(|e| UploadError::internal(format!("placeholder pattern: {}", e)))?;

        Ok(Self { source, pattern })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the template mentions `placeholder`
    pub fn contains(&self, placeholder: Placeholder) -> bool {
        self.source.contains(&placeholder.token())
    }

    /// Whether successive collision retries can produce different keys
    pub fn is_index_sensitive(&self) -> bool {
        self.contains(Placeholder::Index) || self.contains(Placeholder::UuidFlush)
    }

    pub fn expand(&self, tags: &TagMap) -> String {
        self.pattern
            .replace_all(&self.source, |caps: &Captures<'_>| {
                match Placeholder::from_name(&caps[1]).and_then(|p| tags.get(p)) {
                    Some(value) => value.to_string(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

impl fmt::Display for KeyTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl PartialEq for KeyTemplate {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for KeyTemplate {}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_tags() -> TagMap {
        TagMap::new()
            .with(Placeholder::Path, "log/")
            .with(Placeholder::TimeSlice, "20160101")
            .with(Placeholder::Index, "0")
            .with(Placeholder::FileExtension, "gz")
    }

    #[test]
    fn test_expand_default_format() {
        let template = KeyTemplate::parse("%{path}%{time_slice}_%{index}.%{file_extension}").unwrap();
        assert_eq!(template.expand(&default_tags()), "log/20160101_0.gz");
    }

    #[test]
    fn test_expand_all_placeholders() {
        let template = KeyTemplate::parse(
            "%{path}%{file_extension}/%{hex_random}/%{hostname}/%{index}/%{time_slice}/%{uuid_flush}",
        )
        .unwrap();
        let tags = default_tags()
            .with(Placeholder::HexRandom, "6908")
            .with(Placeholder::Hostname, "test-hostname")
            .with(Placeholder::Index, "1")
            .with(Placeholder::UuidFlush, "uuid2");

        assert_eq!(
            template.expand(&tags),
            "log/gz/6908/test-hostname/1/20160101/uuid2"
        );
    }

    #[test]
    fn test_unknown_placeholder_left_verbatim() {
        let template = KeyTemplate::parse("%{path}%{tag}/%{index}").unwrap();
        assert_eq!(template.expand(&default_tags()), "log/%{tag}/0");
    }

    #[test]
    fn test_missing_value_left_verbatim() {
        let template = KeyTemplate::parse("%{hostname}-%{index}").unwrap();
        assert_eq!(template.expand(&default_tags()), "%{hostname}-0");
    }

    #[test]
    fn test_substituted_values_are_not_reexpanded() {
        let template = KeyTemplate::parse("%{path}%{index}").unwrap();
        let tags = TagMap::new()
            .with(Placeholder::Path, "a/%{index}/")
            .with(Placeholder::Index, "7");
        assert_eq!(template.expand(&tags), "a/%{index}/7");
    }

    #[test]
    fn test_repeated_placeholder() {
        let template = KeyTemplate::parse("%{index}-%{index}").unwrap();
        assert_eq!(template.expand(&default_tags()), "0-0");
    }

    #[test]
    fn test_template_without_placeholders() {
        let template = KeyTemplate::parse("static/key.txt").unwrap();
        assert_eq!(template.expand(&default_tags()), "static/key.txt");
        assert!(!template.is_index_sensitive());
    }

    #[test]
    fn test_unterminated_placeholder_rejected() {
        let err = KeyTemplate::parse("%{path}%{time_slice").unwrap_err();
        assert!(matches!(err, UploadError::Config(_)));
    }

    #[test]
    fn test_index_sensitivity() {
        assert!(KeyTemplate::parse("%{path}_%{index}").unwrap().is_index_sensitive());
        assert!(KeyTemplate::parse("%{uuid_flush}").unwrap().is_index_sensitive());
        assert!(!KeyTemplate::parse("%{path}%{time_slice}.%{file_extension}")
            .unwrap()
            .is_index_sensitive());
    }

    #[test]
    fn test_placeholder_names_round_trip() {
        for p in Placeholder::ALL {
            assert_eq!(Placeholder::from_name(p.name()), Some(p));
            assert_eq!(p.to_string(), p.token());
        }
        assert_eq!(Placeholder::from_name("tag"), None);
    }
}
