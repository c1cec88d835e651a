//! Object key generation
//!
//! [`KeyTemplate`] expands `%{...}` placeholders from a [`TagMap`];
//! [`PathResolver`] builds the tag map for a chunk and probes the store
//! until it finds a key that is not taken.

mod resolver;
mod template;

pub use resolver::{KeyResolution, PathResolver, DEFAULT_MAX_INDEX};
pub use template::{KeyTemplate, Placeholder, TagMap};

pub(crate) use resolver::validate_strftime;
