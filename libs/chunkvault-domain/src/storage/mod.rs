//! Storage boundary: the object store port and the option bundles it takes

mod options;
pub mod ports;

pub use options::{EncryptionOptions, UploadOptions};
