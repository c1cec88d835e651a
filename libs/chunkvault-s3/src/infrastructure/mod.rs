//! AWS SDK backed infrastructure

mod client;
mod s3_object_store;
mod sse;

pub use client::{build_client, S3Settings};
pub use s3_object_store::S3ObjectStore;
pub use sse::{SseCustomer, SseCustomerError};
