//! S3 client construction

use std::time::Duration;

use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::Client;
use tracing::info;

/// Connection settings for the S3 client
///
/// Unset fields fall back to the standard AWS environment and profile chain.
#[derive(Debug, Clone)]
pub struct S3Settings {
    /// Region override, e.g. `eu-west-3`
    pub region: Option<String>,
    /// Custom endpoint, e.g. `http://localhost:9000` for MinIO
    pub endpoint_url: Option<String>,
    /// Path-style addressing, required by MinIO
    pub force_path_style: bool,
    /// Retries after a failed request; the SDK default when unset
    pub retries: Option<u32>,
    /// Time limit for one whole operation, retries included
    pub timeout: Option<Duration>,
}

impl Default for S3Settings {
    fn default() -> Self {
        Self {
            region: None,
            endpoint_url: None,
            force_path_style: true,
            retries: None,
            timeout: None,
        }
    }
}

impl S3Settings {
    fn retry_config(&self) -> Option<RetryConfig> {
        self.retries
            .map(|retries| RetryConfig::standard().with_max_attempts(retries.saturating_add(1)))
    }

    fn timeout_config(&self) -> Option<TimeoutConfig> {
        self.timeout
            .map(|timeout| TimeoutConfig::builder().operation_timeout(timeout).build())
    }
}

/// Build an S3 client from the AWS default chain plus `settings`
pub async fn build_client(settings: &S3Settings) -> Client {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = &settings.region {
        loader = loader.region(Region::new(region.clone()));
    }
    if let Some(endpoint) = &settings.endpoint_url {
        loader = loader.endpoint_url(endpoint.clone());
    }
    if let Some(retry) = settings.retry_config() {
        loader = loader.retry_config(retry);
    }
    if let Some(timeout) = settings.timeout_config() {
        loader = loader.timeout_config(timeout);
    }
    let aws_config = loader.load().await;

    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(settings.force_path_style)
        .build();

    info!(
        region = ?s3_config.region(),
        endpoint = ?settings.endpoint_url,
        force_path_style = settings.force_path_style,
        retries = ?settings.retries,
        timeout = ?settings.timeout,
        "Built S3 client"
    );

    Client::from_conf(s3_config)
}
