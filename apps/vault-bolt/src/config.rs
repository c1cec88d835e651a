//! Environment configuration
//!
//! Every option is read from a `CHUNKVAULT_*` variable; `.env` files are
//! loaded by `main` through dotenvy before this runs.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use chunkvault_domain::OutputConfig;
use chunkvault_s3::S3Settings;
use tracing::info;

use crate::format::LineFormat;

const PREFIX: &str = "CHUNKVAULT_";
const DEFAULT_BUCKET: &str = "chunkvault";
const DEFAULT_TIMEKEY_SECS: u64 = 86_400;

/// Everything the binary needs to start
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub output: OutputConfig,
    pub s3: S3Settings,
    pub format: LineFormat,
    pub timekey_secs: u64,
    pub bind_addr: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| {
            lookup(&format!("{}{}", PREFIX, name)).filter(|v| !v.trim().is_empty())
        };

        let mut output = OutputConfig::for_bucket(get("BUCKET").unwrap_or_else(|| {
            info!("CHUNKVAULT_BUCKET not set, using default: {}", DEFAULT_BUCKET);
            DEFAULT_BUCKET.to_string()
        }));

        if let Some(v) = get("OBJECT_KEY_FORMAT") {
            output.object_key_format = v;
        }
        if let Some(v) = get("PATH") {
            output.path = v;
        }
        if let Some(v) = get("STORE_AS") {
            output.store_as = v.parse()?;
        }
        if let Some(v) = get("TRANSCODING") {
            output.transcoding = parse_var("TRANSCODING", &v)?;
        }
        if let Some(v) = get("AUTO_CREATE_BUCKET") {
            output.auto_create_bucket = parse_var("AUTO_CREATE_BUCKET", &v)?;
        }
        if let Some(v) = get("HEX_RANDOM_LENGTH") {
            output.hex_random_length = parse_var("HEX_RANDOM_LENGTH", &v)?;
        }
        if let Some(v) = get("OVERWRITE") {
            output.overwrite = parse_var("OVERWRITE", &v)?;
        }
        if let Some(v) = get("BLIND_WRITE") {
            output.blind_write = parse_var("BLIND_WRITE", &v)?;
        }
        output.acl = get("ACL");
        output.storage_class = get("STORAGE_CLASS");
        output.encryption_key = get("ENCRYPTION_KEY");
        if let Some(v) = get("OBJECT_METADATA") {
            output.object_metadata = parse_metadata(&v)?;
        }
        if let Some(v) = get("TIME_SLICE_FORMAT") {
            output.time_slice_format = v;
        }
        if let Some(v) = get("LOCALTIME") {
            output.localtime = parse_var("LOCALTIME", &v)?;
        }
        output.hostname = get("HOSTNAME");

        output.validate()?;

        let format = match get("FORMAT") {
            Some(v) => v.parse()?,
            None => LineFormat::default(),
        };
        let timekey_secs = match get("TIMEKEY") {
            Some(v) => parse_var("TIMEKEY", &v)?,
            None => DEFAULT_TIMEKEY_SECS,
        };
        if timekey_secs == 0 {
            anyhow::bail!("CHUNKVAULT_TIMEKEY must be at least 1 second");
        }

        let s3 = S3Settings {
            region: get("S3_REGION"),
            endpoint_url: get("S3_ENDPOINT"),
            force_path_style: match get("S3_FORCE_PATH_STYLE") {
                Some(v) => parse_var("S3_FORCE_PATH_STYLE", &v)?,
                None => true,
            },
            retries: match get("S3_RETRIES") {
                Some(v) => Some(parse_var("S3_RETRIES", &v)?),
                None => None,
            },
            timeout: match get("S3_TIMEOUT") {
                Some(v) => Some(Duration::from_secs(parse_var("S3_TIMEOUT", &v)?)),
                None => None,
            },
        };

        let host = lookup("BOLT_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = lookup("BOLT_PORT").unwrap_or_else(|| "3000".to_string());

        Ok(Self {
            output,
            s3,
            format,
            timekey_secs,
            bind_addr: format!("{}:{}", host, port),
        })
    }
}

fn parse_var<T>(name: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("invalid value for {}{}: '{}'", PREFIX, name, value))
}

/// Parse `key=value,key=value`
fn parse_metadata(raw: &str) -> Result<BTreeMap<String, String>> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| -> Result<(String, String)> {
            let (key, value) = pair
                .split_once('=')
                .with_context(|| format!("metadata entry '{}' is not key=value", pair))?;
            Ok((key.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}
