//! Server configuration file support for adoptai.
//!
//! Loads configuration from `adoptai.toml` in the working directory, then
//! applies command-line / environment overrides on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use adoptai_logging::LogFormat;
use adoptai_schedule::{S3Config, DEFAULT_TIMEZONE};
use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::Deserialize;

/// The config file name
pub const CONFIG_FILE_NAME: &str = "adoptai.toml";

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_SERVICE_NAME: &str = "adoptai-api";
pub const DEFAULT_DATA_PREFIX: &str = "data";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Server configuration loaded from `adoptai.toml`
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Listen address, e.g. "127.0.0.1:8080"
    pub bind: Option<String>,
    /// Name reported by `/health`
    pub service_name: Option<String>,
    /// IANA timezone session times are expressed in
    pub timezone: Option<String>,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    pub level: Option<String>,
    pub format: Option<LogFormat>,
}

/// Where the datasets live
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// S3 bucket holding the datasets
    pub bucket: Option<String>,
    /// Key prefix of the datasets inside the store
    pub prefix: Option<String>,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    /// Serve datasets from a local directory instead of S3
    pub data_dir: Option<PathBuf>,
    /// Per-fetch timeout, e.g. "5s"
    #[serde(default, with = "humantime_serde")]
    pub fetch_timeout: Option<Duration>,
}

impl ServerConfig {
    /// Load configuration from `path`.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if file exists and parses successfully
    /// - `Ok(None)` if file does not exist
    /// - `Err(...)` if file exists but fails to parse (hard error)
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let config: ServerConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(Some(config))
    }
}

/// Values given on the command line or through the environment. These take
/// priority over the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub bind: Option<String>,
    pub bucket: Option<String>,
    pub data_prefix: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Debug, Clone)]
pub enum Backend {
    Local(PathBuf),
    S3(S3Config),
}

/// Fully resolved server settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind: String,
    pub service_name: String,
    pub timezone: Tz,
    pub log_level: String,
    pub log_format: LogFormat,
    pub backend: Backend,
    pub data_prefix: String,
    pub fetch_timeout: Duration,
}

impl Settings {
    /// Merge the config file with overrides.
    /// Priority: override > config file > default
    pub fn resolve(config: ServerConfig, overrides: Overrides) -> Result<Self> {
        let timezone = match config.timezone {
            Some(ref name) => name
                .parse::<Tz>()
                .map_err(|e| anyhow::anyhow!("Invalid timezone '{}': {}", name, e))?,
            None => DEFAULT_TIMEZONE,
        };

        let store = config.store;
        let data_dir = overrides.data_dir.or(store.data_dir);
        let bucket = overrides
            .bucket
            .or(store.bucket)
            .filter(|b| !b.is_empty());

        let backend = match (data_dir, bucket) {
            (Some(dir), _) => Backend::Local(dir),
            (None, Some(bucket)) => Backend::S3(S3Config {
                bucket,
                region: overrides.region.or(store.region),
                endpoint_url: overrides.endpoint_url.or(store.endpoint_url),
            }),
            (None, None) => anyhow::bail!(
                "No data source configured. Set BUCKET_NAME (or --bucket) or --data-dir"
            ),
        };

        Ok(Self {
            bind: overrides
                .bind
                .or(config.bind)
                .unwrap_or_else(|| DEFAULT_BIND.to_string()),
            service_name: config
                .service_name
                .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),
            timezone,
            log_level: overrides
                .log_level
                .or(config.log.level)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            log_format: overrides
                .log_format
                .or(config.log.format)
                .unwrap_or_default(),
            backend,
            data_prefix: overrides
                .data_prefix
                .or(store.prefix)
                .unwrap_or_else(|| DEFAULT_DATA_PREFIX.to_string()),
            fetch_timeout: store.fetch_timeout.unwrap_or(DEFAULT_FETCH_TIMEOUT),
        })
    }
}
