//! Fetch-by-key object stores backing the schedule datasets.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::Client;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The object does not exist or the caller may not read it.
    #[error("object {key} not found ({code})")]
    NotFound { key: String, code: String },

    /// The store could not be reached or the object body could not be read.
    #[error("object store error ({code}) loading {key}")]
    Unavailable { key: String, code: String },
}

impl StoreError {
    pub fn key(&self) -> &str {
        match self {
            StoreError::NotFound { key, .. } | StoreError::Unavailable { key, .. } => key,
        }
    }

    /// Underlying cause code, e.g. `NoSuchKey` or `AccessDenied`.
    pub fn code(&self) -> &str {
        match self {
            StoreError::NotFound { code, .. } | StoreError::Unavailable { code, .. } => code,
        }
    }
}

/// A read-only store returning raw object bytes by key.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn fetch(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Human-readable location, used in logs.
    fn describe(&self) -> String;
}

/// Connection settings for [`S3Store`].
#[derive(Debug, Clone, Default)]
pub struct S3Config {
    pub bucket: String,
    pub region: Option<String>,
    /// Custom endpoint (MinIO, LocalStack, ...). Enables path-style addressing.
    pub endpoint_url: Option<String>,
}

/// Objects in an S3 bucket.
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    pub async fn new(config: S3Config) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(ref region) = config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let shared = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(ref endpoint) = config.endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket,
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn fetch(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        debug!(bucket = %self.bucket, key, "Fetching object");

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify_s3_error(key, e))?;

        let body = response
            .body
            .collect()
            .await
            .map_err(|_| StoreError::Unavailable {
                key: key.to_string(),
                code: "BodyRead".to_string(),
            })?;

        Ok(body.into_bytes().to_vec())
    }

    fn describe(&self) -> String {
        format!("s3://{}", self.bucket)
    }
}

fn classify_s3_error<R>(key: &str, err: SdkError<GetObjectError, R>) -> StoreError {
    let code = match &err {
        SdkError::TimeoutError(_) => "Timeout".to_string(),
        SdkError::DispatchFailure(_) => "DispatchFailure".to_string(),
        _ => err.code().unwrap_or("Unknown").to_string(),
    };

    let not_found = matches!(
        err.as_service_error(),
        Some(GetObjectError::NoSuchKey(_))
    ) || matches!(code.as_str(), "NoSuchKey" | "NoSuchBucket" | "AccessDenied");

    if not_found {
        StoreError::NotFound {
            key: key.to_string(),
            code,
        }
    } else {
        StoreError::Unavailable {
            key: key.to_string(),
            code,
        }
    }
}

/// Objects as files under a local directory; the key is the relative path.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn fetch(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.root.join(key);
        debug!(path = %path.display(), "Reading object");

        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StoreError::NotFound {
                key: key.to_string(),
                code: "NoSuchKey".to_string(),
            },
            ErrorKind::PermissionDenied => StoreError::NotFound {
                key: key.to_string(),
                code: "AccessDenied".to_string(),
            },
            kind => StoreError::Unavailable {
                key: key.to_string(),
                code: format!("{:?}", kind),
            },
        })
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// In-memory objects with an optional simulated latency. Counts fetches.
#[derive(Default)]
pub struct MemoryStore {
    objects: HashMap<String, Vec<u8>>,
    latency: Option<Duration>,
    fetches: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(mut self, key: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.objects.insert(key.into(), bytes.into());
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of fetches issued so far, successful or not.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn fetch(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        self.objects
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
                code: "NoSuchKey".to_string(),
            })
    }

    fn describe(&self) -> String {
        format!("memory ({} objects)", self.objects.len())
    }
}
