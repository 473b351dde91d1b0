use std::sync::Arc;
use std::time::Duration;

use chrono_tz::Tz;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::store::{ObjectStore, StoreError};
use crate::types::{ScheduledSession, SessionsFile, Speaker, SpeakersFile};

/// Served at `/` when the text document cannot be fetched.
pub const FALLBACK_TEXT: &str = "# AdoptAI API\n\nVisit /sessions or /speakers for data.";

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("store error ({code}) loading {key}")]
    StoreFetch { key: String, code: String },

    #[error("invalid JSON in {key}: {source}")]
    MalformedDataset {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<StoreError> for LoadError {
    fn from(err: StoreError) -> Self {
        LoadError::StoreFetch {
            key: err.key().to_string(),
            code: err.code().to_string(),
        }
    }
}

/// Well-known object keys of the three datasets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetKeys {
    pub sessions: String,
    pub speakers: String,
    pub fallback_text: String,
}

impl DatasetKeys {
    /// `<prefix>/sessions.json`, `<prefix>/speakers.json`, `<prefix>/llms.txt`.
    pub fn with_prefix(prefix: &str) -> Self {
        let prefix = prefix.trim_matches('/');
        let key = |name: &str| {
            if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{}/{}", prefix, name)
            }
        };

        Self {
            sessions: key("sessions.json"),
            speakers: key("speakers.json"),
            fallback_text: key("llms.txt"),
        }
    }
}

impl Default for DatasetKeys {
    fn default() -> Self {
        Self::with_prefix("data")
    }
}

/// Process-lifetime cache of the schedule datasets.
///
/// Each dataset is fetched on first access only. Concurrent first accesses
/// share a single fetch; a failed fetch is not cached and the next access
/// retries it. Once populated a dataset is never refreshed.
pub struct ScheduleCache {
    store: Arc<dyn ObjectStore>,
    keys: DatasetKeys,
    timezone: Tz,
    fetch_timeout: Option<Duration>,
    sessions: OnceCell<Arc<Vec<ScheduledSession>>>,
    speakers: OnceCell<Arc<Vec<Speaker>>>,
    fallback_text: OnceCell<Arc<str>>,
}

impl ScheduleCache {
    pub fn new(store: Arc<dyn ObjectStore>, keys: DatasetKeys, timezone: Tz) -> Self {
        Self {
            store,
            keys,
            timezone,
            fetch_timeout: None,
            sessions: OnceCell::new(),
            speakers: OnceCell::new(),
            fallback_text: OnceCell::new(),
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Timezone session instants are anchored to.
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// All sessions, with start/end instants computed at load time.
    pub async fn sessions(&self) -> Result<Arc<Vec<ScheduledSession>>, LoadError> {
        self.sessions
            .get_or_try_init(|| async {
                let file: SessionsFile = self.load_json(&self.keys.sessions).await?;
                let sessions: Vec<ScheduledSession> = file
                    .sessions
                    .into_iter()
                    .map(|s| ScheduledSession::new(s, self.timezone))
                    .collect();

                let unscheduled = sessions.iter().filter(|s| s.start().is_none()).count();
                info!(
                    key = %self.keys.sessions,
                    count = sessions.len(),
                    unscheduled,
                    "Loaded sessions"
                );
                Ok::<_, LoadError>(Arc::new(sessions))
            })
            .await
            .cloned()
    }

    pub async fn speakers(&self) -> Result<Arc<Vec<Speaker>>, LoadError> {
        self.speakers
            .get_or_try_init(|| async {
                let file: SpeakersFile = self.load_json(&self.keys.speakers).await?;
                info!(key = %self.keys.speakers, count = file.speakers.len(), "Loaded speakers");
                Ok::<_, LoadError>(Arc::new(file.speakers))
            })
            .await
            .cloned()
    }

    /// The text document served at `/`, or [`FALLBACK_TEXT`] if it cannot be
    /// fetched. The placeholder is not cached.
    pub async fn fallback_text(&self) -> Arc<str> {
        let result = self
            .fallback_text
            .get_or_try_init(|| async {
                let key = &self.keys.fallback_text;
                let bytes = self.fetch(key).await?;
                let text = String::from_utf8(bytes).map_err(|_| LoadError::StoreFetch {
                    key: key.clone(),
                    code: "InvalidUtf8".to_string(),
                })?;
                info!(key = %key, bytes = text.len(), "Loaded text document");
                Ok::<_, LoadError>(Arc::from(text))
            })
            .await;

        match result {
            Ok(text) => text.clone(),
            Err(e) => {
                warn!(error = %e, "Serving placeholder text document");
                Arc::from(FALLBACK_TEXT)
            }
        }
    }

    async fn fetch(&self, key: &str) -> Result<Vec<u8>, LoadError> {
        let fetch = self.store.fetch(key);
        let bytes = match self.fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, fetch)
                .await
                .map_err(|_| LoadError::StoreFetch {
                    key: key.to_string(),
                    code: "Timeout".to_string(),
                })??,
            None => fetch.await?,
        };
        Ok(bytes)
    }

    async fn load_json<T: DeserializeOwned>(&self, key: &str) -> Result<T, LoadError> {
        let bytes = self.fetch(key).await.inspect_err(|e| {
            warn!(store = %self.store.describe(), error = %e, "Dataset fetch failed");
        })?;

        serde_json::from_slice(&bytes).map_err(|source| {
            warn!(key, error = %source, "Dataset is not valid JSON");
            LoadError::MalformedDataset {
                key: key.to_string(),
                source,
            }
        })
    }
}
