//! # Dataset Sources
//!
//! A [`DatasetSource`] turns a dataset's source identifier into its raw
//! payload text. The pipeline never knows where bytes come from.
//!
//! | Source | Backend |
//! |--------|---------|
//! | [`FileSystemSource`] | `<root>/<source>` via `tokio::fs` |
//! | [`HttpSource`] | `GET <base_url>/<source>` via `reqwest` |
//! | [`MockDatasetSource`] | scripted in-memory responses |
//!
//! [`ConfiguredSource`] picks the filesystem or HTTP source from a
//! [`SourceConfig`].

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use url::Url;

use cduty_core::{RetryConfig, SourceConfig};

use crate::retry::send_with_backoff;

// ─── Errors ──────────────────────────────────────────────────────────

/// A dataset payload could not be fetched.
///
/// Every variant renders as a complete, human-readable message: it becomes
/// the dataset's error state verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The source answered with a non-success HTTP status.
    #[error("Failed to load {location} (HTTP {status})")]
    Status { location: String, status: u16 },

    /// Connection, TLS or timeout failure.
    #[error("Failed to load {location}: {message}")]
    Transport { location: String, message: String },

    /// Local file missing or unreadable.
    #[error("Failed to load {location}: {message}")]
    Io { location: String, message: String },

    /// The source identifier is not a plain relative path.
    #[error("invalid source identifier {location:?}: {reason}")]
    InvalidLocation { location: String, reason: String },

    /// The source could not be constructed.
    #[error("dataset source not configured: {0}")]
    NotConfigured(String),

    /// Any other failure, reported as-is.
    #[error("{0}")]
    Other(String),
}

// ─── Trait ───────────────────────────────────────────────────────────

/// Fetches raw tabular payloads by source identifier.
pub trait DatasetSource: Send + Sync {
    /// Fetch the payload for `source` (a file name relative to the source
    /// root).
    fn fetch(&self, source: &str) -> impl Future<Output = Result<String, FetchError>> + Send;

    /// Human-readable description of where payloads come from.
    fn describe(&self) -> String;
}

/// Reject absolute paths and `..` so a source identifier cannot escape
/// the configured root.
fn relative_location(source: &str) -> Result<&Path, FetchError> {
    let path = Path::new(source);
    let invalid = |reason: &str| FetchError::InvalidLocation {
        location: source.to_string(),
        reason: reason.to_string(),
    };
    if source.trim().is_empty() {
        return Err(invalid("empty"));
    }
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => return Err(invalid("must be a relative path without `..`")),
        }
    }
    Ok(path)
}

// ─── Filesystem ──────────────────────────────────────────────────────

/// Reads payloads from files under a root directory.
#[derive(Debug, Clone)]
pub struct FileSystemSource {
    root: PathBuf,
}

impl FileSystemSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl DatasetSource for FileSystemSource {
    async fn fetch(&self, source: &str) -> Result<String, FetchError> {
        let path = self.root.join(relative_location(source)?);
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| FetchError::Io {
                location: source.to_string(),
                message: e.to_string(),
            })
    }

    fn describe(&self) -> String {
        format!("directory {}", self.root.display())
    }
}

// ─── HTTP ────────────────────────────────────────────────────────────

/// Fetches payloads over HTTP(S) below a base URL.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: Url,
    retry: RetryConfig,
}

impl HttpSource {
    /// Build a source with the given per-request timeout.
    ///
    /// A base URL without a trailing slash is treated as a directory, so
    /// `https://host/data` and `https://host/data/` resolve identically.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::NotConfigured(format!("failed to build HTTP client: {e}")))?;
        let mut base_url = base_url;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            client,
            base_url,
            retry: RetryConfig::default(),
        })
    }

    /// Replace the default backoff.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url_for(&self, source: &str) -> Result<Url, FetchError> {
        let relative = relative_location(source)?;
        let relative = relative.to_string_lossy();
        self.base_url
            .join(relative.trim_start_matches("./"))
            .map_err(|e| FetchError::InvalidLocation {
                location: source.to_string(),
                reason: e.to_string(),
            })
    }
}

impl DatasetSource for HttpSource {
    async fn fetch(&self, source: &str) -> Result<String, FetchError> {
        let url = self.url_for(source)?;
        let transport = |e: reqwest::Error| FetchError::Transport {
            location: source.to_string(),
            message: e.to_string(),
        };

        let resp = send_with_backoff(&self.retry, source, || self.client.get(url.clone()).send())
            .await
            .map_err(transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                location: source.to_string(),
                status: status.as_u16(),
            });
        }
        resp.text().await.map_err(transport)
    }

    fn describe(&self) -> String {
        self.base_url.to_string()
    }
}

// ─── Configured ──────────────────────────────────────────────────────

/// The source selected by configuration.
#[derive(Debug, Clone)]
pub enum ConfiguredSource {
    FileSystem(FileSystemSource),
    Http(HttpSource),
}

impl ConfiguredSource {
    pub fn from_config(config: &SourceConfig) -> Result<Self, FetchError> {
        match config {
            SourceConfig::Filesystem { root } => {
                Ok(Self::FileSystem(FileSystemSource::new(root.clone())))
            }
            SourceConfig::Http {
                base_url,
                timeout_secs,
                retry,
            } => Ok(Self::Http(
                HttpSource::new(base_url.clone(), Duration::from_secs(*timeout_secs))?
                    .with_retry(*retry),
            )),
        }
    }
}

impl DatasetSource for ConfiguredSource {
    async fn fetch(&self, source: &str) -> Result<String, FetchError> {
        match self {
            Self::FileSystem(s) => s.fetch(source).await,
            Self::Http(s) => s.fetch(source).await,
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::FileSystem(s) => s.describe(),
            Self::Http(s) => s.describe(),
        }
    }
}

// ─── Mock ────────────────────────────────────────────────────────────

/// In-memory source with scripted responses, for tests and demos.
///
/// Each source identifier holds a queue of responses. A fetch pops the
/// front of the queue while more than one response remains, then keeps
/// returning the last one. Unscripted identifiers fail with
/// [`FetchError::Io`]. Every fetch is recorded in order.
#[derive(Debug, Default)]
pub struct MockDatasetSource {
    responses: Mutex<HashMap<String, VecDeque<Result<String, FetchError>>>>,
    fetches: Mutex<Vec<String>>,
}

impl MockDatasetSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful payload for `source`.
    pub fn with_payload(self, source: &str, payload: impl Into<String>) -> Self {
        self.push(source, Ok(payload.into()));
        self
    }

    /// Queue a failure for `source`.
    pub fn with_failure(self, source: &str, error: FetchError) -> Self {
        self.push(source, Err(error));
        self
    }

    /// Queue a response after construction.
    pub fn push(&self, source: &str, response: Result<String, FetchError>) {
        self.responses
            .lock()
            .entry(source.to_string())
            .or_default()
            .push_back(response);
    }

    /// Source identifiers fetched so far, in order.
    pub fn fetches(&self) -> Vec<String> {
        self.fetches.lock().clone()
    }

    fn next_response(&self, source: &str) -> Result<String, FetchError> {
        let mut responses = self.responses.lock();
        match responses.get_mut(source) {
            Some(queue) if queue.len() > 1 => queue
                .pop_front()
                .unwrap_or_else(|| Err(FetchError::Other("no scripted response".into()))),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or_else(|| Err(FetchError::Other("no scripted response".into()))),
            None => Err(FetchError::Io {
                location: source.to_string(),
                message: "not found".to_string(),
            }),
        }
    }
}

impl DatasetSource for MockDatasetSource {
    async fn fetch(&self, source: &str) -> Result<String, FetchError> {
        self.fetches.lock().push(source.to_string());
        // Yield once so the caller observes a real suspension point.
        tokio::task::yield_now().await;
        self.next_response(source)
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
