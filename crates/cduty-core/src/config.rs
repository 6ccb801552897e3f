//! Dashboard configuration.
//!
//! Loaded from an optional YAML file, then overridden by `CDUTY_*`
//! environment variables, then validated. Every field has a default so the
//! dashboard runs with no configuration at all against `./data`.
//!
//! ```yaml
//! datasets:
//!   - name: ProductData
//!     source: ProductPerformance.csv
//! source:
//!   kind: http
//!   base_url: https://dashboard.example.com/data/
//!   timeout_secs: 10
//!   retry:
//!     max_retries: 2
//!     base_delay_ms: 200
//! load_delay_ms: 300
//! vulnerability_threshold: 50
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::descriptor::{default_datasets, DatasetDescriptor};

/// Where dataset payloads are fetched from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Files under a local directory.
    Filesystem {
        #[serde(default = "default_data_root")]
        root: PathBuf,
    },
    /// Files served over HTTP(S) below a base URL.
    Http {
        base_url: Url,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
        #[serde(default)]
        retry: RetryConfig,
    },
}

/// Backoff for HTTP fetches. Transport errors and 5xx responses are
/// retried; the delay doubles after each retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the initial request.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay before the first retry.
    #[serde(default = "default_retry_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `retry` (0-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        Duration::from_millis(self.base_delay_ms.saturating_mul(1u64 << retry.min(16)))
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::Filesystem {
            root: default_data_root(),
        }
    }
}

/// Top-level configuration for the dashboard core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// The fixed dataset registry, in load order.
    #[serde(default = "default_datasets")]
    pub datasets: Vec<DatasetDescriptor>,
    /// Payload source for dataset fetches.
    #[serde(default)]
    pub source: SourceConfig,
    /// Delay between consecutive attempts of a load-all sweep.
    #[serde(default = "default_load_delay_ms")]
    pub load_delay_ms: u64,
    /// Minimum score (inclusive) at which a customer counts as vulnerable.
    #[serde(default = "default_vulnerability_threshold")]
    pub vulnerability_threshold: f64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            datasets: default_datasets(),
            source: SourceConfig::default(),
            load_delay_ms: default_load_delay_ms(),
            vulnerability_threshold: default_vulnerability_threshold(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceKind {
    Filesystem,
    Http,
}

impl DashboardConfig {
    /// Load configuration from an optional YAML file plus the process
    /// environment, and validate it.
    ///
    /// Variables:
    /// - `CDUTY_SOURCE` (`filesystem` or `http`)
    /// - `CDUTY_DATA_ROOT` (filesystem root, default `./data`)
    /// - `CDUTY_DATA_URL` (HTTP base URL, required when the source is `http`)
    /// - `CDUTY_TIMEOUT_SECS` (HTTP timeout, default 30)
    /// - `CDUTY_HTTP_MAX_RETRIES` (default 2)
    /// - `CDUTY_HTTP_RETRY_DELAY_MS` (first backoff, default 200)
    /// - `CDUTY_LOAD_DELAY_MS` (default 300)
    /// - `CDUTY_VULNERABILITY_THRESHOLD` (default 50)
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        let config = base.with_env(|var| std::env::var(var).ok())?;
        config.validate()?;
        tracing::debug!(
            datasets = config.datasets.len(),
            load_delay_ms = config.load_delay_ms,
            "dashboard configuration loaded"
        );
        Ok(config)
    }

    /// Parse configuration from a YAML document. Missing fields take
    /// their defaults. Not validated.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read and parse a YAML configuration file. Not validated.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }

    /// Apply `CDUTY_*` overrides resolved through `lookup`.
    ///
    /// Switching `CDUTY_SOURCE` to `http` requires a base URL, either from
    /// `CDUTY_DATA_URL` or from an HTTP source already configured.
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let requested_kind = match lookup("CDUTY_SOURCE").as_deref() {
            None => None,
            Some("filesystem") => Some(SourceKind::Filesystem),
            Some("http") => Some(SourceKind::Http),
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    var: "CDUTY_SOURCE".into(),
                    value: other.into(),
                    reason: "expected `filesystem` or `http`".into(),
                })
            }
        };
        let data_root = lookup("CDUTY_DATA_ROOT").map(PathBuf::from);
        let data_url = lookup("CDUTY_DATA_URL")
            .map(|raw| {
                Url::parse(&raw)
                    .map_err(|e| ConfigError::InvalidUrl("CDUTY_DATA_URL".into(), e.to_string()))
            })
            .transpose()?;
        let timeout_secs = parse_var::<u64, _>(&lookup, "CDUTY_TIMEOUT_SECS")?;
        let max_retries = parse_var::<u32, _>(&lookup, "CDUTY_HTTP_MAX_RETRIES")?;
        let retry_delay_ms = parse_var::<u64, _>(&lookup, "CDUTY_HTTP_RETRY_DELAY_MS")?;

        let kind = requested_kind.unwrap_or(match self.source {
            SourceConfig::Filesystem { .. } => SourceKind::Filesystem,
            SourceConfig::Http { .. } => SourceKind::Http,
        });

        self.source = match kind {
            SourceKind::Filesystem => {
                let current = match &self.source {
                    SourceConfig::Filesystem { root } => root.clone(),
                    SourceConfig::Http { .. } => default_data_root(),
                };
                SourceConfig::Filesystem {
                    root: data_root.unwrap_or(current),
                }
            }
            SourceKind::Http => {
                let (current_url, current_timeout, mut retry) = match &self.source {
                    SourceConfig::Http {
                        base_url,
                        timeout_secs,
                        retry,
                    } => (Some(base_url.clone()), *timeout_secs, *retry),
                    SourceConfig::Filesystem { .. } => {
                        (None, default_timeout_secs(), RetryConfig::default())
                    }
                };
                if let Some(n) = max_retries {
                    retry.max_retries = n;
                }
                if let Some(ms) = retry_delay_ms {
                    retry.base_delay_ms = ms;
                }
                SourceConfig::Http {
                    base_url: data_url.or(current_url).ok_or(ConfigError::MissingBaseUrl)?,
                    timeout_secs: timeout_secs.unwrap_or(current_timeout),
                    retry,
                }
            }
        };

        if let Some(delay) = parse_var::<u64, _>(&lookup, "CDUTY_LOAD_DELAY_MS")? {
            self.load_delay_ms = delay;
        }
        if let Some(threshold) = parse_var::<f64, _>(&lookup, "CDUTY_VULNERABILITY_THRESHOLD")? {
            self.vulnerability_threshold = threshold;
        }
        Ok(self)
    }

    /// Check cross-field invariants.
    ///
    /// - at least one dataset, with unique names
    /// - the vulnerability threshold is finite and within `[0, 100]`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.datasets.is_empty() {
            return Err(ConfigError::NoDatasets);
        }
        let mut seen = HashSet::new();
        for descriptor in &self.datasets {
            if !seen.insert(descriptor.name.as_str()) {
                return Err(ConfigError::DuplicateDataset(descriptor.name.to_string()));
            }
            if descriptor.source.trim().is_empty() {
                return Err(ConfigError::EmptySource(descriptor.name.to_string()));
            }
        }
        let t = self.vulnerability_threshold;
        if !t.is_finite() || !(0.0..=100.0).contains(&t) {
            return Err(ConfigError::InvalidThreshold(t));
        }
        Ok(())
    }

    /// Inter-step delay of a load-all sweep.
    pub fn load_delay(&self) -> Duration {
        Duration::from_millis(self.load_delay_ms)
    }
}

fn parse_var<T, F>(lookup: &F, var: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
                var: var.to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

fn default_data_root() -> PathBuf {
    PathBuf::from("data")
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    200
}

fn default_load_delay_ms() -> u64 {
    300
}

fn default_vulnerability_threshold() -> f64 {
    50.0
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidValue {
        var: String,
        value: String,
        reason: String,
    },
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("HTTP source selected but no base URL configured (set CDUTY_DATA_URL)")]
    MissingBaseUrl,
    #[error("at least one dataset must be configured")]
    NoDatasets,
    #[error("dataset {0} is configured more than once")]
    DuplicateDataset(String),
    #[error("dataset {0} has an empty source")]
    EmptySource(String),
    #[error("vulnerability threshold must be a finite score in [0, 100], got {0}")]
    InvalidThreshold(f64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = DashboardConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.datasets.len(), 4);
        assert_eq!(cfg.load_delay(), Duration::from_millis(300));
        assert_eq!(cfg.vulnerability_threshold, 50.0);
        assert_eq!(
            cfg.source,
            SourceConfig::Filesystem {
                root: PathBuf::from("data")
            }
        );
    }

    #[test]
    fn yaml_fills_missing_fields_with_defaults() {
        let cfg = DashboardConfig::from_yaml_str(
            "source:\n  kind: http\n  base_url: https://example.com/data/\n",
        )
        .unwrap();
        assert_eq!(cfg.datasets.len(), 4);
        match cfg.source {
            SourceConfig::Http {
                base_url,
                timeout_secs,
                retry,
            } => {
                assert_eq!(base_url.as_str(), "https://example.com/data/");
                assert_eq!(timeout_secs, 30);
                assert_eq!(retry, RetryConfig::default());
            }
            other => panic!("expected http source, got {other:?}"),
        }
    }

    #[test]
    fn yaml_custom_registry() {
        let cfg = DashboardConfig::from_yaml_str(
            "datasets:\n  - name: ProductData\n    source: p.csv\n  - name: CommData\n    source: c.csv\n",
        )
        .unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.datasets[1].name.as_str(), "CommData");
        assert_eq!(cfg.datasets[1].source, "c.csv");
    }

    #[test]
    fn yaml_rejects_invalid_dataset_name() {
        let result =
            DashboardConfig::from_yaml_str("datasets:\n  - name: \"\"\n    source: p.csv\n");
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn env_overrides_filesystem_root_and_tuning() {
        let cfg = DashboardConfig::default()
            .with_env(env(&[
                ("CDUTY_DATA_ROOT", "/srv/duty"),
                ("CDUTY_LOAD_DELAY_MS", "0"),
                ("CDUTY_VULNERABILITY_THRESHOLD", "65.5"),
            ]))
            .unwrap();
        assert_eq!(
            cfg.source,
            SourceConfig::Filesystem {
                root: PathBuf::from("/srv/duty")
            }
        );
        assert_eq!(cfg.load_delay_ms, 0);
        assert_eq!(cfg.vulnerability_threshold, 65.5);
    }

    #[test]
    fn env_switches_to_http() {
        let cfg = DashboardConfig::default()
            .with_env(env(&[
                ("CDUTY_SOURCE", "http"),
                ("CDUTY_DATA_URL", "http://127.0.0.1:9000/data/"),
                ("CDUTY_TIMEOUT_SECS", "5"),
                ("CDUTY_HTTP_MAX_RETRIES", "4"),
            ]))
            .unwrap();
        assert_eq!(
            cfg.source,
            SourceConfig::Http {
                base_url: Url::parse("http://127.0.0.1:9000/data/").unwrap(),
                timeout_secs: 5,
                retry: RetryConfig {
                    max_retries: 4,
                    base_delay_ms: 200,
                },
            }
        );
    }

    #[test]
    fn yaml_retry_policy_and_backoff() {
        let cfg = DashboardConfig::from_yaml_str(
            "source:\n  kind: http\n  base_url: https://example.com/\n  retry:\n    base_delay_ms: 50\n",
        )
        .unwrap();
        let SourceConfig::Http { retry, .. } = cfg.source else {
            panic!("expected http source");
        };
        assert_eq!(retry.max_retries, 2);
        assert_eq!(retry.delay_for(0), Duration::from_millis(50));
        assert_eq!(retry.delay_for(2), Duration::from_millis(200));
    }

    #[test]
    fn env_http_without_url_is_rejected() {
        let result = DashboardConfig::default().with_env(env(&[("CDUTY_SOURCE", "http")]));
        assert!(matches!(result, Err(ConfigError::MissingBaseUrl)));
    }

    #[test]
    fn env_rejects_unknown_source_kind() {
        let result = DashboardConfig::default().with_env(env(&[("CDUTY_SOURCE", "ftp")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn env_rejects_unparseable_numbers() {
        let result =
            DashboardConfig::default().with_env(env(&[("CDUTY_LOAD_DELAY_MS", "soon")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn validate_rejects_duplicates_and_empty_registry() {
        let mut cfg = DashboardConfig::default();
        cfg.datasets.push(cfg.datasets[0].clone());
        assert!(matches!(cfg.validate(), Err(ConfigError::DuplicateDataset(_))));

        cfg.datasets.clear();
        assert!(matches!(cfg.validate(), Err(ConfigError::NoDatasets)));
    }

    #[test]
    fn validate_rejects_out_of_range_threshold() {
        let cfg = DashboardConfig {
            vulnerability_threshold: 120.0,
            ..DashboardConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidThreshold(_))));

        let cfg = DashboardConfig {
            vulnerability_threshold: f64::NAN,
            ..DashboardConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn load_reads_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cduty.yaml");
        std::fs::write(&path, "load_delay_ms: 25\n").unwrap();
        let cfg = DashboardConfig::from_yaml_file(&path).unwrap();
        assert_eq!(cfg.load_delay_ms, 25);
    }

    #[test]
    fn load_reports_missing_file() {
        let result = DashboardConfig::from_yaml_file(Path::new("/nonexistent/cduty.yaml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
