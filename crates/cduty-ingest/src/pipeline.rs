//! # Ingestion Pipeline
//!
//! The single writer of the dataset registry.
//!
//! ## Load One
//!
//! ```text
//!   begin_load ──▶ fetch(source) ──▶ count_rows ──▶ complete_load ──▶ notify "Dataset Loaded"
//!                      │                  │
//!                      └──── failure ─────┴──────▶ fail_load ──────▶ notify "Load Failed"
//! ```
//!
//! A record that is already `Loading` is skipped without a fetch. Fetch and
//! parse failures are recorded as dataset state and never returned as
//! errors; the only error from [`IngestionPipeline::load_dataset`] is a
//! caller error (unknown dataset, broken registry invariant).
//!
//! ## Load All
//!
//! Walks the registry in order and loads every record that is not `Loaded`
//! when the sweep reaches it. Attempts are strictly sequential, with a
//! fixed delay between consecutive attempts. One failure never stops the
//! sweep.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::Instrument;

use cduty_core::{AttemptId, CdutyError, DatasetName};
use cduty_state::{
    DatasetTransitionError, LoadProgress, RegistryError, RegistryReader, RegistryWriter,
};

use crate::notify::{Notification, Notifier};
use crate::payload::count_rows;
use crate::source::DatasetSource;

/// Default delay between consecutive attempts of a load-all sweep.
pub const DEFAULT_LOAD_DELAY: Duration = Duration::from_millis(300);

// ─── Errors ──────────────────────────────────────────────────────────

/// Caller errors from the ingestion pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    #[error("unknown dataset: {0}")]
    UnknownDataset(String),

    /// The registry rejected a transition the pipeline expected to succeed.
    #[error("registry rejected transition: {0}")]
    Registry(#[from] RegistryError),
}

impl From<IngestError> for CdutyError {
    fn from(err: IngestError) -> Self {
        CdutyError::Ingest(err.to_string())
    }
}

// ─── Outcomes ────────────────────────────────────────────────────────

/// What a single `load_dataset` call did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LoadOutcome {
    Loaded {
        dataset: DatasetName,
        attempt: AttemptId,
        row_count: u64,
    },
    Failed {
        dataset: DatasetName,
        attempt: AttemptId,
        message: String,
    },
    /// Another attempt was outstanding; nothing was fetched.
    Skipped { dataset: DatasetName },
}

impl LoadOutcome {
    pub fn dataset(&self) -> &DatasetName {
        match self {
            Self::Loaded { dataset, .. }
            | Self::Failed { dataset, .. }
            | Self::Skipped { dataset } => dataset,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Whether a fetch was issued.
    pub fn attempted(&self) -> bool {
        !matches!(self, Self::Skipped { .. })
    }
}

/// Result of a load-all sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadAllReport {
    /// One entry per dataset the sweep visited, in order.
    pub outcomes: Vec<LoadOutcome>,
    /// Registry progress after the sweep.
    pub progress: LoadProgress,
}

impl LoadAllReport {
    /// True iff every dataset was loaded when the sweep finished.
    pub fn ready(&self) -> bool {
        self.progress.all_loaded()
    }

    /// Number of fetches issued.
    pub fn attempts(&self) -> usize {
        self.outcomes.iter().filter(|o| o.attempted()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &LoadOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }
}

// ─── Attempt Guard ───────────────────────────────────────────────────

/// Message recorded when a load future is dropped before it settles.
pub const CANCELLED_MESSAGE: &str = "load cancelled";

/// Fails the attempt if the load future is dropped mid-flight, so the
/// record never stays `Loading` with nobody left to settle it.
struct AttemptGuard<'a> {
    writer: &'a RegistryWriter,
    name: &'a DatasetName,
    attempt: AttemptId,
    settled: bool,
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        tracing::warn!(dataset = %self.name, attempt = %self.attempt, "dataset load dropped before completion");
        if let Err(e) = self.writer.fail_load(self.name, self.attempt, CANCELLED_MESSAGE) {
            tracing::debug!(dataset = %self.name, error = %e, "cancelled attempt already settled");
        }
    }
}

// ─── Pipeline ────────────────────────────────────────────────────────

/// Drives dataset loads against a source and records results in the
/// registry.
#[derive(Debug)]
pub struct IngestionPipeline<S, N> {
    writer: RegistryWriter,
    reader: RegistryReader,
    source: S,
    notifier: N,
    load_delay: Duration,
}

impl<S: DatasetSource, N: Notifier> IngestionPipeline<S, N> {
    /// Take ownership of the registry writer.
    pub fn new(writer: RegistryWriter, source: S, notifier: N) -> Self {
        let reader = writer.reader();
        Self {
            writer,
            reader,
            source,
            notifier,
            load_delay: DEFAULT_LOAD_DELAY,
        }
    }

    /// Set the delay between consecutive attempts of [`Self::load_all`].
    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    /// A reader onto the registry this pipeline writes.
    pub fn reader(&self) -> RegistryReader {
        self.reader.clone()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Load one dataset.
    ///
    /// # Errors
    ///
    /// [`IngestError::UnknownDataset`] if `name` is not registered. Fetch
    /// and parse failures are not errors; they yield
    /// [`LoadOutcome::Failed`].
    pub async fn load_dataset(&self, name: &DatasetName) -> Result<LoadOutcome, IngestError> {
        let location = self
            .reader
            .source_of(name)
            .ok_or_else(|| IngestError::UnknownDataset(name.to_string()))?;

        let attempt = match self.writer.begin_load(name) {
            Ok(attempt) => attempt,
            Err(RegistryError::Transition(DatasetTransitionError::AlreadyLoading {
                attempt, ..
            })) => {
                tracing::debug!(dataset = %name, %attempt, "dataset already loading, skipped");
                return Ok(LoadOutcome::Skipped {
                    dataset: name.clone(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let mut guard = AttemptGuard {
            writer: &self.writer,
            name,
            attempt,
            settled: false,
        };
        let span = tracing::info_span!("load_dataset", dataset = %name, %attempt, source = %location);
        let outcome = self
            .run_attempt(name, attempt, &location)
            .instrument(span)
            .await;
        guard.settled = true;
        outcome
    }

    async fn run_attempt(
        &self,
        name: &DatasetName,
        attempt: AttemptId,
        location: &str,
    ) -> Result<LoadOutcome, IngestError> {
        let parsed = match self.source.fetch(location).await {
            Ok(payload) => count_rows(&payload).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        match parsed {
            Ok(row_count) => {
                self.writer.complete_load(name, attempt, row_count)?;
                tracing::info!(row_count, "dataset loaded");
                self.notifier.notify(Notification::info(
                    "Dataset Loaded",
                    format!("{name} loaded successfully with {row_count} records."),
                ));
                Ok(LoadOutcome::Loaded {
                    dataset: name.clone(),
                    attempt,
                    row_count,
                })
            }
            Err(message) => {
                self.writer.fail_load(name, attempt, message)?;
                // Read back: a blank message is normalised by the record.
                let message = self
                    .reader
                    .state_of(name)
                    .and_then(|s| s.error_message().map(str::to_string))
                    .unwrap_or_default();
                tracing::warn!(error = %message, "dataset load failed");
                self.notifier.notify(Notification::error(
                    "Load Failed",
                    format!("Failed to load {name}: {message}"),
                ));
                Ok(LoadOutcome::Failed {
                    dataset: name.clone(),
                    attempt,
                    message,
                })
            }
        }
    }

    /// Load every dataset that is not loaded, one at a time, in registry
    /// order.
    pub async fn load_all(&self) -> LoadAllReport {
        let mut outcomes = Vec::new();

        for name in self.reader.names() {
            let already_loaded = self
                .reader
                .state_of(&name)
                .is_some_and(|s| s.is_loaded());
            if already_loaded {
                continue;
            }
            if outcomes.iter().any(LoadOutcome::attempted) && !self.load_delay.is_zero() {
                tokio::time::sleep(self.load_delay).await;
            }
            match self.load_dataset(&name).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => tracing::error!(dataset = %name, error = %e, "load-all step rejected"),
            }
        }

        let progress = self.reader.progress();
        if progress.all_loaded() {
            tracing::info!(total = progress.total, "all datasets loaded");
            self.notifier.notify(Notification::info(
                "All Datasets Loaded Successfully",
                "All datasets have been loaded without any problems. The system is ready for analysis.",
            ));
        } else {
            tracing::warn!(
                loaded = progress.loaded,
                total = progress.total,
                failed = progress.failed.len(),
                "load-all finished with datasets outstanding"
            );
            self.notifier.notify(Notification::warning(
                "Datasets Not Ready",
                progress.to_string(),
            ));
        }

        LoadAllReport { outcomes, progress }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
