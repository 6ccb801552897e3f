//! # Dataset Registry
//!
//! The fixed, ordered set of dataset records for the process lifetime.
//!
//! ## Single Writer, Many Readers
//!
//! A [`DatasetRegistry`] is built once from the configured descriptors and
//! then split by [`DatasetRegistry::into_shared`] into:
//!
//! - one [`RegistryWriter`] (not `Clone`), owned by the ingestion pipeline,
//!   the only component allowed to move records between states;
//! - any number of [`RegistryReader`]s (`Clone`), handing out [`RegistrySnapshot`]s, which
//!   are immutable copies that views can keep as long as they like.
//!
//! The lock is a `parking_lot::RwLock` and is never held across an
//! `.await`: every writer method takes it, applies one transition, and
//! releases it.
//!
//! Every successful transition bumps [`version`](RegistrySnapshot::version),
//! so a reader can memoize anything derived from a snapshot and invalidate
//! it when the version moves.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use thiserror::Error;

use cduty_core::{AttemptId, CdutyError, DatasetDescriptor, DatasetName};

use crate::dataset::{DatasetRecord, DatasetState, DatasetTransitionError};

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors from building or mutating the registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A registry with no datasets would make the readiness gate vacuously
    /// true.
    #[error("dataset registry must contain at least one dataset")]
    Empty,

    #[error("dataset {0} is registered more than once")]
    DuplicateDataset(String),

    #[error("unknown dataset: {0}")]
    UnknownDataset(String),

    #[error(transparent)]
    Transition(#[from] DatasetTransitionError),
}

impl From<RegistryError> for CdutyError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Transition(e) => CdutyError::InvalidTransition(e.to_string()),
            RegistryError::UnknownDataset(name) => {
                CdutyError::Ingest(format!("unknown dataset: {name}"))
            }
            other => CdutyError::InvalidTransition(other.to_string()),
        }
    }
}

// ─── Progress ────────────────────────────────────────────────────────

/// Aggregate load progress, as shown on the ingestion control panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadProgress {
    /// Records in the `Loaded` state.
    pub loaded: usize,
    /// All records.
    pub total: usize,
    /// Whether any record is currently loading.
    pub any_loading: bool,
    /// Records in the `Error` state, in registry order.
    pub failed: Vec<DatasetName>,
}

impl LoadProgress {
    fn from_records(records: &[DatasetRecord]) -> Self {
        Self {
            loaded: records.iter().filter(|r| r.state().is_loaded()).count(),
            total: records.len(),
            any_loading: records.iter().any(|r| r.state().is_loading()),
            failed: records
                .iter()
                .filter(|r| r.state().is_error())
                .map(|r| r.name().clone())
                .collect(),
        }
    }

    pub fn all_loaded(&self) -> bool {
        self.loaded == self.total
    }
}

impl std::fmt::Display for LoadProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.all_loaded() {
            f.write_str("All datasets loaded successfully")
        } else {
            write!(f, "{}/{} datasets loaded", self.loaded, self.total)
        }
    }
}

fn all_loaded(records: &[DatasetRecord]) -> bool {
    records.iter().all(|r| r.state().is_loaded())
}

// ─── Registry ────────────────────────────────────────────────────────

/// The dataset records, in registration order, plus a change counter.
#[derive(Debug, Clone)]
pub struct DatasetRegistry {
    records: Vec<DatasetRecord>,
    version: u64,
}

impl DatasetRegistry {
    /// Build a registry with every record `Idle`.
    ///
    /// # Errors
    ///
    /// Rejects an empty descriptor list and duplicate names.
    pub fn new(descriptors: Vec<DatasetDescriptor>) -> Result<Self, RegistryError> {
        if descriptors.is_empty() {
            return Err(RegistryError::Empty);
        }
        let mut seen = HashSet::new();
        for d in &descriptors {
            if !seen.insert(d.name.clone()) {
                return Err(RegistryError::DuplicateDataset(d.name.to_string()));
            }
        }
        Ok(Self {
            records: descriptors.into_iter().map(DatasetRecord::new).collect(),
            version: 0,
        })
    }

    pub fn records(&self) -> &[DatasetRecord] {
        &self.records
    }

    pub fn get(&self, name: &DatasetName) -> Option<&DatasetRecord> {
        self.records.iter().find(|r| r.name() == name)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// True iff every record is `Loaded`.
    pub fn is_ready(&self) -> bool {
        all_loaded(&self.records)
    }

    pub fn progress(&self) -> LoadProgress {
        LoadProgress::from_records(&self.records)
    }

    /// Split into the single writer and a reader.
    pub fn into_shared(self) -> (RegistryWriter, RegistryReader) {
        let inner = Arc::new(RwLock::new(self));
        (
            RegistryWriter {
                inner: Arc::clone(&inner),
            },
            RegistryReader { inner },
        )
    }

    fn get_mut(&mut self, name: &DatasetName) -> Result<&mut DatasetRecord, RegistryError> {
        self.records
            .iter_mut()
            .find(|r| r.name() == name)
            .ok_or_else(|| RegistryError::UnknownDataset(name.to_string()))
    }

    fn begin_load(&mut self, name: &DatasetName) -> Result<AttemptId, RegistryError> {
        let record = self.get_mut(name)?;
        let from = record.state().kind();
        let attempt = match record.begin_load() {
            Ok(attempt) => attempt,
            Err(e) => {
                tracing::debug!(dataset = %name, error = %e, "begin_load rejected");
                return Err(e.into());
            }
        };
        self.version += 1;
        tracing::info!(dataset = %name, %attempt, %from, to = "LOADING", version = self.version, "dataset transition");
        Ok(attempt)
    }

    fn complete_load(
        &mut self,
        name: &DatasetName,
        attempt: AttemptId,
        row_count: u64,
    ) -> Result<(), RegistryError> {
        self.get_mut(name)?.complete_load(attempt, row_count)?;
        self.version += 1;
        tracing::info!(dataset = %name, %attempt, row_count, to = "LOADED", version = self.version, "dataset transition");
        Ok(())
    }

    fn fail_load(
        &mut self,
        name: &DatasetName,
        attempt: AttemptId,
        message: String,
    ) -> Result<(), RegistryError> {
        self.get_mut(name)?.fail_load(attempt, message)?;
        self.version += 1;
        tracing::info!(dataset = %name, %attempt, to = "ERROR", version = self.version, "dataset transition");
        Ok(())
    }

    fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            records: self.records.clone(),
            version: self.version,
        }
    }
}

// ─── Snapshot ────────────────────────────────────────────────────────

/// Immutable copy of the registry at one version.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrySnapshot {
    records: Vec<DatasetRecord>,
    version: u64,
}

impl RegistrySnapshot {
    pub fn records(&self) -> &[DatasetRecord] {
        &self.records
    }

    pub fn get(&self, name: &DatasetName) -> Option<&DatasetRecord> {
        self.records.iter().find(|r| r.name() == name)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// True iff every record is `Loaded`.
    pub fn is_ready(&self) -> bool {
        all_loaded(&self.records)
    }

    pub fn progress(&self) -> LoadProgress {
        LoadProgress::from_records(&self.records)
    }
}

// ─── Reader ──────────────────────────────────────────────────────────

/// Read-only handle onto the shared registry.
#[derive(Debug, Clone)]
pub struct RegistryReader {
    inner: Arc<RwLock<DatasetRegistry>>,
}

impl RegistryReader {
    /// Copy the current registry.
    pub fn snapshot(&self) -> RegistrySnapshot {
        self.inner.read().snapshot()
    }

    /// The readiness gate: true iff every record is `Loaded` right now.
    pub fn is_ready(&self) -> bool {
        self.inner.read().is_ready()
    }

    pub fn version(&self) -> u64 {
        self.inner.read().version()
    }

    pub fn progress(&self) -> LoadProgress {
        self.inner.read().progress()
    }

    pub fn state_of(&self, name: &DatasetName) -> Option<DatasetState> {
        self.inner.read().get(name).map(|r| r.state().clone())
    }

    /// Source identifier of `name`, without copying the registry.
    pub fn source_of(&self, name: &DatasetName) -> Option<String> {
        self.inner.read().get(name).map(|r| r.source().to_string())
    }

    /// Dataset names in registry order.
    pub fn names(&self) -> Vec<DatasetName> {
        self.inner
            .read()
            .records()
            .iter()
            .map(|r| r.name().clone())
            .collect()
    }
}

// ─── Writer ──────────────────────────────────────────────────────────

/// The only handle that can change dataset states.
///
/// Deliberately not `Clone`: whoever holds it is the single writer.
#[derive(Debug)]
pub struct RegistryWriter {
    inner: Arc<RwLock<DatasetRegistry>>,
}

impl RegistryWriter {
    /// A new reader onto the same registry.
    pub fn reader(&self) -> RegistryReader {
        RegistryReader {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Move `name` to `Loading` and return the new attempt id.
    ///
    /// Fails with [`DatasetTransitionError::AlreadyLoading`] if an attempt is
    /// outstanding.
    pub fn begin_load(&self, name: &DatasetName) -> Result<AttemptId, RegistryError> {
        self.inner.write().begin_load(name)
    }

    /// Move `name` from `Loading` to `Loaded` for the given attempt.
    pub fn complete_load(
        &self,
        name: &DatasetName,
        attempt: AttemptId,
        row_count: u64,
    ) -> Result<(), RegistryError> {
        self.inner.write().complete_load(name, attempt, row_count)
    }

    /// Move `name` from `Loading` to `Error` for the given attempt.
    pub fn fail_load(
        &self,
        name: &DatasetName,
        attempt: AttemptId,
        message: impl Into<String>,
    ) -> Result<(), RegistryError> {
        self.inner.write().fail_load(name, attempt, message.into())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
