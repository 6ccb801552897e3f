//! # Readiness Gate
//!
//! `ready()` is the conjunction of `state == Loaded` over every record. It
//! is derived from the registry on each call and never stored.
//!
//! Analysis views open only through [`require_ready`] (or
//! [`AnalysisView::open`]). When the gate is closed the caller receives a
//! [`NotReady`] carrying the fixed notice, and must show that instead of
//! reading any dataset-derived data.

use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use cduty_core::{CdutyError, DatasetName};

use crate::registry::{RegistryReader, RegistrySnapshot};

/// Notice shown in place of any gated view while the gate is closed.
pub const NOT_READY_NOTICE: &str =
    "Datasets are not yet loaded. Please load all required datasets to proceed with analysis.";

/// The gate is closed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", NOT_READY_NOTICE)]
pub struct NotReady {
    /// Datasets that are idle or loading.
    pub pending: Vec<DatasetName>,
    /// Datasets whose last attempt failed.
    pub failed: Vec<DatasetName>,
    /// Registry version the decision was taken at.
    pub version: u64,
}

impl From<NotReady> for CdutyError {
    fn from(err: NotReady) -> Self {
        CdutyError::NotReady(err.to_string())
    }
}

/// Take a snapshot and return it only if every dataset is loaded.
///
/// The snapshot and the decision come from the same read, so a caller never
/// sees a "ready" answer paired with a registry that has since changed.
pub fn require_ready(reader: &RegistryReader) -> Result<RegistrySnapshot, NotReady> {
    let snapshot = reader.snapshot();
    if snapshot.is_ready() {
        return Ok(snapshot);
    }
    let mut pending = Vec::new();
    let mut failed = Vec::new();
    for record in snapshot.records() {
        if record.state().is_error() {
            failed.push(record.name().clone());
        } else if !record.state().is_loaded() {
            pending.push(record.name().clone());
        }
    }
    Err(NotReady {
        pending,
        failed,
        version: snapshot.version(),
    })
}

// ─── Analysis Views ──────────────────────────────────────────────────

/// The Consumer Duty analysis views that depend on the loaded datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisView {
    ConsumerDutyStats,
    ProductsAndServices,
    PriceAndValue,
    ConsumerUnderstanding,
    ConsumerSupport,
}

impl AnalysisView {
    pub const ALL: [AnalysisView; 5] = [
        Self::ConsumerDutyStats,
        Self::ProductsAndServices,
        Self::PriceAndValue,
        Self::ConsumerUnderstanding,
        Self::ConsumerSupport,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Self::ConsumerDutyStats => "Consumer Duty Stats",
            Self::ProductsAndServices => "Products & Services",
            Self::PriceAndValue => "Price & Value",
            Self::ConsumerUnderstanding => "Consumer Understanding",
            Self::ConsumerSupport => "Consumer Support",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Self::ConsumerDutyStats => "consumer-duty-stats",
            Self::ProductsAndServices => "products-and-services",
            Self::PriceAndValue => "price-and-value",
            Self::ConsumerUnderstanding => "consumer-understanding",
            Self::ConsumerSupport => "consumer-support",
        }
    }

    /// Open this view through the gate.
    pub fn open(self, reader: &RegistryReader) -> Result<OpenedView, NotReady> {
        let snapshot = require_ready(reader)?;
        Ok(OpenedView {
            view: self,
            snapshot,
        })
    }
}

impl std::fmt::Display for AnalysisView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for AnalysisView {
    type Err = String;

    /// Accepts the slug or the title, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|v| v.slug().eq_ignore_ascii_case(needle) || v.title().eq_ignore_ascii_case(needle))
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|v| v.slug()).collect();
                format!("unknown analysis view {s:?}; expected one of: {}", known.join(", "))
            })
    }
}

/// A view that passed the gate, with the snapshot it was opened against.
#[derive(Debug, Clone)]
pub struct OpenedView {
    view: AnalysisView,
    snapshot: RegistrySnapshot,
}

impl OpenedView {
    pub fn view(&self) -> AnalysisView {
        self.view
    }

    pub fn snapshot(&self) -> &RegistrySnapshot {
        &self.snapshot
    }

    /// Total data rows across the datasets backing this view.
    pub fn total_rows(&self) -> u64 {
        self.snapshot
            .records()
            .iter()
            .filter_map(|r| r.state().row_count())
            .sum()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
