//! # Dataset Lifecycle State Machine
//!
//! Models the load lifecycle of one named dataset.
//!
//! ## States
//!
//! ```text
//!            begin_load              complete_load
//!   Idle ──────────────▶ Loading ──────────────────▶ Loaded { row_count }
//!                         ▲   │                          │
//!                         │   │ fail_load                │ begin_load (reload)
//!                         │   ▼                          │
//!                         │ Error { message }            │
//!                         │   │                          │
//!                         └───┴──────────────────────────┘
//!                           begin_load (retry)
//! ```
//!
//! `Loading → Loading` is rejected: a record that is already loading cannot
//! start a second attempt. Completions carry the [`AttemptId`] issued by
//! `begin_load`; a completion for any other attempt is rejected.
//!
//! ## Design Decision
//!
//! Four states and one in-flight attempt do not justify typestate types, and
//! the registry must hold heterogeneous records in one `Vec`. The enum
//! approach with transitions returning `Result` keeps the registry simple
//! while the enum payloads make the state/row-count/message invariant
//! unrepresentable to violate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use cduty_core::{AttemptId, DatasetDescriptor, DatasetName, Timestamp};

/// Message recorded when a failure is reported with an empty description.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";

// ─── States ──────────────────────────────────────────────────────────

/// The lifecycle state of a dataset, with the data each state owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DatasetState {
    /// Not loaded yet in this process.
    Idle,
    /// A fetch is outstanding.
    Loading,
    /// Payload fetched and parsed.
    Loaded {
        /// Number of data rows (header excluded).
        row_count: u64,
    },
    /// The last attempt failed. Retryable.
    Error {
        /// Human-readable, never empty.
        message: String,
    },
}

impl DatasetState {
    /// The payload-free discriminant of this state.
    pub fn kind(&self) -> DatasetStateKind {
        match self {
            Self::Idle => DatasetStateKind::Idle,
            Self::Loading => DatasetStateKind::Loading,
            Self::Loaded { .. } => DatasetStateKind::Loaded,
            Self::Error { .. } => DatasetStateKind::Error,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Row count, defined only when loaded.
    pub fn row_count(&self) -> Option<u64> {
        match self {
            Self::Loaded { row_count } => Some(*row_count),
            _ => None,
        }
    }

    /// Error message, defined only in the error state.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { message } => Some(message),
            _ => None,
        }
    }
}

impl std::fmt::Display for DatasetState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loaded { row_count } => write!(f, "LOADED ({row_count} records)"),
            Self::Error { message } => write!(f, "ERROR ({message})"),
            other => write!(f, "{}", other.kind()),
        }
    }
}

/// Discriminant of [`DatasetState`], used in transition logs and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DatasetStateKind {
    Idle,
    Loading,
    Loaded,
    Error,
}

impl DatasetStateKind {
    /// All states, in lifecycle order.
    pub const ALL: [DatasetStateKind; 4] = [Self::Idle, Self::Loading, Self::Loaded, Self::Error];

    /// States reachable from this one in a single transition.
    pub fn valid_transitions(&self) -> &'static [DatasetStateKind] {
        match self {
            Self::Idle => &[Self::Loading],
            Self::Loading => &[Self::Loaded, Self::Error],
            Self::Loaded => &[Self::Loading],
            Self::Error => &[Self::Loading],
        }
    }

    pub fn can_transition_to(&self, to: DatasetStateKind) -> bool {
        self.valid_transitions().contains(&to)
    }
}

impl std::fmt::Display for DatasetStateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "IDLE",
            Self::Loading => "LOADING",
            Self::Loaded => "LOADED",
            Self::Error => "ERROR",
        };
        f.write_str(s)
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors from dataset lifecycle transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DatasetTransitionError {
    /// Attempted transition is not valid from the current state.
    #[error("invalid transition for dataset {dataset}: {from} -> {to}")]
    InvalidTransition {
        dataset: String,
        from: DatasetStateKind,
        to: DatasetStateKind,
    },

    /// A load was requested while another attempt is outstanding.
    #[error("dataset {dataset} is already loading ({attempt})")]
    AlreadyLoading { dataset: String, attempt: AttemptId },

    /// A completion arrived for an attempt that is not the current one.
    #[error("dataset {dataset}: {attempt} is not the current load attempt")]
    StaleAttempt { dataset: String, attempt: AttemptId },
}

// ─── Transition Log ──────────────────────────────────────────────────

/// Record of one dataset state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetTransitionRecord {
    pub from_state: DatasetStateKind,
    pub to_state: DatasetStateKind,
    pub attempt: AttemptId,
    pub timestamp: Timestamp,
}

// ─── Record ──────────────────────────────────────────────────────────

/// A dataset descriptor together with its lifecycle state and history.
///
/// Fields are private: the only way to change state is through the
/// transition methods, which the registry exposes to its single writer.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetRecord {
    descriptor: DatasetDescriptor,
    state: DatasetState,
    current_attempt: Option<AttemptId>,
    transitions: Vec<DatasetTransitionRecord>,
}

impl DatasetRecord {
    /// Create a record in the `Idle` state.
    pub fn new(descriptor: DatasetDescriptor) -> Self {
        Self {
            descriptor,
            state: DatasetState::Idle,
            current_attempt: None,
            transitions: Vec::new(),
        }
    }

    pub fn name(&self) -> &DatasetName {
        &self.descriptor.name
    }

    pub fn source(&self) -> &str {
        &self.descriptor.source
    }

    pub fn descriptor(&self) -> &DatasetDescriptor {
        &self.descriptor
    }

    pub fn state(&self) -> &DatasetState {
        &self.state
    }

    /// The outstanding attempt, present only while loading.
    pub fn current_attempt(&self) -> Option<AttemptId> {
        self.current_attempt
    }

    /// Ordered log of every state transition.
    pub fn transitions(&self) -> &[DatasetTransitionRecord] {
        &self.transitions
    }

    /// Start a load attempt (IDLE | LOADED | ERROR → LOADING).
    ///
    /// Clears any previous error or row count.
    pub(crate) fn begin_load(&mut self) -> Result<AttemptId, DatasetTransitionError> {
        if let (DatasetState::Loading, Some(attempt)) = (&self.state, self.current_attempt) {
            return Err(DatasetTransitionError::AlreadyLoading {
                dataset: self.name().to_string(),
                attempt,
            });
        }
        self.require_transition(DatasetStateKind::Loading)?;
        let attempt = AttemptId::new();
        self.current_attempt = Some(attempt);
        self.do_transition(DatasetState::Loading, attempt);
        Ok(attempt)
    }

    /// Finish the current attempt successfully (LOADING → LOADED).
    pub(crate) fn complete_load(
        &mut self,
        attempt: AttemptId,
        row_count: u64,
    ) -> Result<(), DatasetTransitionError> {
        self.require_current_attempt(attempt, DatasetStateKind::Loaded)?;
        self.current_attempt = None;
        self.do_transition(DatasetState::Loaded { row_count }, attempt);
        Ok(())
    }

    /// Finish the current attempt with a failure (LOADING → ERROR).
    ///
    /// A blank message is recorded as [`UNKNOWN_ERROR_MESSAGE`].
    pub(crate) fn fail_load(
        &mut self,
        attempt: AttemptId,
        message: impl Into<String>,
    ) -> Result<(), DatasetTransitionError> {
        self.require_current_attempt(attempt, DatasetStateKind::Error)?;
        let mut message = message.into();
        if message.trim().is_empty() {
            message = UNKNOWN_ERROR_MESSAGE.to_string();
        }
        self.current_attempt = None;
        self.do_transition(DatasetState::Error { message }, attempt);
        Ok(())
    }

    fn require_transition(&self, to: DatasetStateKind) -> Result<(), DatasetTransitionError> {
        let from = self.state.kind();
        if !from.can_transition_to(to) {
            return Err(DatasetTransitionError::InvalidTransition {
                dataset: self.name().to_string(),
                from,
                to,
            });
        }
        Ok(())
    }

    fn require_current_attempt(
        &self,
        attempt: AttemptId,
        to: DatasetStateKind,
    ) -> Result<(), DatasetTransitionError> {
        self.require_transition(to)?;
        if self.current_attempt != Some(attempt) {
            return Err(DatasetTransitionError::StaleAttempt {
                dataset: self.name().to_string(),
                attempt,
            });
        }
        Ok(())
    }

    fn do_transition(&mut self, to: DatasetState, attempt: AttemptId) {
        self.transitions.push(DatasetTransitionRecord {
            from_state: self.state.kind(),
            to_state: to.kind(),
            attempt,
            timestamp: Timestamp::now(),
        });
        self.state = to;
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
