//! # cduty-state — Dataset Lifecycle and Readiness
//!
//! ## State Machine
//!
//! - **Dataset** (`dataset.rs`): `Idle → Loading → Loaded | Error`, with
//!   `Error → Loading` (retry) and `Loaded → Loading` (reload). The row count
//!   lives inside `Loaded` and the message inside `Error`, so a loaded record
//!   without a count or an errored record without a message cannot be built.
//!
//! - **Registry** (`registry.rs`): the fixed, ordered set of dataset records
//!   for the process lifetime. Converted into exactly one `RegistryWriter`
//!   (held by the ingestion pipeline) and any number of `RegistryReader`s
//!   that hand out immutable snapshots.
//!
//! - **Gate** (`gate.rs`): `ready()` is derived on every read from the
//!   registry, never stored. Analysis views open only through it.

pub mod dataset;
pub mod gate;
pub mod registry;

// ─── Dataset re-exports ─────────────────────────────────────────────

pub use dataset::{
    DatasetRecord, DatasetState, DatasetStateKind, DatasetTransitionError,
    DatasetTransitionRecord, UNKNOWN_ERROR_MESSAGE,
};

// ─── Registry re-exports ────────────────────────────────────────────

pub use registry::{
    DatasetRegistry, LoadProgress, RegistryError, RegistryReader, RegistrySnapshot,
    RegistryWriter,
};

// ─── Gate re-exports ────────────────────────────────────────────────

pub use gate::{require_ready, AnalysisView, NotReady, OpenedView, NOT_READY_NOTICE};
