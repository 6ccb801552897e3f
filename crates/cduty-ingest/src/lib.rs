//! # cduty-ingest — Dataset Ingestion
//!
//! Fetches dataset payloads, counts their rows and moves each dataset
//! through its lifecycle. The [`IngestionPipeline`] owns the registry's
//! only [`RegistryWriter`](cduty_state::RegistryWriter).
//!
//! ## Collaborators
//!
//! - [`DatasetSource`]: where payloads come from (filesystem, HTTP, mock).
//! - [`Notifier`]: where success and failure messages go (tracing,
//!   in-memory).
//!
//! ## Failure Model
//!
//! A failed fetch or an unparseable payload is a dataset state, not an
//! error. It is recorded on the record, announced through the notifier,
//! and stays retryable. `load_all` never stops early.

pub mod notify;
pub mod payload;
pub mod pipeline;
mod retry;
pub mod source;

pub use notify::{CollectingNotifier, Notification, Notifier, Severity, TracingNotifier};
pub use payload::{count_rows, PayloadError};
pub use pipeline::{
    IngestError, IngestionPipeline, LoadAllReport, LoadOutcome, CANCELLED_MESSAGE,
    DEFAULT_LOAD_DELAY,
};
pub use source::{
    ConfiguredSource, DatasetSource, FetchError, FileSystemSource, HttpSource, MockDatasetSource,
};
