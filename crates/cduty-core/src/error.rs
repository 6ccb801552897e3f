//! # Error Types — Structured Error Hierarchy
//!
//! Defines the umbrella error for the dashboard. All errors use `thiserror`
//! for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Dataset lifecycle errors include the dataset, the current state and the
//!   attempted transition.
//! - Upload errors name the offending row and column.
//! - Dataset fetch and parse failures never surface here: the ingestion
//!   pipeline records them as dataset state instead.

use thiserror::Error;

use crate::config::ConfigError;

/// Top-level error type for the Consumer Duty dashboard.
#[derive(Error, Debug)]
pub enum CdutyError {
    /// Configuration could not be loaded or failed validation.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An identifier failed validation.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Dataset registry or lifecycle transition rejected.
    #[error("invalid state transition: {0}")]
    InvalidTransition(String),

    /// Ingestion was asked to do something the registry cannot satisfy.
    #[error("ingestion error: {0}")]
    Ingest(String),

    /// Customer upload was rejected.
    #[error("upload rejected: {0}")]
    Upload(String),

    /// A filter selection was invalid for the current customer snapshot.
    #[error("invalid filter: {0}")]
    Filter(String),

    /// A gated view was requested before the datasets were ready.
    #[error("{0}")]
    NotReady(String),
}
