//! # cduty-core — Foundational Types for the Consumer Duty Dashboard
//!
//! Every other crate in the workspace depends on `cduty-core`; it depends on
//! nothing internal.
//!
//! ## Contents
//!
//! - **Identifiers** (`identity.rs`): `DatasetName`, `CustomerId` and
//!   `AttemptId` newtypes with validated constructors. No bare strings for keys.
//!
//! - **Dataset descriptors** (`descriptor.rs`): the fixed, named inputs the
//!   dashboard ingests, and the four Consumer Duty defaults.
//!
//! - **Timestamps** (`temporal.rs`): UTC-only, seconds precision, used by
//!   every transition log.
//!
//! - **Configuration** (`config.rs`): `DashboardConfig`, loaded from YAML
//!   and overridden from `CDUTY_*` environment variables.
//!
//! - **Errors** (`error.rs`): `CdutyError`, the umbrella error that the
//!   per-crate error enums convert into.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `cduty-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod identity;
pub mod temporal;

pub use config::{ConfigError, DashboardConfig, RetryConfig, SourceConfig};
pub use descriptor::{default_datasets, DatasetDescriptor};
pub use error::CdutyError;
pub use identity::{AttemptId, CustomerId, DatasetName};
pub use temporal::Timestamp;
