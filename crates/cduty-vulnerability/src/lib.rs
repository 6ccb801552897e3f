//! # cduty-vulnerability — Vulnerable Customer Analysis
//!
//! ## Pipeline
//!
//! ```text
//!   CSV upload ─▶ CustomerSnapshot ─▶ VulnerabilityClassifier ─▶ filter_and_rank ─▶ rows
//! ```
//!
//! - **Customers** (`customer.rs`): `CustomerRecord` with an optional,
//!   finite `VulnerabilityScore`, a `ProductCategory`, a product, indicator
//!   flags and passthrough columns.
//! - **Classifier** (`classifier.rs`): the single vulnerability rule,
//!   behind the `VulnerabilityClassifier` trait.
//! - **Filter** (`filter.rs`): category → product → score band, then rank
//!   by score. Pure; borrows its inputs.
//! - **View** (`view.rs`): filter state bound to a snapshot, with product
//!   selections checked against the selected category.
//! - **Upload** (`upload.rs`): all-or-nothing CSV validation and the
//!   `CustomerStore` holding the validated snapshot.

pub mod classifier;
pub mod customer;
pub mod filter;
pub mod upload;
pub mod view;

pub use classifier::{
    ClassifierError, ScoreSeverity, ThresholdClassifier, VulnerabilityClassifier,
    DEFAULT_THRESHOLD,
};
pub use customer::{
    CustomerError, CustomerRecord, CustomerSnapshot, ProductCategory, VulnerabilityIndicator,
    VulnerabilityScore,
};
pub use filter::{
    available_products, filter_and_rank, vulnerable, FilterError, FilterState, ScoreBand,
    Selection,
};
pub use upload::{parse_customers, parse_customers_str, CustomerStore, UploadError};
pub use view::{ViewSummary, VulnerabilityView, DATA_REQUIRED_MESSAGE, EMPTY_STATE_MESSAGE};
