//! # cduty-cli — Consumer Duty Dashboard CLI
//!
//! Provides the `cduty` command-line interface over the dashboard core.
//!
//! ## Subcommands
//!
//! - `cduty load` — load datasets and report readiness.
//! - `cduty status` — show the configured datasets and source.
//! - `cduty analysis <VIEW>` — open a gated analysis view.
//! - `cduty customers --file F` — list vulnerable customers.
//! - `cduty products --file F --category C` — list products in a category.
//!
//! ```bash
//! CDUTY_DATA_ROOT=./data cduty load
//! cduty analysis price-and-value
//! cduty customers --file customers.csv --category Mortgages --band 80-90
//! ```
//!
//! Exit codes: 0 on success, 1 on error, 2 when the datasets are not all
//! loaded.

pub mod analysis;
pub mod context;
pub mod customers;
pub mod dataset;
