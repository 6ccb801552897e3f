//! # Customer Subcommands
//!
//! - `customers` — validate an upload, then list vulnerable customers
//!   filtered by category, product and score band, highest score first.
//! - `products` — list the products offered to vulnerable customers in a
//!   category.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use cduty_state::require_ready;
use cduty_vulnerability::{
    CustomerRecord, CustomerSnapshot, CustomerStore, ProductCategory, ScoreBand, ScoreSeverity,
    Selection, ThresholdClassifier, ViewSummary, VulnerabilityView, DATA_REQUIRED_MESSAGE,
};

use crate::context::{build_pipeline, load_config, runtime, EXIT_NOT_READY};

/// Arguments for `cduty customers`.
#[derive(Args, Debug)]
pub struct CustomersArgs {
    /// Customer CSV upload.
    #[arg(long)]
    pub file: PathBuf,

    /// Product category (e.g. "Mortgages"). All categories when omitted.
    #[arg(long)]
    pub category: Option<String>,

    /// Product within the category. Requires --category.
    #[arg(long, requires = "category")]
    pub product: Option<String>,

    /// Inclusive score band, e.g. 80-90.
    #[arg(long, value_parser = parse_band)]
    pub band: Option<ScoreBand>,

    /// Load every dataset first and refuse to list customers unless all
    /// of them loaded.
    #[arg(long)]
    pub require_ready: bool,

    /// Print as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `cduty products`.
#[derive(Args, Debug)]
pub struct ProductsArgs {
    /// Customer CSV upload.
    #[arg(long)]
    pub file: PathBuf,

    /// Product category.
    #[arg(long)]
    pub category: String,
}

fn parse_band(s: &str) -> Result<ScoreBand, String> {
    s.parse().map_err(|e: cduty_vulnerability::FilterError| e.to_string())
}

#[derive(Serialize)]
struct CustomerRow<'a> {
    #[serde(flatten)]
    customer: &'a CustomerRecord,
    severity: Option<ScoreSeverity>,
}

#[derive(Serialize)]
struct CustomerListing<'a> {
    summary: ViewSummary,
    customers: Vec<CustomerRow<'a>>,
}

/// Validate an upload. On rejection the error leads with the notice shown
/// in place of the customer list, followed by the validation failure.
fn validated_upload(file: &Path) -> Result<Arc<CustomerSnapshot>> {
    let mut store = CustomerStore::new();
    store
        .upload_path(file)
        .with_context(|| format!("validating {}", file.display()))
        .context(DATA_REQUIRED_MESSAGE)
}

/// Execute `cduty customers`.
pub fn run_customers(args: &CustomersArgs, config_path: Option<&Path>) -> Result<u8> {
    let config = load_config(config_path)?;

    if args.require_ready {
        let pipeline = build_pipeline(&config)?;
        runtime()?.block_on(pipeline.load_all());
        if let Err(not_ready) = require_ready(&pipeline.reader()) {
            println!("{not_ready}");
            return Ok(EXIT_NOT_READY);
        }
    }

    let classifier = ThresholdClassifier::from_config(&config)?;
    let snapshot = validated_upload(&args.file)?;

    let mut view = VulnerabilityView::new(&snapshot, &classifier);
    if let Some(category) = &args.category {
        view.select_category(Selection::Only(ProductCategory::new(category)?));
    }
    if let Some(product) = &args.product {
        view.select_product(Selection::Only(product.clone()))?;
    }
    if let Some(band) = args.band {
        view.select_band(Selection::Only(band));
    }

    let rows = view.rows();
    let summary = view.summary();

    if args.json {
        let listing = CustomerListing {
            summary,
            customers: rows
                .iter()
                .map(|&c| CustomerRow {
                    customer: c,
                    severity: c.score().map(ScoreSeverity::of),
                })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(0);
    }

    println!("Vulnerable Customers ({})", summary.shown);
    if let Some(line) = summary.filtered_from() {
        println!("{line}");
    }
    if let Some(empty) = summary.empty_state() {
        println!("{empty}");
        return Ok(0);
    }
    println!(
        "  {:<12} {:<24} {:>6} {:<9} {:<12} {}",
        "ID", "Name", "Score", "Severity", "Category", "Product"
    );
    for c in rows {
        let score = c
            .score()
            .map_or_else(|| "N/A".to_string(), |s| s.to_string());
        let severity = c
            .score()
            .map_or_else(|| "-".to_string(), |s| ScoreSeverity::of(s).to_string());
        println!(
            "  {:<12} {:<24} {:>6} {:<9} {:<12} {}",
            c.id().as_str(),
            c.name(),
            score,
            severity,
            c.category().as_str(),
            c.product()
        );
    }
    Ok(0)
}

/// Execute `cduty products`.
pub fn run_products(args: &ProductsArgs, config_path: Option<&Path>) -> Result<u8> {
    let config = load_config(config_path)?;
    let classifier = ThresholdClassifier::from_config(&config)?;
    let snapshot = validated_upload(&args.file)?;

    let mut view = VulnerabilityView::new(&snapshot, &classifier);
    view.select_category(Selection::Only(ProductCategory::new(&args.category)?));
    for product in view.available_products() {
        println!("{product}");
    }
    Ok(0)
}
