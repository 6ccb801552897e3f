//! # Dataset Subcommands
//!
//! - `load` — load all datasets (or the named ones) and report readiness.
//! - `status` — show the configured registry and source without loading.

use std::path::Path;

use anyhow::Result;
use clap::Args;

use cduty_core::DatasetName;
use cduty_ingest::{DatasetSource, LoadOutcome};

use crate::context::{build_pipeline, load_config, print_registry, runtime, EXIT_NOT_READY};

/// Arguments for `cduty load`.
#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Load only this dataset. Repeatable. Loads every unloaded dataset
    /// when omitted.
    #[arg(long = "dataset", value_name = "NAME")]
    pub datasets: Vec<String>,

    /// Print the final registry as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `cduty status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Print as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute `cduty load`. Returns exit code 0 when every dataset is loaded.
pub fn run_load(args: &LoadArgs, config_path: Option<&Path>) -> Result<u8> {
    let config = load_config(config_path)?;
    let pipeline = build_pipeline(&config)?;

    let names = args
        .datasets
        .iter()
        .map(DatasetName::new)
        .collect::<Result<Vec<_>, _>>()?;

    let rt = runtime()?;
    rt.block_on(async {
        if names.is_empty() {
            let report = pipeline.load_all().await;
            tracing::debug!(attempts = report.attempts(), "load-all finished");
            return Ok::<_, anyhow::Error>(());
        }
        for name in &names {
            match pipeline.load_dataset(name).await? {
                LoadOutcome::Skipped { dataset } => {
                    tracing::info!(%dataset, "already loading, skipped")
                }
                outcome => tracing::debug!(dataset = %outcome.dataset(), "load finished"),
            }
        }
        Ok(())
    })?;

    let snapshot = pipeline.reader().snapshot();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        println!("Datasets ({})", pipeline.source().describe());
        print_registry(&snapshot);
    }

    Ok(if snapshot.is_ready() { 0 } else { EXIT_NOT_READY })
}

/// Execute `cduty status`.
pub fn run_status(args: &StatusArgs, config_path: Option<&Path>) -> Result<u8> {
    let config = load_config(config_path)?;
    let pipeline = build_pipeline(&config)?;
    let snapshot = pipeline.reader().snapshot();

    if args.json {
        let out = serde_json::json!({
            "source": pipeline.source().describe(),
            "load_delay_ms": config.load_delay_ms,
            "vulnerability_threshold": config.vulnerability_threshold,
            "registry": snapshot,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("Source:                  {}", pipeline.source().describe());
        println!("Load delay:              {} ms", config.load_delay_ms);
        println!("Vulnerability threshold: {}", config.vulnerability_threshold);
        println!("Datasets:");
        print_registry(&snapshot);
    }
    Ok(0)
}
