//! # Analysis Subcommand
//!
//! Loads every dataset, then opens one of the Consumer Duty analysis views
//! through the readiness gate. While any dataset is not loaded the view is
//! replaced by the fixed not-ready notice.

use std::path::Path;

use anyhow::Result;
use clap::Args;

use cduty_state::AnalysisView;

use crate::context::{build_pipeline, load_config, print_registry, runtime, EXIT_NOT_READY};

/// Arguments for `cduty analysis`.
#[derive(Args, Debug)]
pub struct AnalysisArgs {
    /// View to open: consumer-duty-stats, products-and-services,
    /// price-and-value, consumer-understanding, consumer-support.
    #[arg(value_parser = parse_view)]
    pub view: AnalysisView,
}

fn parse_view(s: &str) -> Result<AnalysisView, String> {
    s.parse()
}

/// Execute `cduty analysis`.
pub fn run_analysis(args: &AnalysisArgs, config_path: Option<&Path>) -> Result<u8> {
    let config = load_config(config_path)?;
    let pipeline = build_pipeline(&config)?;
    let rt = runtime()?;
    rt.block_on(pipeline.load_all());

    match args.view.open(&pipeline.reader()) {
        Ok(opened) => {
            println!("{}", opened.view().title());
            print_registry(opened.snapshot());
            println!("Total records: {}", opened.total_rows());
            Ok(0)
        }
        Err(not_ready) => {
            println!("{not_ready}");
            for name in &not_ready.failed {
                println!("  failed:  {name}");
            }
            for name in &not_ready.pending {
                println!("  pending: {name}");
            }
            Ok(EXIT_NOT_READY)
        }
    }
}
