//! # cduty CLI entry point
//!
//! Parses command-line arguments, initialises tracing and dispatches to
//! subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cduty_cli::analysis::{run_analysis, AnalysisArgs};
use cduty_cli::customers::{run_customers, run_products, CustomersArgs, ProductsArgs};
use cduty_cli::dataset::{run_load, run_status, LoadArgs, StatusArgs};

/// Consumer Duty dashboard core.
///
/// Loads the Consumer Duty datasets, gates analysis views on their
/// readiness, and ranks vulnerable customers from a CSV upload.
#[derive(Parser, Debug)]
#[command(name = "cduty", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Path to a YAML configuration file.
    #[arg(long, global = true, env = "CDUTY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load datasets and report readiness.
    Load(LoadArgs),

    /// Show the configured datasets and source without loading.
    Status(StatusArgs),

    /// Load all datasets and open an analysis view through the readiness gate.
    Analysis(AnalysisArgs),

    /// List vulnerable customers from an upload, filtered and ranked.
    Customers(CustomersArgs),

    /// List products offered to vulnerable customers in a category.
    Products(ProductsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v.
    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = cli.config.as_deref();
    let result = match &cli.command {
        Commands::Load(args) => run_load(args, config),
        Commands::Status(args) => run_status(args, config),
        Commands::Analysis(args) => run_analysis(args, config),
        Commands::Customers(args) => run_customers(args, config),
        Commands::Products(args) => run_products(args, config),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
