//! Shared setup for subcommands: configuration, runtime, pipeline.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use cduty_core::DashboardConfig;
use cduty_ingest::{ConfiguredSource, IngestionPipeline, TracingNotifier};
use cduty_state::{DatasetRegistry, RegistrySnapshot};

/// Exit code when the datasets are not all loaded.
pub const EXIT_NOT_READY: u8 = 2;

pub type Pipeline = IngestionPipeline<ConfiguredSource, TracingNotifier>;

/// Load and validate configuration from an optional file plus `CDUTY_*`
/// variables.
pub fn load_config(path: Option<&Path>) -> Result<DashboardConfig> {
    DashboardConfig::load(path).context("loading dashboard configuration")
}

/// Build the dataset registry and the pipeline that owns its writer.
pub fn build_pipeline(config: &DashboardConfig) -> Result<Pipeline> {
    let registry = DatasetRegistry::new(config.datasets.clone())
        .context("building dataset registry")?;
    let (writer, _reader) = registry.into_shared();
    let source =
        ConfiguredSource::from_config(&config.source).context("configuring dataset source")?;
    tracing::debug!(source = %cduty_ingest::DatasetSource::describe(&source), "dataset source ready");
    Ok(IngestionPipeline::new(writer, source, TracingNotifier)
        .with_load_delay(Duration::from_millis(config.load_delay_ms)))
}

/// A single-threaded runtime: loads run one at a time on one thread.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting async runtime")
}

/// Print one line per dataset plus the progress line.
pub fn print_registry(snapshot: &RegistrySnapshot) {
    for record in snapshot.records() {
        println!(
            "  {:<14} {:<28} {}",
            record.name().as_str(),
            record.source(),
            record.state()
        );
    }
    println!("{}", snapshot.progress());
}
