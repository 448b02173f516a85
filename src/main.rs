// Batch entry point: one full analysis run against the configured
// dataset, all artifacts written to the output directory.

use anyhow::Context;
use tracing::info;

use sales_forecast::{logging, pipeline, Config};

fn main() -> anyhow::Result<()> {
    logging::init();

    let cfg = Config::default();
    let outcome = pipeline::run(&cfg).context("analysis run failed")?;

    info!(
        "run complete: {} records, {} alert(s), report at {}",
        outcome.records,
        outcome.alerts.len(),
        outcome.report_path.display()
    );
    Ok(())
}
