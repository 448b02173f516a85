pub mod aggregate;
pub mod alerts;
pub mod charts;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod fetch;
pub mod forecast;
pub mod loader;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod report;
pub mod thresholds;
pub mod types;
pub mod util;

pub use config::Config;
pub use error::{PipelineError, Result};
pub use pipeline::{run, RunOutcome};
