use std::path::PathBuf;
use thiserror::Error;

/// Errors the pipeline treats as fatal.
///
/// Forecast-fit failures never surface here; they degrade tier by tier
/// inside the forecaster. Fetch failures are logged and recovered with
/// the local file, which then fails on load if it is truly absent.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no usable sales rows in {path}")]
    EmptyDataset { path: PathBuf },

    #[error("chart rendering failed: {0}")]
    Chart(String),
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
