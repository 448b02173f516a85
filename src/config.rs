// Pipeline configuration and constants.
//
// Everything the run needs in one place: data source, output location,
// forecasting parameters and alert multipliers. Defaults mirror the
// values the analysis was tuned with; the integration tests override
// paths to point at a tempdir.

use std::path::{Path, PathBuf};

pub const DATA_CSV_URL: &str =
    "https://raw.githubusercontent.com/StephenEastham/bmw-sales-forecast/refs/heads/main/BMW-sales-data-2010-2024.csv";

#[derive(Debug, Clone)]
pub struct Config {
    /// Remote location of the sales CSV, fetched only when the local
    /// cache file is missing.
    pub data_url: String,
    /// Local cache path for the sales CSV.
    pub csv_path: PathBuf,
    /// Directory for all generated artifacts; wiped at run start.
    pub output_dir: PathBuf,
    /// Number of future periods to forecast.
    pub forecast_steps: usize,
    /// Fraction of the yearly series used for training in the held-out
    /// evaluation of the overall forecast.
    pub train_split: f64,
    /// Confidence level for forecast intervals.
    pub confidence_level: f64,
    /// Threshold multipliers per scope.
    pub overall_threshold_multiplier: f64,
    pub model_threshold_multiplier: f64,
    pub region_threshold_multiplier: f64,
    /// Year-over-year decline rate above which a trend alert fires.
    pub decline_threshold: f64,
    /// How many top-selling models get individual forecasts.
    pub top_model_count: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_url: DATA_CSV_URL.to_string(),
            csv_path: PathBuf::from("BMW-sales-data-2010-2024.csv"),
            output_dir: PathBuf::from("outputs"),
            forecast_steps: 3,
            train_split: 0.8,
            confidence_level: 0.95,
            overall_threshold_multiplier: 0.8,
            model_threshold_multiplier: 0.8,
            region_threshold_multiplier: 0.8,
            decline_threshold: 0.15,
            top_model_count: 5,
        }
    }
}

impl Config {
    /// Path of an artifact inside the output directory.
    pub fn out_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }

    pub fn with_paths(csv_path: impl AsRef<Path>, output_dir: impl AsRef<Path>) -> Self {
        Self {
            csv_path: csv_path.as_ref().to_path_buf(),
            output_dir: output_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }
}
