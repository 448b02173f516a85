// Alert threshold derivation.
//
// Every threshold is a fixed fraction of a historical mean: no
// smoothing, no recency weighting. The overall scope averages the
// yearly totals; model and region scopes average the raw
// per-transaction volumes for that model or region.

use std::collections::HashMap;

use tracing::debug;

use crate::config::Config;
use crate::types::{SalesRecord, YearlyPoint};
use crate::util::mean;

/// `mean(values) * multiplier`.
pub fn threshold(values: &[f64], multiplier: f64) -> f64 {
    mean(values) * multiplier
}

/// The full threshold set for one evaluation pass.
#[derive(Debug, Clone)]
pub struct AlertThresholds {
    pub overall: f64,
    pub per_model: HashMap<String, f64>,
    pub per_region: HashMap<String, f64>,
}

impl AlertThresholds {
    pub fn model(&self, name: &str) -> f64 {
        self.per_model.get(name).copied().unwrap_or(self.overall)
    }

    pub fn region(&self, name: &str) -> f64 {
        self.per_region.get(name).copied().unwrap_or(self.overall)
    }
}

/// Derive thresholds for the overall series, each top model and each
/// distinct region.
pub fn compute_thresholds(
    records: &[SalesRecord],
    yearly: &[YearlyPoint],
    top_models: &[String],
    regions: &[String],
    cfg: &Config,
) -> AlertThresholds {
    let totals: Vec<f64> = yearly.iter().map(|p| p.total_sales).collect();
    let overall = threshold(&totals, cfg.overall_threshold_multiplier);
    debug!("overall alert threshold: {:.0}", overall);

    let mut per_model = HashMap::new();
    for model in top_models {
        let values: Vec<f64> = records
            .iter()
            .filter(|r| &r.model == model)
            .map(|r| r.sales_volume)
            .collect();
        per_model.insert(model.clone(), threshold(&values, cfg.model_threshold_multiplier));
    }

    let mut per_region = HashMap::new();
    for region in regions {
        let values: Vec<f64> = records
            .iter()
            .filter(|r| &r.region == region)
            .map(|r| r.sales_volume)
            .collect();
        per_region.insert(
            region.clone(),
            threshold(&values, cfg.region_threshold_multiplier),
        );
    }

    AlertThresholds {
        overall,
        per_model,
        per_region,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn threshold_is_mean_times_multiplier() {
        assert_relative_eq!(threshold(&[100.0, 110.0, 90.0], 0.8), 80.0);
        assert_relative_eq!(threshold(&[50.0], 0.5), 25.0);
    }

    #[test]
    fn threshold_scales_linearly_with_input() {
        let series = [120.0, 80.0, 95.0, 130.0];
        let scaled: Vec<f64> = series.iter().map(|v| v * 3.0).collect();
        assert_relative_eq!(threshold(&scaled, 0.8), threshold(&series, 0.8) * 3.0);
    }

    #[test]
    fn unknown_scope_falls_back_to_overall() {
        let thresholds = AlertThresholds {
            overall: 77.0,
            per_model: HashMap::new(),
            per_region: HashMap::new(),
        };
        assert_eq!(thresholds.model("i8"), 77.0);
        assert_eq!(thresholds.region("Antarctica"), 77.0);
    }
}
