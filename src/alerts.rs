// Rule-based alert evaluation.
//
// A single pass over forecasts, thresholds and latest actuals that
// rebuilds the alert list from empty. Rules are independent; one model
// or region can trigger several alert types in the same pass. Every
// triggered alert is also written to the run's alert log, a side
// channel nothing reads back programmatically.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::Local;
use tracing::warn;

use crate::aggregate::GroupedYearly;
use crate::error::{PipelineError, Result};
use crate::thresholds::AlertThresholds;
use crate::types::{Alert, ForecastOutcome};

/// Append-only alert log scoped to one pipeline run: a text file in
/// the output directory plus the console via `tracing`.
pub struct AlertLog {
    writer: BufWriter<File>,
}

impl AlertLog {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
        Ok(AlertLog {
            writer: BufWriter::new(file),
        })
    }

    fn record(&mut self, message: &str) {
        warn!("{}", message);
        let line = format!(
            "{} - WARNING - {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            message
        );
        // A failed log write must not abort alert evaluation.
        let _ = self.writer.write_all(line.as_bytes());
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

impl Drop for AlertLog {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

/// Evaluate every alert rule and return the triggered alerts in
/// evaluation order: overall first, then per model (performance, then
/// decline) in top-N order, then per region in first-appearance order.
#[allow(clippy::too_many_arguments)]
pub fn evaluate_alerts(
    overall_forecast: &[f64],
    model_forecasts: &[(String, ForecastOutcome)],
    regions: &[String],
    region_yearly: &GroupedYearly,
    latest_year: i32,
    thresholds: &AlertThresholds,
    decline_threshold: f64,
    log: &mut AlertLog,
) -> Vec<Alert> {
    let mut alerts: Vec<Alert> = Vec::new();

    for (i, value) in overall_forecast.iter().enumerate() {
        if *value < thresholds.overall {
            push(
                &mut alerts,
                Alert::OverallSales {
                    horizon: i + 1,
                    forecast_value: *value,
                    threshold: thresholds.overall,
                    gap: thresholds.overall - value,
                },
                log,
            );
        }
    }

    for (model, outcome) in model_forecasts {
        let threshold = thresholds.model(model);
        let recent_sales = outcome.historical.last().copied().unwrap_or(0.0);
        if recent_sales < threshold {
            push(
                &mut alerts,
                Alert::ModelUnderperformance {
                    model: model.clone(),
                    recent_sales,
                    threshold,
                    gap: threshold - recent_sales,
                },
                log,
            );
        }

        // Needs two observations; shorter histories are simply not
        // evaluated.
        if outcome.historical.len() >= 2 {
            let prev = outcome.historical[outcome.historical.len() - 2];
            let last = outcome.historical[outcome.historical.len() - 1];
            let decline_rate = (prev - last) / prev;
            if decline_rate > decline_threshold {
                push(
                    &mut alerts,
                    Alert::DecliningTrend {
                        item: model.clone(),
                        decline_rate,
                    },
                    log,
                );
            }
        }
    }

    for region in regions {
        let Some(sales) = region_yearly.value_for(region, latest_year) else {
            continue;
        };
        let threshold = thresholds.region(region);
        if sales < threshold {
            push(
                &mut alerts,
                Alert::RegionUnderperformance {
                    region: region.clone(),
                    sales,
                    threshold,
                    gap: threshold - sales,
                },
                log,
            );
        }
    }

    alerts
}

fn push(alerts: &mut Vec<Alert>, alert: Alert, log: &mut AlertLog) {
    log.record(&alert.message());
    alerts.push(alert);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::types::{ForecastTier, SalesRecord, YearlyPoint};
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    fn log() -> (AlertLog, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let log = AlertLog::create(&dir.path().join("sales_alerts.log")).unwrap();
        (log, dir)
    }

    fn outcome(historical: Vec<f64>) -> ForecastOutcome {
        let n = historical.len();
        ForecastOutcome {
            years: (0..n as i32).map(|i| 2015 + i).collect(),
            historical,
            forecast_years: vec![],
            forecast: vec![],
            confidence: None,
            holdout: None,
            tier: ForecastTier::Naive,
        }
    }

    fn thresholds(overall: f64) -> AlertThresholds {
        AlertThresholds {
            overall,
            per_model: HashMap::new(),
            per_region: HashMap::new(),
        }
    }

    fn empty_regions() -> GroupedYearly {
        crate::aggregate::region_yearly(&[])
    }

    #[test]
    fn overall_shortfall_computes_gap() {
        // Scenario A from the analysis: threshold mean(100,110,90)*0.8
        // = 80, one forecast value of 75 => one alert with gap 5.
        let cfg = Config::default();
        let yearly: Vec<YearlyPoint> = [100.0, 110.0, 90.0]
            .iter()
            .enumerate()
            .map(|(i, v)| YearlyPoint {
                year: 2020 + i as i32,
                total_sales: *v,
                yoy_growth: None,
            })
            .collect();
        let th = crate::thresholds::compute_thresholds(&[], &yearly, &[], &[], &cfg);
        assert_relative_eq!(th.overall, 80.0);

        let (mut log, _dir) = log();
        let alerts = evaluate_alerts(&[75.0], &[], &[], &empty_regions(), 2022, &th, 0.15, &mut log);
        assert_eq!(alerts.len(), 1);
        match &alerts[0] {
            Alert::OverallSales {
                horizon,
                forecast_value,
                threshold,
                gap,
            } => {
                assert_eq!(*horizon, 1);
                assert_relative_eq!(*forecast_value, 75.0);
                assert_relative_eq!(*threshold, 80.0);
                assert_relative_eq!(*gap, 5.0);
            }
            other => panic!("unexpected alert {:?}", other),
        }
    }

    #[test]
    fn overall_fires_iff_below_threshold() {
        let (mut log, _dir) = log();
        let th = thresholds(80.0);
        let alerts = evaluate_alerts(
            &[80.0, 79.9, 120.0],
            &[],
            &[],
            &empty_regions(),
            2022,
            &th,
            0.15,
            &mut log,
        );
        // Equality does not trigger; only the strictly-below value does.
        assert_eq!(alerts.len(), 1);
        assert!(matches!(alerts[0], Alert::OverallSales { horizon: 2, .. }));
    }

    #[test]
    fn declining_trend_scenario() {
        // Scenario B: history [50, 40] => decline rate 0.20 > 0.15.
        let (mut log, _dir) = log();
        let th = thresholds(0.0);
        let models = vec![("X1".to_string(), outcome(vec![50.0, 40.0]))];
        let alerts =
            evaluate_alerts(&[], &models, &[], &empty_regions(), 2022, &th, 0.15, &mut log);
        assert_eq!(alerts.len(), 1);
        match &alerts[0] {
            Alert::DecliningTrend { item, decline_rate } => {
                assert_eq!(item, "X1");
                assert_relative_eq!(*decline_rate, 0.20);
            }
            other => panic!("unexpected alert {:?}", other),
        }
    }

    #[test]
    fn short_history_produces_no_decline_alert() {
        let (mut log, _dir) = log();
        let th = thresholds(0.0);
        let models = vec![("X1".to_string(), outcome(vec![40.0]))];
        let alerts =
            evaluate_alerts(&[], &models, &[], &empty_regions(), 2022, &th, 0.15, &mut log);
        assert!(alerts.is_empty());
    }

    #[test]
    fn region_underperformance_scenario() {
        // Scenario C: latest-year value 45 against a region threshold
        // of 50.
        let records = vec![
            SalesRecord {
                year: 2022,
                model: "X1".into(),
                region: "Europe".into(),
                sales_volume: 45.0,
                price_usd: 0.0,
            },
        ];
        let region_yearly = crate::aggregate::region_yearly(&records);
        let mut th = thresholds(0.0);
        th.per_region.insert("Europe".to_string(), 50.0);

        let (mut log, _dir) = log();
        let regions = vec!["Europe".to_string()];
        let alerts =
            evaluate_alerts(&[], &[], &regions, &region_yearly, 2022, &th, 0.15, &mut log);
        assert_eq!(alerts.len(), 1);
        match &alerts[0] {
            Alert::RegionUnderperformance {
                region,
                sales,
                threshold,
                gap,
            } => {
                assert_eq!(region, "Europe");
                assert_relative_eq!(*sales, 45.0);
                assert_relative_eq!(*threshold, 50.0);
                assert_relative_eq!(*gap, 5.0);
            }
            other => panic!("unexpected alert {:?}", other),
        }
    }

    #[test]
    fn alerts_keep_evaluation_order() {
        let records = vec![
            SalesRecord {
                year: 2022,
                model: "X1".into(),
                region: "Asia".into(),
                sales_volume: 10.0,
                price_usd: 0.0,
            },
            SalesRecord {
                year: 2022,
                model: "X1".into(),
                region: "Europe".into(),
                sales_volume: 10.0,
                price_usd: 0.0,
            },
        ];
        let region_yearly = crate::aggregate::region_yearly(&records);
        let mut th = thresholds(100.0);
        th.per_model.insert("X1".to_string(), 60.0);
        th.per_region.insert("Asia".to_string(), 20.0);
        th.per_region.insert("Europe".to_string(), 20.0);

        let models = vec![("X1".to_string(), outcome(vec![100.0, 50.0]))];
        let regions = vec!["Asia".to_string(), "Europe".to_string()];
        let (mut log, _dir) = log();
        let alerts = evaluate_alerts(
            &[90.0],
            &models,
            &regions,
            &region_yearly,
            2022,
            &th,
            0.15,
            &mut log,
        );

        let kinds: Vec<&str> = alerts.iter().map(|a| a.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                "OVERALL_SALES",
                "MODEL_UNDERPERFORMANCE",
                "DECLINING_TREND",
                "REGION_UNDERPERFORMANCE",
                "REGION_UNDERPERFORMANCE",
            ]
        );
        // Regions stay in first-appearance order.
        assert!(matches!(
            &alerts[3],
            Alert::RegionUnderperformance { region, .. } if region == "Asia"
        ));
    }

    #[test]
    fn alert_log_receives_one_line_per_alert() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales_alerts.log");
        {
            let mut log = AlertLog::create(&path).unwrap();
            let th = thresholds(80.0);
            let alerts = evaluate_alerts(
                &[70.0, 60.0],
                &[],
                &[],
                &empty_regions(),
                2022,
                &th,
                0.15,
                &mut log,
            );
            assert_eq!(alerts.len(), 2);
        }
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.contains("falls below threshold"));
    }
}
