// Tiered forecasting over yearly sales series.
//
// Strategies are tried in a fixed order: ARIMA(1,1,1), then
// additive-trend exponential smoothing, then repeating the last
// observed value. Each strategy returns a Result; the first success
// wins and the tier used is recorded on the outcome. The chain never
// fails as a whole: the naive tier always produces its N values.

pub mod arima;
pub mod smoothing;

use statrs::distribution::{ContinuousCDF, Normal};
use tracing::{info, warn};

use crate::aggregate::GroupedYearly;
use crate::config::Config;
use crate::types::{ConfidenceBand, ForecastOutcome, ForecastTier, HoldoutEval, YearlyPoint};

use arima::Arima111;
use smoothing::forecast_holt;

/// Minimum history length for a per-model forecast; shorter series are
/// skipped entirely.
pub const MIN_MODEL_POINTS: usize = 3;

/// What one strategy produced before assembly into an outcome.
struct Attempt {
    future: Vec<f64>,
    confidence: Option<ConfidenceBand>,
    holdout_predictions: Option<Vec<f64>>,
    holdout_confidence: Option<ConfidenceBand>,
}

fn normal_quantile(confidence_level: f64) -> f64 {
    // Normal(0,1) construction cannot fail for these constants; fall
    // back to the 95% quantile if the level is out of range.
    Normal::new(0.0, 1.0)
        .map(|n| n.inverse_cdf(0.5 + confidence_level / 2.0))
        .unwrap_or(1.96)
}

fn try_arima(values: &[f64], train_size: usize, steps: usize, z: f64) -> Result<Attempt, String> {
    let test_len = values.len() - train_size;
    let (holdout_predictions, holdout_confidence) = if test_len > 0 {
        let train_model = Arima111::fit(&values[..train_size])?;
        let (preds, ci) = train_model.forecast(test_len, z);
        (Some(preds), Some(ci))
    } else {
        (None, None)
    };

    let full_model = Arima111::fit(values)?;
    let (future, confidence) = full_model.forecast(steps, z);
    Ok(Attempt {
        future,
        confidence: Some(confidence),
        holdout_predictions,
        holdout_confidence,
    })
}

fn try_smoothing(values: &[f64], train_size: usize, steps: usize) -> Result<Attempt, String> {
    let test_len = values.len() - train_size;
    let holdout_predictions = if test_len > 0 {
        Some(forecast_holt(&values[..train_size], test_len)?)
    } else {
        None
    };
    let future = forecast_holt(values, steps)?;
    Ok(Attempt {
        future,
        confidence: None,
        holdout_predictions,
        holdout_confidence: None,
    })
}

fn naive(values: &[f64], steps: usize) -> Attempt {
    let last = values.last().copied().unwrap_or(0.0);
    Attempt {
        future: vec![last; steps],
        confidence: None,
        holdout_predictions: None,
        holdout_confidence: None,
    }
}

fn assemble(
    years: Vec<i32>,
    values: Vec<f64>,
    train_size: usize,
    steps: usize,
    tier: ForecastTier,
    attempt: Attempt,
) -> ForecastOutcome {
    let last_year = years.last().copied().unwrap_or(0);
    let forecast_years: Vec<i32> = (1..=steps as i32).map(|i| last_year + i).collect();

    let holdout = attempt.holdout_predictions.map(|predictions| {
        let actual = &values[train_size..];
        let (rmse, mae) = holdout_metrics(&predictions, actual);
        HoldoutEval {
            train_size,
            predictions,
            confidence: attempt.holdout_confidence,
            rmse,
            mae,
        }
    });

    ForecastOutcome {
        years,
        historical: values,
        forecast_years,
        forecast: attempt.future,
        confidence: attempt.confidence,
        holdout,
        tier,
    }
}

fn holdout_metrics(predictions: &[f64], actual: &[f64]) -> (f64, f64) {
    let n = predictions.len().min(actual.len());
    if n == 0 {
        return (0.0, 0.0);
    }
    let mut sq = 0.0;
    let mut abs = 0.0;
    for (p, a) in predictions.iter().zip(actual.iter()) {
        sq += (p - a) * (p - a);
        abs += (p - a).abs();
    }
    ((sq / n as f64).sqrt(), abs / n as f64)
}

/// Run the full tier chain over one series.
///
/// `train_size` controls the held-out evaluation; pass the series
/// length to skip it (the per-model path does).
fn run_tiers(
    years: Vec<i32>,
    values: Vec<f64>,
    train_size: usize,
    steps: usize,
    z: f64,
    context: &str,
) -> ForecastOutcome {
    match try_arima(&values, train_size, steps, z) {
        Ok(attempt) => {
            info!("{}: ARIMA(1,1,1) fitted", context);
            return assemble(years, values, train_size, steps, ForecastTier::Arima, attempt);
        }
        Err(e) => {
            warn!("{}: ARIMA error: {}. Falling back to exponential smoothing", context, e);
        }
    }

    match try_smoothing(&values, train_size, steps) {
        Ok(attempt) => {
            info!("{}: exponential smoothing fitted", context);
            return assemble(
                years,
                values,
                train_size,
                steps,
                ForecastTier::ExponentialSmoothing,
                attempt,
            );
        }
        Err(e) => {
            warn!("{}: fallback error: {}. Using last observed value", context, e);
        }
    }

    let attempt = naive(&values, steps);
    assemble(years, values, train_size, steps, ForecastTier::Naive, attempt)
}

/// Forecast the overall yearly total-sales series, with a held-out
/// evaluation over the trailing ~20% of points.
pub fn forecast_overall(series: &[YearlyPoint], cfg: &Config) -> ForecastOutcome {
    let years: Vec<i32> = series.iter().map(|p| p.year).collect();
    let values: Vec<f64> = series.iter().map(|p| p.total_sales).collect();
    let train_size = ((values.len() as f64 * cfg.train_split).floor() as usize)
        .max(1)
        .min(values.len());
    let z = normal_quantile(cfg.confidence_level);
    run_tiers(years, values, train_size, cfg.forecast_steps, z, "overall")
}

/// Forecast each of the given models' yearly series, fitting on the
/// full history (no held-out step). Models with fewer than
/// `MIN_MODEL_POINTS` observations are skipped.
pub fn forecast_models(
    grouped: &GroupedYearly,
    top_models: &[String],
    cfg: &Config,
) -> Vec<(String, ForecastOutcome)> {
    let z = normal_quantile(cfg.confidence_level);
    let mut out = Vec::new();
    for model in top_models {
        let Some(series) = grouped.series(model) else {
            continue;
        };
        if series.len() < MIN_MODEL_POINTS {
            warn!(
                "skipping forecast for {}: only {} data points",
                model,
                series.len()
            );
            continue;
        }
        let years: Vec<i32> = series.iter().map(|(y, _)| *y).collect();
        let values: Vec<f64> = series.iter().map(|(_, v)| *v).collect();
        let train_size = values.len();
        let outcome = run_tiers(years, values, train_size, cfg.forecast_steps, z, model);
        out.push((model.clone(), outcome));
    }
    out
}
