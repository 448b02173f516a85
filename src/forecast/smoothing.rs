// Second forecasting tier: additive-trend exponential smoothing.
//
// Thin wrapper over augurs ETS. Only the point forecasts are used;
// this tier deliberately reports no confidence band.

use augurs_core::{Fit, Predict};
use augurs_ets::AutoETS;

/// Fit an A,A,N (additive error, additive trend, no season) smoothing
/// model and return `horizon` point forecasts.
pub fn forecast_holt(values: &[f64], horizon: usize) -> Result<Vec<f64>, String> {
    if horizon == 0 {
        return Ok(Vec::new());
    }

    let model = AutoETS::new(1, "AAN")
        .map_err(|e| format!("failed to create smoothing model: {}", e))?;
    let fitted = model
        .fit(values)
        .map_err(|e| format!("exponential smoothing fit failed: {}", e))?;
    let forecast = fitted
        .predict(horizon, 0.95)
        .map_err(|e| format!("exponential smoothing prediction failed: {}", e))?;

    if forecast.point.len() != horizon || forecast.point.iter().any(|v| !v.is_finite()) {
        return Err("exponential smoothing produced unusable forecasts".to_string());
    }
    Ok(forecast.point)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecasts_trending_series() {
        let values: Vec<f64> = (0..12).map(|i| 100.0 + 10.0 * i as f64).collect();
        let point = forecast_holt(&values, 3).unwrap();
        assert_eq!(point.len(), 3);
        // The additive trend should carry the forecast above the last
        // observation.
        assert!(point[0] > 190.0);
    }

    #[test]
    fn fails_on_tiny_series() {
        assert!(forecast_holt(&[42.0], 3).is_err());
    }
}
