// Static HTML dashboard embedding the rendered charts plus the
// forecast and alert tables. No server, just a file to open locally.

use crate::types::{Alert, ForecastOutcome};
use crate::util::format_number;

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Builds the dashboard page. Chart paths are relative to the page
/// itself so the file stays portable inside the output directory.
pub fn render_dashboard(
    overall: &ForecastOutcome,
    alerts: &[Alert],
    threshold: f64,
) -> String {
    let mut forecast_rows = String::new();
    for (year, value) in overall.forecast_years.iter().zip(&overall.forecast) {
        let status = if *value < threshold {
            "<span class=\"bad\">BELOW THRESHOLD</span>"
        } else {
            "<span class=\"ok\">OK</span>"
        };
        forecast_rows.push_str(&format!(
            "      <tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            year,
            format_number(*value, 0),
            status
        ));
    }

    let alert_section = if alerts.is_empty() {
        "    <p class=\"ok\">No active alerts.</p>\n".to_string()
    } else {
        let mut rows = String::new();
        for alert in alerts {
            rows.push_str(&format!(
                "      <tr><td>{}</td><td class=\"sev-{}\">{}</td><td>{}</td></tr>\n",
                escape(alert.kind()),
                alert.severity().as_str().to_lowercase(),
                alert.severity().as_str(),
                escape(&alert.message())
            ));
        }
        format!(
            "    <table>\n      <tr><th>Type</th><th>Severity</th><th>Message</th></tr>\n{rows}    </table>\n"
        )
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Sales Trend Forecasting Dashboard</title>
  <style>
    body {{ font-family: sans-serif; margin: 2em auto; max-width: 1080px; color: #222; }}
    h1 {{ border-bottom: 2px solid #444; padding-bottom: 0.3em; }}
    table {{ border-collapse: collapse; width: 100%; margin: 1em 0; }}
    th, td {{ border: 1px solid #ccc; padding: 0.4em 0.8em; text-align: left; }}
    th {{ background: #f0f0f0; }}
    img {{ max-width: 100%; border: 1px solid #ddd; margin: 1em 0; }}
    .ok {{ color: #2a7a2a; font-weight: bold; }}
    .bad {{ color: #b02020; font-weight: bold; }}
    .sev-high {{ color: #b02020; font-weight: bold; }}
    .sev-medium {{ color: #b06a20; font-weight: bold; }}
  </style>
</head>
<body>
  <h1>Sales Trend Forecasting Dashboard</h1>
  <section>
    <h2>Historical Sales</h2>
    <img src="sales_overview.svg" alt="Yearly sales overview">
  </section>
  <section>
    <h2>Sales by Model and Region</h2>
    <img src="model_region_heatmap.svg" alt="Model by region sales heatmap">
  </section>
  <section>
    <h2>Forecast ({tier})</h2>
    <img src="sales_forecast.svg" alt="Sales forecast">
    <table>
      <tr><th>Year</th><th>Forecasted Sales</th><th>Status</th></tr>
{forecast_rows}    </table>
  </section>
  <section>
    <h2>Active Alerts ({alert_count})</h2>
{alert_section}  </section>
</body>
</html>
"#,
        tier = overall.tier.label(),
        forecast_rows = forecast_rows,
        alert_count = alerts.len(),
        alert_section = alert_section,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ForecastTier;

    fn outcome() -> ForecastOutcome {
        ForecastOutcome {
            years: vec![2021, 2022, 2023],
            historical: vec![100.0, 110.0, 120.0],
            forecast_years: vec![2024, 2025],
            forecast: vec![130.0, 70.0],
            confidence: None,
            holdout: None,
            tier: ForecastTier::Naive,
        }
    }

    #[test]
    fn dashboard_flags_below_threshold_years() {
        let html = render_dashboard(&outcome(), &[], 100.0);
        assert!(html.contains("BELOW THRESHOLD"));
        assert!(html.contains("No active alerts."));
        assert!(html.contains("sales_forecast.svg"));
        assert!(html.contains("model_region_heatmap.svg"));
    }

    #[test]
    fn dashboard_escapes_alert_messages() {
        let alerts = vec![Alert::ModelUnderperformance {
            model: "X<1>".into(),
            recent_sales: 10.0,
            threshold: 50.0,
            gap: 40.0,
        }];
        let html = render_dashboard(&outcome(), &alerts, 10.0);
        assert!(html.contains("X&lt;1&gt;"));
        assert!(!html.contains("No active alerts."));
    }
}
