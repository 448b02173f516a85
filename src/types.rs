use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::util::format_number;

/// One raw CSV row. Every field is optional text so a malformed cell
/// never aborts deserialization of the whole file; the loader decides
/// what is usable.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Year")]
    pub year: Option<String>,
    #[serde(rename = "Model")]
    pub model: Option<String>,
    #[serde(rename = "Region")]
    pub region: Option<String>,
    #[serde(rename = "Sales_Volume")]
    pub sales_volume: Option<String>,
    #[serde(rename = "Price_USD")]
    pub price_usd: Option<String>,
}

/// A cleaned per-transaction sales record.
#[derive(Debug, Clone)]
pub struct SalesRecord {
    pub year: i32,
    pub model: String,
    pub region: String,
    pub sales_volume: f64,
    pub price_usd: f64,
}

/// One point of the yearly total-sales series. `yoy_growth` is a
/// percentage and `None` for the first year on record.
#[derive(Debug, Clone, PartialEq)]
pub struct YearlyPoint {
    pub year: i32,
    pub total_sales: f64,
    pub yoy_growth: Option<f64>,
}

/// Which forecasting strategy actually produced a result.
///
/// The tiers form an ordered fallback chain; the chosen tier is kept on
/// the outcome so reports can say how the numbers were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ForecastTier {
    Arima,
    ExponentialSmoothing,
    Naive,
}

impl ForecastTier {
    pub fn label(&self) -> &'static str {
        match self {
            ForecastTier::Arima => "ARIMA(1,1,1)",
            ForecastTier::ExponentialSmoothing => "Exponential smoothing (additive trend)",
            ForecastTier::Naive => "Naive last-value",
        }
    }
}

/// Symmetric interval bounds aligned with a forecast vector.
#[derive(Debug, Clone)]
pub struct ConfidenceBand {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

/// Held-out evaluation of the overall forecast: predictions for the
/// test suffix of the yearly series plus the usual accuracy metrics.
#[derive(Debug, Clone)]
pub struct HoldoutEval {
    pub train_size: usize,
    pub predictions: Vec<f64>,
    pub confidence: Option<ConfidenceBand>,
    pub rmse: f64,
    pub mae: f64,
}

/// A completed forecast run over one series.
///
/// Always carries exactly `forecast_steps` future values and labels
/// `last_year+1 ..= last_year+N`, whichever tier produced them. Holdout
/// and confidence fields are absent when the tier that succeeded does
/// not provide them.
#[derive(Debug, Clone)]
pub struct ForecastOutcome {
    pub years: Vec<i32>,
    pub historical: Vec<f64>,
    pub forecast_years: Vec<i32>,
    pub forecast: Vec<f64>,
    pub confidence: Option<ConfidenceBand>,
    pub holdout: Option<HoldoutEval>,
    pub tier: ForecastTier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    High,
    Medium,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
        }
    }
}

/// A triggered alert. One variant per rule, each carrying only the
/// fields that rule produces. Threshold-comparison variants all carry
/// `gap = threshold - value`.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// A future overall forecast value fell below the overall threshold.
    /// `horizon` is the 1-based forecast step.
    OverallSales {
        horizon: usize,
        forecast_value: f64,
        threshold: f64,
        gap: f64,
    },
    /// A model's most recent yearly sales fell below its threshold.
    ModelUnderperformance {
        model: String,
        recent_sales: f64,
        threshold: f64,
        gap: f64,
    },
    /// Year-over-year decline beyond the configured rate.
    DecliningTrend { item: String, decline_rate: f64 },
    /// A region's latest-year sales fell below its threshold.
    RegionUnderperformance {
        region: String,
        sales: f64,
        threshold: f64,
        gap: f64,
    },
}

impl Alert {
    pub fn kind(&self) -> &'static str {
        match self {
            Alert::OverallSales { .. } => "OVERALL_SALES",
            Alert::ModelUnderperformance { .. } => "MODEL_UNDERPERFORMANCE",
            Alert::DecliningTrend { .. } => "DECLINING_TREND",
            Alert::RegionUnderperformance { .. } => "REGION_UNDERPERFORMANCE",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Alert::OverallSales { .. } => Severity::High,
            _ => Severity::Medium,
        }
    }

    pub fn gap(&self) -> Option<f64> {
        match self {
            Alert::OverallSales { gap, .. }
            | Alert::ModelUnderperformance { gap, .. }
            | Alert::RegionUnderperformance { gap, .. } => Some(*gap),
            Alert::DecliningTrend { .. } => None,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Alert::OverallSales {
                horizon,
                forecast_value,
                threshold,
                ..
            } => format!(
                "ALERT: Forecasted sales for year {} ({}) falls below threshold ({})",
                horizon,
                format_number(*forecast_value, 0),
                format_number(*threshold, 0)
            ),
            Alert::ModelUnderperformance {
                model,
                recent_sales,
                threshold,
                ..
            } => format!(
                "ALERT: Model {} recent sales ({}) below threshold ({})",
                model,
                format_number(*recent_sales, 0),
                format_number(*threshold, 0)
            ),
            Alert::DecliningTrend { item, decline_rate } => {
                format!("ALERT: {} showing {:.1}% decline", item, decline_rate * 100.0)
            }
            Alert::RegionUnderperformance {
                region,
                sales,
                threshold,
                ..
            } => format!(
                "ALERT: Region {} sales ({}) below threshold ({})",
                region,
                format_number(*sales, 0),
                format_number(*threshold, 0)
            ),
        }
    }
}

// ---------------------------------------------------------------------
// Export / preview row types. CSV columns keep the original header
// names; the same structs drive the markdown previews on the console.
// ---------------------------------------------------------------------

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct YearlyRow {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Total_Sales")]
    #[tabled(rename = "Total_Sales")]
    pub total_sales: String,
    #[serde(rename = "YoY_Growth")]
    #[tabled(rename = "YoY_Growth")]
    pub yoy_growth: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct GroupTotalRow {
    #[serde(rename = "Name")]
    #[tabled(rename = "Name")]
    pub name: String,
    #[serde(rename = "Total_Sales")]
    #[tabled(rename = "Total_Sales")]
    pub total_sales: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ForecastExportRow {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Forecasted_Sales")]
    #[tabled(rename = "Forecasted_Sales")]
    pub forecasted_sales: i64,
    #[serde(rename = "Threshold")]
    #[tabled(rename = "Threshold")]
    pub threshold: i64,
    #[serde(rename = "Below_Threshold")]
    #[tabled(rename = "Below_Threshold")]
    pub below_threshold: bool,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct AlertExportRow {
    #[serde(rename = "Type")]
    #[tabled(rename = "Type")]
    pub alert_type: String,
    #[serde(rename = "Severity")]
    #[tabled(rename = "Severity")]
    pub severity: String,
    #[serde(rename = "Item")]
    #[tabled(rename = "Item")]
    pub item: String,
    #[serde(rename = "Gap")]
    #[tabled(rename = "Gap")]
    pub gap: String,
    #[serde(rename = "Message")]
    #[tabled(rename = "Message")]
    pub message: String,
}

impl From<&Alert> for AlertExportRow {
    fn from(alert: &Alert) -> Self {
        let item = match alert {
            Alert::OverallSales { horizon, .. } => format!("year +{}", horizon),
            Alert::ModelUnderperformance { model, .. } => model.clone(),
            Alert::DecliningTrend { item, .. } => item.clone(),
            Alert::RegionUnderperformance { region, .. } => region.clone(),
        };
        AlertExportRow {
            alert_type: alert.kind().to_string(),
            severity: alert.severity().as_str().to_string(),
            item,
            gap: alert
                .gap()
                .map(|g| format_number(g, 0))
                .unwrap_or_default(),
            message: alert.message(),
        }
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ModelForecastExportRow {
    #[serde(rename = "Model")]
    #[tabled(rename = "Model")]
    pub model: String,
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Forecasted_Sales")]
    #[tabled(rename = "Forecasted_Sales")]
    pub forecasted_sales: i64,
    #[serde(rename = "Threshold")]
    #[tabled(rename = "Threshold")]
    pub threshold: i64,
}

/// Run-level summary written to `summary.json`.
#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub total_records: usize,
    pub first_year: i32,
    pub last_year: i32,
    pub models_tracked: usize,
    pub regions_tracked: usize,
    pub average_annual_sales: f64,
    pub forecast_tier: ForecastTier,
    pub active_alerts: usize,
    pub high_severity: usize,
    pub medium_severity: usize,
}
