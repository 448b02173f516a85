// Text report generation.
//
// Two free-text artifacts per run: the timestamped monthly report and
// the final analysis summary. Both are plain strings assembled here
// and written by the pipeline.

use std::collections::HashSet;

use chrono::Local;

use crate::aggregate::GroupedYearly;
use crate::thresholds::AlertThresholds;
use crate::types::{Alert, ForecastOutcome, SalesRecord, Severity, YearlyPoint};
use crate::util::{format_int, format_number, mean};

const RULE: &str = "────────────────────────────────────────────────────────────────────────────────";
const BAR: &str = "================================================================================";

pub struct ReportContext<'a> {
    pub records: &'a [SalesRecord],
    pub yearly: &'a [YearlyPoint],
    pub overall: &'a ForecastOutcome,
    pub model_forecasts: &'a [(String, ForecastOutcome)],
    pub models: &'a GroupedYearly,
    pub regions: &'a GroupedYearly,
    pub alerts: &'a [Alert],
    pub thresholds: &'a AlertThresholds,
}

impl ReportContext<'_> {
    fn average_sales(&self) -> f64 {
        let totals: Vec<f64> = self.yearly.iter().map(|p| p.total_sales).collect();
        mean(&totals)
    }
}

/// The monthly report with executive summary, metrics, alerts,
/// outlook, top models and regional shares.
pub fn monthly_report(ctx: &ReportContext<'_>) -> String {
    let now = Local::now();
    let forecast_mean = mean(&ctx.overall.forecast);
    let last_actual = ctx.overall.historical.last().copied().unwrap_or(0.0);

    let mut report = format!(
        "\n{BAR}\nSALES ANALYTICS - MONTHLY REPORT\nGenerated: {}\n{BAR}\n\n\
         1. EXECUTIVE SUMMARY\n{RULE}\n\
         \u{2022} Report Period: {}\n\
         \u{2022} Total Forecasted Sales (Next Quarter): {}\n\
         \u{2022} Alert Threshold: {}\n\
         \u{2022} Number of Active Alerts: {}\n\n\
         2. KEY METRICS\n{RULE}\n\
         \u{2022} Historical Average Sales: {}\n\
         \u{2022} Forecast Method: {}\n\
         \u{2022} Current Forecast Trend: {}\n",
        now.format("%Y-%m-%d %H:%M:%S"),
        now.format("%B %Y"),
        format_number(forecast_mean, 0),
        format_number(ctx.thresholds.overall, 0),
        ctx.alerts.len(),
        format_number(ctx.average_sales(), 0),
        ctx.overall.tier.label(),
        if ctx.overall.forecast.last().copied().unwrap_or(0.0) > last_actual {
            "INCREASING"
        } else {
            "DECREASING"
        },
    );

    if ctx.overall.historical.len() >= 2 {
        let n = ctx.overall.historical.len();
        let prev = ctx.overall.historical[n - 2];
        if prev != 0.0 {
            report.push_str(&format!(
                "\u{2022} Year-over-Year Change: {:+.2}%\n",
                (ctx.overall.historical[n - 1] - prev) / prev * 100.0
            ));
        }
    }

    report.push_str(&format!("\n3. ALERTS & ACTION ITEMS\n{RULE}\n"));
    if ctx.alerts.is_empty() {
        report.push_str("\n   No alerts triggered. All metrics within acceptable range.\n");
    } else {
        for (i, alert) in ctx.alerts.iter().enumerate() {
            report.push_str(&format!("\n   Alert {}: {}", i + 1, alert.message()));
            if let Some(gap) = alert.gap() {
                report.push_str(&format!(
                    "\n              Gap from threshold: {}",
                    format_number(gap, 0)
                ));
            }
        }
        report.push('\n');
    }

    report.push_str(&format!(
        "\n4. FORECAST OUTLOOK (NEXT {} YEARS)\n{RULE}\n",
        ctx.overall.forecast.len()
    ));
    for (year, value) in ctx.overall.forecast_years.iter().zip(&ctx.overall.forecast) {
        let trend = if *value > last_actual { "UP" } else { "DOWN" };
        report.push_str(&format!(
            "\n   {}: {} [{}]",
            year,
            format_number(*value, 0),
            trend
        ));
    }

    report.push_str(&format!("\n\n5. MODEL PERFORMANCE (Top 5)\n{RULE}\n"));
    for (i, name) in ctx.models.top_n(5).iter().enumerate() {
        let total: f64 = ctx
            .models
            .series(name)
            .map(|s| s.iter().map(|(_, v)| v).sum())
            .unwrap_or(0.0);
        report.push_str(&format!(
            "\n   {}. {}: {}",
            i + 1,
            name,
            format_number(total, 0)
        ));
    }

    report.push_str(&format!("\n\n6. REGIONAL PERFORMANCE\n{RULE}\n"));
    let mut region_totals = ctx.regions.totals();
    region_totals.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    let grand_total: f64 = region_totals.iter().map(|(_, v)| v).sum();
    for (region, total) in &region_totals {
        let pct = if grand_total > 0.0 {
            total / grand_total * 100.0
        } else {
            0.0
        };
        report.push_str(&format!(
            "\n   \u{2022} {}: {} ({:.1}%)",
            region,
            format_number(*total, 0),
            pct
        ));
    }

    report.push_str(&format!(
        "\n\n7. RECOMMENDATIONS\n{RULE}\n\
         \u{2022} Monitor underperforming models closely\n\
         \u{2022} Invest in high-growth regions\n\
         \u{2022} Adjust inventory based on forecasts\n\
         \u{2022} Review market conditions quarterly\n\n{BAR}\nEND OF REPORT\n{BAR}\n"
    ));

    report
}

/// The end-of-run summary written to `ANALYSIS_SUMMARY.txt`.
pub fn final_summary(ctx: &ReportContext<'_>) -> String {
    let years: Vec<i32> = ctx.yearly.iter().map(|p| p.year).collect();
    let totals: Vec<f64> = ctx.yearly.iter().map(|p| p.total_sales).collect();
    let models: HashSet<&str> = ctx.records.iter().map(|r| r.model.as_str()).collect();
    let regions: HashSet<&str> = ctx.records.iter().map(|r| r.region.as_str()).collect();

    let peak_idx = totals
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let low_idx = totals
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0);

    let high = ctx
        .alerts
        .iter()
        .filter(|a| a.severity() == Severity::High)
        .count();
    let medium = ctx
        .alerts
        .iter()
        .filter(|a| a.severity() == Severity::Medium)
        .count();

    let mut summary = format!(
        "\n{BAR}\nSALES TREND FORECASTING & ALERT SYSTEM - RUN COMPLETE\n{BAR}\n\n\
         1. Data Overview:\n\
         \u{2022} Total records analyzed: {}\n\
         \u{2022} Time period: {} - {}\n\
         \u{2022} Models tracked: {}\n\
         \u{2022} Regions tracked: {}\n\n\
         2. Historical Performance:\n\
         \u{2022} Average annual sales: {}\n\
         \u{2022} Peak sales year: {} ({})\n\
         \u{2022} Lowest sales year: {} ({})\n\
         \u{2022} Trend: {}\n\n\
         3. Forecast Results ({}):\n",
        format_int(ctx.records.len() as i64),
        years.first().copied().unwrap_or(0),
        years.last().copied().unwrap_or(0),
        models.len(),
        regions.len(),
        format_number(ctx.average_sales(), 0),
        years.get(peak_idx).copied().unwrap_or(0),
        format_number(totals.get(peak_idx).copied().unwrap_or(0.0), 0),
        years.get(low_idx).copied().unwrap_or(0),
        format_number(totals.get(low_idx).copied().unwrap_or(0.0), 0),
        if totals.last() > totals.first() {
            "GROWING"
        } else {
            "DECLINING"
        },
        ctx.overall.tier.label(),
    );

    for (i, (year, value)) in ctx
        .overall
        .forecast_years
        .iter()
        .zip(&ctx.overall.forecast)
        .enumerate()
    {
        summary.push_str(&format!(
            "   \u{2022} Year {} ({}): {}\n",
            i + 1,
            year,
            format_number(*value, 0)
        ));
    }

    summary.push_str(&format!(
        "\n4. Alert System Status:\n\
         \u{2022} Active alerts: {}\n\
         \u{2022} High severity: {}\n\
         \u{2022} Medium severity: {}\n\n\
         5. Model Forecasts:\n\
         \u{2022} Models forecasted: {}\n\n{BAR}\n",
        ctx.alerts.len(),
        high,
        medium,
        ctx.model_forecasts.len(),
    ));

    summary
}
