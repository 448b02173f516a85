// End-to-end batch run: fetch, load, aggregate, forecast, alert,
// render, export. Each stage logs what it produced; artifacts all land
// in the configured output directory, which is wiped at run start.

use tracing::info;

use crate::aggregate::{self, GroupedYearly};
use crate::alerts::AlertLog;
use crate::charts;
use crate::config::Config;
use crate::dashboard;
use crate::error::Result;
use crate::fetch;
use crate::forecast;
use crate::loader;
use crate::output;
use crate::report::{self, ReportContext};
use crate::thresholds;
use crate::types::{
    Alert, AlertExportRow, ForecastExportRow, ForecastOutcome, GroupTotalRow,
    ModelForecastExportRow, SalesRecord, Severity, SummaryStats, YearlyPoint, YearlyRow,
};
use crate::util::{format_number, mean, print_section};

/// Everything a run produced, for callers (and tests) that want to
/// inspect results without re-reading the artifact files.
#[derive(Debug)]
pub struct RunOutcome {
    pub records: usize,
    pub yearly: Vec<YearlyPoint>,
    pub overall: ForecastOutcome,
    pub model_forecasts: Vec<(String, ForecastOutcome)>,
    pub alerts: Vec<Alert>,
    pub report_path: std::path::PathBuf,
}

pub fn run(cfg: &Config) -> Result<RunOutcome> {
    output::reset_output_dir(&cfg.output_dir)?;
    fetch::download_if_missing(&cfg.data_url, &cfg.csv_path);

    let (records, load_report) = loader::load_sales(&cfg.csv_path)?;
    info!(
        "loaded {} of {} rows ({} rejected)",
        load_report.kept_rows, load_report.total_rows, load_report.parse_errors
    );

    let yearly = aggregate::yearly_series(&records);
    let models = aggregate::model_yearly(&records);
    let regions = aggregate::region_yearly(&records);
    print_exploration(&records, &yearly, &models, &regions);

    print_section("FORECASTING");
    let overall = forecast::forecast_overall(&yearly, cfg);
    info!("overall forecast method: {}", overall.tier.label());
    if let Some(holdout) = &overall.holdout {
        info!(
            "holdout evaluation: RMSE {} / MAE {}",
            format_number(holdout.rmse, 0),
            format_number(holdout.mae, 0)
        );
    }

    let top_models = models.top_n(cfg.top_model_count);
    let model_forecasts = forecast::forecast_models(&models, &top_models, cfg);

    let thresholds =
        thresholds::compute_thresholds(&records, &yearly, &top_models, regions.groups(), cfg);

    print_section("ALERT EVALUATION");
    let latest_year = yearly.last().map(|p| p.year).unwrap_or(0);
    let mut alert_log = AlertLog::create(&cfg.out_path("sales_alerts.log"))?;
    let alerts = crate::alerts::evaluate_alerts(
        &overall.forecast,
        &model_forecasts,
        regions.groups(),
        &regions,
        latest_year,
        &thresholds,
        cfg.decline_threshold,
        &mut alert_log,
    );
    alert_log
        .flush()
        .map_err(|e| crate::error::PipelineError::io(cfg.out_path("sales_alerts.log"), e))?;
    info!("{} alert(s) triggered", alerts.len());

    charts::render_overview(&yearly, &cfg.out_path("sales_overview.svg"))?;
    let pivot = aggregate::model_region_pivot(&records, aggregate::MAX_HEATMAP_MODELS);
    charts::render_heatmap(&pivot, &cfg.out_path("model_region_heatmap.svg"))?;
    charts::render_forecast(&overall, &cfg.out_path("sales_forecast.svg"))?;
    output::write_text(
        &cfg.out_path("dashboard.html"),
        &dashboard::render_dashboard(&overall, &alerts, thresholds.overall),
    )?;

    write_exports(cfg, &overall, &model_forecasts, &alerts, &thresholds)?;
    write_summary(cfg, &records, &yearly, &overall, &alerts)?;

    let ctx = ReportContext {
        records: &records,
        yearly: &yearly,
        overall: &overall,
        model_forecasts: &model_forecasts,
        models: &models,
        regions: &regions,
        alerts: &alerts,
        thresholds: &thresholds,
    };
    let report_name = format!(
        "sales_report_{}.txt",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let report_path = cfg.out_path(&report_name);
    output::write_text(&report_path, &report::monthly_report(&ctx))?;
    output::write_text(
        &cfg.out_path("ANALYSIS_SUMMARY.txt"),
        &report::final_summary(&ctx),
    )?;

    Ok(RunOutcome {
        records: records.len(),
        yearly,
        overall,
        model_forecasts,
        alerts,
        report_path,
    })
}

fn print_exploration(
    records: &[SalesRecord],
    yearly: &[YearlyPoint],
    models: &GroupedYearly,
    regions: &GroupedYearly,
) {
    print_section("DATA EXPLORATION");
    info!("records: {}", records.len());
    if let (Some(first), Some(last)) = (yearly.first(), yearly.last()) {
        info!("years covered: {} - {}", first.year, last.year);
    }

    let yearly_rows: Vec<YearlyRow> = yearly
        .iter()
        .map(|p| YearlyRow {
            year: p.year,
            total_sales: format_number(p.total_sales, 0),
            yoy_growth: p
                .yoy_growth
                .map(|g| format!("{:+.2}%", g))
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();
    println!("\nYearly totals:");
    output::preview_table(&yearly_rows, 20);

    for (title, grouped) in [("Sales by model:", models), ("Sales by region:", regions)] {
        let mut totals = grouped.totals();
        totals.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        let rows: Vec<GroupTotalRow> = totals
            .into_iter()
            .map(|(name, total)| GroupTotalRow {
                name,
                total_sales: format_number(total, 0),
            })
            .collect();
        println!("\n{title}");
        output::preview_table(&rows, 10);
    }
}

fn write_exports(
    cfg: &Config,
    overall: &ForecastOutcome,
    model_forecasts: &[(String, ForecastOutcome)],
    alerts: &[Alert],
    thresholds: &thresholds::AlertThresholds,
) -> Result<()> {
    let forecast_rows: Vec<ForecastExportRow> = overall
        .forecast_years
        .iter()
        .zip(&overall.forecast)
        .map(|(year, value)| ForecastExportRow {
            year: *year,
            forecasted_sales: value.round() as i64,
            threshold: thresholds.overall.round() as i64,
            below_threshold: *value < thresholds.overall,
        })
        .collect();
    output::write_csv(&cfg.out_path("forecast_next_3_years.csv"), &forecast_rows)?;

    let alert_rows: Vec<AlertExportRow> = alerts.iter().map(AlertExportRow::from).collect();
    output::write_csv(&cfg.out_path("active_alerts.csv"), &alert_rows)?;

    let mut model_rows: Vec<ModelForecastExportRow> = Vec::new();
    for (model, outcome) in model_forecasts {
        let threshold = thresholds.model(model).round() as i64;
        for (year, value) in outcome.forecast_years.iter().zip(&outcome.forecast) {
            model_rows.push(ModelForecastExportRow {
                model: model.clone(),
                year: *year,
                forecasted_sales: value.round() as i64,
                threshold,
            });
        }
    }
    output::write_csv(&cfg.out_path("model_forecasts_export.csv"), &model_rows)?;
    Ok(())
}

fn write_summary(
    cfg: &Config,
    records: &[SalesRecord],
    yearly: &[YearlyPoint],
    overall: &ForecastOutcome,
    alerts: &[Alert],
) -> Result<()> {
    let models: std::collections::HashSet<&str> =
        records.iter().map(|r| r.model.as_str()).collect();
    let regions: std::collections::HashSet<&str> =
        records.iter().map(|r| r.region.as_str()).collect();
    let totals: Vec<f64> = yearly.iter().map(|p| p.total_sales).collect();

    let stats = SummaryStats {
        total_records: records.len(),
        first_year: yearly.first().map(|p| p.year).unwrap_or(0),
        last_year: yearly.last().map(|p| p.year).unwrap_or(0),
        models_tracked: models.len(),
        regions_tracked: regions.len(),
        average_annual_sales: mean(&totals),
        forecast_tier: overall.tier,
        active_alerts: alerts.len(),
        high_severity: alerts
            .iter()
            .filter(|a| a.severity() == Severity::High)
            .count(),
        medium_severity: alerts
            .iter()
            .filter(|a| a.severity() == Severity::Medium)
            .count(),
    };
    output::write_json(&cfg.out_path("summary.json"), &stats)
}
