// Full pipeline run against a synthetic dataset in a tempdir.

use std::fs;
use std::io::Write;

use sales_forecast::{logging, pipeline, Config};

fn write_sample_csv(path: &std::path::Path) {
    let mut file = fs::File::create(path).unwrap();
    writeln!(file, "Year,Model,Region,Sales_Volume,Price_USD").unwrap();
    let models = ["X1", "X3", "i4"];
    let regions = ["Europe", "Asia", "North America"];
    for (i, year) in (2015..=2024).enumerate() {
        for (m, model) in models.iter().enumerate() {
            for (r, region) in regions.iter().enumerate() {
                // Mild upward trend with deterministic per-cell variation.
                let volume = 800 + i * 40 + m * 120 + r * 60;
                writeln!(
                    file,
                    "{},{},{},{},{}",
                    year,
                    model,
                    region,
                    volume,
                    40_000 + m * 5_000
                )
                .unwrap();
            }
        }
    }
    // A couple of junk rows the loader should drop.
    writeln!(file, "not_a_year,X1,Europe,100,40000").unwrap();
    writeln!(file, "2024,X1,Europe,-5,40000").unwrap();
}

#[test]
fn full_run_produces_all_artifacts() {
    logging::init_test();
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("sales.csv");
    let out_dir = dir.path().join("outputs");
    write_sample_csv(&csv_path);

    let cfg = Config::with_paths(&csv_path, &out_dir);
    let outcome = pipeline::run(&cfg).unwrap();

    assert_eq!(outcome.records, 90);
    assert_eq!(outcome.yearly.len(), 10);
    assert_eq!(outcome.overall.forecast.len(), cfg.forecast_steps);
    assert_eq!(outcome.overall.forecast_years, vec![2025, 2026, 2027]);
    assert_eq!(outcome.model_forecasts.len(), 3);

    for name in [
        "sales_overview.svg",
        "model_region_heatmap.svg",
        "sales_forecast.svg",
        "dashboard.html",
        "forecast_next_3_years.csv",
        "active_alerts.csv",
        "model_forecasts_export.csv",
        "summary.json",
        "sales_alerts.log",
        "ANALYSIS_SUMMARY.txt",
    ] {
        assert!(out_dir.join(name).exists(), "missing artifact {name}");
    }
    assert!(outcome.report_path.exists());

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out_dir.join("summary.json")).unwrap()).unwrap();
    assert_eq!(summary["total_records"], 90);
    assert_eq!(summary["first_year"], 2015);
    assert_eq!(summary["last_year"], 2024);
    assert_eq!(summary["models_tracked"], 3);
    assert_eq!(summary["regions_tracked"], 3);
    assert_eq!(
        summary["active_alerts"].as_u64().unwrap() as usize,
        outcome.alerts.len()
    );

    let forecast_csv = fs::read_to_string(out_dir.join("forecast_next_3_years.csv")).unwrap();
    assert!(forecast_csv.starts_with("Year,Forecasted_Sales,Threshold,Below_Threshold"));
    assert_eq!(forecast_csv.trim().lines().count(), 4);
}

#[test]
fn repeated_runs_are_deterministic() {
    logging::init_test();
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("sales.csv");
    let out_dir = dir.path().join("outputs");
    write_sample_csv(&csv_path);

    let cfg = Config::with_paths(&csv_path, &out_dir);
    let first = pipeline::run(&cfg).unwrap();
    let second = pipeline::run(&cfg).unwrap();

    assert_eq!(first.overall.tier, second.overall.tier);
    assert_eq!(first.overall.forecast, second.overall.forecast);
    assert_eq!(
        first.alerts.iter().map(|a| a.message()).collect::<Vec<_>>(),
        second.alerts.iter().map(|a| a.message()).collect::<Vec<_>>()
    );
    // The wipe at run start removes the first run's timestamped report.
    assert!(second.report_path.exists());
}

#[test]
fn missing_csv_is_a_load_error() {
    logging::init_test();
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = Config::with_paths(dir.path().join("absent.csv"), dir.path().join("outputs"));
    // Point the fetch at a dead URL so nothing can materialize the file.
    cfg.data_url = "http://127.0.0.1:9/unreachable.csv".to_string();
    let err = pipeline::run(&cfg).unwrap_err();
    assert!(matches!(err, sales_forecast::PipelineError::Io { .. }));
}
