// File and console output primitives.
//
// CSV/JSON writers are generic over serde rows; console previews use
// markdown-style tables capped at a few rows so long exports stay
// readable in the terminal.

use std::fs;
use std::path::Path;

use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

use crate::error::{PipelineError, Result};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path).map_err(PipelineError::Csv)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush().map_err(|e| PipelineError::io(path, e))?;
    info!("saved {}", path.display());
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    fs::write(path, s).map_err(|e| PipelineError::io(path, e))?;
    info!("saved {}", path.display());
    Ok(())
}

pub fn write_text(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|e| PipelineError::io(path, e))?;
    info!("saved {}", path.display());
    Ok(())
}

/// Print the first `max_rows` rows as a markdown table.
pub fn preview_table<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

/// Wipe and recreate the output directory.
///
/// Wholesale, not incremental: every artifact of the previous run goes
/// away before the new run writes anything.
pub fn reset_output_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir).map_err(|e| PipelineError::io(dir, e))?;
    }
    fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ForecastExportRow;

    #[test]
    fn reset_clears_previous_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("outputs");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("stale.csv"), "old").unwrap();

        reset_output_dir(&out).unwrap();
        assert!(out.exists());
        assert!(!out.join("stale.csv").exists());
    }

    #[test]
    fn csv_roundtrip_keeps_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forecast.csv");
        let rows = vec![ForecastExportRow {
            year: 2025,
            forecasted_sales: 1234,
            threshold: 1000,
            below_threshold: false,
        }];
        write_csv(&path, &rows).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("Year,Forecasted_Sales,Threshold,Below_Threshold"));
        assert!(contents.contains("2025,1234,1000,false"));
    }
}
