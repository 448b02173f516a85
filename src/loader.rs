use std::path::Path;

use csv::ReaderBuilder;

use crate::error::{PipelineError, Result};
use crate::types::{RawRow, SalesRecord};
use crate::util::{parse_f64_safe, parse_i32_safe};

/// What happened while loading: how many rows came in, how many were
/// kept, how many failed to parse.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    pub parse_errors: usize,
}

/// Load the sales CSV and clean it into typed records.
///
/// Cleaning is limited to trimming header and string values and
/// rejecting rows whose numeric fields cannot be parsed or whose
/// `Sales_Volume` is negative. An input that yields zero usable rows is
/// a fatal error; everything downstream reads statistics off this data.
pub fn load_sales(path: &Path) -> Result<(Vec<SalesRecord>, LoadReport)> {
    let file = std::fs::File::open(path).map_err(|e| PipelineError::io(path, e))?;
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(file);

    let mut total_rows = 0usize;
    let mut parse_errors = 0usize;
    let mut records: Vec<SalesRecord> = Vec::new();

    for result in rdr.deserialize::<RawRow>() {
        total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(_) => {
                parse_errors += 1;
                continue;
            }
        };

        let year = match parse_i32_safe(row.year.as_deref()) {
            Some(y) => y,
            None => {
                parse_errors += 1;
                continue;
            }
        };
        let sales_volume = match parse_f64_safe(row.sales_volume.as_deref()) {
            Some(v) if v >= 0.0 => v,
            _ => {
                parse_errors += 1;
                continue;
            }
        };
        // Price is carried through but never gates a row; a missing
        // price still leaves a usable sales observation.
        let price_usd = parse_f64_safe(row.price_usd.as_deref()).unwrap_or(0.0);

        let model = row
            .model
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("Unknown")
            .to_string();
        let region = row
            .region
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("Unknown")
            .to_string();

        records.push(SalesRecord {
            year,
            model,
            region,
            sales_volume,
            price_usd,
        });
    }

    if records.is_empty() {
        return Err(PipelineError::EmptyDataset {
            path: path.to_path_buf(),
        });
    }

    let report = LoadReport {
        total_rows,
        kept_rows: records.len(),
        parse_errors,
    };
    Ok((records, report))
}
