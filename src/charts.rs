// Static SVG charts over the aggregated series and the forecast.

use std::path::Path;

use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::aggregate::SalesPivot;
use crate::error::{PipelineError, Result};
use crate::types::{ForecastOutcome, YearlyPoint};
use crate::util::format_number;

fn chart_err<E: std::fmt::Display>(e: E) -> PipelineError {
    PipelineError::Chart(e.to_string())
}

/// Line chart of total sales per year.
pub fn render_overview(yearly: &[YearlyPoint], path: &Path) -> Result<()> {
    if yearly.is_empty() {
        return Ok(());
    }
    let root = SVGBackend::new(path, (1024, 576)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let x_min = yearly.first().map(|p| p.year).unwrap_or(0);
    let x_max = yearly.last().map(|p| p.year).unwrap_or(1);
    let y_max = yearly
        .iter()
        .map(|p| p.total_sales)
        .fold(f64::NEG_INFINITY, f64::max);

    let mut chart = ChartBuilder::on(&root)
        .caption("Total Sales by Year", ("sans-serif", 28))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(x_min..x_max + 1, 0f64..y_max * 1.1)
        .map_err(chart_err)?;
    chart
        .configure_mesh()
        .x_desc("Year")
        .y_desc("Sales volume")
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(LineSeries::new(
            yearly.iter().map(|p| (p.year, p.total_sales)),
            BLUE.stroke_width(2),
        ))
        .map_err(chart_err)?;
    chart
        .draw_series(
            yearly
                .iter()
                .map(|p| Circle::new((p.year, p.total_sales), 3, BLUE.filled())),
        )
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    Ok(())
}

/// Linear ramp from pale yellow to deep red, `t` in [0, 1].
fn heat_color(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    let lerp = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
    RGBColor(lerp(255, 189), lerp(255, 0), lerp(204, 38))
}

/// Heatmap of summed sales per model-region cell, models top to bottom
/// in rank order, each cell annotated with its total.
pub fn render_heatmap(pivot: &SalesPivot, path: &Path) -> Result<()> {
    if pivot.models.is_empty() || pivot.regions.is_empty() {
        return Ok(());
    }
    let root = SVGBackend::new(path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let n_regions = pivot.regions.len();
    let n_models = pivot.models.len();
    let max = pivot
        .values
        .iter()
        .flatten()
        .fold(0f64, |acc, v| acc.max(*v));

    let mut chart = ChartBuilder::on(&root)
        .caption("Sales by Model and Region", ("sans-serif", 28))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(110)
        .build_cartesian_2d(0f64..n_regions as f64, n_models as f64..0f64)
        .map_err(chart_err)?;

    let region_names = pivot.regions.clone();
    let model_names = pivot.models.clone();
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n_regions)
        .y_labels(n_models)
        .x_label_formatter(&|v| {
            region_names
                .get(v.floor() as usize)
                .cloned()
                .unwrap_or_default()
        })
        .y_label_formatter(&|v| {
            model_names
                .get(v.floor() as usize)
                .cloned()
                .unwrap_or_default()
        })
        .x_desc("Region")
        .y_desc("Model")
        .draw()
        .map_err(chart_err)?;

    let annotation = ("sans-serif", 13)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));
    for (row, values) in pivot.values.iter().enumerate() {
        for (col, value) in values.iter().enumerate() {
            let t = if max > 0.0 { value / max } else { 0.0 };
            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [
                        (col as f64, row as f64),
                        (col as f64 + 1.0, row as f64 + 1.0),
                    ],
                    heat_color(t).filled(),
                )))
                .map_err(chart_err)?;
            chart
                .draw_series(std::iter::once(Text::new(
                    format_number(*value, 0),
                    (col as f64 + 0.5, row as f64 + 0.5),
                    annotation.clone(),
                )))
                .map_err(chart_err)?;
        }
    }

    root.present().map_err(chart_err)?;
    Ok(())
}

/// Forecast chart: history, held-out predictions when present, future
/// forecast and the confidence band when the fitted tier provides one.
pub fn render_forecast(outcome: &ForecastOutcome, path: &Path) -> Result<()> {
    if outcome.historical.is_empty() {
        return Ok(());
    }
    let root = SVGBackend::new(path, (1024, 576)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let x_min = outcome.years.first().copied().unwrap_or(0);
    let x_max = outcome
        .forecast_years
        .last()
        .copied()
        .unwrap_or_else(|| outcome.years.last().copied().unwrap_or(1));

    let mut y_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    for v in outcome
        .historical
        .iter()
        .chain(outcome.forecast.iter())
        .chain(outcome.confidence.iter().flat_map(|b| b.upper.iter()))
        .chain(outcome.confidence.iter().flat_map(|b| b.lower.iter()))
    {
        y_max = y_max.max(*v);
        y_min = y_min.min(*v);
    }
    let pad = (y_max - y_min).abs().max(1.0) * 0.1;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Sales Forecast ({})", outcome.tier.label()),
            ("sans-serif", 28),
        )
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(x_min..x_max + 1, (y_min - pad)..(y_max + pad))
        .map_err(chart_err)?;
    chart
        .configure_mesh()
        .x_desc("Year")
        .y_desc("Sales volume")
        .draw()
        .map_err(chart_err)?;

    // Confidence band first so the lines draw on top of it.
    if let Some(band) = &outcome.confidence {
        let mut polygon: Vec<(i32, f64)> = outcome
            .forecast_years
            .iter()
            .zip(band.upper.iter())
            .map(|(y, v)| (*y, *v))
            .collect();
        polygon.extend(
            outcome
                .forecast_years
                .iter()
                .zip(band.lower.iter())
                .rev()
                .map(|(y, v)| (*y, *v)),
        );
        chart
            .draw_series(std::iter::once(Polygon::new(polygon, RED.mix(0.15))))
            .map_err(chart_err)?;
    }

    chart
        .draw_series(LineSeries::new(
            outcome
                .years
                .iter()
                .zip(outcome.historical.iter())
                .map(|(y, v)| (*y, *v)),
            BLUE.stroke_width(2),
        ))
        .map_err(chart_err)?
        .label("historical")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

    if let Some(holdout) = &outcome.holdout {
        let test_years = &outcome.years[holdout.train_size..];
        chart
            .draw_series(LineSeries::new(
                test_years
                    .iter()
                    .zip(holdout.predictions.iter())
                    .map(|(y, v)| (*y, *v)),
                GREEN.stroke_width(2),
            ))
            .map_err(chart_err)?
            .label("held-out prediction")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &GREEN));
    }

    // Connect the last observation to the first forecast point.
    let mut forecast_points: Vec<(i32, f64)> = Vec::with_capacity(outcome.forecast.len() + 1);
    if let (Some(y), Some(v)) = (outcome.years.last(), outcome.historical.last()) {
        forecast_points.push((*y, *v));
    }
    forecast_points.extend(
        outcome
            .forecast_years
            .iter()
            .zip(outcome.forecast.iter())
            .map(|(y, v)| (*y, *v)),
    );
    chart
        .draw_series(LineSeries::new(forecast_points, RED.stroke_width(2)))
        .map_err(chart_err)?
        .label("forecast")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));

    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .background_style(&WHITE.mix(0.8))
        .draw()
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConfidenceBand, ForecastTier};

    #[test]
    fn renders_forecast_svg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forecast.svg");
        let outcome = ForecastOutcome {
            years: vec![2020, 2021, 2022],
            historical: vec![100.0, 110.0, 90.0],
            forecast_years: vec![2023, 2024, 2025],
            forecast: vec![95.0, 97.0, 99.0],
            confidence: Some(ConfidenceBand {
                lower: vec![85.0, 84.0, 83.0],
                upper: vec![105.0, 110.0, 115.0],
            }),
            holdout: None,
            tier: ForecastTier::Arima,
        };
        render_forecast(&outcome, &path).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn renders_heatmap_svg_with_cell_annotations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("heatmap.svg");
        let pivot = SalesPivot {
            models: vec!["X3".to_string(), "X5".to_string()],
            regions: vec!["Europe".to_string(), "Asia".to_string()],
            values: vec![vec![1500.0, 250.0], vec![0.0, 400.0]],
        };
        render_heatmap(&pivot, &path).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("1,500"));
    }

    #[test]
    fn renders_overview_svg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overview.svg");
        let yearly = vec![
            YearlyPoint { year: 2020, total_sales: 100.0, yoy_growth: None },
            YearlyPoint { year: 2021, total_sales: 120.0, yoy_growth: Some(20.0) },
        ];
        render_overview(&yearly, &path).unwrap();
        assert!(path.exists());
    }
}
