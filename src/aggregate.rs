// Group-by aggregation of the raw sales records.
//
// A sum is a sum: no filtering, no outlier handling. Grouping is done
// with explicit ordered maps; years sort ascending inside each group
// while group names keep their order of first appearance in the input,
// which also fixes the iteration order of the alert evaluator.

use std::collections::{BTreeMap, HashMap};

use crate::types::{SalesRecord, YearlyPoint};

/// Total sales per year, ascending, with year-over-year growth in
/// percent (undefined for the first year).
pub fn yearly_series(records: &[SalesRecord]) -> Vec<YearlyPoint> {
    let mut totals: BTreeMap<i32, f64> = BTreeMap::new();
    for r in records {
        *totals.entry(r.year).or_insert(0.0) += r.sales_volume;
    }

    let mut points: Vec<YearlyPoint> = Vec::with_capacity(totals.len());
    let mut prev: Option<f64> = None;
    for (year, total) in totals {
        let yoy_growth = prev
            .filter(|p| *p != 0.0)
            .map(|p| (total - p) / p * 100.0);
        points.push(YearlyPoint {
            year,
            total_sales: total,
            yoy_growth,
        });
        prev = Some(total);
    }
    points
}

/// Sales summed by (group, year). Derived fresh on every run and never
/// mutated afterwards.
#[derive(Debug, Clone)]
pub struct GroupedYearly {
    order: Vec<String>,
    series: HashMap<String, Vec<(i32, f64)>>,
}

impl GroupedYearly {
    fn build<F>(records: &[SalesRecord], key: F) -> Self
    where
        F: Fn(&SalesRecord) -> &str,
    {
        let mut order: Vec<String> = Vec::new();
        let mut acc: HashMap<String, BTreeMap<i32, f64>> = HashMap::new();
        for r in records {
            let name = key(r);
            if !acc.contains_key(name) {
                order.push(name.to_string());
            }
            *acc.entry(name.to_string())
                .or_default()
                .entry(r.year)
                .or_insert(0.0) += r.sales_volume;
        }

        let series = acc
            .into_iter()
            .map(|(name, by_year)| (name, by_year.into_iter().collect::<Vec<_>>()))
            .collect();
        GroupedYearly { order, series }
    }

    /// Group names in order of first appearance in the source rows.
    pub fn groups(&self) -> &[String] {
        &self.order
    }

    /// The (year, total) series for one group, ascending by year.
    pub fn series(&self, name: &str) -> Option<&[(i32, f64)]> {
        self.series.get(name).map(|v| v.as_slice())
    }

    /// All-time total per group, in appearance order.
    pub fn totals(&self) -> Vec<(String, f64)> {
        self.order
            .iter()
            .map(|name| {
                let total = self.series[name].iter().map(|(_, v)| v).sum();
                (name.clone(), total)
            })
            .collect()
    }

    /// The `n` groups with the largest all-time totals, best first.
    pub fn top_n(&self, n: usize) -> Vec<String> {
        let mut totals = self.totals();
        totals.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        totals.into_iter().take(n).map(|(name, _)| name).collect()
    }

    /// A group's value for one specific year, if present.
    pub fn value_for(&self, name: &str, year: i32) -> Option<f64> {
        self.series
            .get(name)?
            .iter()
            .find(|(y, _)| *y == year)
            .map(|(_, v)| *v)
    }
}

/// How many models the model-by-region pivot keeps.
pub const MAX_HEATMAP_MODELS: usize = 15;

/// Model-by-region pivot of summed sales. Rows are models ranked by
/// all-time total (capped at `MAX_HEATMAP_MODELS`), columns are regions
/// in order of first appearance; missing combinations are zero.
#[derive(Debug, Clone)]
pub struct SalesPivot {
    pub models: Vec<String>,
    pub regions: Vec<String>,
    /// Indexed `values[model][region]`, aligned with the name vectors.
    pub values: Vec<Vec<f64>>,
}

pub fn model_region_pivot(records: &[SalesRecord], max_models: usize) -> SalesPivot {
    let mut regions: Vec<String> = Vec::new();
    let mut model_order: Vec<String> = Vec::new();
    let mut model_totals: HashMap<String, f64> = HashMap::new();
    let mut cells: HashMap<String, HashMap<String, f64>> = HashMap::new();
    for r in records {
        if !regions.contains(&r.region) {
            regions.push(r.region.clone());
        }
        if !model_totals.contains_key(&r.model) {
            model_order.push(r.model.clone());
        }
        *model_totals.entry(r.model.clone()).or_insert(0.0) += r.sales_volume;
        *cells
            .entry(r.model.clone())
            .or_default()
            .entry(r.region.clone())
            .or_insert(0.0) += r.sales_volume;
    }

    // Stable sort keeps first-appearance order among ties.
    let mut models = model_order;
    models.sort_by(|a, b| {
        model_totals[b]
            .partial_cmp(&model_totals[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    models.truncate(max_models);

    let values = models
        .iter()
        .map(|m| {
            let row = cells.get(m);
            regions
                .iter()
                .map(|g| {
                    row.and_then(|by_region| by_region.get(g))
                        .copied()
                        .unwrap_or(0.0)
                })
                .collect()
        })
        .collect();

    SalesPivot {
        models,
        regions,
        values,
    }
}

pub fn model_yearly(records: &[SalesRecord]) -> GroupedYearly {
    GroupedYearly::build(records, |r| &r.model)
}

pub fn region_yearly(records: &[SalesRecord]) -> GroupedYearly {
    GroupedYearly::build(records, |r| &r.region)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rec(year: i32, model: &str, region: &str, volume: f64) -> SalesRecord {
        SalesRecord {
            year,
            model: model.to_string(),
            region: region.to_string(),
            sales_volume: volume,
            price_usd: 0.0,
        }
    }

    #[test]
    fn yearly_totals_sorted_with_growth() {
        let records = vec![
            rec(2021, "X1", "Europe", 60.0),
            rec(2020, "X1", "Europe", 100.0),
            rec(2021, "X3", "Asia", 50.0),
            rec(2022, "X1", "Europe", 90.0),
        ];
        let series = yearly_series(&records);
        assert_eq!(series.len(), 3);
        assert_eq!(series[0].year, 2020);
        assert_eq!(series[0].total_sales, 100.0);
        assert_eq!(series[0].yoy_growth, None);
        assert_eq!(series[1].total_sales, 110.0);
        assert_relative_eq!(series[1].yoy_growth.unwrap(), 10.0);
        assert_relative_eq!(series[2].yoy_growth.unwrap(), (90.0 - 110.0) / 110.0 * 100.0);
    }

    #[test]
    fn groups_keep_first_appearance_order() {
        let records = vec![
            rec(2020, "X1", "Europe", 10.0),
            rec(2020, "X1", "Asia", 20.0),
            rec(2021, "X1", "Europe", 30.0),
            rec(2021, "X1", "Americas", 5.0),
        ];
        let regions = region_yearly(&records);
        assert_eq!(regions.groups(), &["Europe", "Asia", "Americas"]);
        assert_eq!(regions.series("Europe").unwrap(), &[(2020, 10.0), (2021, 30.0)]);
        assert_eq!(regions.value_for("Asia", 2020), Some(20.0));
        assert_eq!(regions.value_for("Asia", 2021), None);
    }

    #[test]
    fn pivot_ranks_models_and_zero_fills_missing_cells() {
        let records = vec![
            rec(2020, "X1", "Europe", 10.0),
            rec(2020, "X3", "Europe", 50.0),
            rec(2021, "X3", "Asia", 25.0),
            rec(2021, "X5", "Asia", 40.0),
        ];
        let pivot = model_region_pivot(&records, 2);
        // X3 (75) outranks X5 (40); X1 (10) falls off the cap.
        assert_eq!(pivot.models, &["X3", "X5"]);
        assert_eq!(pivot.regions, &["Europe", "Asia"]);
        assert_eq!(pivot.values, vec![vec![50.0, 25.0], vec![0.0, 40.0]]);
    }

    #[test]
    fn top_n_by_all_time_total() {
        let records = vec![
            rec(2020, "X1", "Europe", 10.0),
            rec(2020, "X3", "Europe", 50.0),
            rec(2021, "X5", "Europe", 30.0),
            rec(2021, "X3", "Europe", 5.0),
        ];
        let models = model_yearly(&records);
        assert_eq!(models.top_n(2), vec!["X3".to_string(), "X5".to_string()]);
    }

    #[test]
    fn empty_input_yields_empty_series() {
        assert!(yearly_series(&[]).is_empty());
        assert!(model_yearly(&[]).groups().is_empty());
    }
}
