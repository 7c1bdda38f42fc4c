//! Period-over-period sales growth.

use crate::types::{CategorySales, GrowthRecord, MonthlySales};
use std::collections::HashMap;

/// A sales total that belongs to one series (a category, or the whole store
/// when `series` is `None`) at one period.
pub trait PeriodSales {
    fn series(&self) -> Option<&str>;

    /// `(year, month)`; yearly tables have no month.
    fn period(&self) -> (i32, Option<u32>);

    fn total_sales(&self) -> f64;
}

impl PeriodSales for MonthlySales {
    fn series(&self) -> Option<&str> {
        None
    }

    fn period(&self) -> (i32, Option<u32>) {
        (self.year, Some(self.month))
    }

    fn total_sales(&self) -> f64 {
        self.total_sales
    }
}

impl PeriodSales for CategorySales {
    fn series(&self) -> Option<&str> {
        Some(self.product_category_name.as_str())
    }

    fn period(&self) -> (i32, Option<u32>) {
        (self.year, None)
    }

    fn total_sales(&self) -> f64 {
        self.total_sales
    }
}

/// Percentage change from `previous` to `current`. `None` when there is no
/// previous period or it sold nothing.
pub fn growth_pct(current: f64, previous: Option<f64>) -> Option<f64> {
    match previous {
        Some(p) if p != 0.0 => Some((current - p) / p * 100.0),
        _ => None,
    }
}

/// Attach the previous period's sales and the growth against it to every
/// row. "Previous" is the chronologically preceding row of the same series
/// present in the table, regardless of how the input is ordered. Output rows
/// keep the input order. Every `PeriodSales` row carries a `total_sales`, so
/// there is no missing-column case to report here.
pub fn calculate_growth<T: PeriodSales>(rows: &[T]) -> Vec<GrowthRecord> {
    let mut series: HashMap<Option<&str>, Vec<usize>> = HashMap::new();
    for (i, r) in rows.iter().enumerate() {
        series.entry(r.series()).or_default().push(i);
    }

    let mut previous: Vec<Option<f64>> = vec![None; rows.len()];
    for idx in series.values_mut() {
        idx.sort_by_key(|&i| rows[i].period());
        for pair in idx.windows(2) {
            previous[pair[1]] = Some(rows[pair[0]].total_sales());
        }
    }

    let out: Vec<GrowthRecord> = rows
        .iter()
        .zip(previous)
        .map(|(r, previous_period_sales)| {
            let (year, month) = r.period();
            GrowthRecord {
                year,
                month,
                product_category_name: r.series().map(str::to_string),
                total_sales: r.total_sales(),
                previous_period_sales,
                growth: growth_pct(r.total_sales(), previous_period_sales),
            }
        })
        .collect();
    tracing::debug!(
        rows = out.len(),
        series = series.len(),
        undefined = out.iter().filter(|g| g.growth.is_none()).count(),
        "computed period growth"
    );
    out
}
