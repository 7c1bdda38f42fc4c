use crate::error::{Error, Result};
use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tabled::Tabled;

/// One CSV record before validation. Every field is optional so that a
/// missing column and an empty cell both land here as `None`.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    pub order_id: Option<String>,
    pub customer_id: Option<String>,
    pub seller_city: Option<String>,
    pub seller_state: Option<String>,
    pub product_category_name: Option<String>,
    pub price: Option<String>,
    pub order_purchase_timestamp: Option<String>,
    pub order_delivered_customer_date: Option<String>,
    pub delivery_delay_days: Option<String>,
    pub year: Option<String>,
    pub month: Option<String>,
}

/// Columns of the order table that reports can depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    OrderId,
    CustomerId,
    SellerCity,
    SellerState,
    ProductCategoryName,
    Price,
    OrderPurchaseTimestamp,
    OrderDeliveredCustomerDate,
    DeliveryDelayDays,
    Year,
    Month,
}

impl Column {
    pub const ALL: [Column; 11] = [
        Column::OrderId,
        Column::CustomerId,
        Column::SellerCity,
        Column::SellerState,
        Column::ProductCategoryName,
        Column::Price,
        Column::OrderPurchaseTimestamp,
        Column::OrderDeliveredCustomerDate,
        Column::DeliveryDelayDays,
        Column::Year,
        Column::Month,
    ];

    /// Columns the loader refuses to work without.
    pub const REQUIRED: [Column; 4] = [
        Column::OrderId,
        Column::CustomerId,
        Column::Price,
        Column::OrderPurchaseTimestamp,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Column::OrderId => "order_id",
            Column::CustomerId => "customer_id",
            Column::SellerCity => "seller_city",
            Column::SellerState => "seller_state",
            Column::ProductCategoryName => "product_category_name",
            Column::Price => "price",
            Column::OrderPurchaseTimestamp => "order_purchase_timestamp",
            Column::OrderDeliveredCustomerDate => "order_delivered_customer_date",
            Column::DeliveryDelayDays => "delivery_delay_days",
            Column::Year => "year",
            Column::Month => "month",
        }
    }

    pub fn from_header(name: &str) -> Option<Column> {
        let name = name.trim();
        Column::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The set of columns present in a source table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: BTreeSet<Column>,
}

impl Schema {
    pub fn full() -> Self {
        Self {
            columns: Column::ALL.into_iter().collect(),
        }
    }

    pub fn from_headers<'a, I>(headers: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self {
            columns: headers.into_iter().filter_map(Column::from_header).collect(),
        }
    }

    pub fn contains(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    pub fn insert(&mut self, column: Column) {
        self.columns.insert(column);
    }

    pub fn without(mut self, column: Column) -> Self {
        self.columns.remove(&column);
        self
    }

    /// Check that every column a report needs is present. The first missing
    /// column is logged against the report name and returned as an error.
    pub fn require(&self, report: &str, columns: &[Column]) -> Result<()> {
        match columns.iter().find(|c| !self.contains(**c)) {
            Some(&missing) => {
                tracing::error!(report, column = %missing, "column not found in dataset");
                Err(Error::MissingColumn(missing))
            }
            None => Ok(()),
        }
    }
}

/// One order line item. `year`/`month` are copied from the source table
/// when it carries them; they are not recomputed here.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub order_id: String,
    pub customer_id: String,
    pub seller_city: Option<String>,
    pub seller_state: Option<String>,
    pub product_category_name: Option<String>,
    pub price: f64,
    pub order_purchase_timestamp: NaiveDateTime,
    pub order_delivered_customer_date: Option<NaiveDateTime>,
    pub delivery_delay_days: Option<i64>,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

/// An immutable snapshot of order lines together with the schema they were
/// read with.
#[derive(Debug, Clone)]
pub struct OrderSet {
    schema: Schema,
    rows: Vec<OrderLine>,
}

impl OrderSet {
    /// Wrap rows that carry every column.
    pub fn new(rows: Vec<OrderLine>) -> Self {
        Self::with_schema(Schema::full(), rows)
    }

    pub fn with_schema(schema: Schema, rows: Vec<OrderLine>) -> Self {
        Self { schema, rows }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[OrderLine] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Earliest and latest purchase timestamps, or `None` for an empty set.
    pub fn purchase_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let mut it = self.rows.iter().map(|r| r.order_purchase_timestamp);
        let first = it.next()?;
        Some(it.fold((first, first), |(lo, hi), ts| (lo.min(ts), hi.max(ts))))
    }

    /// Fill `year`/`month` from the purchase timestamp and mark both
    /// columns present. Used by ingestion when the file lacks them.
    pub fn derive_periods(mut self) -> Self {
        for r in &mut self.rows {
            r.year = Some(r.order_purchase_timestamp.year());
            r.month = Some(r.order_purchase_timestamp.month());
        }
        self.schema.insert(Column::Year);
        self.schema.insert(Column::Month);
        self
    }
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct DailyOrders {
    pub order_purchase_timestamp: NaiveDateTime,
    pub total_orders: usize,
    #[tabled(display_with = "fmt_money")]
    pub total_sales: f64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct MonthlySales {
    pub year: i32,
    pub month: u32,
    #[tabled(display_with = "fmt_money")]
    pub total_sales: f64,
}

/// A (year, category) sales total; the output of the category trend reports.
#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct CategorySales {
    pub year: i32,
    pub product_category_name: String,
    #[tabled(display_with = "fmt_money")]
    pub total_sales: f64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct CityDelivery {
    pub seller_city: String,
    pub seller_state: String,
    #[tabled(display_with = "fmt_opt_days")]
    pub avg_delivery_delay: Option<f64>,
    pub total_orders: usize,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct CityLateness {
    pub seller_city: String,
    pub seller_state: String,
    pub total_late_orders: usize,
    pub total_ontime_orders: usize,
    pub total_orders: usize,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct Rfm {
    pub customer_id: String,
    pub recency: i64,
    pub frequency: usize,
    #[tabled(display_with = "fmt_money")]
    pub monetary: f64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct ProductSales {
    pub product_category_name: String,
    #[tabled(display_with = "fmt_money")]
    pub total_sales: f64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct ProductOrders {
    pub product_category_name: String,
    pub total_orders: usize,
}

/// A period sales row augmented with the previous period's value and the
/// percentage change against it.
#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct GrowthRecord {
    pub year: i32,
    #[tabled(display_with = "fmt_opt")]
    pub month: Option<u32>,
    #[tabled(display_with = "fmt_opt")]
    pub product_category_name: Option<String>,
    #[tabled(display_with = "fmt_money")]
    pub total_sales: f64,
    #[tabled(display_with = "fmt_opt_money")]
    pub previous_period_sales: Option<f64>,
    #[tabled(display_with = "fmt_opt_pct")]
    pub growth: Option<f64>,
}

/// `describe()`-style statistics for one numeric column.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Default)]
pub struct Describe {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub max: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct RfmSummary {
    pub recency: Describe,
    pub frequency: Describe,
    pub monetary: Describe,
}

#[derive(Debug, Tabled, Clone)]
pub struct DescribeRow {
    pub statistic: &'static str,
    pub recency: String,
    pub frequency: String,
    pub monetary: String,
}

impl RfmSummary {
    /// Lay the statistics out one row per statistic, like a printed
    /// `describe()` table.
    pub fn rows(&self) -> Vec<DescribeRow> {
        type Pick = fn(&Describe) -> f64;
        let stats: [(&'static str, Pick); 8] = [
            ("count", |d| d.count as f64),
            ("mean", |d| d.mean),
            ("std", |d| d.std),
            ("min", |d| d.min),
            ("25%", |d| d.p25),
            ("50%", |d| d.p50),
            ("75%", |d| d.p75),
            ("max", |d| d.max),
        ];
        stats
            .into_iter()
            .map(|(statistic, pick)| DescribeRow {
                statistic,
                recency: crate::util::format_number(pick(&self.recency), 2),
                frequency: crate::util::format_number(pick(&self.frequency), 2),
                monetary: crate::util::format_number(pick(&self.monetary), 2),
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub window_start: String,
    pub window_end: String,
    pub total_orders: usize,
    pub total_sales: f64,
    pub total_customers: usize,
    pub rfm: RfmSummary,
}

fn fmt_money(v: &f64) -> String {
    crate::util::format_number(*v, 2)
}

fn fmt_opt_money(v: &Option<f64>) -> String {
    v.map(|x| crate::util::format_number(x, 2)).unwrap_or_default()
}

fn fmt_opt_days(v: &Option<f64>) -> String {
    v.map(|x| format!("{:.2}", x)).unwrap_or_default()
}

fn fmt_opt_pct(v: &Option<f64>) -> String {
    v.map(|x| format!("{:.2}%", x)).unwrap_or_default()
}

fn fmt_opt<T: fmt::Display>(v: &Option<T>) -> String {
    v.as_ref().map(|x| x.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_from_headers_ignores_unknown_columns() {
        let schema = Schema::from_headers(["order_id", " price ", "review_score"]);
        assert!(schema.contains(Column::OrderId));
        assert!(schema.contains(Column::Price));
        assert!(!schema.contains(Column::Year));
    }

    #[test]
    fn require_reports_first_missing_column() {
        let schema = Schema::full().without(Column::ProductCategoryName);
        let err = schema
            .require("category_trends", &[Column::Year, Column::ProductCategoryName])
            .unwrap_err();
        assert!(matches!(err, Error::MissingColumn(Column::ProductCategoryName)));
        assert_eq!(err.to_string(), "column 'product_category_name' not found in dataset");
    }

    #[test]
    fn describe_rows_follow_describe_layout() {
        let rows = RfmSummary::default().rows();
        let names: Vec<_> = rows.iter().map(|r| r.statistic).collect();
        assert_eq!(names, ["count", "mean", "std", "min", "25%", "50%", "75%", "max"]);
    }
}
