use crate::error::Result;
use crate::grouping::{group_by, Count, CountWhere, Latest, Mean, Sum};
use crate::select::{nlargest, nlargest_per, nsmallest};
use crate::types::{
    CategorySales, CityDelivery, CityLateness, Column, DailyOrders, MonthlySales, OrderLine,
    OrderSet, ProductOrders, ProductSales, Rfm, RfmSummary,
};
use crate::util::{days_between, describe};
use crate::window::{filter_window, DateWindow, Granularity};
use chrono::{Datelike, NaiveDateTime};

/// The `n` highest and `n` lowest rows of a table by one field.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking<T> {
    pub top: Vec<T>,
    pub bottom: Vec<T>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CityLatenessRanking {
    pub most_late: Vec<CityLateness>,
    pub most_ontime: Vec<CityLateness>,
}

fn price(r: &OrderLine) -> f64 {
    r.price
}

fn delay(r: &OrderLine) -> Option<f64> {
    r.delivery_delay_days.map(|d| d as f64)
}

fn seller_location(r: &OrderLine) -> Option<(String, String)> {
    Some((r.seller_city.clone()?, r.seller_state.clone()?))
}

/// Orders and sales per purchase timestamp inside `window`, in
/// chronological order.
pub fn daily_orders(set: &OrderSet, window: &DateWindow, granularity: Granularity) -> Vec<DailyOrders> {
    let filtered = filter_window(set, window);
    let mut out: Vec<DailyOrders> = group_by(
        filtered.rows(),
        |r: &OrderLine| Some(granularity.key(r.order_purchase_timestamp)),
        (Count::new(), Sum::new(price)),
    )
    .into_iter()
    .map(|(ts, (total_orders, total_sales))| DailyOrders {
        order_purchase_timestamp: ts,
        total_orders,
        total_sales,
    })
    .collect();
    out.sort_by_key(|r| r.order_purchase_timestamp);
    out
}

/// Headline totals over a daily report: (orders, sales).
pub fn daily_totals(daily: &[DailyOrders]) -> (usize, f64) {
    daily
        .iter()
        .fold((0, 0.0), |(n, s), d| (n + d.total_orders, s + d.total_sales))
}

pub fn monthly_sales(set: &OrderSet) -> Result<Vec<MonthlySales>> {
    set.schema()
        .require("monthly_sales", &[Column::Year, Column::Month])?;
    let mut out: Vec<MonthlySales> = group_by(
        set.rows(),
        |r: &OrderLine| Some((r.year?, r.month?)),
        Sum::new(price),
    )
    .into_iter()
    .map(|((year, month), total_sales)| MonthlySales {
        year,
        month,
        total_sales,
    })
    .collect();
    out.sort_by_key(|r| (r.year, r.month));
    Ok(out)
}

fn category_sales_by<Y>(set: &OrderSet, year_of: Y, per_year: usize) -> Vec<CategorySales>
where
    Y: Fn(&OrderLine) -> Option<i32>,
{
    let mut table: Vec<CategorySales> = group_by(
        set.rows(),
        |r: &OrderLine| Some((year_of(r)?, r.product_category_name.clone()?)),
        Sum::new(price),
    )
    .into_iter()
    .map(|((year, product_category_name), total_sales)| CategorySales {
        year,
        product_category_name,
        total_sales,
    })
    .collect();
    table.sort_by(|a, b| {
        (a.year, &a.product_category_name).cmp(&(b.year, &b.product_category_name))
    });
    nlargest_per(&table, per_year, |r| r.year, |r| Some(r.total_sales))
}

/// Per-year category sales, keeping the `per_year` best-selling categories
/// of each year. Needs the table's own `year` column.
pub fn category_trends(set: &OrderSet, per_year: usize) -> Result<Vec<CategorySales>> {
    set.schema().require(
        "category_trends",
        &[Column::Year, Column::ProductCategoryName],
    )?;
    Ok(category_sales_by(set, |r| r.year, per_year))
}

/// Same ranking as [`category_trends`], but the year is taken from the
/// purchase timestamp, so it works on tables without a `year` column. The
/// input rows are left untouched.
pub fn top_sales_per_year(set: &OrderSet, per_year: usize) -> Result<Vec<CategorySales>> {
    set.schema()
        .require("top_sales_per_year", &[Column::ProductCategoryName])?;
    Ok(category_sales_by(
        set,
        |r| Some(r.order_purchase_timestamp.year()),
        per_year,
    ))
}

pub fn city_delivery(set: &OrderSet) -> Result<Vec<CityDelivery>> {
    set.schema().require(
        "city_delivery",
        &[Column::SellerCity, Column::SellerState, Column::DeliveryDelayDays],
    )?;
    let mut out: Vec<CityDelivery> = group_by(set.rows(), seller_location, (Mean::new(delay), Count::new()))
        .into_iter()
        .map(|((seller_city, seller_state), (avg_delivery_delay, total_orders))| CityDelivery {
            seller_city,
            seller_state,
            avg_delivery_delay,
            total_orders,
        })
        .collect();
    out.sort_by(|a, b| (&a.seller_city, &a.seller_state).cmp(&(&b.seller_city, &b.seller_state)));
    Ok(out)
}

/// Cities with the largest (`top`) and smallest (`bottom`) mean delivery
/// delay. Cities with no recorded delay are not ranked.
pub fn city_delivery_ranking(set: &OrderSet, n: usize) -> Result<Ranking<CityDelivery>> {
    let table = city_delivery(set)?;
    Ok(Ranking {
        top: nlargest(&table, n, |r| r.avg_delivery_delay),
        bottom: nsmallest(&table, n, |r| r.avg_delivery_delay),
    })
}

pub fn city_lateness(set: &OrderSet) -> Result<Vec<CityLateness>> {
    set.schema().require(
        "city_lateness",
        &[Column::SellerCity, Column::SellerState, Column::DeliveryDelayDays],
    )?;
    let aggs = (
        CountWhere::new(|r: &OrderLine| r.delivery_delay_days.is_some_and(|d| d > 0)),
        CountWhere::new(|r: &OrderLine| r.delivery_delay_days == Some(0)),
        Count::new(),
    );
    let mut out: Vec<CityLateness> = group_by(set.rows(), seller_location, aggs)
        .into_iter()
        .map(
            |((seller_city, seller_state), (total_late_orders, total_ontime_orders, total_orders))| {
                CityLateness {
                    seller_city,
                    seller_state,
                    total_late_orders,
                    total_ontime_orders,
                    total_orders,
                }
            },
        )
        .collect();
    out.sort_by(|a, b| (&a.seller_city, &a.seller_state).cmp(&(&b.seller_city, &b.seller_state)));
    Ok(out)
}

/// The `n` cities with the most late deliveries and, separately, the `n`
/// with the most on-time deliveries. A city may appear in both lists.
pub fn city_lateness_ranking(set: &OrderSet, n: usize) -> Result<CityLatenessRanking> {
    let table = city_lateness(set)?;
    Ok(CityLatenessRanking {
        most_late: nlargest(&table, n, |r| Some(r.total_late_orders as f64)),
        most_ontime: nlargest(&table, n, |r| Some(r.total_ontime_orders as f64)),
    })
}

/// Recency, frequency and monetary value per customer. Recency is counted
/// in whole days back from `reference` and is negative for customers who
/// purchased after it.
pub fn rfm(set: &OrderSet, reference: NaiveDateTime) -> Vec<Rfm> {
    let mut out: Vec<Rfm> = group_by(
        set.rows(),
        |r: &OrderLine| Some(r.customer_id.clone()),
        (
            Latest::new(|r: &OrderLine| r.order_purchase_timestamp),
            Count::new(),
            Sum::new(price),
        ),
    )
    .into_iter()
    .filter_map(|(customer_id, (latest, frequency, monetary))| {
        Some(Rfm {
            customer_id,
            recency: days_between(latest?, reference),
            frequency,
            monetary,
        })
    })
    .collect();
    out.sort_by(|a, b| a.customer_id.cmp(&b.customer_id));
    out
}

pub fn top_customers(rfm: &[Rfm], n: usize) -> Vec<Rfm> {
    nlargest(rfm, n, |r| Some(r.monetary))
}

pub fn rfm_summary(rfm: &[Rfm]) -> RfmSummary {
    RfmSummary {
        recency: describe(rfm.iter().map(|r| r.recency as f64).collect()),
        frequency: describe(rfm.iter().map(|r| r.frequency as f64).collect()),
        monetary: describe(rfm.iter().map(|r| r.monetary).collect()),
    }
}

fn by_category<A>(set: &OrderSet, report: &str, agg: A) -> Result<Vec<(String, A::Output)>>
where
    A: crate::grouping::Aggregator<OrderLine> + Clone,
{
    set.schema().require(report, &[Column::ProductCategoryName])?;
    let mut out = group_by(
        set.rows(),
        |r: &OrderLine| r.product_category_name.clone(),
        agg,
    );
    out.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(out)
}

/// Best and worst selling categories over the whole dataset by revenue.
pub fn product_sales_ranking(set: &OrderSet, n: usize) -> Result<Ranking<ProductSales>> {
    let table: Vec<ProductSales> = by_category(set, "product_sales", Sum::new(price))?
        .into_iter()
        .map(|(product_category_name, total_sales)| ProductSales {
            product_category_name,
            total_sales,
        })
        .collect();
    Ok(Ranking {
        top: nlargest(&table, n, |r| Some(r.total_sales)),
        bottom: nsmallest(&table, n, |r| Some(r.total_sales)),
    })
}

/// Best and worst selling categories by number of order lines.
pub fn product_orders_ranking(set: &OrderSet, n: usize) -> Result<Ranking<ProductOrders>> {
    let table: Vec<ProductOrders> = by_category(set, "product_orders", Count::new())?
        .into_iter()
        .map(|(product_category_name, total_orders)| ProductOrders {
            product_category_name,
            total_orders,
        })
        .collect();
    Ok(Ranking {
        top: nlargest(&table, n, |r| Some(r.total_orders as f64)),
        bottom: nsmallest(&table, n, |r| Some(r.total_orders as f64)),
    })
}
