mod common;

use common::{at, date, Order};
use order_analytics::growth::calculate_growth;
use order_analytics::loader::load_orders_from_reader;
use order_analytics::reports;
use order_analytics::{Column, DateWindow, Error, Granularity, OrderSet, Schema};

#[test]
fn rfm_recency_from_reference_date() {
    let set = OrderSet::new(vec![
        Order::new("o1", "alice", at(2018, 7, 1, 0), 20.0).build(),
        Order::new("o2", "alice", at(2018, 8, 20, 0), 30.0).build(),
        Order::new("o3", "bob", at(2018, 9, 2, 0), 5.0).build(),
    ]);
    let reference = date(2018, 9, 3).and_hms_opt(0, 0, 0).unwrap();
    let rfm = reports::rfm(&set, reference);
    let alice = rfm.iter().find(|r| r.customer_id == "alice").unwrap();
    assert_eq!(alice.recency, 14);
    assert_eq!(alice.frequency, 2);
    assert_eq!(alice.monetary, 50.0);
    assert!(rfm.iter().all(|r| r.recency >= 0));
}

#[test]
fn delivery_top_and_bottom_cover_small_group_sets() {
    let set = OrderSet::new(vec![
        Order::new("o1", "c", at(2018, 1, 1, 0), 1.0).city("a", "SP").delay(4).build(),
        Order::new("o2", "c", at(2018, 1, 1, 0), 1.0).city("b", "SP").delay(-2).build(),
        Order::new("o3", "c", at(2018, 1, 1, 0), 1.0).city("c", "RJ").delay(0).build(),
    ]);
    let ranking = reports::city_delivery_ranking(&set, 5).unwrap();
    let mut top: Vec<_> = ranking.top.iter().map(|r| r.seller_city.clone()).collect();
    let mut bottom: Vec<_> = ranking.bottom.iter().map(|r| r.seller_city.clone()).collect();
    top.sort();
    bottom.sort();
    assert_eq!(top, vec!["a", "b", "c"]);
    assert_eq!(top, bottom);
}

#[test]
fn delivery_top_and_bottom_are_disjoint_for_many_groups() {
    let rows = (0..12)
        .map(|i| {
            Order::new(&format!("o{i}"), "c", at(2018, 1, 1, 0), 1.0)
                .city(&format!("city{i}"), "MG")
                .delay(i - 6)
                .build()
        })
        .collect();
    let ranking = reports::city_delivery_ranking(&OrderSet::new(rows), 5).unwrap();
    assert_eq!(ranking.top.len(), 5);
    assert_eq!(ranking.top[0].avg_delivery_delay, Some(5.0));
    assert_eq!(ranking.bottom[0].avg_delivery_delay, Some(-6.0));
    assert!(ranking.top.iter().all(|t| !ranking.bottom.contains(t)));
}

#[test]
fn lateness_lists_are_independent() {
    let mut rows = Vec::new();
    for i in 0..10 {
        rows.push(Order::new(&format!("l{i}"), "c", at(2018, 1, 1, 0), 1.0).city("late", "SP").delay(3).build());
        rows.push(Order::new(&format!("t{i}"), "c", at(2018, 1, 1, 0), 1.0).city("punctual", "PR").delay(0).build());
    }
    let ranking = reports::city_lateness_ranking(&OrderSet::new(rows), 1).unwrap();
    assert_eq!(ranking.most_late[0].seller_city, "late");
    assert_eq!(ranking.most_late[0].total_late_orders, 10);
    assert_eq!(ranking.most_ontime[0].seller_city, "punctual");
    assert_eq!(ranking.most_ontime[0].total_ontime_orders, 10);
}

#[test]
fn category_reports_without_category_column_are_skipped() {
    let schema = Schema::full().without(Column::ProductCategoryName);
    let set = OrderSet::with_schema(schema, vec![Order::new("o1", "c", at(2018, 1, 1, 0), 1.0).build()]);

    assert!(matches!(
        reports::category_trends(&set, 10),
        Err(Error::MissingColumn(Column::ProductCategoryName))
    ));
    assert!(reports::top_sales_per_year(&set, 10).is_err());
    assert!(reports::product_sales_ranking(&set, 5).is_err());
    // Sibling reports still run on the same snapshot.
    assert_eq!(reports::monthly_sales(&set).unwrap().len(), 1);
    assert_eq!(reports::rfm(&set, at(2018, 9, 3, 0)).len(), 1);
}

#[test]
fn category_trends_feed_growth() {
    let mut rows = Vec::new();
    for (year, sales) in [(2016, 100.0), (2017, 150.0), (2018, 75.0)] {
        rows.push(Order::new("o", "c", at(year, 6, 1, 0), sales).category("perfumaria").build());
    }
    let trends = reports::category_trends(&OrderSet::new(rows), 10).unwrap();
    let growth = calculate_growth(&trends);
    let pct: Vec<_> = growth.iter().map(|g| g.growth).collect();
    assert_eq!(pct, vec![None, Some(50.0), Some(-50.0)]);
}

#[test]
fn csv_to_reports_end_to_end() {
    let csv = "\
order_id,customer_id,seller_city,seller_state,product_category_name,price,order_purchase_timestamp,order_delivered_customer_date,delivery_delay_days
a,c1,campinas,SP,esporte_lazer,100.0,2017-03-01 09:00:00,2017-03-09 10:00:00,2
a,c1,campinas,SP,esporte_lazer,50.0,2017-03-01 09:00:00,2017-03-09 10:00:00,2
b,c2,curitiba,PR,moveis_decoracao,80.0,2017-03-02 12:30:00,2017-03-05 08:00:00,0
c,c3,curitiba,PR,moveis_decoracao,20.0,2017-03-04 18:00:00,,
";
    let (set, report) = load_orders_from_reader(csv.as_bytes()).unwrap();
    assert_eq!(report.loaded_rows, 4);

    // No year/month columns in this file.
    assert!(reports::monthly_sales(&set).is_err());
    assert!(reports::category_trends(&set, 10).is_err());
    let top = reports::top_sales_per_year(&set, 10).unwrap();
    assert_eq!(top[0].product_category_name, "esporte_lazer");
    assert_eq!(top[0].total_sales, 150.0);

    let window = DateWindow::covering(&set).unwrap();
    let daily = reports::daily_orders(&set, &window, Granularity::Timestamp);
    // The 18:00 purchase on the last day falls after the midnight end bound.
    assert_eq!(reports::daily_totals(&daily), (3, 230.0));

    let derived = set.derive_periods();
    let monthly = reports::monthly_sales(&derived).unwrap();
    assert_eq!(monthly.len(), 1);
    assert_eq!(monthly[0].total_sales, 250.0);
}
