#![allow(dead_code)]

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use order_analytics::OrderLine;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn at(y: i32, m: u32, d: u32, hour: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(hour, 0, 0).expect("valid time")
}

/// Midnight of 2017-01-01 plus `days` and `hours`.
pub fn offset(days: i64, hours: i64) -> NaiveDateTime {
    at(2017, 1, 1, 0) + Duration::days(days) + Duration::hours(hours)
}

pub struct Order(OrderLine);

impl Order {
    pub fn new(order_id: &str, customer_id: &str, ts: NaiveDateTime, price: f64) -> Self {
        Order(OrderLine {
            order_id: order_id.to_string(),
            customer_id: customer_id.to_string(),
            seller_city: Some("sao paulo".to_string()),
            seller_state: Some("SP".to_string()),
            product_category_name: Some("utilidades_domesticas".to_string()),
            price,
            order_purchase_timestamp: ts,
            order_delivered_customer_date: None,
            delivery_delay_days: None,
            year: Some(ts.year()),
            month: Some(ts.month()),
        })
    }

    pub fn city(mut self, city: &str, state: &str) -> Self {
        self.0.seller_city = Some(city.to_string());
        self.0.seller_state = Some(state.to_string());
        self
    }

    pub fn category(mut self, name: &str) -> Self {
        self.0.product_category_name = Some(name.to_string());
        self
    }

    pub fn delay(mut self, days: i64) -> Self {
        self.0.delivery_delay_days = Some(days);
        self
    }

    pub fn build(self) -> OrderLine {
        self.0
    }
}
