//! Date-window filtering for the daily report.

use crate::types::{OrderLine, OrderSet};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;

/// Inclusive calendar-date bounds. Both ends are compared as midnight of
/// that date, so purchases made later on `end` fall outside the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The window spanning the first and last purchase dates of a set, or
    /// `None` if the set is empty.
    pub fn covering(set: &OrderSet) -> Option<Self> {
        set.purchase_range()
            .map(|(lo, hi)| Self::new(lo.date(), hi.date()))
    }

    fn bounds(&self) -> (NaiveDateTime, NaiveDateTime) {
        (
            self.start.and_time(NaiveTime::MIN),
            self.end.and_time(NaiveTime::MIN),
        )
    }

    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        let (lo, hi) = self.bounds();
        lo <= ts && ts <= hi
    }
}

/// How the daily report keys its groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Exact purchase timestamp as stored.
    #[default]
    Timestamp,
    /// Calendar day of the purchase (midnight).
    Day,
}

impl Granularity {
    pub fn key(self, ts: NaiveDateTime) -> NaiveDateTime {
        match self {
            Granularity::Timestamp => ts,
            Granularity::Day => ts.date().and_time(NaiveTime::MIN),
        }
    }
}

/// Rows purchased inside `window`, in their original order. An inverted
/// window (`start > end`) selects nothing.
pub fn filter_window(set: &OrderSet, window: &DateWindow) -> OrderSet {
    let rows: Vec<OrderLine> = set
        .rows()
        .iter()
        .filter(|r| window.contains(r.order_purchase_timestamp))
        .cloned()
        .collect();
    tracing::debug!(
        start = %window.start,
        end = %window.end,
        kept = rows.len(),
        total = set.len(),
        "filtered orders to date window"
    );
    OrderSet::with_schema(set.schema().clone(), rows)
}
