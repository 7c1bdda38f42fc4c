//! Report tunables and the optional TOML file they can be read from.
//!
//! Precedence is defaults < config file < command-line flags; the binary
//! applies the flags on top of [`ReportConfig::from_file`].

use crate::error::Result;
use crate::window::{DateWindow, Granularity};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    /// RFM recency is measured back from midnight of this date.
    pub reference_date: NaiveDate,
    /// Daily report window. `None` covers the whole dataset.
    pub window: Option<DateWindow>,
    pub daily_granularity: Granularity,
    /// Size of the city, product and customer rankings.
    pub top_n: usize,
    /// Categories kept per year by the trend reports.
    pub top_per_year: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            reference_date: NaiveDate::from_ymd_opt(2018, 9, 3).unwrap_or(NaiveDate::MIN),
            window: None,
            daily_granularity: Granularity::Timestamp,
            top_n: 5,
            top_per_year: 10,
        }
    }
}

/// Shape of the TOML file. Every key is optional.
///
/// ```toml
/// reference_date = "2018-09-03"
/// top_n = 5
/// top_per_year = 10
/// daily_granularity = "day"
///
/// [window]
/// start = "2017-01-01"
/// end = "2017-12-31"
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub reference_date: Option<NaiveDate>,
    pub window: Option<DateWindow>,
    pub daily_granularity: Option<Granularity>,
    pub top_n: Option<usize>,
    pub top_per_year: Option<usize>,
}

impl FileConfig {
    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn read(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }
}

impl ReportConfig {
    pub fn from_file(file: FileConfig) -> Self {
        let d = Self::default();
        Self {
            reference_date: file.reference_date.unwrap_or(d.reference_date),
            window: file.window.or(d.window),
            daily_granularity: file.daily_granularity.unwrap_or(d.daily_granularity),
            top_n: file.top_n.unwrap_or(d.top_n),
            top_per_year: file.top_per_year.unwrap_or(d.top_per_year),
        }
    }

    pub fn reference_instant(&self) -> NaiveDateTime {
        self.reference_date.and_time(NaiveTime::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dashboard_constants() {
        let c = ReportConfig::default();
        assert_eq!(c.reference_date, NaiveDate::from_ymd_opt(2018, 9, 3).unwrap());
        assert_eq!((c.top_n, c.top_per_year), (5, 10));
        assert_eq!(c.window, None);
    }

    #[test]
    fn file_values_override_defaults() {
        let file = FileConfig::parse(
            r#"
            reference_date = "2019-01-01"
            top_n = 3
            daily_granularity = "day"

            [window]
            start = "2017-01-01"
            end = "2017-06-30"
            "#,
        )
        .unwrap();
        let c = ReportConfig::from_file(file);
        assert_eq!(c.reference_date, NaiveDate::from_ymd_opt(2019, 1, 1).unwrap());
        assert_eq!(c.top_n, 3);
        assert_eq!(c.top_per_year, 10);
        assert_eq!(c.daily_granularity, Granularity::Day);
        assert_eq!(c.window.unwrap().end, NaiveDate::from_ymd_opt(2017, 6, 30).unwrap());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(FileConfig::parse("topn = 3").is_err());
    }
}
