// Utility helpers for parsing and basic statistics.
//
// CSV cell cleanup and number formatting live here so the rest of the code
// can assume clean, typed values.
use crate::types::Describe;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use num_format::{Locale, ToFormattedString};

const SECONDS_PER_DAY: i64 = 86_400;

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in CSV exports.
///
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters (this also rejects `NaN`).
/// - Strips thousands separators like `","` before parsing.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(",", "");
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn parse_i32_safe(s: Option<&str>) -> Option<i32> {
    parse_whole(s).and_then(|v| i32::try_from(v).ok())
}

/// Integer columns exported through a float dtype come out as `"3.0"`;
/// accept those, reject anything with a real fractional part.
pub fn parse_i64_safe(s: Option<&str>) -> Option<i64> {
    parse_whole(s)
}

fn parse_whole(s: Option<&str>) -> Option<i64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    let f = parse_f64_safe(Some(s))?;
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Accepts `YYYY-MM-DD HH:MM:SS` (optionally with fractional seconds or a
/// `T` separator) and bare `YYYY-MM-DD`, which maps to midnight.
pub fn parse_timestamp_safe(s: Option<&str>) -> Option<NaiveDateTime> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    const FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];
    FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Whole days from `earlier` to `later`, rounded toward negative infinity,
/// so a purchase one hour after the reference counts as `-1` days.
pub fn days_between(earlier: NaiveDateTime, later: NaiveDateTime) -> i64 {
    let delta = later - earlier;
    // `num_seconds` truncates toward zero; step back for a negative
    // remainder below one second.
    let mut secs = delta.num_seconds();
    if delta < Duration::seconds(secs) {
        secs -= 1;
    }
    secs.div_euclid(SECONDS_PER_DAY)
}

pub fn average(v: &[f64]) -> f64 {
    // Arithmetic mean; returns 0 for an empty slice to avoid NaNs.
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

/// Sample standard deviation (n - 1 in the denominator). Zero for fewer
/// than two values.
pub fn std_dev(v: &[f64]) -> f64 {
    if v.len() < 2 {
        return 0.0;
    }
    let mean = average(v);
    let ss: f64 = v.iter().map(|x| (x - mean).powi(2)).sum();
    (ss / (v.len() - 1) as f64).sqrt()
}

/// Quantile `q` in `[0, 1]` of an already sorted slice, interpolating
/// linearly between the two nearest ranks.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

pub fn describe(mut v: Vec<f64>) -> Describe {
    if v.is_empty() {
        return Describe::default();
    }
    v.sort_by(f64::total_cmp);
    Describe {
        count: v.len(),
        mean: average(&v),
        std: std_dev(&v),
        min: v[0],
        p25: quantile_sorted(&v, 0.25),
        p50: quantile_sorted(&v, 0.50),
        p75: quantile_sorted(&v, 0.75),
        max: v[v.len() - 1],
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus locale-aware thousands separators (`1,234,567.89`).
    if !n.is_finite() {
        return n.to_string();
    }
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg && res.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Counts in console messages, e.g. `9,855 rows loaded`.
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        parse_timestamp_safe(Some(s)).unwrap()
    }

    #[test]
    fn parses_float_encoded_integers() {
        assert_eq!(parse_i64_safe(Some("3.0")), Some(3));
        assert_eq!(parse_i64_safe(Some("-12")), Some(-12));
        assert_eq!(parse_i64_safe(Some("2.5")), None);
        assert_eq!(parse_i64_safe(Some("NaN")), None);
        assert_eq!(parse_i32_safe(Some("2018")), Some(2018));
    }

    #[test]
    fn parses_timestamps_and_bare_dates() {
        assert_eq!(ts("2018-08-20"), ts("2018-08-20 00:00:00"));
        assert_eq!(ts("2017-10-02T10:56:33"), ts("2017-10-02 10:56:33"));
        assert_eq!(parse_timestamp_safe(Some("02/10/2017")), None);
    }

    #[test]
    fn days_between_floors_partial_days() {
        let reference = ts("2018-09-03");
        assert_eq!(days_between(ts("2018-08-20"), reference), 14);
        assert_eq!(days_between(ts("2018-08-20 15:00:00"), reference), 13);
        assert_eq!(days_between(ts("2018-09-03 01:00:00"), reference), -1);
        assert_eq!(days_between(ts("2018-09-03 00:00:00.500"), reference), -1);
        assert_eq!(days_between(ts("2018-09-01 23:59:59.250"), reference), 1);
    }

    #[test]
    fn describe_matches_pandas_conventions() {
        let d = describe(vec![4.0, 1.0, 3.0, 2.0]);
        assert_eq!(d.count, 4);
        assert_eq!(d.mean, 2.5);
        assert!((d.std - 1.290_994_448_7).abs() < 1e-9);
        assert_eq!(d.p25, 1.75);
        assert_eq!(d.p50, 2.5);
        assert_eq!(d.p75, 3.25);
        assert_eq!((d.min, d.max), (1.0, 4.0));
    }

    #[test]
    fn format_number_groups_thousands() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-42.0, 1), "-42.0");
        assert_eq!(format_number(-0.001, 2), "0.00");
        assert_eq!(format_int(9855), "9,855");
    }
}
