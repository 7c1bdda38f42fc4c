//! Top/bottom-N selection over report tables.
//!
//! Sorting is stable, so rows with equal scores keep their table order.
//! Report tables are sorted by group key before ranking, so exact ties go
//! to the smaller key. Rows whose score is `None` or NaN are never selected.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;

fn select<T, F>(rows: &[T], n: usize, score: F, descending: bool) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> Option<f64>,
{
    let mut scored: Vec<(f64, &T)> = rows
        .iter()
        .filter_map(|r| score(r).filter(|s| !s.is_nan()).map(|s| (s, r)))
        .collect();
    scored.sort_by(|a, b| {
        let ord = a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal);
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
    scored.into_iter().take(n).map(|(_, r)| r.clone()).collect()
}

/// The `n` rows with the largest score, largest first.
pub fn nlargest<T, F>(rows: &[T], n: usize, score: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> Option<f64>,
{
    select(rows, n, score, true)
}

/// The `n` rows with the smallest score, smallest first.
pub fn nsmallest<T, F>(rows: &[T], n: usize, score: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> Option<f64>,
{
    select(rows, n, score, false)
}

/// Apply [`nlargest`] independently within each partition. Partitions are
/// emitted in order of first appearance.
pub fn nlargest_per<T, P, K, S>(rows: &[T], n: usize, partition: P, score: S) -> Vec<T>
where
    T: Clone,
    P: Fn(&T) -> K,
    K: Eq + Hash,
    S: Fn(&T) -> Option<f64> + Copy,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut parts: Vec<Vec<T>> = Vec::new();
    for row in rows {
        let slot = *index.entry(partition(row)).or_insert_with(|| {
            parts.push(Vec::new());
            parts.len() - 1
        });
        parts[slot].push(row.clone());
    }
    parts
        .iter()
        .flat_map(|part| nlargest(part, n, score))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn largest_and_smallest_order_by_score() {
        let v = [3.0, 9.0, 1.0, 7.0, 5.0];
        assert_eq!(nlargest(&v, 2, |x| Some(*x)), vec![9.0, 7.0]);
        assert_eq!(nsmallest(&v, 2, |x| Some(*x)), vec![1.0, 3.0]);
    }

    #[test]
    fn fewer_rows_than_n_returns_all() {
        let v = [2.0, 1.0];
        assert_eq!(nlargest(&v, 5, |x| Some(*x)), vec![2.0, 1.0]);
    }

    #[test]
    fn ties_keep_table_order() {
        let v = [("a", 1.0), ("b", 2.0), ("c", 2.0), ("d", 2.0)];
        let top = nlargest(&v, 2, |r| Some(r.1));
        assert_eq!(top, vec![("b", 2.0), ("c", 2.0)]);
    }

    #[test]
    fn null_and_nan_scores_are_skipped() {
        let v = [Some(1.0), None, Some(f64::NAN), Some(4.0)];
        assert_eq!(nlargest(&v, 5, |x| *x), vec![Some(4.0), Some(1.0)]);
        assert_eq!(nsmallest(&v, 5, |x| *x), vec![Some(1.0), Some(4.0)]);
    }

    #[test]
    fn per_partition_selection() {
        let v = [(2017, 1.0), (2018, 5.0), (2017, 3.0), (2017, 2.0), (2018, 4.0)];
        let out = nlargest_per(&v, 2, |r| r.0, |r| Some(r.1));
        assert_eq!(out, vec![(2017, 3.0), (2017, 2.0), (2018, 5.0), (2018, 4.0)]);
    }
}
