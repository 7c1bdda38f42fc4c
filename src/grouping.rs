//! Generic "group rows by key, fold each group" primitive.
//!
//! Every report is a [`group_by`] call with a key extractor and an
//! [`Aggregator`] (or a tuple of them). Groups come back in order of first
//! appearance in the input; callers that need a ranking sort explicitly.

use std::collections::HashMap;
use std::hash::Hash;

/// Folds the rows of one group into a single value.
pub trait Aggregator<R> {
    type Output;

    fn update(&mut self, row: &R);

    fn finish(self) -> Self::Output;
}

/// Number of rows in the group.
#[derive(Debug, Clone, Copy, Default)]
pub struct Count {
    n: usize,
}

impl Count {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R> Aggregator<R> for Count {
    type Output = usize;

    fn update(&mut self, _row: &R) {
        self.n += 1;
    }

    fn finish(self) -> usize {
        self.n
    }
}

/// Number of rows matching a predicate.
#[derive(Debug, Clone, Copy)]
pub struct CountWhere<F> {
    pred: F,
    n: usize,
}

impl<F> CountWhere<F> {
    pub fn new(pred: F) -> Self {
        Self { pred, n: 0 }
    }
}

impl<R, F> Aggregator<R> for CountWhere<F>
where
    F: Fn(&R) -> bool,
{
    type Output = usize;

    fn update(&mut self, row: &R) {
        if (self.pred)(row) {
            self.n += 1;
        }
    }

    fn finish(self) -> usize {
        self.n
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Sum<F> {
    field: F,
    total: f64,
}

impl<F> Sum<F> {
    pub fn new(field: F) -> Self {
        Self { field, total: 0.0 }
    }
}

impl<R, F> Aggregator<R> for Sum<F>
where
    F: Fn(&R) -> f64,
{
    type Output = f64;

    fn update(&mut self, row: &R) {
        self.total += (self.field)(row);
    }

    fn finish(self) -> f64 {
        self.total
    }
}

/// Mean over the non-null values of a field; `None` when the group has no
/// values at all.
#[derive(Debug, Clone, Copy)]
pub struct Mean<F> {
    field: F,
    total: f64,
    n: usize,
}

impl<F> Mean<F> {
    pub fn new(field: F) -> Self {
        Self {
            field,
            total: 0.0,
            n: 0,
        }
    }
}

impl<R, F> Aggregator<R> for Mean<F>
where
    F: Fn(&R) -> Option<f64>,
{
    type Output = Option<f64>;

    fn update(&mut self, row: &R) {
        if let Some(v) = (self.field)(row) {
            self.total += v;
            self.n += 1;
        }
    }

    fn finish(self) -> Option<f64> {
        (self.n > 0).then(|| self.total / self.n as f64)
    }
}

/// Largest value of an ordered field.
#[derive(Debug, Clone, Copy)]
pub struct Latest<F, T> {
    field: F,
    max: Option<T>,
}

impl<F, T> Latest<F, T> {
    pub fn new(field: F) -> Self {
        Self { field, max: None }
    }
}

impl<R, F, T> Aggregator<R> for Latest<F, T>
where
    F: Fn(&R) -> T,
    T: Ord,
{
    type Output = Option<T>;

    fn update(&mut self, row: &R) {
        let v = (self.field)(row);
        match &self.max {
            Some(cur) if *cur >= v => {}
            _ => self.max = Some(v),
        }
    }

    fn finish(self) -> Option<T> {
        self.max
    }
}

macro_rules! tuple_aggregator {
    ($($name:ident),+) => {
        impl<R, $($name),+> Aggregator<R> for ($($name,)+)
        where
            $($name: Aggregator<R>,)+
        {
            type Output = ($($name::Output,)+);

            #[allow(non_snake_case)]
            fn update(&mut self, row: &R) {
                let ($($name,)+) = self;
                $($name.update(row);)+
            }

            #[allow(non_snake_case)]
            fn finish(self) -> Self::Output {
                let ($($name,)+) = self;
                ($($name.finish(),)+)
            }
        }
    };
}

tuple_aggregator!(A, B);
tuple_aggregator!(A, B, C);
tuple_aggregator!(A, B, C, D);

/// Group `rows` by `key` and fold each group with a fresh copy of `agg`.
///
/// Rows whose key is `None` are skipped, so null keys never form a group.
/// Only keys present in the input produce output.
pub fn group_by<'a, R, K, A, I, F>(rows: I, key: F, agg: A) -> Vec<(K, A::Output)>
where
    R: 'a,
    I: IntoIterator<Item = &'a R>,
    F: Fn(&R) -> Option<K>,
    K: Eq + Hash + Clone,
    A: Aggregator<R> + Clone,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, A)> = Vec::new();
    for row in rows {
        let Some(k) = key(row) else { continue };
        let slot = *index.entry(k.clone()).or_insert_with(|| {
            groups.push((k, agg.clone()));
            groups.len() - 1
        });
        groups[slot].1.update(row);
    }
    tracing::debug!(groups = groups.len(), "grouped rows");
    groups.into_iter().map(|(k, a)| (k, a.finish())).collect()
}
