//! Grouping and summing of records.
//!
//! A [`Tally`] is an accumulator for one kind of record: it knows how to add a
//! single record's contribution to itself. [`Grouped`] keeps one tally per
//! dimension key, creating it on the first contribution, and [`Counts`] is the
//! general-purpose tally for integer metrics such as downloads per source.
//!
//! All accumulation is summation, so the result never depends on the order in
//! which records arrive.

use std::{cmp::Ordering, collections::BTreeMap};

/// An accumulator for records of type `R`.
pub trait Tally<R>: Default {
    fn add(&mut self, record: &R);

    /// Tallies every record in `records` into a fresh accumulator.
    fn of<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a R>,
        R: 'a,
    {
        let mut tally = Self::default();
        for record in records {
            tally.add(record);
        }
        tally
    }
}

/// Integer counts keyed by metric name.
///
/// Metrics that have never been counted read as zero, and the synthetic
/// [`Counts::total`] is always the sum of every named metric.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Counts<M> {
    metrics: BTreeMap<M, u64>,
}

impl<M> Default for Counts<M> {
    fn default() -> Self {
        Self {
            metrics: BTreeMap::new(),
        }
    }
}

impl<M: Ord> Counts<M> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_count(&mut self, metric: M, count: u64) {
        *self.metrics.entry(metric).or_default() += count;
    }

    /// Returns the count for `metric`, or zero if nothing was counted for it.
    #[must_use]
    pub fn get(&self, metric: &M) -> u64 {
        self.metrics.get(metric).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.metrics.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&M, u64)> {
        self.metrics.iter().map(|(metric, count)| (metric, *count))
    }
}

/// One tally per dimension key.
#[derive(Clone, Debug)]
pub struct Grouped<K, T> {
    groups: BTreeMap<K, T>,
}

impl<K, T> Default for Grouped<K, T> {
    fn default() -> Self {
        Self {
            groups: BTreeMap::new(),
        }
    }
}

impl<K: Ord, T> Grouped<K, T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Groups `records` by the dimension that `key` extracts from each one.
    ///
    /// `key` must map missing or unrecognised values to a sentinel rather than
    /// skip the record, so that every record is counted somewhere.
    pub fn by<'a, R, I, F>(records: I, key: F) -> Self
    where
        R: 'a,
        I: IntoIterator<Item = &'a R>,
        F: Fn(&R) -> K,
        T: Tally<R>,
    {
        let mut grouped = Self::new();
        for record in records {
            grouped.add(key(record), record);
        }
        grouped
    }

    /// Adds `record` to the tally for `key`, creating it if necessary.
    pub fn add<R>(&mut self, key: K, record: &R)
    where
        T: Tally<R>,
    {
        self.groups.entry(key).or_default().add(record);
    }

    /// Returns the tally for `key`, or an empty one if nothing was added.
    #[must_use]
    pub fn get(&self, key: &K) -> T
    where
        T: Clone + Default,
    {
        self.groups.get(key).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Iterates over the groups in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &T)> {
        self.groups.iter()
    }

    /// Returns the groups sorted by `metric`, largest first.
    ///
    /// Groups with equal metrics are listed in ascending key order.
    pub fn ranked_by<V, F>(&self, metric: F) -> Vec<(&K, &T)>
    where
        V: PartialOrd,
        F: Fn(&T) -> V,
    {
        let mut ranked: Vec<_> = self.groups.iter().collect();
        ranked.sort_by(|(_, a), (_, b)| {
            metric(b)
                .partial_cmp(&metric(a))
                .unwrap_or(Ordering::Equal)
        });
        ranked
    }

    /// Returns at most `limit` groups, ranked as for [`Self::ranked_by`].
    pub fn top_by<V, F>(&self, limit: usize, metric: F) -> Vec<(&K, &T)>
    where
        V: PartialOrd,
        F: Fn(&T) -> V,
    {
        let mut ranked = self.ranked_by(metric);
        ranked.truncate(limit);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Hit {
        page: &'static str,
        referrer: &'static str,
        count: u64,
    }

    impl Tally<Hit> for Counts<&'static str> {
        fn add(&mut self, record: &Hit) {
            self.add_count(record.referrer, record.count);
        }
    }

    fn hits() -> Vec<Hit> {
        vec![
            Hit { page: "home", referrer: "search", count: 3 },
            Hit { page: "docs", referrer: "direct", count: 5 },
            Hit { page: "home", referrer: "direct", count: 1 },
            Hit { page: "blog", referrer: "social", count: 0 },
            Hit { page: "home", referrer: "search", count: 2 },
        ]
    }

    #[test]
    fn counts_total_is_sum_of_named_metrics() {
        let counts = Counts::of(&hits());
        assert_eq!(counts.get(&"search"), 5);
        assert_eq!(counts.get(&"direct"), 6);
        assert_eq!(counts.get(&"social"), 0);
        assert_eq!(counts.total(), counts.iter().map(|(_, n)| n).sum::<u64>());
        assert_eq!(counts.total(), 11);
    }

    #[test]
    fn counts_get_fn_reads_absent_metric_as_zero() {
        let counts: Counts<&str> = Counts::new();
        assert_eq!(counts.get(&"never"), 0);
        assert_eq!(counts.total(), 0);
    }

    #[test]
    fn grouped_by_fn_is_independent_of_record_order() {
        let mut reversed = hits();
        reversed.reverse();
        let forward: Grouped<_, Counts<_>> = Grouped::by(&hits(), |h: &Hit| h.page);
        let backward: Grouped<_, Counts<_>> = Grouped::by(&reversed, |h: &Hit| h.page);
        for page in ["home", "docs", "blog"] {
            assert_eq!(forward.get(&page), backward.get(&page));
        }
        assert_eq!(forward.get(&"home").total(), 6);
        assert_eq!(forward.get(&"missing"), Counts::new());
    }

    #[test]
    fn grouped_can_be_regrouped_by_another_dimension() {
        let records = hits();
        let by_page: Grouped<_, Counts<_>> = Grouped::by(&records, |h: &Hit| h.page);
        let by_referrer: Grouped<_, Counts<_>> = Grouped::by(&records, |h: &Hit| h.referrer);
        fn total(grouped: &Grouped<&str, Counts<&str>>) -> u64 {
            grouped.iter().map(|(_, counts)| counts.total()).sum()
        }
        assert_eq!(by_page.len(), 3);
        assert_eq!(by_referrer.len(), 3);
        assert_eq!(total(&by_page), total(&by_referrer));
    }

    #[test]
    fn ranked_by_fn_breaks_ties_by_key() {
        let records = vec![
            Hit { page: "b", referrer: "x", count: 4 },
            Hit { page: "c", referrer: "x", count: 9 },
            Hit { page: "a", referrer: "x", count: 4 },
        ];
        let grouped: Grouped<_, Counts<_>> = Grouped::by(&records, |h: &Hit| h.page);
        let order: Vec<_> = grouped
            .ranked_by(Counts::total)
            .into_iter()
            .map(|(k, _)| *k)
            .collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }

    #[test]
    fn top_by_fn_keeps_the_highest_totals_in_descending_order() {
        let names: Vec<String> = (0..25).map(|i| format!("key{i:02}")).collect();
        let records: Vec<(String, u64)> = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), 100 - i as u64))
            .collect();
        let mut grouped: Grouped<String, Counts<&str>> = Grouped::new();
        for (name, count) in &records {
            grouped.add(name.clone(), &Hit { page: "", referrer: "x", count: *count });
        }
        let top = grouped.top_by(20, Counts::total);
        assert_eq!(top.len(), 20);
        let keys: Vec<_> = top.iter().map(|(k, _)| k.as_str()).collect();
        let expected: Vec<_> = names[..20].iter().map(String::as_str).collect();
        assert_eq!(keys, expected);
        assert!(top.windows(2).all(|w| w[0].1.total() > w[1].1.total()));
    }
}
