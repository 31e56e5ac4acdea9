//! Windowed per-key aggregation store
//!
//! Holds one [`Series`] per referrer key plus its running total, and answers
//! ranking and export queries. Only [`AggregationStore::merge`] and
//! [`AggregationStore::evict`] mutate state; everything else is a pure read.
//!
//! Keys are kept in first-seen order. A key whose series is fully evicted is
//! dropped, and if it shows up again later it is first-seen at that point.

use super::series::Series;
use super::types::{KeySeries, MergeSummary, Observation, RankedEntry, Timestamp};
use indexmap::IndexMap;

#[derive(Debug, Default)]
pub struct AggregationStore {
    series: IndexMap<String, Series>,
    provenance: Option<String>,
}

impl AggregationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a batch of observations
    ///
    /// Each valid observation overwrites `series[key][timestamp]`. Malformed
    /// observations (empty key, negative count) are skipped and logged; the
    /// rest of the batch still lands. Provenance becomes the producer of the
    /// last observation in the batch. An empty batch changes nothing.
    pub fn merge(&mut self, batch: &[Observation]) -> MergeSummary {
        let mut summary = MergeSummary::default();

        for observation in batch {
            if observation.key.is_empty() {
                log::warn!(
                    "Skipping sample with empty key (producer={}, ts={})",
                    observation.producer_id,
                    observation.timestamp
                );
                summary.rejected += 1;
                continue;
            }

            let count = match u64::try_from(observation.count) {
                Ok(count) => count,
                Err(_) => {
                    log::warn!(
                        "Skipping sample with negative count: key={} ts={} count={} producer={}",
                        observation.key,
                        observation.timestamp,
                        observation.count,
                        observation.producer_id
                    );
                    summary.rejected += 1;
                    continue;
                }
            };

            // A lone point always fits, so a refused upsert never leaves an empty series
            let series = self.series.entry(observation.key.clone()).or_default();
            if !series.upsert(observation.timestamp, count) {
                log::warn!(
                    "Skipping sample that would overflow the total: key={} ts={} count={} producer={}",
                    observation.key,
                    observation.timestamp,
                    observation.count,
                    observation.producer_id
                );
                summary.rejected += 1;
                continue;
            }
            summary.accepted += 1;
        }

        if let Some(last) = batch.last() {
            self.provenance = Some(last.producer_id.clone());
        }

        summary
    }

    /// Drop every point with a timestamp strictly less than `cutoff`
    ///
    /// Keys left without points are removed entirely. Returns the number of
    /// points removed.
    pub fn evict(&mut self, cutoff: Timestamp) -> usize {
        let mut removed = 0;

        for series in self.series.values_mut() {
            removed += series.evict_before(cutoff);
        }

        if removed > 0 {
            self.series.retain(|_, series| !series.is_empty());
        }

        removed
    }

    /// Remove all data, keeping provenance
    pub fn clear(&mut self) -> usize {
        let removed = self.point_count();
        self.series.clear();
        removed
    }

    /// The `min(n, len)` keys with the largest totals, descending
    ///
    /// Ties go to the key seen first.
    pub fn top_n(&self, n: usize) -> Vec<RankedEntry> {
        if n == 0 {
            return Vec::new();
        }

        let mut ranked: Vec<(&String, u64)> = self
            .series
            .iter()
            .map(|(key, series)| (key, series.total()))
            .collect();

        // Stable sort keeps first-seen order among equal totals
        ranked.sort_by(|(_, a), (_, b)| b.cmp(a));

        ranked
            .into_iter()
            .take(n)
            .map(|(key, total)| RankedEntry {
                key: key.clone(),
                total,
            })
            .collect()
    }

    /// Owned copy of every non-empty series, in first-seen key order
    pub fn export(&self) -> Vec<KeySeries> {
        self.series
            .iter()
            .map(|(key, series)| KeySeries {
                key: key.clone(),
                points: series.points().collect(),
            })
            .collect()
    }

    /// Producer of the most recently merged batch
    pub fn provenance(&self) -> Option<&str> {
        self.provenance.as_deref()
    }

    pub fn total(&self, key: &str) -> Option<u64> {
        self.series.get(key).map(Series::total)
    }

    pub fn series(&self, key: &str) -> Option<&Series> {
        self.series.get(key)
    }

    /// Number of keys with data
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Number of points across all keys
    pub fn point_count(&self) -> usize {
        self.series.values().map(Series::len).sum()
    }

    /// Iterate `(key, total)` in first-seen order
    pub fn totals(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.series
            .iter()
            .map(|(key, series)| (key.as_str(), series.total()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(key: &str, timestamp: Timestamp, count: i64) -> Observation {
        Observation::new(key, timestamp, count, "worker01")
    }

    fn assert_totals_consistent(store: &AggregationStore) {
        for (key, total) in store.totals() {
            let series = store.series(key).unwrap();
            assert!(!series.is_empty(), "empty series kept for {}", key);
            assert_eq!(u128::from(total), series.resum(), "total drift for {}", key);
        }
    }

    #[test]
    fn test_merge_is_idempotent() {
        let batch = vec![obs("A", 1000, 3), obs("B", 1000, 4), obs("A", 2000, 5)];

        let mut once = AggregationStore::new();
        once.merge(&batch);

        let mut twice = AggregationStore::new();
        twice.merge(&batch);
        twice.merge(&batch);

        assert_eq!(once.export(), twice.export());
        assert_eq!(once.total("A"), Some(8));
        assert_eq!(twice.total("A"), Some(8));
        assert_eq!(twice.total("B"), Some(4));
    }

    #[test]
    fn test_merge_overwrites_existing_point() {
        let mut store = AggregationStore::new();
        store.merge(&[obs("A", 1000, 10), obs("A", 2000, 1)]);
        store.merge(&[obs("A", 1000, 3)]);

        assert_eq!(store.series("A").unwrap().get(1000), Some(3));
        assert_eq!(store.total("A"), Some(4));
    }

    #[test]
    fn test_merge_skips_malformed_samples() {
        let mut store = AggregationStore::new();
        let summary = store.merge(&[
            obs("A", 1000, 2),
            obs("B", 1000, -1),
            obs("", 1000, 9),
            obs("C", 1000, 0),
        ]);

        assert_eq!(summary, MergeSummary { accepted: 2, rejected: 2 });
        assert_eq!(store.total("A"), Some(2));
        assert_eq!(store.total("B"), None);
        assert_eq!(store.total("C"), Some(0));
        assert_totals_consistent(&store);
    }

    #[test]
    fn test_merge_rejects_counts_that_overflow_total() {
        let mut store = AggregationStore::new();
        let summary = store.merge(&[
            obs("A", 1, i64::MAX),
            obs("A", 2, i64::MAX),
            obs("A", 3, i64::MAX),
            obs("B", 3, 1),
        ]);

        assert_eq!(summary, MergeSummary { accepted: 3, rejected: 1 });
        assert_eq!(store.total("A"), Some(2 * i64::MAX as u64));
        assert_eq!(store.series("A").map(Series::len), Some(2));
        assert_totals_consistent(&store);

        assert_eq!(store.evict(10), 3);
        assert!(store.is_empty());
        assert_totals_consistent(&store);
    }

    #[test]
    fn test_provenance_follows_last_batch() {
        let mut store = AggregationStore::new();
        assert_eq!(store.provenance(), None);

        store.merge(&[obs("A", 1000, 1)]);
        assert_eq!(store.provenance(), Some("worker01"));

        store.merge(&[
            Observation::new("A", 2000, 1, "worker02"),
            Observation::new("B", 2000, 1, "worker03"),
        ]);
        assert_eq!(store.provenance(), Some("worker03"));

        // Empty batch is a no-op
        store.merge(&[]);
        assert_eq!(store.provenance(), Some("worker03"));
    }

    #[test]
    fn test_evict_boundary_and_key_removal() {
        let mut store = AggregationStore::new();
        store.merge(&[obs("A", 1999, 1), obs("A", 2000, 2), obs("B", 1500, 7)]);

        assert_eq!(store.evict(2000), 2);
        assert_eq!(store.total("A"), Some(2));
        assert_eq!(store.total("B"), None);
        assert!(store.series("B").is_none());
        assert_eq!(store.len(), 1);

        // Idempotent for same or earlier cutoff
        assert_eq!(store.evict(2000), 0);
        assert_eq!(store.evict(1000), 0);
        assert_eq!(store.total("A"), Some(2));
    }

    #[test]
    fn test_total_invariant_over_mixed_operations() {
        let mut store = AggregationStore::new();
        store.merge(&[obs("A", 100, 5), obs("B", 200, 6), obs("A", 300, 7)]);
        assert_totals_consistent(&store);
        store.merge(&[obs("A", 100, 1), obs("C", 400, 2)]);
        assert_totals_consistent(&store);
        store.evict(250);
        assert_totals_consistent(&store);
        store.merge(&[obs("B", 500, 3)]);
        store.evict(450);
        assert_totals_consistent(&store);

        assert_eq!(store.total("A"), None);
        assert_eq!(store.total("B"), Some(3));
        assert_eq!(store.total("C"), None);
    }

    #[test]
    fn test_top_n_ranking_and_tie_break() {
        let mut store = AggregationStore::new();
        store.merge(&[obs("A", 0, 50), obs("B", 0, 30), obs("C", 0, 30), obs("D", 0, 10)]);

        let top2 = store.top_n(2);
        assert_eq!(
            top2,
            vec![
                RankedEntry { key: "A".to_string(), total: 50 },
                RankedEntry { key: "B".to_string(), total: 30 },
            ]
        );

        assert!(store.top_n(0).is_empty());

        let all: Vec<_> = store.top_n(100).into_iter().map(|e| (e.key, e.total)).collect();
        assert_eq!(
            all,
            vec![
                ("A".to_string(), 50),
                ("B".to_string(), 30),
                ("C".to_string(), 30),
                ("D".to_string(), 10),
            ]
        );
    }

    #[test]
    fn test_top_n_reappearing_key_is_seen_again() {
        let mut store = AggregationStore::new();
        store.merge(&[obs("A", 0, 5), obs("B", 10, 5)]);
        store.evict(5);
        store.merge(&[obs("A", 20, 5)]);

        let keys: Vec<_> = store.top_n(2).into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["B".to_string(), "A".to_string()]);
    }

    #[test]
    fn test_export_points_sorted_and_detached() {
        let mut store = AggregationStore::new();
        store.merge(&[obs("A", 3000, 3), obs("A", 1000, 1), obs("A", 2000, 2)]);

        let mut exported = store.export();
        assert_eq!(exported.len(), 1);
        assert_eq!(exported[0].points, vec![(1000, 1), (2000, 2), (3000, 3)]);

        exported[0].points.clear();
        exported[0].key.push_str("-mutated");

        assert_eq!(store.export()[0].key, "A");
        assert_eq!(store.export()[0].points.len(), 3);
        assert_eq!(store.total("A"), Some(6));
    }

    #[test]
    fn test_end_to_end_window_scenario() {
        let mut store = AggregationStore::new();
        store.merge(&[obs("X", 0, 5)]);
        store.merge(&[obs("X", 4000, 5), obs("Y", 4000, 2)]);

        store.evict(2000);

        assert_eq!(store.total("X"), Some(5));
        assert_eq!(store.total("Y"), Some(2));
        assert_eq!(
            store.top_n(1),
            vec![RankedEntry { key: "X".to_string(), total: 5 }]
        );
    }

    #[test]
    fn test_clear_keeps_provenance() {
        let mut store = AggregationStore::new();
        store.merge(&[obs("A", 0, 1), obs("B", 0, 1)]);

        assert_eq!(store.clear(), 2);
        assert!(store.is_empty());
        assert!(store.export().is_empty());
        assert_eq!(store.provenance(), Some("worker01"));
    }
}
