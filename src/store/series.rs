//! Per-key ordered time series with an exact running total

use super::types::Timestamp;
use std::collections::BTreeMap;

/// Ordered timestamp → count mapping for a single key
///
/// The total is adjusted on every insert, overwrite and removal so that
/// `total() == points.values().sum()` holds after each call returns. An
/// upsert that would push the total past `u64::MAX` is refused, so removals
/// can always subtract exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Series {
    points: BTreeMap<Timestamp, u64>,
    total: u64,
}

impl Series {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the count at `timestamp`, replacing any previous value
    ///
    /// Returns `false` and leaves the series untouched if the new total would
    /// overflow.
    pub fn upsert(&mut self, timestamp: Timestamp, count: u64) -> bool {
        let previous = self.points.get(&timestamp).copied().unwrap_or(0);
        let Some(total) = (self.total - previous).checked_add(count) else {
            return false;
        };

        self.points.insert(timestamp, count);
        self.total = total;
        true
    }

    /// Remove every point strictly older than `cutoff`, returning how many went
    pub fn evict_before(&mut self, cutoff: Timestamp) -> usize {
        // split_off keeps [cutoff, ..) in the returned map
        let retained = self.points.split_off(&cutoff);
        let evicted = std::mem::replace(&mut self.points, retained);

        for count in evicted.values() {
            self.total -= count;
        }

        evicted.len()
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn get(&self, timestamp: Timestamp) -> Option<u64> {
        self.points.get(&timestamp).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Points in ascending timestamp order
    pub fn points(&self) -> impl Iterator<Item = (Timestamp, u64)> + '_ {
        self.points.iter().map(|(ts, count)| (*ts, *count))
    }

    /// Full resum of the stored counts, independent of the running total
    pub fn resum(&self) -> u128 {
        self.points.values().map(|count| u128::from(*count)).sum()
    }
}
