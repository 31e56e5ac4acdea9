//! Core data types shared by the store, the refresh loop and the sinks

/// Epoch milliseconds
pub type Timestamp = i64;

/// One element of a merge batch
///
/// `count` is signed so that negative values coming off the wire reach the
/// store, which rejects them per element instead of failing the whole batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub key: String,
    pub timestamp: Timestamp,
    pub count: i64,
    pub producer_id: String,
}

impl Observation {
    pub fn new(
        key: impl Into<String>,
        timestamp: Timestamp,
        count: i64,
        producer_id: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            timestamp,
            count,
            producer_id: producer_id.into(),
        }
    }
}

/// Exported view of one key's series, points ascending by timestamp
///
/// This is an owned copy; mutating it has no effect on the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySeries {
    pub key: String,
    pub points: Vec<(Timestamp, u64)>,
}

impl KeySeries {
    /// Largest count in this series, 0 when empty
    pub fn max_count(&self) -> u64 {
        self.points.iter().map(|(_, count)| *count).max().unwrap_or(0)
    }
}

/// One row of a top-N ranking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    pub key: String,
    pub total: u64,
}

/// Result of a merge call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Samples written into a series
    pub accepted: usize,
    /// Samples skipped (empty key, negative count, or a count that would
    /// overflow the key's total)
    pub rejected: usize,
}
