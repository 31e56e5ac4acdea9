//! # Aggregation Store
//!
//! Authoritative holder of the windowed per-referrer time series.
//!
//! ```text
//! Vec<Observation> ──merge──▶ AggregationStore ──export──▶ Vec<KeySeries>
//!                               │       ▲
//!                          top_n│       │evict(cutoff)
//!                               ▼
//!                        Vec<RankedEntry>
//! ```
//!
//! The store has no notion of time or scheduling; callers pass cutoffs in.
//! Share it across tasks as `Arc<tokio::sync::RwLock<AggregationStore>>` so a
//! whole batch is merged under one write lock.

pub mod aggregation;
pub mod series;
pub mod types;

pub use aggregation::AggregationStore;
pub use series::Series;
pub use types::{KeySeries, MergeSummary, Observation, RankedEntry, Timestamp};
