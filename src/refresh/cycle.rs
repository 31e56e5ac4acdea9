//! One refresh cycle: fetch → merge → evict → rank → export → provenance
//!
//! [`CycleRunner`] owns everything a cycle touches except the store, which it
//! shares behind an `RwLock` so readers (the dashboard, tests) always see a
//! fully merged batch. The runner itself is driven by
//! [`super::orchestrator::RefreshOrchestrator`] but can be stepped directly.
//!
//! The active resource lives in a `watch` channel rather than in the runner,
//! so it can be switched while a fetch is in flight. A batch fetched for a
//! resource that was switched away from before the merge is discarded.

use super::config::RefreshConfig;
use super::sinks::Sinks;
use super::source::{into_batch, DataSource, DataSourceError};
use crate::store::{AggregationStore, MergeSummary, Timestamp};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

/// Wall clock in epoch milliseconds
pub type Clock = Box<dyn Fn() -> Timestamp + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleStatus {
    Completed {
        merge: MergeSummary,
        evicted: usize,
        /// Whether the ranked summary was recomputed this cycle
        ranked: bool,
    },
    /// Fetch failed; the store was left untouched and no sink was called
    FetchFailed(String),
    /// The active resource changed during the fetch; the batch was dropped
    /// and no sink was called
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleOutcome {
    pub cycle: u64,
    pub status: CycleStatus,
}

pub struct CycleRunner {
    store: Arc<RwLock<AggregationStore>>,
    source: Box<dyn DataSource>,
    sinks: Sinks,
    config: RefreshConfig,
    filter: Arc<watch::Sender<String>>,
    filter_rx: watch::Receiver<String>,
    cycle_count: u64,
    now_fn: Clock,
}

impl CycleRunner {
    pub fn new(
        store: Arc<RwLock<AggregationStore>>,
        source: Box<dyn DataSource>,
        sinks: Sinks,
        config: RefreshConfig,
    ) -> Self {
        Self::new_with_clock(
            store,
            source,
            sinks,
            config,
            Box::new(|| chrono::Utc::now().timestamp_millis()),
        )
    }

    /// Create a runner with a custom clock (deterministic tests)
    pub fn new_with_clock(
        store: Arc<RwLock<AggregationStore>>,
        source: Box<dyn DataSource>,
        sinks: Sinks,
        config: RefreshConfig,
        now_fn: Clock,
    ) -> Self {
        let (filter, filter_rx) = watch::channel(config.active_resource.clone());
        Self {
            store,
            source,
            sinks,
            config,
            filter: Arc::new(filter),
            filter_rx,
            cycle_count: 1,
            now_fn,
        }
    }

    /// Initial load before the first rendered cycle
    ///
    /// Fetches, merges and evicts without touching the sinks or the cycle
    /// counter, so the first rendered cycle already has data.
    pub async fn prime(&mut self) -> Result<MergeSummary, DataSourceError> {
        let merged = self.fetch_merge_evict().await?;
        Ok(merged.map(|(merge, _)| merge).unwrap_or_default())
    }

    /// Run one full cycle and advance the cycle counter
    ///
    /// A failed fetch is logged and skips every remaining step; it never
    /// propagates.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let cycle = self.cycle_count;

        let status = match self.fetch_merge_evict().await {
            Ok(None) => {
                log::debug!("Cycle {}: active resource changed mid-fetch, batch dropped", cycle);
                CycleStatus::Superseded
            }
            Ok(Some((merge, evicted))) => {
                let ranked = cycle % self.config.top_n_every == 0;

                let (ranking, series, provenance) = {
                    let store = self.store.read().await;
                    let ranking = ranked.then(|| store.top_n(self.config.top_n_count));
                    (ranking, store.export(), store.provenance().map(str::to_string))
                };

                if let Some(ranking) = ranking {
                    self.sinks.ranked.publish_ranking(ranking).await;
                }
                self.sinks.renderer.render(series).await;
                self.sinks.display.show_provenance(provenance).await;

                log::debug!(
                    "Cycle {}: merged {} (rejected {}), evicted {}{}",
                    cycle,
                    merge.accepted,
                    merge.rejected,
                    evicted,
                    if ranked { ", ranked" } else { "" }
                );

                CycleStatus::Completed {
                    merge,
                    evicted,
                    ranked,
                }
            }
            Err(e) => {
                log::warn!(
                    "⚠️  Cycle {}: fetch from {} source failed, skipping: {}",
                    cycle,
                    self.source.source_type(),
                    e
                );
                CycleStatus::FetchFailed(e.to_string())
            }
        };

        self.cycle_count += 1;

        CycleOutcome { cycle, status }
    }

    /// Switch the queried resource and drop all current data
    ///
    /// The new resource is used from the next fetch on. Returns the number of
    /// points dropped.
    pub async fn set_active_resource(&self, resource: impl Into<String>) -> usize {
        switch_filter(&self.filter, &self.store, resource.into()).await
    }

    pub fn active_resource(&self) -> String {
        self.filter.borrow().clone()
    }

    /// Handle for switching the resource without going through the runner
    pub fn filter(&self) -> Arc<watch::Sender<String>> {
        self.filter.clone()
    }

    /// Number of the next cycle to run (starts at 1)
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    pub fn config(&self) -> &RefreshConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<RwLock<AggregationStore>> {
        self.store.clone()
    }

    /// `Ok(None)` when the resource was switched while fetching
    async fn fetch_merge_evict(
        &mut self,
    ) -> Result<Option<(MergeSummary, usize)>, DataSourceError> {
        let resource = self.filter_rx.borrow_and_update().clone();
        let reports = self
            .source
            .request(&resource, self.config.fetch_range_seconds)
            .await?;

        let batch = into_batch(&reports);
        let cutoff = (self.now_fn)() - self.config.window_ms();

        // One write lock for merge + evict: readers never see a partial batch.
        // The filter check happens under the same lock that `switch_filter`
        // needs to clear, so a stale batch can never land after the clear.
        let mut store = self.store.write().await;
        if self.filter_rx.has_changed().unwrap_or(false) {
            return Ok(None);
        }
        let merge = store.merge(&batch);
        let evicted = store.evict(cutoff);

        Ok(Some((merge, evicted)))
    }
}

/// Point `filter` at `resource` and clear the store
///
/// Publishes the new resource before taking the store lock, so a cycle that
/// merges after the clear sees the change and drops its batch.
pub async fn switch_filter(
    filter: &watch::Sender<String>,
    store: &RwLock<AggregationStore>,
    resource: String,
) -> usize {
    filter.send_replace(resource.clone());
    let dropped = store.write().await.clear();
    log::info!(
        "🎯 Active resource set to {} (dropped {} points)",
        resource,
        dropped
    );
    dropped
}
