//! Refresh orchestrator - drives the cycle runner on a fixed cadence
//!
//! ## Lifecycle
//!
//! ```text
//! Idle ──start()──▶ Starting ──initial load──▶ Running ⇄ cycle
//!   ▲                                             │
//!   └───────── start() ◀── Stopped ◀──stop()──────┘
//! ```
//!
//! The loop runs one cycle, then waits `interval_ms` before the next, so a
//! slow fetch delays the schedule instead of overlapping it. `stop()` cancels
//! the pending delay; a cycle already in flight is allowed to finish, after
//! which the loop exits without rescheduling.

use super::config::RefreshConfig;
use super::cycle::{switch_filter, CycleRunner};
use super::sinks::Sinks;
use super::source::DataSource;
use crate::store::AggregationStore;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Starting,
    Running,
    Stopped,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("refresh loop is already {0:?}")]
    AlreadyRunning(Phase),
}

pub struct RefreshOrchestrator {
    runner: Arc<Mutex<CycleRunner>>,
    store: Arc<RwLock<AggregationStore>>,
    filter: Arc<watch::Sender<String>>,
    interval: Duration,
    phase: Phase,
    /// Cancelled by `stop()`; doubles as the loop's `running` flag
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl RefreshOrchestrator {
    /// Orchestrator over a fresh store
    pub fn new(source: Box<dyn DataSource>, sinks: Sinks, config: RefreshConfig) -> Self {
        let store = Arc::new(RwLock::new(AggregationStore::new()));
        Self::from_runner(CycleRunner::new(store, source, sinks, config))
    }

    pub fn from_runner(runner: CycleRunner) -> Self {
        let store = runner.store();
        let filter = runner.filter();
        let interval = runner.config().interval();

        Self {
            runner: Arc::new(Mutex::new(runner)),
            store,
            filter,
            interval,
            phase: Phase::Idle,
            cancel: CancellationToken::new(),
            task: None,
        }
    }

    /// Load initial data, then start the periodic cycle
    ///
    /// A failed initial load is logged and the loop starts anyway.
    pub async fn start(&mut self) -> Result<(), OrchestratorError> {
        if matches!(self.phase, Phase::Starting | Phase::Running) {
            return Err(OrchestratorError::AlreadyRunning(self.phase));
        }

        self.phase = Phase::Starting;

        {
            let mut runner = self.runner.lock().await;
            log::info!(
                "🚀 Starting refresh loop (resource: {}, interval: {}ms)",
                runner.active_resource(),
                self.interval.as_millis()
            );
            match runner.prime().await {
                Ok(merge) => log::info!("📥 Initial load: {} samples", merge.accepted),
                Err(e) => log::warn!("⚠️  Initial load failed, starting anyway: {}", e),
            }
        }

        self.cancel = CancellationToken::new();
        self.task = Some(tokio::spawn(refresh_loop(
            self.runner.clone(),
            self.cancel.clone(),
            self.interval,
        )));
        self.phase = Phase::Running;

        Ok(())
    }

    /// Stop rescheduling cycles
    ///
    /// Does not abort an in-flight fetch; use [`RefreshOrchestrator::join`]
    /// to wait for the loop to exit.
    pub fn stop(&mut self) {
        if self.phase != Phase::Running {
            return;
        }
        log::info!("⏹️  Stopping refresh loop");
        self.cancel.cancel();
        self.phase = Phase::Stopped;
    }

    /// Wait for the background loop to exit after `stop()`
    pub async fn join(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::error!("❌ Refresh loop task failed: {}", e);
            }
        }
    }

    /// Swap the queried resource and drop all current data
    ///
    /// Does not wait for an in-flight cycle: the switch is published at once
    /// and a fetch still running for the old resource has its batch dropped.
    /// The next cycle queries the new resource.
    pub async fn set_active_key_filter(&self, resource: impl Into<String>) {
        switch_filter(&self.filter, &self.store, resource.into()).await;
    }

    pub fn active_key_filter(&self) -> String {
        self.filter.borrow().clone()
    }

    /// Number of the next cycle to run
    pub async fn cycle_count(&self) -> u64 {
        self.runner.lock().await.cycle_count()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running && !self.cancel.is_cancelled()
    }

    /// Shared read handle on the store
    pub fn store(&self) -> Arc<RwLock<AggregationStore>> {
        self.store.clone()
    }
}

impl Drop for RefreshOrchestrator {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn refresh_loop(
    runner: Arc<Mutex<CycleRunner>>,
    cancel: CancellationToken,
    interval: Duration,
) {
    loop {
        {
            let mut runner = runner.lock().await;
            runner.run_cycle().await;
        }

        if cancel.is_cancelled() {
            break;
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    log::info!("Refresh loop stopped");
}
