use {
    crate::{
        refresh::{DisplaySink, RankedSummarySink, Renderer},
        store::{KeySeries, RankedEntry, Timestamp},
    },
    async_trait::async_trait,
    std::sync::Arc,
    tokio::sync::RwLock,
};

/// Everything the dashboard draws, as last delivered by the refresh loop
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    /// Latest exported series (replaced wholesale on every render)
    pub series: Vec<KeySeries>,
    /// Latest ranked summary
    pub ranking: Vec<RankedEntry>,
    /// Producer that last updated the store
    pub provenance: Option<String>,
    /// Renders received so far
    pub render_count: u64,
    /// Wall-clock time of the last render
    pub last_render_ms: Option<Timestamp>,
    /// Wall-clock time of the last ranked summary
    pub ranking_updated_ms: Option<Timestamp>,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn point_count(&self) -> usize {
        self.series.iter().map(|s| s.points.len()).sum()
    }
}

/// Shared dashboard view; clones write to the same state
///
/// Implements all three refresh sinks, so the orchestrator can be wired with
/// `Sinks::shared(dashboard.clone())` while the UI loop reads the state.
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    state: Arc<RwLock<DashboardState>>,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Arc<RwLock<DashboardState>> {
        self.state.clone()
    }

    /// Copy of the current view state
    pub async fn snapshot(&self) -> DashboardState {
        self.state.read().await.clone()
    }
}

fn now_ms() -> Timestamp {
    chrono::Utc::now().timestamp_millis()
}

#[async_trait]
impl Renderer for Dashboard {
    async fn render(&mut self, series: Vec<KeySeries>) {
        let mut state = self.state.write().await;
        state.series = series;
        state.render_count += 1;
        state.last_render_ms = Some(now_ms());
    }
}

#[async_trait]
impl RankedSummarySink for Dashboard {
    async fn publish_ranking(&mut self, ranking: Vec<RankedEntry>) {
        let mut state = self.state.write().await;
        state.ranking = ranking;
        state.ranking_updated_ms = Some(now_ms());
    }
}

#[async_trait]
impl DisplaySink for Dashboard {
    async fn show_provenance(&mut self, provenance: Option<String>) {
        self.state.write().await.provenance = provenance;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clones_share_state() {
        let dashboard = Dashboard::new();
        let mut renderer = dashboard.clone();
        let mut ranked = dashboard.clone();
        let mut display = dashboard.clone();

        renderer
            .render(vec![KeySeries {
                key: "a".to_string(),
                points: vec![(1000, 2), (2000, 3)],
            }])
            .await;
        ranked
            .publish_ranking(vec![RankedEntry {
                key: "a".to_string(),
                total: 5,
            }])
            .await;
        display.show_provenance(Some("worker01".to_string())).await;

        let snapshot = dashboard.snapshot().await;
        assert_eq!(snapshot.render_count, 1);
        assert_eq!(snapshot.point_count(), 2);
        assert_eq!(snapshot.ranking[0].total, 5);
        assert_eq!(snapshot.provenance.as_deref(), Some("worker01"));
        assert!(snapshot.last_render_ms.is_some());
        assert!(snapshot.ranking_updated_ms.is_some());
    }

    #[tokio::test]
    async fn test_render_replaces_series() {
        let mut dashboard = Dashboard::new();
        dashboard
            .render(vec![KeySeries {
                key: "a".to_string(),
                points: vec![(1, 1)],
            }])
            .await;
        dashboard.render(Vec::new()).await;

        let snapshot = dashboard.snapshot().await;
        assert!(snapshot.series.is_empty());
        assert_eq!(snapshot.render_count, 2);
    }
}
