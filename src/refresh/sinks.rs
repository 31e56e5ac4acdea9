//! Output seams of the refresh loop
//!
//! Three consumers receive data from each cycle:
//! - [`Renderer`] gets the exported series every completed cycle
//! - [`RankedSummarySink`] gets the top-N ranking every `top_n_every` cycles
//! - [`DisplaySink`] gets the current provenance every completed cycle

use crate::store::{KeySeries, RankedEntry};
use async_trait::async_trait;

#[async_trait]
pub trait Renderer: Send {
    /// Replace the drawn series with `series`; may be empty
    async fn render(&mut self, series: Vec<KeySeries>);
}

#[async_trait]
pub trait RankedSummarySink: Send {
    async fn publish_ranking(&mut self, ranking: Vec<RankedEntry>);
}

#[async_trait]
pub trait DisplaySink: Send {
    /// `None` until some producer has updated the store
    async fn show_provenance(&mut self, provenance: Option<String>);
}

/// The three sinks a cycle fans out to
pub struct Sinks {
    pub renderer: Box<dyn Renderer>,
    pub ranked: Box<dyn RankedSummarySink>,
    pub display: Box<dyn DisplaySink>,
}

impl Sinks {
    pub fn new(
        renderer: Box<dyn Renderer>,
        ranked: Box<dyn RankedSummarySink>,
        display: Box<dyn DisplaySink>,
    ) -> Self {
        Self {
            renderer,
            ranked,
            display,
        }
    }

    /// Use clones of one value for all three roles
    pub fn shared<T>(sink: T) -> Self
    where
        T: Renderer + RankedSummarySink + DisplaySink + Clone + 'static,
    {
        Self::new(
            Box::new(sink.clone()),
            Box::new(sink.clone()),
            Box::new(sink),
        )
    }
}

/// Headless sink that writes every update to the log
#[derive(Debug, Clone, Default)]
pub struct LogSink {
    last_provenance: Option<String>,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Renderer for LogSink {
    async fn render(&mut self, series: Vec<KeySeries>) {
        let points: usize = series.iter().map(|s| s.points.len()).sum();
        log::debug!("📈 Render: {} series, {} points", series.len(), points);
    }
}

#[async_trait]
impl RankedSummarySink for LogSink {
    async fn publish_ranking(&mut self, ranking: Vec<RankedEntry>) {
        if ranking.is_empty() {
            log::info!("🏆 Top referrers: (no data)");
            return;
        }

        let rows: Vec<String> = ranking
            .iter()
            .enumerate()
            .map(|(i, entry)| format!("{}. {} ({})", i + 1, entry.key, entry.total))
            .collect();
        log::info!("🏆 Top referrers: {}", rows.join(" | "));
    }
}

#[async_trait]
impl DisplaySink for LogSink {
    async fn show_provenance(&mut self, provenance: Option<String>) {
        if provenance != self.last_provenance {
            if let Some(ref host) = provenance {
                log::info!("🔄 Data last updated by: {}", host);
            }
            self.last_provenance = provenance;
        }
    }
}
