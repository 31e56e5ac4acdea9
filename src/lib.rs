//! # refflow
//!
//! Rolling-window referrer counts per resource, refreshed on a fixed cadence
//! from a fleet of producers and shown as a live chart with a periodic top-N
//! summary.
//!
//! - `store` - time-bucketed series per key, eviction, ranking
//! - `refresh` - data sources, sinks and the refresh orchestrator
//! - `ui` - terminal dashboard
//! - `config` - application configuration

pub mod config;
pub mod refresh;
pub mod store;
pub mod ui;

pub use config::{AppConfig, SourceKind};
pub use refresh::{DataSource, RefreshConfig, RefreshOrchestrator, Sinks};
pub use store::{AggregationStore, KeySeries, Observation, RankedEntry};
