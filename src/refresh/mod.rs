//! # Refresh Orchestrator
//!
//! Sequences the store's operations on a fixed cadence and fans the results
//! out to the sinks.
//!
//! ```text
//! DataSource::request ──▶ AggregationStore::merge ──▶ evict(now - window)
//!                                                        │
//!                       every top_n_every cycles: top_n ─┼──▶ RankedSummarySink
//!                                                export ─┼──▶ Renderer
//!                                            provenance ─┴──▶ DisplaySink
//! ```
//!
//! ## Module Organization
//!
//! - `config` - `RefreshConfig` from environment variables
//! - `source` - `DataSource` trait and report types
//! - `http_source` - count endpoint client
//! - `simulated` - in-process producer fleet
//! - `sinks` - output traits and the headless `LogSink`
//! - `cycle` - a single fetch/merge/evict/export cycle
//! - `orchestrator` - lifecycle and timer

pub mod config;
pub mod cycle;
pub mod http_source;
pub mod orchestrator;
pub mod simulated;
pub mod sinks;
pub mod source;

pub use config::{ConfigError, RefreshConfig};
pub use cycle::{CycleOutcome, CycleRunner, CycleStatus};
pub use http_source::HttpCountsSource;
pub use orchestrator::{OrchestratorError, Phase, RefreshOrchestrator};
pub use simulated::SimulatedSource;
pub use sinks::{DisplaySink, LogSink, RankedSummarySink, Renderer, Sinks};
pub use source::{DataSource, DataSourceError, Report, ReportSample};
