//! Terminal dashboard
//!
//! `Dashboard` is the sink side: the refresh loop writes series, rankings and
//! provenance into it. `run_ui` is the reader side that draws them with
//! ratatui and forwards resource switches back to the orchestrator.

pub mod dashboard;
pub mod layout;
pub mod renderer;
pub mod terminal;

pub use dashboard::{Dashboard, DashboardState};
pub use terminal::run_ui;
