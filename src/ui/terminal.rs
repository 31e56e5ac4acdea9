use {
    super::{
        dashboard::Dashboard,
        layout::{render_layout, ViewContext},
    },
    crate::{config::AppConfig, refresh::RefreshOrchestrator},
    crossterm::event::{Event, KeyCode, KeyEventKind},
    ratatui::{backend::CrosstermBackend, Terminal},
    std::{io::Stdout, time::Duration},
};

/// Redraw at least this often even without input
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Run the TUI event loop
///
/// Handles keyboard input and redraws from the dashboard state the refresh
/// loop writes. Returns when the user quits; the orchestrator is left running
/// for the caller to stop.
pub async fn run_ui(
    dashboard: Dashboard,
    orchestrator: &RefreshOrchestrator,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let backend = CrosstermBackend::new(std::io::stdout());
    let mut terminal = Terminal::new(backend)?;

    crossterm::terminal::enable_raw_mode()?;

    // Alternate screen keeps stderr logs out of the drawing buffer
    crossterm::execute!(
        std::io::stdout(),
        crossterm::terminal::EnterAlternateScreen,
        crossterm::cursor::Hide
    )?;
    terminal.clear()?;

    let result = event_loop(&mut terminal, &dashboard, orchestrator, config).await;

    // Restore the terminal even if the loop failed
    crossterm::execute!(
        std::io::stdout(),
        crossterm::terminal::LeaveAlternateScreen,
        crossterm::cursor::Show
    )?;
    crossterm::terminal::disable_raw_mode()?;

    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    dashboard: &Dashboard,
    orchestrator: &RefreshOrchestrator,
    config: &AppConfig,
) -> anyhow::Result<()> {
    // Tracked locally so drawing never waits on an in-flight cycle
    let mut resource = config.refresh.active_resource.clone();
    let top_n_period_ms = config.refresh.top_n_period().as_millis();

    loop {
        if crossterm::event::poll(POLL_INTERVAL)? {
            if let Event::Key(key) = crossterm::event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => break,
                        KeyCode::Tab => {
                            let next = config.next_resource(&resource).to_string();
                            if next != resource {
                                log::info!("🔀 Switching resource: {} → {}", resource, next);
                                orchestrator.set_active_key_filter(next.clone()).await;
                                resource = next;
                            }
                        }
                        _ => {}
                    }
                }
            }
        }

        let state = dashboard.snapshot().await;
        let view = ViewContext {
            resource: &resource,
            window_seconds: config.refresh.window_seconds,
            top_n_count: config.refresh.top_n_count,
            top_n_period_ms,
            now: chrono::Utc::now().timestamp_millis(),
        };

        let area = terminal.size()?;
        terminal.draw(|f| render_layout(f, area, &state, &view))?;
    }

    Ok(())
}
