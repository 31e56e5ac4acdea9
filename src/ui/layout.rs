use {
    super::{
        dashboard::DashboardState,
        renderer::{chart_points, format_count, format_period_ms, format_provenance, y_axis_bounds},
    },
    crate::store::Timestamp,
    ratatui::{
        layout::{Constraint, Direction, Layout as RatLayout, Rect},
        style::{Color, Modifier, Style},
        symbols,
        text::{Line, Span},
        widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Row, Table},
        Frame,
    },
};

const PALETTE: [Color; 8] = [
    Color::Cyan,
    Color::Yellow,
    Color::Green,
    Color::Magenta,
    Color::Red,
    Color::Blue,
    Color::LightCyan,
    Color::LightYellow,
];

/// Values the layout needs besides the dashboard state
pub struct ViewContext<'a> {
    pub resource: &'a str,
    pub window_seconds: u64,
    pub top_n_count: usize,
    pub top_n_period_ms: u128,
    pub now: Timestamp,
}

/// Render the main UI layout
pub fn render_layout(f: &mut Frame, area: Rect, state: &DashboardState, view: &ViewContext) {
    let chunks = RatLayout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(10),   // Chart + top N
            Constraint::Length(3), // Footer/Status
        ])
        .split(area);

    let body = RatLayout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(40), Constraint::Length(44)])
        .split(chunks[1]);

    render_header(f, chunks[0], view);
    render_chart(f, body[0], state, view);
    render_top_n(f, body[1], state, view);
    render_footer(f, chunks[2], state, view);
}

fn render_header(f: &mut Frame, area: Rect, view: &ViewContext) {
    let text = vec![
        Line::from(vec![
            Span::styled(
                "refflow",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(
                " - requests to {} by referrer, last {} seconds",
                view.resource, view.window_seconds
            )),
        ]),
        Line::from(vec![Span::raw("Press 'q' or Esc to quit, Tab to switch resource")]),
    ];

    let header = Block::default().borders(Borders::ALL).title("Referrer Counts");
    f.render_widget(Paragraph::new(text).block(header), area);
}

fn render_chart(f: &mut Frame, area: Rect, state: &DashboardState, view: &ViewContext) {
    // Point buffers must outlive the datasets that borrow them
    let points: Vec<Vec<(f64, f64)>> = state
        .series
        .iter()
        .map(|series| chart_points(series, view.now))
        .collect();

    let datasets: Vec<Dataset> = state
        .series
        .iter()
        .zip(points.iter())
        .enumerate()
        .map(|(i, (series, data))| {
            Dataset::default()
                .name(series.key.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(PALETTE[i % PALETTE.len()]))
                .data(data)
        })
        .collect();

    let window = view.window_seconds as f64;
    let [y_min, y_max] = y_axis_bounds(&state.series);

    let x_axis = Axis::default()
        .title("seconds")
        .style(Style::default().fg(Color::Gray))
        .bounds([-window, 0.0])
        .labels(vec![
            Span::raw(format!("-{}s", view.window_seconds)),
            Span::raw(format!("-{}s", view.window_seconds / 2)),
            Span::raw("now"),
        ]);

    let y_axis = Axis::default()
        .title("count")
        .style(Style::default().fg(Color::Gray))
        .bounds([y_min, y_max])
        .labels(vec![
            Span::raw(format!("{}", y_min as u64)),
            Span::raw(format!("{}", (y_max / 2.0) as u64)),
            Span::raw(format!("{}", y_max as u64)),
        ]);

    let title = if state.series.is_empty() {
        "Requests per referrer (waiting for data)".to_string()
    } else {
        format!("Requests per referrer ({} referrers)", state.series.len())
    };

    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title(title))
        .x_axis(x_axis)
        .y_axis(y_axis);

    f.render_widget(chart, area);
}

fn render_top_n(f: &mut Frame, area: Rect, state: &DashboardState, view: &ViewContext) {
    let header = Row::new(vec!["#", "Referrer", "Count"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = state
        .ranking
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            Row::new(vec![
                format!("{}", i + 1),
                entry.key.clone(),
                format_count(entry.total),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(3),  // Rank
        Constraint::Min(24),    // Referrer
        Constraint::Length(10), // Count
    ];

    let title = format!(
        "Top {} referrers (every {})",
        view.top_n_count,
        format_period_ms(view.top_n_period_ms)
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title));

    f.render_widget(table, area);
}

fn render_footer(f: &mut Frame, area: Rect, state: &DashboardState, view: &ViewContext) {
    let provenance = format_provenance(state.provenance.as_deref());

    let text = vec![Line::from(vec![
        Span::styled("Resource: ", Style::default().fg(Color::Cyan)),
        Span::raw(view.resource.to_string()),
        Span::raw(" | "),
        Span::styled("Points: ", Style::default().fg(Color::Cyan)),
        Span::raw(state.point_count().to_string()),
        Span::raw(" | "),
        Span::styled("Cycles: ", Style::default().fg(Color::Cyan)),
        Span::raw(state.render_count.to_string()),
        Span::raw(" | "),
        Span::styled(provenance, Style::default().fg(Color::Green)),
    ])];

    let footer = Block::default().borders(Borders::ALL).title("Status");
    f.render_widget(Paragraph::new(text).block(footer), area);
}
