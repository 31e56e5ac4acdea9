// Renderer module - formatting utilities
// Drawing lives in layout.rs; the math and text it needs lives here so it
// can be tested without a terminal.

use crate::store::{KeySeries, Timestamp};

/// Format a referrer total for display
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// "Data last updated by: host", or an empty string before any update
pub fn format_provenance(provenance: Option<&str>) -> String {
    match provenance {
        Some(host) if !host.is_empty() => format!("Data last updated by: {}", host),
        _ => String::new(),
    }
}

/// Chart points for one series: x = seconds relative to `now` (≤ 0), y = count
pub fn chart_points(series: &KeySeries, now: Timestamp) -> Vec<(f64, f64)> {
    series
        .points
        .iter()
        .map(|(ts, count)| ((*ts - now) as f64 / 1000.0, *count as f64))
        .collect()
}

/// Y-axis bounds covering every point
///
/// The lower bound is pinned at 0 and the upper bound is the largest count
/// rounded up to a multiple of 10, with a floor of 10 so an empty or flat
/// chart still has a visible range.
pub fn y_axis_bounds(series: &[KeySeries]) -> [f64; 2] {
    let max = series.iter().map(KeySeries::max_count).max().unwrap_or(0);
    let ceiling = max.div_ceil(10).max(1) * 10;
    [0.0, ceiling as f64]
}

/// Human-readable cadence, e.g. "2000ms" or "2s"
pub fn format_period_ms(ms: u128) -> String {
    if ms >= 1000 && ms % 1000 == 0 {
        format!("{}s", ms / 1000)
    } else {
        format!("{}ms", ms)
    }
}
