use crate::app::{App, Focus};
use perf_dashboard_tui::api::{AggregateRow, DetailSeries};
use perf_dashboard_tui::domain::{round_metric, truncate_label, Metric};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line as TextLine, Span};
use ratatui::widgets::{
    Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Paragraph,
};
use ratatui::Frame;

use super::tables::border_style;

/// Bar labels are cut harder than grid labels to leave room for the bars.
const BAR_LABEL_WIDTH: usize = 24;

const fn metric_color(metric: Metric) -> Color {
    match metric {
        Metric::Total => Color::Cyan,
        Metric::Avg => Color::Green,
        Metric::Count => Color::Magenta,
    }
}

/// The three ranking charts side by side.
pub fn render_charts(app: &App, f: &mut Frame<'_>, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    for (index, metric) in Metric::ALL.into_iter().enumerate() {
        let focused = app.focus == Focus::Charts && app.selected_metric() == metric;
        let selected = focused.then_some(app.selected_bar);
        render_ranking(
            app.view.charts.for_metric(metric),
            metric,
            selected,
            f,
            columns[index],
        );
    }
}

fn render_ranking(
    rows: &[AggregateRow],
    metric: Metric,
    selected: Option<usize>,
    f: &mut Frame<'_>,
    area: Rect,
) {
    let block = Block::default()
        .title(format!(" {} ", metric.label()))
        .borders(Borders::ALL)
        .border_style(border_style(selected.is_some()));

    if rows.is_empty() {
        let paragraph = Paragraph::new("No data")
            .block(block)
            .alignment(Alignment::Center);
        f.render_widget(paragraph, area);
        return;
    }

    // Bar lengths are integers, so fractional seconds are scaled up.
    let scale = if metric == Metric::Count { 1.0 } else { 10_000.0 };
    let bars: Vec<Bar<'_>> = rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let value = row.metric(metric);
            let style = if selected == Some(index) {
                Style::default()
                    .fg(Color::Rgb(0, 0, 238))
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(metric_color(metric))
            };
            Bar::default()
                .value(scaled(value, scale))
                .text_value(round_metric(value).to_string())
                .label(TextLine::from(truncate_label(&row.label, BAR_LABEL_WIDTH)))
                .style(style)
                .value_style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD))
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .direction(Direction::Horizontal)
        .data(BarGroup::default().bars(&bars))
        .bar_width(1)
        .bar_gap(0);

    f.render_widget(chart, area);
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn scaled(value: f64, scale: f64) -> u64 {
    (value.max(0.0) * scale).round() as u64
}

/// Per-event durations over time on the detail page.
pub fn render_scatter(series: &DetailSeries, selected: usize, f: &mut Frame<'_>, area: Rect) {
    let block = Block::default()
        .title(" Event Durations ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let Some((time, duration)) = series.bounds() else {
        let paragraph = Paragraph::new("No events recorded")
            .block(block)
            .alignment(Alignment::Center);
        f.render_widget(paragraph, area);
        return;
    };

    let points: Vec<(f64, f64)> = series
        .points
        .iter()
        .map(|point| (point.timestamp, point.duration))
        .collect();
    let highlighted: Vec<(f64, f64)> = points.get(selected).copied().into_iter().collect();

    let datasets = vec![
        Dataset::default()
            .name("Events")
            .marker(Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Cyan))
            .data(&points),
        Dataset::default()
            .name("Selected")
            .marker(Marker::Block)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Yellow))
            .data(&highlighted),
    ];

    let x_bounds = padded(time);
    let y_bounds = [0.0, padded(duration)[1]];

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .title("Time")
                .style(Style::default().fg(Color::Gray))
                .bounds(x_bounds)
                .labels(vec![
                    Span::raw(time_label(x_bounds[0])),
                    Span::raw(time_label(x_bounds[1])),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("Seconds")
                .style(Style::default().fg(Color::Gray))
                .bounds(y_bounds)
                .labels(vec![
                    Span::raw("0"),
                    Span::raw(round_metric(y_bounds[1]).to_string()),
                ]),
        );

    f.render_widget(chart, area);
}

/// Widens a degenerate range so a single point still has an axis.
fn padded(bounds: [f64; 2]) -> [f64; 2] {
    if (bounds[1] - bounds[0]).abs() < f64::EPSILON {
        [bounds[0] - 1.0, bounds[1] + 1.0]
    } else {
        bounds
    }
}

#[allow(clippy::cast_possible_truncation)]
fn time_label(timestamp: f64) -> String {
    chrono::DateTime::from_timestamp(timestamp as i64, 0)
        .map(|dt| dt.format("%m-%d %H:%M").to_string())
        .unwrap_or_default()
}
