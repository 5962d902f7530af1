use crate::app::App;
use crate::ui::widgets::charts::render_scatter;
use perf_dashboard_tui::domain::{round_metric, truncate_label, LABEL_WIDTH};
use perf_dashboard_tui::view::DetailView;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use super::{page_layout, render_filter_bar, render_footer, render_header};

const HINTS: [(&str, &str); 5] = [
    ("←/→", "Event"),
    ("Enter", "Event table"),
    ("f", "Filter"),
    ("d", "Dates"),
    ("?", "Help"),
];

pub fn render_detail(app: &App, f: &mut Frame<'_>) {
    let [header, filters, body, footer] = page_layout(f);

    render_header(app, f, header);
    render_filter_bar(app, f, filters);

    match &app.view.detail {
        DetailView::Loaded(series) => {
            let split = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(7), Constraint::Min(8)])
                .split(body);
            render_stats(app, f, split[0]);
            render_scatter(series, app.selected_point, f, split[1]);
        }
        DetailView::Empty | DetailView::NotLoaded => {
            let message = app.view.failure.clone().unwrap_or_else(|| {
                if app.view.detail == DetailView::Empty {
                    "No data for this item".to_string()
                } else {
                    "Loading...".to_string()
                }
            });
            let paragraph = Paragraph::new(message)
                .block(block(" Detail "))
                .alignment(Alignment::Center);
            f.render_widget(paragraph, body);
        }
    }

    render_footer(app, f, footer, &HINTS);
}

fn render_stats(app: &App, f: &mut Frame<'_>, area: Rect) {
    let DetailView::Loaded(series) = &app.view.detail else {
        return;
    };
    let stats = series.stats;
    let label_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let mut lines = vec![
        TextLine::from(Span::styled(
            truncate_label(&series.label, LABEL_WIDTH),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        TextLine::from(vec![
            Span::styled("Count: ", label_style),
            Span::raw(format!("{}   ", stats.count)),
            Span::styled("Total: ", label_style),
            Span::raw(format!("{}   ", round_metric(stats.total))),
            Span::styled("Avg: ", label_style),
            Span::raw(format!("{}   ", round_metric(stats.avg))),
            Span::styled("Min: ", label_style),
            Span::raw(format!("{}   ", round_metric(stats.min))),
            Span::styled("Max: ", label_style),
            Span::raw(round_metric(stats.max).to_string()),
        ]),
    ];

    if let Some(point) = app.selected_scatter_point() {
        lines.push(TextLine::from(vec![
            Span::styled("Event: ", label_style),
            Span::raw(format!(
                "{} ({}s)",
                point.event_id,
                round_metric(point.duration)
            )),
        ]));
    }

    let paragraph = Paragraph::new(lines)
        .block(block(" Statistics "))
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn block(title: &str) -> Block<'_> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
}
