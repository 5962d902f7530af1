pub mod detail;
pub mod overlays;
pub mod overview;

use crate::app::App;
use perf_dashboard_tui::domain::Collection;
use perf_dashboard_tui::sync::SyncPhase;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Tabs};
use ratatui::Frame;
use throbber_widgets_tui::Throbber;

/// Header, body and footer areas shared by both pages.
pub fn page_layout(f: &Frame<'_>) -> [Rect; 4] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(3),
        ])
        .split(f.area());
    [chunks[0], chunks[1], chunks[2], chunks[3]]
}

/// Collection tabs plus the fetch indicator.
pub fn render_header(app: &App, f: &mut Frame<'_>, area: Rect) {
    let split = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(40), Constraint::Length(24)])
        .split(area);

    let titles = Collection::ALL
        .iter()
        .enumerate()
        .map(|(i, collection)| TextLine::from(format!("{} {}", i + 1, collection.label())))
        .collect::<Vec<_>>();
    let selected = Collection::ALL
        .iter()
        .position(|c| *c == app.sync.collection())
        .unwrap_or(0);

    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .title(" Profiling Dashboard ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .select(selected)
        .style(Style::default().fg(Color::Gray))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .divider(Span::raw("|"));
    f.render_widget(tabs, split[0]);

    let status_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let status = match app.sync.phase() {
        SyncPhase::Fetching => Throbber::default()
            .label("Loading")
            .style(Style::default().fg(Color::Yellow))
            .to_line(&app.throbber),
        SyncPhase::Error => TextLine::from(Span::styled(
            "Fetch failed",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        SyncPhase::Idle | SyncPhase::Rendered => TextLine::from(Span::styled(
            "Up to date",
            Style::default().fg(Color::Green),
        )),
    };
    f.render_widget(Paragraph::new(status).block(status_block), split[1]);
}

/// Active filters, the selected one highlighted, then dates and search.
pub fn render_filter_bar(app: &App, f: &mut Frame<'_>, area: Rect) {
    let current = app.sync.current();
    let mut spans = Vec::new();

    if current.filters.is_empty() {
        spans.push(Span::styled("No filters", Style::default().fg(Color::Gray)));
    }
    for (i, filter) in current.filters.iter().enumerate() {
        let style = if i == app.selected_filter {
            Style::default()
                .bg(Color::Rgb(0, 0, 238))
                .fg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled(format!(" {filter} "), style));
        spans.push(Span::raw(" "));
    }

    let range = current.view.date_range;
    if !range.is_unbounded() {
        spans.push(Span::styled(
            format!(
                "  dates {} .. {}",
                or_open(&app.date_start_input),
                or_open(&app.date_end_input)
            ),
            Style::default().fg(Color::Cyan),
        ));
    }
    if let Some(search) = &current.view.search {
        spans.push(Span::styled(
            format!("  search \"{search}\""),
            Style::default().fg(Color::Cyan),
        ));
    }

    let block = Block::default()
        .title(" Filters ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    f.render_widget(Paragraph::new(TextLine::from(spans)).block(block), area);
}

fn or_open(input: &str) -> &str {
    if input.is_empty() {
        "*"
    } else {
        input
    }
}

/// Status message, or the key hints when there is none.
pub fn render_footer(app: &App, f: &mut Frame<'_>, area: Rect, hints: &[(&str, &str)]) {
    let line = if app.status_message.is_empty() {
        let mut spans = Vec::new();
        for (key, action) in hints {
            spans.push(Span::styled(
                *key,
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::raw(format!(" {action}  ")));
        }
        if app.can_go_back() {
            spans.push(Span::styled(
                "Esc",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::raw(" Back"));
        }
        TextLine::from(spans)
    } else {
        TextLine::from(Span::styled(
            app.status_message.as_str(),
            Style::default().fg(Color::White),
        ))
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    f.render_widget(Paragraph::new(line).block(block), area);
}
