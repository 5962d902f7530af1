use crate::app::App;
use crate::ui::widgets::charts::render_charts;
use crate::ui::widgets::tables::render_grid;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::Frame;

use super::{page_layout, render_filter_bar, render_footer, render_header};

const HINTS: [(&str, &str); 8] = [
    ("Tab", "Grid/Charts"),
    ("Enter", "Open"),
    ("←/→", "Page"),
    ("s/r", "Sort"),
    ("/", "Search"),
    ("f", "Filter"),
    ("d", "Dates"),
    ("?", "Help"),
];

pub fn render_overview(app: &App, f: &mut Frame<'_>) {
    let [header, filters, body, footer] = page_layout(f);

    render_header(app, f, header);
    render_filter_bar(app, f, filters);

    let split = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(body);
    render_grid(app, f, split[0]);
    render_charts(app, f, split[1]);

    render_footer(app, f, footer, &HINTS);
}
