use crate::app::{App, DateField, Overlay};
use crate::ui::widgets::popup::{centered_fixed, centered_rect};
use perf_dashboard_tui::picker::PickerStage;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

pub fn render_overlay(app: &App, f: &mut Frame<'_>) {
    match app.overlay {
        Overlay::None => {}
        Overlay::FilterPicker => render_picker(app, f),
        Overlay::DateRange => render_dates(app, f),
        Overlay::Search => render_search(app, f),
        Overlay::Help => render_help(f),
    }
}

fn popup_block(title: &str) -> Block<'_> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
}

fn selected_style() -> Style {
    Style::default()
        .bg(Color::Rgb(0, 0, 238))
        .fg(Color::White)
        .add_modifier(Modifier::BOLD)
}

fn render_picker(app: &App, f: &mut Frame<'_>) {
    let area = centered_rect(50, 60, f.area());
    f.render_widget(Clear, area);

    let picker = &app.picker;
    let title = match (picker.stage(), picker.selected_key()) {
        (PickerStage::Values, Some(key)) => format!(" Value for {key} "),
        _ => " Filter key ".to_string(),
    };
    let block = popup_block(&title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let query = Paragraph::new(TextLine::from(vec![
        Span::styled("> ", Style::default().fg(Color::Yellow)),
        Span::raw(picker.query()),
    ]));
    f.render_widget(query, Rect { height: 1, ..inner });

    let list_area = Rect {
        y: inner.y + 2,
        height: inner.height.saturating_sub(2),
        ..inner
    };

    if let Some(error) = picker.error() {
        let message = Paragraph::new(error).style(Style::default().fg(Color::Red));
        f.render_widget(message, list_area);
        return;
    }
    if picker.is_loading() {
        f.render_widget(Paragraph::new("Loading..."), list_area);
        return;
    }

    let entries = match picker.stage() {
        PickerStage::Keys => picker.visible_keys(),
        PickerStage::Values => picker.choices(),
    };
    if entries.is_empty() {
        f.render_widget(
            Paragraph::new("No metadata keys").style(Style::default().fg(Color::Gray)),
            list_area,
        );
        return;
    }

    let items: Vec<ListItem<'_>> = entries.into_iter().map(ListItem::new).collect();
    let list = List::new(items).highlight_style(selected_style());
    let mut state = ListState::default().with_selected(Some(picker.cursor()));
    f.render_stateful_widget(list, list_area, &mut state);
}

fn render_dates(app: &App, f: &mut Frame<'_>) {
    let area = centered_fixed(40, 7, f.area());
    f.render_widget(Clear, area);

    let field = |label: &'static str, value: &str, active: bool| {
        let style = if active {
            selected_style()
        } else {
            Style::default()
        };
        TextLine::from(vec![
            Span::styled(
                label,
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("{value:<10}"), style),
        ])
    };

    let lines = vec![
        field(
            "Start: ",
            &app.date_start_input,
            app.date_field == DateField::Start,
        ),
        field("End:   ", &app.date_end_input, app.date_field == DateField::End),
        TextLine::from(""),
        TextLine::from(Span::styled(
            "YYYY-MM-DD, blank for open. Tab switches, Enter applies",
            Style::default().fg(Color::Gray),
        )),
    ];

    f.render_widget(
        Paragraph::new(lines).block(popup_block(" Date range ")),
        area,
    );
}

fn render_search(app: &App, f: &mut Frame<'_>) {
    let area = centered_fixed(50, 3, f.area());
    f.render_widget(Clear, area);
    let line = TextLine::from(vec![
        Span::styled("/ ", Style::default().fg(Color::Yellow)),
        Span::raw(app.search_input.as_str()),
    ]);
    f.render_widget(
        Paragraph::new(line).block(popup_block(" Search grid ")),
        area,
    );
}

const HELP: [(&str, &str); 17] = [
    ("1-3", "Switch collection"),
    ("Tab", "Toggle grid and charts"),
    ("↑/↓", "Move selection"),
    ("←/→", "Grid page, chart or event"),
    ("Enter", "Drill down"),
    ("s", "Next sort column"),
    ("r", "Reverse sort"),
    ("/", "Search the grid"),
    ("f", "Add a filter"),
    ("[ ]", "Select a filter"),
    ("x", "Remove the selected filter"),
    ("c", "Clear all filters"),
    ("d", "Date range"),
    ("Esc", "Back"),
    ("?/F1", "Toggle help"),
    ("q", "Quit"),
    ("Ctrl+C", "Quit"),
];

#[allow(clippy::cast_possible_truncation)]
fn render_help(f: &mut Frame<'_>) {
    let area = centered_fixed(50, HELP.len() as u16 + 2, f.area());
    f.render_widget(Clear, area);

    let lines: Vec<TextLine<'_>> = HELP
        .iter()
        .map(|(key, action)| {
            TextLine::from(vec![
                Span::styled(
                    format!("{key:<8}"),
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(*action),
            ])
        })
        .collect();

    f.render_widget(Paragraph::new(lines).block(popup_block(" Keys ")), area);
}
