use crate::app::{App, Focus};
use perf_dashboard_tui::domain::{round_metric, truncate_label, SortColumn, SortDirection, LABEL_WIDTH};
use ratatui::layout::{Alignment, Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};
use ratatui::Frame;

pub const fn scroll_offset(
    total_rows: usize,
    max_visible_rows: usize,
    selected_index: usize,
) -> usize {
    if total_rows <= max_visible_rows {
        return 0;
    }

    if selected_index >= max_visible_rows {
        return selected_index.saturating_sub(max_visible_rows) + 1;
    }

    0
}

pub fn render_grid(app: &App, f: &mut Frame<'_>, area: Rect) {
    let collection = app.sync.collection();
    let focused = app.focus == Focus::Grid;
    let title = format!(" {} ({}) ", collection.label(), app.view.grid_info());
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style(focused));

    let rows = &app.view.grid.rows;
    if rows.is_empty() {
        let message = app
            .view
            .failure
            .clone()
            .unwrap_or_else(|| "No matching records".to_string());
        let paragraph = Paragraph::new(message)
            .block(block)
            .alignment(Alignment::Center);
        f.render_widget(paragraph, area);
        return;
    }

    let sort = app.sync.current().view.sort;
    let header = Row::new(SortColumn::ALL.map(|column| {
        let label = if column == SortColumn::Label {
            collection.label_column()
        } else {
            column.label()
        };
        if column == sort.column {
            let arrow = match sort.direction {
                SortDirection::Asc => "▲",
                SortDirection::Desc => "▼",
            };
            Cell::from(format!("{label} {arrow}"))
        } else {
            Cell::from(label)
        }
    }))
    .style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let max_visible_rows = area.height.saturating_sub(3) as usize;
    let offset = scroll_offset(rows.len(), max_visible_rows, app.selected_row);

    let table_rows = rows
        .iter()
        .enumerate()
        .skip(offset)
        .take(max_visible_rows)
        .map(|(i, row)| {
            let style = if focused && i == app.selected_row {
                Style::default()
                    .bg(Color::Rgb(0, 0, 238))
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(truncate_label(&row.label, LABEL_WIDTH)),
                Cell::from(row.count.to_string()),
                Cell::from(round_metric(row.total).to_string()),
                Cell::from(round_metric(row.avg).to_string()),
                Cell::from(round_metric(row.min).to_string()),
                Cell::from(round_metric(row.max).to_string()),
            ])
            .style(style)
        });

    let widths = [
        Constraint::Min(30),
        Constraint::Length(8),
        Constraint::Length(11),
        Constraint::Length(11),
        Constraint::Length(11),
        Constraint::Length(11),
    ];

    let table = Table::new(table_rows, widths)
        .header(header)
        .block(block)
        .column_spacing(1);

    f.render_widget(table, area);
}

pub fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Cyan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_offset_keeps_the_selection_visible() {
        assert_eq!(scroll_offset(5, 10, 4), 0);
        assert_eq!(scroll_offset(20, 10, 3), 0);
        assert_eq!(scroll_offset(20, 10, 12), 3);
    }
}
