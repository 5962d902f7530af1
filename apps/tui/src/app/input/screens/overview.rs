use crate::app::state::{App, Focus, Overlay};
use crossterm::event::KeyCode;
use perf_dashboard_tui::domain::Metric;

use crate::app::input::helpers::{wrap_decrement, wrap_increment};

pub fn handle_overview_input(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Tab => {
            app.focus = match app.focus {
                Focus::Grid => Focus::Charts,
                Focus::Charts => Focus::Grid,
            };
        }
        KeyCode::Enter => app.drill_down(),
        KeyCode::Char('/') => {
            app.search_input = app.sync.current().view.search.clone().unwrap_or_default();
            app.overlay = Overlay::Search;
        }
        _ => match app.focus {
            Focus::Grid => handle_grid_input(app, key),
            Focus::Charts => handle_chart_input(app, key),
        },
    }
}

fn handle_grid_input(app: &mut App, key: KeyCode) {
    let rows = app.view.grid.rows.len();
    match key {
        KeyCode::Up => app.selected_row = wrap_decrement(app.selected_row, rows),
        KeyCode::Down => app.selected_row = wrap_increment(app.selected_row, rows),
        KeyCode::Right | KeyCode::PageDown => app.next_page(),
        KeyCode::Left | KeyCode::PageUp => app.previous_page(),
        KeyCode::Char('s') => app.cycle_sort_column(),
        KeyCode::Char('r') => app.reverse_sort(),
        _ => {}
    }
}

fn handle_chart_input(app: &mut App, key: KeyCode) {
    let bars = app.selected_chart_rows().len();
    match key {
        KeyCode::Up => app.selected_bar = wrap_decrement(app.selected_bar, bars),
        KeyCode::Down => app.selected_bar = wrap_increment(app.selected_bar, bars),
        KeyCode::Left => {
            app.selected_chart = wrap_decrement(app.selected_chart, Metric::ALL.len());
            app.selected_bar = 0;
        }
        KeyCode::Right => {
            app.selected_chart = wrap_increment(app.selected_chart, Metric::ALL.len());
            app.selected_bar = 0;
        }
        _ => {}
    }
}
