use crate::app::state::App;
use crossterm::event::KeyCode;
use perf_dashboard_tui::view::DetailView;

use crate::app::input::helpers::{wrap_decrement, wrap_increment};

pub fn handle_detail_input(app: &mut App, key: KeyCode) {
    let points = match &app.view.detail {
        DetailView::Loaded(series) => series.points.len(),
        DetailView::NotLoaded | DetailView::Empty => 0,
    };

    match key {
        KeyCode::Left | KeyCode::Up => {
            app.selected_point = wrap_decrement(app.selected_point, points);
        }
        KeyCode::Right | KeyCode::Down => {
            app.selected_point = wrap_increment(app.selected_point, points);
        }
        KeyCode::Enter => app.drill_down(),
        _ => {}
    }
}
