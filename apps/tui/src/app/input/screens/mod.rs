use crate::app::state::{App, DateField, Overlay};
use crossterm::event::KeyCode;
use perf_dashboard_tui::domain::Collection;
use perf_dashboard_tui::sync::SyncEvent;

use crate::app::input::helpers::{wrap_decrement, wrap_increment};

mod dates;
mod detail;
mod help;
mod overview;
mod picker;
mod search;

pub fn dispatch_input(app: &mut App, key: KeyCode) {
    if help::handle_help_toggle(app, key) {
        return;
    }

    match app.overlay {
        Overlay::FilterPicker => picker::handle_picker_input(app, key),
        Overlay::DateRange => dates::handle_dates_input(app, key),
        Overlay::Search => search::handle_search_input(app, key),
        Overlay::Help => {}
        Overlay::None => {
            if handle_page_input(app, key) {
                return;
            }
            if app.sync.page().is_detail() {
                detail::handle_detail_input(app, key);
            } else {
                overview::handle_overview_input(app, key);
            }
        }
    }
}

/// Keys shared by every page: filters, dates, collections and history.
fn handle_page_input(app: &mut App, key: KeyCode) -> bool {
    let filter_count = app.sync.current().filters.count();

    match key {
        KeyCode::Char('q') => app.running = false,
        KeyCode::Char('f') => app.open_picker(),
        KeyCode::Char('d') => {
            app.date_field = DateField::Start;
            app.overlay = Overlay::DateRange;
        }
        KeyCode::Char('[') => {
            app.selected_filter = wrap_decrement(app.selected_filter, filter_count);
        }
        KeyCode::Char(']') => {
            app.selected_filter = wrap_increment(app.selected_filter, filter_count);
        }
        KeyCode::Char('x') | KeyCode::Delete => app.remove_selected_filter(),
        KeyCode::Char('c') => app.handle_event(&SyncEvent::FiltersCleared),
        KeyCode::Char(digit @ '1'..='3') => {
            let index = digit.to_digit(10).map_or(0, |d| d as usize - 1);
            if let Some(collection) = Collection::from_index(index) {
                app.switch_collection(collection);
            }
        }
        KeyCode::Esc | KeyCode::Backspace => app.back(),
        _ => return false,
    }
    true
}
