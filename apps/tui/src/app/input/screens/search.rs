use crate::app::state::{App, Overlay};
use crossterm::event::KeyCode;

pub fn handle_search_input(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Esc => app.overlay = Overlay::None,
        KeyCode::Enter => app.apply_search(),
        KeyCode::Backspace => {
            app.search_input.pop();
        }
        KeyCode::Char(c) => app.search_input.push(c),
        _ => {}
    }
}
