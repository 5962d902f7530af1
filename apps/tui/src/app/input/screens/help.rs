use crate::app::state::{App, Overlay};
use crossterm::event::KeyCode;

pub fn handle_help_toggle(app: &mut App, key: KeyCode) -> bool {
    let typing = matches!(
        app.overlay,
        Overlay::FilterPicker | Overlay::DateRange | Overlay::Search
    );

    if key == KeyCode::F(1) || (key == KeyCode::Char('?') && !typing) {
        app.overlay = if app.overlay == Overlay::Help {
            Overlay::None
        } else {
            Overlay::Help
        };
        return true;
    }

    if app.overlay == Overlay::Help {
        if matches!(key, KeyCode::Esc | KeyCode::Char('q')) {
            app.overlay = Overlay::None;
        }
        return true;
    }

    false
}
