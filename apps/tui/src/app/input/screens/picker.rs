use crate::app::state::{App, Overlay};
use crossterm::event::KeyCode;
use perf_dashboard_tui::picker::PickerStage;

pub fn handle_picker_input(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Esc => match app.picker.stage() {
            PickerStage::Keys => app.overlay = Overlay::None,
            PickerStage::Values => app.picker.back(),
        },
        KeyCode::Up => app.picker.move_up(),
        KeyCode::Down | KeyCode::Tab => app.picker.move_down(),
        KeyCode::Enter => match app.picker.stage() {
            PickerStage::Keys => app.picker_select_key(),
            PickerStage::Values => app.picker_choose(),
        },
        KeyCode::Backspace => app.picker.pop_char(),
        KeyCode::Char(c) => app.picker.push_char(c),
        _ => {}
    }
}
