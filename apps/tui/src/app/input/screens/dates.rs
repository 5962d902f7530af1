use crate::app::state::{App, DateField, Overlay};
use crossterm::event::KeyCode;

pub fn handle_dates_input(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Esc => app.overlay = Overlay::None,
        KeyCode::Tab | KeyCode::Up | KeyCode::Down => {
            app.date_field = match app.date_field {
                DateField::Start => DateField::End,
                DateField::End => DateField::Start,
            };
        }
        KeyCode::Enter => app.apply_date_inputs(),
        KeyCode::Backspace => {
            field(app).pop();
        }
        KeyCode::Char(c) if c.is_ascii_digit() || c == '-' => {
            let input = field(app);
            if input.len() < "YYYY-MM-DD".len() {
                input.push(c);
            }
        }
        _ => {}
    }
}

fn field(app: &mut App) -> &mut String {
    match app.date_field {
        DateField::Start => &mut app.date_start_input,
        DateField::End => &mut app.date_end_input,
    }
}
