// Terminal rendering of the synchronized dashboard view

pub mod screens;
pub mod widgets;

use crate::app::App;
use ratatui::Frame;

pub fn ui(app: &App, f: &mut Frame<'_>) {
    if app.sync.page().is_detail() {
        screens::detail::render_detail(app, f);
    } else {
        screens::overview::render_overview(app, f);
    }
    screens::overlays::render_overlay(app, f);
}
