// Render seam between the synchronizer and whatever draws the page

use crate::api::{DetailSeries, GridPage, Rankings};
use crate::fetch::FetchFailure;
use crate::query::PageWindow;
use serde::Serialize;

/// Receives synchronized data. For one batch the synchronizer always calls
/// `render_grid` before `render_charts`, or `render_detail` alone.
pub trait ViewRenderer {
    fn render_grid(&mut self, grid: &GridPage, page: PageWindow);

    /// All three charts at once.
    fn render_charts(&mut self, rankings: &Rankings);

    /// `None` is an item without data, shown as such.
    fn render_detail(&mut self, detail: Option<&DetailSeries>);

    fn render_failure(&mut self, failure: &FetchFailure);
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", content = "series", rename_all = "snake_case")]
pub enum DetailView {
    #[default]
    NotLoaded,
    Empty,
    Loaded(DetailSeries),
}

/// What the terminal draws and headless mode prints.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardView {
    pub grid: GridPage,
    pub page: PageWindow,
    pub charts: Rankings,
    pub detail: DetailView,
    /// Set while the views show the failure indicator.
    pub failure: Option<String>,
    /// Bumped on every render call.
    pub revision: u64,
}

pub const NO_DATA: &str = "No data found";

impl DashboardView {
    pub fn grid_info(&self) -> String {
        self.grid.info(self.page.offset)
    }
}

impl ViewRenderer for DashboardView {
    fn render_grid(&mut self, grid: &GridPage, page: PageWindow) {
        self.grid = grid.clone();
        self.page = page;
        self.failure = None;
        self.revision += 1;
    }

    fn render_charts(&mut self, rankings: &Rankings) {
        self.charts = rankings.clone();
        self.revision += 1;
    }

    fn render_detail(&mut self, detail: Option<&DetailSeries>) {
        self.detail = detail.map_or(DetailView::Empty, |series| DetailView::Loaded(series.clone()));
        self.failure = None;
        self.revision += 1;
    }

    fn render_failure(&mut self, failure: &FetchFailure) {
        self.grid = GridPage::default();
        self.charts = Rankings::default();
        if self.detail != DetailView::NotLoaded {
            self.detail = DetailView::Empty;
        }
        self.failure = Some(format!("{NO_DATA} ({failure})"));
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::row;
    use crate::error::FetchError;
    use crate::fetch::RequestId;

    #[test]
    fn failure_clears_grid_and_charts() {
        let mut view = DashboardView::default();
        let grid = GridPage {
            rows: vec![row("a", 1, 1.0)],
            echo: 1,
            total_records: 1,
            filtered_records: 1,
        };
        view.render_grid(&grid, PageWindow::default());
        view.render_charts(&Rankings {
            total: vec![row("a", 1, 1.0)],
            ..Rankings::default()
        });
        assert_eq!(view.grid_info(), "1 to 1 of 1");

        view.render_failure(&FetchFailure {
            request: RequestId::Grid,
            error: FetchError::network("refused"),
        });
        assert!(view.grid.is_empty());
        assert!(view.charts.total.is_empty());
        assert_eq!(view.grid_info(), "0 to 0 of 0");
        assert!(view.failure.as_deref().is_some_and(|m| m.starts_with(NO_DATA)));
        assert_eq!(view.revision, 3);
    }

    #[test]
    fn empty_detail_is_shown_as_empty() {
        let mut view = DashboardView::default();
        view.render_detail(None);
        assert_eq!(view.detail, DetailView::Empty);
        assert_eq!(view.failure, None);
    }
}
