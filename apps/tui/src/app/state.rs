use perf_dashboard_tui::api::{AggregateRow, SeriesPoint, StatsBackend};
use perf_dashboard_tui::config::DashboardConfig;
use perf_dashboard_tui::domain::{Collection, Metric, SortColumn};
use perf_dashboard_tui::fetch::BatchOutcome;
use perf_dashboard_tui::navigate::Route;
use perf_dashboard_tui::picker::{load_keys, load_values, FilterPicker, PickerUpdate};
use perf_dashboard_tui::query::{DateRange, Sort};
use perf_dashboard_tui::sync::{Resolution, SyncEvent, ViewSynchronizer};
use perf_dashboard_tui::view::{DashboardView, DetailView};
use std::sync::Arc;
use std::time::{Duration, Instant};
use throbber_widgets_tui::ThrobberState;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

const THROBBER_TICK: Duration = Duration::from_millis(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    None,
    FilterPicker,
    DateRange,
    Search,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Grid,
    Charts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Start,
    End,
}

pub struct App {
    pub running: bool,
    backend: Arc<dyn StatsBackend>,
    pub config: DashboardConfig,
    pub sync: ViewSynchronizer,
    outcomes: UnboundedReceiver<BatchOutcome>,
    pub view: DashboardView,
    history: Vec<String>,
    pub picker: FilterPicker,
    picker_tx: UnboundedSender<PickerUpdate>,
    picker_rx: UnboundedReceiver<PickerUpdate>,
    pub overlay: Overlay,
    pub focus: Focus,
    pub selected_row: usize,
    pub selected_chart: usize,
    pub selected_bar: usize,
    pub selected_filter: usize,
    pub selected_point: usize,
    pub date_field: DateField,
    pub date_start_input: String,
    pub date_end_input: String,
    pub search_input: String,
    pub status_message: String,
    pub throbber: ThrobberState,
    last_frame: Instant,
}

impl App {
    /// Builds the app on `route` and issues its first batch.
    pub fn new(backend: Arc<dyn StatsBackend>, config: DashboardConfig, route: &Route) -> Self {
        let (sync, outcomes) = ViewSynchronizer::new(Arc::clone(&backend), route, &config);
        let (picker_tx, picker_rx) = unbounded_channel();

        let mut app = Self {
            running: true,
            backend,
            config,
            sync,
            outcomes,
            view: DashboardView::default(),
            history: Vec::new(),
            picker: FilterPicker::new(route.page.collection()),
            picker_tx,
            picker_rx,
            overlay: Overlay::None,
            focus: Focus::Grid,
            selected_row: 0,
            selected_chart: 0,
            selected_bar: 0,
            selected_filter: 0,
            selected_point: 0,
            date_field: DateField::Start,
            date_start_input: String::new(),
            date_end_input: String::new(),
            search_input: String::new(),
            status_message: String::new(),
            throbber: ThrobberState::default(),
            last_frame: Instant::now(),
        };
        app.sync.load();
        app.sync_inputs();
        app
    }

    pub fn update(&mut self) {
        let now = Instant::now();
        if now.duration_since(self.last_frame) >= THROBBER_TICK {
            self.throbber.calc_next();
            self.last_frame = now;
        }
        self.drain_outcomes();
        self.drain_picker();
    }

    /// Resolves every batch outcome that has arrived since the last frame.
    pub fn drain_outcomes(&mut self) -> usize {
        let mut rendered = 0;
        while let Ok(outcome) = self.outcomes.try_recv() {
            match self.sync.resolve(outcome, &mut self.view) {
                Resolution::Applied | Resolution::Interim => {
                    rendered += 1;
                    self.clamp_selections();
                }
                Resolution::Failed => {
                    rendered += 1;
                    self.status_message = self.view.failure.clone().unwrap_or_default();
                    self.clamp_selections();
                }
                Resolution::Stale => {}
            }
        }
        rendered
    }

    /// Waits for the page to settle, for headless mode.
    pub async fn settle(&mut self) {
        while self.sync.is_fetching() {
            match self.outcomes.recv().await {
                Some(outcome) => {
                    self.sync.resolve(outcome, &mut self.view);
                }
                None => break,
            }
        }
    }

    pub fn handle_event(&mut self, event: &SyncEvent) {
        if self.sync.handle(event) {
            self.status_message.clear();
            self.selected_filter = self
                .selected_filter
                .min(self.sync.current().filters.count().saturating_sub(1));
        }
    }

    /// Full navigation: the current page is torn down and a new one is
    /// hydrated from `url`.
    pub fn navigate(&mut self, url: &str) {
        let current = self.sync.current_url();
        if self.open(url) {
            self.history.push(current);
        }
    }

    pub fn back(&mut self) {
        match self.history.pop() {
            Some(url) => {
                self.open(&url);
            }
            None => self.status_message = "Already on the first page".to_string(),
        }
    }

    pub fn can_go_back(&self) -> bool {
        !self.history.is_empty()
    }

    fn open(&mut self, url: &str) -> bool {
        let route = match Route::parse(url) {
            Ok(route) => route,
            Err(err) => {
                self.status_message = err.to_string();
                return false;
            }
        };

        info!(url = %route.to_url(), "navigating");
        let (sync, outcomes) = ViewSynchronizer::new(Arc::clone(&self.backend), &route, &self.config);
        self.sync = sync;
        self.outcomes = outcomes;
        self.view = DashboardView::default();
        self.overlay = Overlay::None;
        self.focus = Focus::Grid;
        self.selected_row = 0;
        self.selected_bar = 0;
        self.selected_filter = 0;
        self.selected_point = 0;
        self.status_message.clear();
        self.sync.load();
        self.sync_inputs();
        true
    }

    fn sync_inputs(&mut self) {
        let view = &self.sync.current().view;
        self.search_input = view.search.clone().unwrap_or_default();
        self.date_start_input = format_date(view.date_range.start);
        self.date_end_input = format_date(view.date_range.end);
    }

    fn clamp_selections(&mut self) {
        self.selected_row = self
            .selected_row
            .min(self.view.grid.rows.len().saturating_sub(1));
        self.selected_bar = self
            .selected_bar
            .min(self.selected_chart_rows().len().saturating_sub(1));
        if let DetailView::Loaded(series) = &self.view.detail {
            self.selected_point = self.selected_point.min(series.points.len().saturating_sub(1));
        }
    }

    pub fn selected_metric(&self) -> Metric {
        Metric::ALL[self.selected_chart % Metric::ALL.len()]
    }

    pub fn selected_chart_rows(&self) -> &[AggregateRow] {
        self.view.charts.for_metric(self.selected_metric())
    }

    pub fn selected_grid_row(&self) -> Option<&AggregateRow> {
        self.view.grid.rows.get(self.selected_row)
    }

    pub fn selected_scatter_point(&self) -> Option<&SeriesPoint> {
        match &self.view.detail {
            DetailView::Loaded(series) => series.points.get(self.selected_point),
            DetailView::NotLoaded | DetailView::Empty => None,
        }
    }

    /// Follows the selected grid row, bar or scatter point.
    pub fn drill_down(&mut self) {
        let navigator = *self.sync.navigator();
        let current = self.sync.current();

        if self.sync.page().is_detail() {
            if let Some(point) = self.selected_scatter_point() {
                // Raw event tables are a browser-only page.
                self.status_message = format!(
                    "Event table: {}{}",
                    self.config.base_url.trim_end_matches('/'),
                    navigator.scatter_point_target(point)
                );
            }
            return;
        }

        let target = match self.focus {
            Focus::Grid => self
                .selected_grid_row()
                .map(|row| navigator.grid_row_target(row, current)),
            Focus::Charts => self
                .selected_chart_rows()
                .get(self.selected_bar)
                .map(|row| navigator.aggregate_row_target(row, current)),
        };
        if let Some(target) = target {
            self.navigate(&target);
        }
    }

    pub fn switch_collection(&mut self, collection: Collection) {
        if !self.sync.page().is_detail() && self.sync.collection() == collection {
            return;
        }
        let target = self
            .sync
            .navigator()
            .collection_target(collection, self.sync.current());
        self.navigate(&target);
    }

    pub fn next_page(&mut self) {
        let page = self.sync.current().view.page;
        match page.next(self.view.grid.filtered_records) {
            Some(next) => self.handle_event(&SyncEvent::GridPageChanged(next)),
            None => self.status_message = "Last page".to_string(),
        }
    }

    pub fn previous_page(&mut self) {
        let page = self.sync.current().view.page;
        if let Some(previous) = page.previous() {
            self.handle_event(&SyncEvent::GridPageChanged(previous));
        }
    }

    pub fn cycle_sort_column(&mut self) {
        let sort = self.sync.current().view.sort;
        let next = SortColumn::from_index((sort.column.position() + 1) % SortColumn::ALL.len())
            .unwrap_or(SortColumn::Total);
        self.handle_event(&SyncEvent::GridSortChanged(Sort {
            column: next,
            direction: sort.direction,
        }));
    }

    pub fn reverse_sort(&mut self) {
        let sort = self.sync.current().view.sort;
        self.handle_event(&SyncEvent::GridSortChanged(Sort {
            column: sort.column,
            direction: sort.direction.toggled(),
        }));
    }

    pub fn remove_selected_filter(&mut self) {
        if self.sync.current().filters.is_empty() {
            return;
        }
        self.handle_event(&SyncEvent::FilterRemoved(self.selected_filter));
    }

    pub fn apply_date_inputs(&mut self) {
        match DateRange::from_date_inputs(&self.date_start_input, &self.date_end_input) {
            Ok(range) => {
                self.overlay = Overlay::None;
                self.handle_event(&SyncEvent::DateRangeChanged(range));
            }
            Err(err) => self.status_message = err.to_string(),
        }
    }

    pub fn apply_search(&mut self) {
        self.overlay = Overlay::None;
        let text = self.search_input.clone();
        self.handle_event(&SyncEvent::GridSearchChanged(text));
    }

    pub fn open_picker(&mut self) {
        self.picker = FilterPicker::new(self.sync.collection());
        self.overlay = Overlay::FilterPicker;
        let backend = Arc::clone(&self.backend);
        let collection = self.sync.collection();
        let tx = self.picker_tx.clone();
        tokio::spawn(async move {
            if tx.send(load_keys(backend, collection).await).is_err() {
                debug!("picker closed before keys arrived");
            }
        });
    }

    pub fn picker_select_key(&mut self) {
        let Some(key) = self.picker.select_key() else {
            return;
        };
        let backend = Arc::clone(&self.backend);
        let tx = self.picker_tx.clone();
        tokio::spawn(async move {
            if tx.send(load_values(backend, key).await).is_err() {
                debug!("picker closed before values arrived");
            }
        });
    }

    pub fn picker_choose(&mut self) {
        if let Some(event) = self.picker.choose() {
            self.handle_event(&event);
        }
        self.overlay = Overlay::None;
    }

    fn drain_picker(&mut self) {
        while let Ok(update) = self.picker_rx.try_recv() {
            self.picker.apply(update);
        }
    }
}

fn format_date(timestamp: Option<i64>) -> String {
    timestamp
        .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::StaticBackend;

    async fn settled_app() -> App {
        let mut app = App::new(
            Arc::new(StaticBackend),
            DashboardConfig::default(),
            &Route::overview(Collection::CallStacks),
        );
        app.settle().await;
        app
    }

    #[tokio::test]
    async fn drill_down_opens_the_detail_page_and_back_returns() {
        let mut app = settled_app().await;
        assert_eq!(app.view.grid.rows.len(), 1);
        assert_eq!(app.view.charts.total.len(), 1);

        app.drill_down();
        assert!(app.sync.page().is_detail());
        assert!(app.can_go_back());
        app.settle().await;
        assert_eq!(app.view.detail, DetailView::Empty);
        assert_eq!(app.view.failure, None);

        app.back();
        assert!(!app.sync.page().is_detail());
        assert!(!app.can_go_back());
    }

    #[tokio::test]
    async fn invalid_date_input_stays_on_the_popup() {
        let mut app = settled_app().await;
        app.overlay = Overlay::DateRange;
        app.date_start_input = "2024-13-01".to_string();
        app.apply_date_inputs();
        assert_eq!(app.overlay, Overlay::DateRange);
        assert!(!app.status_message.is_empty());
        assert!(!app.sync.is_fetching());
    }

    #[tokio::test]
    async fn switching_collection_keeps_the_filters() {
        let mut app = settled_app().await;
        app.handle_event(&SyncEvent::FilterAdded {
            key: "host".to_string(),
            value: "web-1".to_string(),
        });
        app.settle().await;

        app.switch_collection(Collection::SqlStatements);
        assert_eq!(app.sync.collection(), Collection::SqlStatements);
        assert_eq!(app.sync.current().filters.count(), 1);
    }

    #[test]
    fn format_date_shows_the_utc_day() {
        assert_eq!(format_date(Some(1_704_067_200 + 86_399)), "2024-01-01");
        assert_eq!(format_date(None), "");
    }
}
