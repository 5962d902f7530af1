// Keeps the grid and charts of one page consistent with its filters
// Outcomes issued under an older snapshot are discarded on resolution

pub mod phase;
pub mod transition;

use crate::api::StatsBackend;
use crate::config::DashboardConfig;
use crate::domain::{Collection, PageKind};
use crate::fetch::{
    BatchOutcome, BatchPayload, BatchScope, BatchTicket, FetchCoordinator, Snapshot,
};
use crate::navigate::{DrillDownNavigator, Route};
use crate::query::{decode_with_base, encode, PageWindow, QueryTarget, ViewState};
use crate::view::ViewRenderer;
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tracing::{debug, info, warn};

pub use phase::{PhaseEvent, PhaseMachine, PhaseTransitionError, SyncPhase};
pub use transition::{apply, SyncEvent};

/// What `resolve` did with a batch outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The latest batch was rendered.
    Applied,
    /// An older batch for the same snapshot was rendered ahead of the latest.
    Interim,
    /// The latest batch failed and the failure was rendered.
    Failed,
    /// Issued under another snapshot, superseded, or already covered.
    Stale,
}

pub struct ViewSynchronizer {
    page: PageKind,
    current: Snapshot,
    machine: PhaseMachine,
    coordinator: FetchCoordinator,
    navigator: DrillDownNavigator,
    generation: u64,
    latest: Option<(u64, BatchScope)>,
    applied_generation: u64,
}

impl ViewSynchronizer {
    /// Hydrates a synchronizer for `route`. Outcomes of its batches arrive
    /// on the returned receiver and must be fed back through [`Self::resolve`].
    pub fn new(
        backend: Arc<dyn StatsBackend>,
        route: &Route,
        config: &DashboardConfig,
    ) -> (Self, UnboundedReceiver<BatchOutcome>) {
        let decoded = decode_with_base(&route.query, ViewState::with_page_size(config.page_size));
        for issue in &decoded.issues {
            debug!(%issue, "dropped query entry");
        }

        let (tx, rx) = unbounded_channel();
        let coordinator =
            FetchCoordinator::new(backend, route.page.clone(), config.fetch_settings(), tx);
        let navigator = DrillDownNavigator::new(route.page.collection(), config.carry_filters);

        let synchronizer = Self {
            page: route.page.clone(),
            current: Snapshot {
                filters: decoded.filters,
                view: decoded.view,
            },
            machine: PhaseMachine::default(),
            coordinator,
            navigator,
            generation: 0,
            latest: None,
            applied_generation: 0,
        };
        (synchronizer, rx)
    }

    pub const fn page(&self) -> &PageKind {
        &self.page
    }

    pub const fn collection(&self) -> Collection {
        self.page.collection()
    }

    pub const fn current(&self) -> &Snapshot {
        &self.current
    }

    pub const fn phase(&self) -> SyncPhase {
        self.machine.phase()
    }

    pub const fn is_fetching(&self) -> bool {
        matches!(self.machine.phase(), SyncPhase::Fetching)
    }

    pub const fn navigator(&self) -> &DrillDownNavigator {
        &self.navigator
    }

    /// URL of this page in its current state.
    pub fn current_url(&self) -> String {
        Route {
            page: self.page.clone(),
            query: encode(&self.current.filters, &self.current.view, QueryTarget::Page),
        }
        .to_url()
    }

    pub fn header_links(&self) -> Vec<(Collection, String)> {
        self.navigator.header_links(&self.current)
    }

    /// Issues the initial batch. Does nothing once the page has loaded.
    pub fn load(&mut self) -> bool {
        if self.phase() != SyncPhase::Idle {
            return false;
        }
        self.dispatch(self.full_scope());
        true
    }

    /// Applies an external event. Returns whether a batch was issued.
    pub fn handle(&mut self, event: &SyncEvent) -> bool {
        if self.page.is_detail() && event.affects_grid_only() {
            debug!(%event, "grid event ignored on a detail page");
            return false;
        }

        let next = apply(&self.current, event);
        if next == self.current {
            debug!(%event, "event left the filters unchanged");
            return false;
        }

        let scope = if event.affects_grid_only() && self.charts_current() {
            BatchScope::GridOnly
        } else {
            self.full_scope()
        };
        info!(%event, ?scope, "filters changed");
        self.current = next;
        self.dispatch(scope);
        true
    }

    /// Validates `outcome` against `Current` and drives `renderer` when it
    /// still applies: grid then charts, or the detail series.
    pub fn resolve(&mut self, outcome: BatchOutcome, renderer: &mut impl ViewRenderer) -> Resolution {
        let BatchOutcome { ticket, result } = outcome;
        let generation = ticket.generation;

        if ticket.snapshot != self.current || generation <= self.applied_generation {
            debug!(generation, "discarding stale batch");
            return Resolution::Stale;
        }
        let is_latest = self.latest.is_some_and(|(latest, _)| latest == generation);

        match result {
            Ok(payload) => {
                render(payload, ticket.snapshot.view.page, renderer);
                self.applied_generation = generation;
                if is_latest {
                    self.transition(PhaseEvent::Settled { generation });
                    Resolution::Applied
                } else {
                    Resolution::Interim
                }
            }
            Err(failure) if is_latest => {
                renderer.render_failure(&failure);
                self.applied_generation = generation;
                self.transition(PhaseEvent::Failed { generation });
                Resolution::Failed
            }
            Err(failure) => {
                debug!(generation, %failure, "ignoring failure of a superseded batch");
                Resolution::Stale
            }
        }
    }

    const fn full_scope(&self) -> BatchScope {
        if self.page.is_detail() {
            BatchScope::Detail
        } else {
            BatchScope::Overview
        }
    }

    /// True when the rendered or pending charts match the current filters.
    fn charts_current(&self) -> bool {
        match self.phase() {
            SyncPhase::Rendered => true,
            SyncPhase::Fetching => {
                matches!(self.latest, Some((_, BatchScope::GridOnly)))
            }
            SyncPhase::Idle | SyncPhase::Error => false,
        }
    }

    fn dispatch(&mut self, scope: BatchScope) {
        self.generation += 1;
        let generation = self.generation;
        self.latest = Some((generation, scope));
        self.transition(PhaseEvent::Dispatched { generation });
        self.coordinator.dispatch(BatchTicket {
            generation,
            scope,
            snapshot: self.current.clone(),
        });
    }

    fn transition(&mut self, event: PhaseEvent) {
        if let Err(err) = self.machine.process_event(event) {
            warn!(%err, "phase transition rejected");
        }
    }
}

fn render(payload: BatchPayload, page: PageWindow, renderer: &mut impl ViewRenderer) {
    match payload {
        BatchPayload::Overview { grid, rankings } => {
            renderer.render_grid(&grid, page);
            renderer.render_charts(&rankings);
        }
        BatchPayload::GridOnly(grid) => renderer.render_grid(&grid, page),
        BatchPayload::Detail(detail) => renderer.render_detail(detail.as_ref()),
    }
}
