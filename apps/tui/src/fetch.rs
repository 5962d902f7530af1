// Issues a view's requests concurrently and resolves them as one unit

use crate::api::{AggregateRow, DetailSeries, GridPage, Rankings, StatsBackend};
use crate::domain::{Metric, PageKind};
use crate::error::FetchError;
use crate::filters::FilterSet;
use crate::query::{encode, QueryTarget, ViewState};
use futures::future::join_all;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Bars drawn per chart.
pub const DEFAULT_RANKING_LIMIT: usize = 6;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RequestId {
    Grid,
    Ranked(Metric),
    Detail,
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grid => write!(f, "grid"),
            Self::Ranked(metric) => write!(f, "{} chart", metric.as_str()),
            Self::Detail => write!(f, "detail"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchRequest {
    Grid { echo: u64 },
    Ranked { metric: Metric, limit: usize },
    Detail,
}

impl FetchRequest {
    pub const fn id(&self) -> RequestId {
        match self {
            Self::Grid { .. } => RequestId::Grid,
            Self::Ranked { metric, .. } => RequestId::Ranked(*metric),
            Self::Detail => RequestId::Detail,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchResponse {
    Grid(GridPage),
    Ranked(Metric, Vec<AggregateRow>),
    /// `None` when the item has no data.
    Detail(Option<DetailSeries>),
}

/// The first failed request of a batch, in request order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{request} request failed: {error}")]
pub struct FetchFailure {
    pub request: RequestId,
    pub error: FetchError,
}

/// Filters and view state a batch was issued under.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Snapshot {
    pub filters: FilterSet,
    pub view: ViewState,
}

/// Which requests a batch carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BatchScope {
    /// Grid page plus one ranking per chart.
    Overview,
    /// Grid page only; the charts already match the filters.
    GridOnly,
    /// Stats and scatter points of one item.
    Detail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchTicket {
    pub generation: u64,
    pub scope: BatchScope,
    pub snapshot: Snapshot,
}

impl BatchTicket {
    /// Grid requests echo the generation so mismatched replies are caught.
    pub fn requests(&self, ranking_limit: usize) -> Vec<FetchRequest> {
        let grid = FetchRequest::Grid {
            echo: self.generation,
        };
        match self.scope {
            BatchScope::Overview => std::iter::once(grid)
                .chain(Metric::ALL.into_iter().map(|metric| FetchRequest::Ranked {
                    metric,
                    limit: ranking_limit,
                }))
                .collect(),
            BatchScope::GridOnly => vec![grid],
            BatchScope::Detail => vec![FetchRequest::Detail],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BatchPayload {
    Overview { grid: GridPage, rankings: Rankings },
    GridOnly(GridPage),
    Detail(Option<DetailSeries>),
}

impl BatchPayload {
    fn assemble(scope: BatchScope, responses: Vec<FetchResponse>) -> Self {
        let mut grid = GridPage::default();
        let mut rankings = Rankings::default();
        let mut detail = None;
        for response in responses {
            match response {
                FetchResponse::Grid(page) => grid = page,
                FetchResponse::Ranked(metric, rows) => rankings.set(metric, rows),
                FetchResponse::Detail(series) => detail = series,
            }
        }

        match scope {
            BatchScope::Overview => Self::Overview { grid, rankings },
            BatchScope::GridOnly => Self::GridOnly(grid),
            BatchScope::Detail => Self::Detail(detail),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub ticket: BatchTicket,
    pub result: Result<BatchPayload, FetchFailure>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSettings {
    pub request_timeout: Duration,
    pub ranking_limit: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            ranking_limit: DEFAULT_RANKING_LIMIT,
        }
    }
}

/// Runs fetch batches for one page and reports their outcomes on a channel.
#[derive(Clone)]
pub struct FetchCoordinator {
    backend: Arc<dyn StatsBackend>,
    page: PageKind,
    settings: FetchSettings,
    outcomes: UnboundedSender<BatchOutcome>,
}

impl FetchCoordinator {
    pub fn new(
        backend: Arc<dyn StatsBackend>,
        page: PageKind,
        settings: FetchSettings,
        outcomes: UnboundedSender<BatchOutcome>,
    ) -> Self {
        Self {
            backend,
            page,
            settings,
            outcomes,
        }
    }

    pub const fn settings(&self) -> FetchSettings {
        self.settings
    }

    /// One grid page. An empty page is a normal result.
    pub async fn fetch_grid_page(
        &self,
        filters: &FilterSet,
        view: &ViewState,
        echo: u64,
    ) -> Result<GridPage, FetchError> {
        let query = encode(filters, view, QueryTarget::Grid { echo });
        let page = self
            .backend
            .grid_page(self.page.collection(), &query)
            .await?;
        if page.echo != echo {
            return Err(FetchError::network(format!(
                "grid reply echoed {} for request {echo}",
                page.echo
            )));
        }
        Ok(page)
    }

    /// Top `limit` rows by `metric`.
    pub async fn fetch_ranked(
        &self,
        filters: &FilterSet,
        view: &ViewState,
        metric: Metric,
        limit: usize,
    ) -> Result<Vec<AggregateRow>, FetchError> {
        let query = encode(filters, view, QueryTarget::Ranked { metric, limit });
        self.backend.ranked(self.page.collection(), &query).await
    }

    /// `Ok(None)` when the item has no data.
    pub async fn fetch_detail(
        &self,
        filters: &FilterSet,
        view: &ViewState,
    ) -> Result<Option<DetailSeries>, FetchError> {
        let PageKind::Detail {
            collection,
            item_id,
        } = &self.page
        else {
            return Err(FetchError::network("detail requested outside a detail page"));
        };

        let query = encode(filters, view, QueryTarget::Detail);
        match self.backend.detail(*collection, item_id, &query).await {
            Ok(series) => Ok(Some(series)),
            Err(FetchError::EmptyResult) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn fetch_one(
        &self,
        snapshot: &Snapshot,
        request: FetchRequest,
    ) -> Result<FetchResponse, FetchError> {
        let Snapshot { filters, view } = snapshot;
        let fetch = async {
            match request {
                FetchRequest::Grid { echo } => self
                    .fetch_grid_page(filters, view, echo)
                    .await
                    .map(FetchResponse::Grid),
                FetchRequest::Ranked { metric, limit } => self
                    .fetch_ranked(filters, view, metric, limit)
                    .await
                    .map(|rows| FetchResponse::Ranked(metric, rows)),
                FetchRequest::Detail => self
                    .fetch_detail(filters, view)
                    .await
                    .map(FetchResponse::Detail),
            }
        };

        let timeout = self.settings.request_timeout;
        tokio::time::timeout(timeout, fetch).await.unwrap_or_else(|_| {
            Err(FetchError::network(format!(
                "{} request timed out after {timeout:?}",
                request.id()
            )))
        })
    }

    /// Runs `requests` concurrently and waits for all of them. Returns every
    /// response in request order, or the first failure in request order.
    pub async fn fetch_all(
        &self,
        snapshot: &Snapshot,
        requests: &[FetchRequest],
    ) -> Result<Vec<FetchResponse>, FetchFailure> {
        let tasks = requests.iter().map(|&request| {
            let coordinator = self.clone();
            let snapshot = snapshot.clone();
            tokio::spawn(async move { coordinator.fetch_one(&snapshot, request).await })
        });
        let settled = join_all(tasks).await;

        let mut responses = Vec::with_capacity(requests.len());
        for (request, joined) in requests.iter().zip(settled) {
            let result = joined.unwrap_or_else(|err| {
                Err(FetchError::network(format!("request task failed: {err}")))
            });
            match result {
                Ok(response) => responses.push(response),
                Err(error) => {
                    return Err(FetchFailure {
                        request: request.id(),
                        error,
                    })
                }
            }
        }
        Ok(responses)
    }

    pub async fn run_batch(&self, ticket: &BatchTicket) -> Result<BatchPayload, FetchFailure> {
        let requests = ticket.requests(self.settings.ranking_limit);
        let responses = self.fetch_all(&ticket.snapshot, &requests).await?;
        Ok(BatchPayload::assemble(ticket.scope, responses))
    }

    /// Runs the batch on its own task and sends the outcome to the channel.
    pub fn dispatch(&self, ticket: BatchTicket) -> JoinHandle<()> {
        let coordinator = self.clone();
        debug!(generation = ticket.generation, scope = ?ticket.scope, "dispatching batch");

        tokio::spawn(async move {
            let result = coordinator.run_batch(&ticket).await;
            match &result {
                Ok(_) => debug!(generation = ticket.generation, "batch settled"),
                Err(failure) => warn!(generation = ticket.generation, %failure, "batch failed"),
            }
            if coordinator
                .outcomes
                .send(BatchOutcome { ticket, result })
                .is_err()
            {
                // The page was left while the batch was in flight.
                info!("batch outcome dropped, synchronizer is gone");
            }
        })
    }
}
