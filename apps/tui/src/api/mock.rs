// In-memory StatsBackend for tests
// Rules match a substring of the call label and add a delay or an error

use super::models::{AggregateRow, DetailSeries, GridPage};
use super::StatsBackend;
use crate::domain::{Collection, Metric};
use crate::error::FetchError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

struct Rule {
    fragment: String,
    delay: Option<Duration>,
    error: Option<FetchError>,
}

#[derive(Default)]
struct MockState {
    rows: Vec<AggregateRow>,
    detail: Option<DetailSeries>,
    keys: Vec<String>,
    values: HashMap<String, Vec<String>>,
    rules: Vec<Rule>,
    calls: Vec<String>,
    echo_override: Option<u64>,
}

#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with_rows(self, rows: Vec<AggregateRow>) -> Self {
        self.state().rows = rows;
        self
    }

    pub fn with_detail(self, detail: DetailSeries) -> Self {
        self.state().detail = Some(detail);
        self
    }

    pub fn with_keys(self, keys: &[&str]) -> Self {
        self.state().keys = keys.iter().map(ToString::to_string).collect();
        self
    }

    pub fn with_values(self, key: &str, values: &[&str]) -> Self {
        self.state().values.insert(
            key.to_string(),
            values.iter().map(ToString::to_string).collect(),
        );
        self
    }

    /// Delays every call whose label contains `fragment`.
    pub fn delay(self, fragment: &str, delay: Duration) -> Self {
        self.state().rules.push(Rule {
            fragment: fragment.to_string(),
            delay: Some(delay),
            error: None,
        });
        self
    }

    /// Fails every call whose label contains `fragment`.
    pub fn fail(self, fragment: &str, error: FetchError) -> Self {
        self.state().rules.push(Rule {
            fragment: fragment.to_string(),
            delay: None,
            error: Some(error),
        });
        self
    }

    /// Answers grid requests with this `sEcho` instead of the requested one.
    pub fn echo(self, echo: u64) -> Self {
        self.state().echo_override = Some(echo);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn calls_matching(&self, fragment: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|call| call.contains(fragment))
            .count()
    }

    /// Records the call and returns the summed delay and first matching error.
    fn record(&self, label: String) -> (Duration, Option<FetchError>) {
        let mut state = self.state();
        let mut delay = Duration::ZERO;
        let mut error = None;
        for rule in state.rules.iter().filter(|rule| label.contains(&rule.fragment)) {
            delay += rule.delay.unwrap_or_default();
            if error.is_none() {
                error.clone_from(&rule.error);
            }
        }
        state.calls.push(label);
        (delay, error)
    }

    async fn settle(&self, label: String) -> Result<(), FetchError> {
        let (delay, error) = self.record(label);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        error.map_or(Ok(()), Err)
    }
}

fn param(query: &str, name: &str) -> Option<String> {
    serde_urlencoded::from_str::<Vec<(String, String)>>(query)
        .ok()?
        .into_iter()
        .find_map(|(key, value)| (key == name).then_some(value))
}

fn number(query: &str, name: &str) -> Option<u64> {
    param(query, name).and_then(|value| value.parse().ok())
}

#[async_trait]
impl StatsBackend for MockBackend {
    async fn grid_page(&self, collection: Collection, query: &str) -> Result<GridPage, FetchError> {
        self.settle(format!("grid:{}?{query}", collection.as_str()))
            .await?;

        let state = self.state();
        let offset = number(query, "iDisplayStart").unwrap_or(0);
        let length = number(query, "iDisplayLength").unwrap_or(10);
        let rows: Vec<AggregateRow> = state
            .rows
            .iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(length).unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(GridPage {
            rows,
            echo: state
                .echo_override
                .or_else(|| number(query, "sEcho"))
                .unwrap_or(0),
            total_records: state.rows.len() as u64,
            filtered_records: state.rows.len() as u64,
        })
    }

    async fn ranked(
        &self,
        collection: Collection,
        query: &str,
    ) -> Result<Vec<AggregateRow>, FetchError> {
        self.settle(format!("ranked:{}?{query}", collection.as_str()))
            .await?;

        let metric = param(query, "sort")
            .and_then(|sort| Metric::parse(&sort))
            .unwrap_or(Metric::Total);
        let limit = number(query, "limit").unwrap_or(6);
        let mut rows = self.state().rows.clone();
        rows.sort_by(|a, b| b.metric(metric).total_cmp(&a.metric(metric)));
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }

    async fn detail(
        &self,
        collection: Collection,
        item_id: &str,
        query: &str,
    ) -> Result<DetailSeries, FetchError> {
        self.settle(format!("detail:{}/{item_id}?{query}", collection.as_str()))
            .await?;
        self.state().detail.clone().ok_or(FetchError::EmptyResult)
    }

    async fn metadata_keys(&self, collection: Collection) -> Result<Vec<String>, FetchError> {
        self.settle(format!("keys:{}", collection.as_str())).await?;
        Ok(self.state().keys.clone())
    }

    async fn metadata_values(&self, key: &str) -> Result<Vec<String>, FetchError> {
        self.settle(format!("values:{key}")).await?;
        Ok(self.state().values.get(key).cloned().unwrap_or_default())
    }
}

/// Row `id` with `total = count * avg`.
pub fn row(id: &str, count: u64, avg: f64) -> AggregateRow {
    #[allow(clippy::cast_precision_loss)]
    let total = count as f64 * avg;
    AggregateRow {
        id: id.to_string(),
        label: format!("{id}.label"),
        count,
        total,
        avg,
        min: avg / 2.0,
        max: avg * 2.0,
    }
}
