use async_trait::async_trait;
use perf_dashboard_tui::api::{AggregateRow, DetailSeries, GridPage, StatsBackend};
use perf_dashboard_tui::domain::Collection;
use perf_dashboard_tui::FetchError;

/// Serves one fixed row for every collection. Detail pages have no data.
pub struct StaticBackend;

pub fn sample_row() -> AggregateRow {
    AggregateRow {
        id: "7".to_string(),
        label: "views.index".to_string(),
        count: 3,
        total: 1.5,
        avg: 0.5,
        min: 0.25,
        max: 0.75,
    }
}

#[async_trait]
impl StatsBackend for StaticBackend {
    async fn grid_page(&self, _collection: Collection, query: &str) -> Result<GridPage, FetchError> {
        let params: Vec<(String, String)> = serde_urlencoded::from_str(query)
            .map_err(|e| FetchError::network(e.to_string()))?;
        let echo = params
            .iter()
            .find(|(key, _)| key == "sEcho")
            .and_then(|(_, value)| value.parse().ok())
            .unwrap_or_default();
        Ok(GridPage {
            rows: vec![sample_row()],
            echo,
            total_records: 1,
            filtered_records: 1,
        })
    }

    async fn ranked(
        &self,
        _collection: Collection,
        _query: &str,
    ) -> Result<Vec<AggregateRow>, FetchError> {
        Ok(vec![sample_row()])
    }

    async fn detail(
        &self,
        _collection: Collection,
        _item_id: &str,
        _query: &str,
    ) -> Result<DetailSeries, FetchError> {
        Err(FetchError::EmptyResult)
    }

    async fn metadata_keys(&self, _collection: Collection) -> Result<Vec<String>, FetchError> {
        Ok(vec!["host".to_string()])
    }

    async fn metadata_values(&self, _key: &str) -> Result<Vec<String>, FetchError> {
        Ok(Vec::new())
    }
}
