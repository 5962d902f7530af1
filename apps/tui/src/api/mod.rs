// Access to the profiling stats service

pub mod client;
#[cfg(test)]
pub mod mock;
pub mod models;

use crate::domain::Collection;
use crate::error::FetchError;
use async_trait::async_trait;

pub use client::HttpBackend;
pub use models::{AggregateRow, DetailSeries, DetailStats, GridPage, Rankings, SeriesPoint};

/// Read-only stats endpoints. `query` is an already encoded query string
/// without the leading `?`.
#[async_trait]
pub trait StatsBackend: Send + Sync {
    async fn grid_page(&self, collection: Collection, query: &str) -> Result<GridPage, FetchError>;

    async fn ranked(
        &self,
        collection: Collection,
        query: &str,
    ) -> Result<Vec<AggregateRow>, FetchError>;

    /// `EmptyResult` when the item does not exist or has no recorded events.
    async fn detail(
        &self,
        collection: Collection,
        item_id: &str,
        query: &str,
    ) -> Result<DetailSeries, FetchError>;

    /// Metadata keys recorded for `collection`, possibly none.
    async fn metadata_keys(&self, collection: Collection) -> Result<Vec<String>, FetchError>;

    /// Distinct values seen for one metadata key, possibly none.
    async fn metadata_values(&self, key: &str) -> Result<Vec<String>, FetchError>;
}
