use super::models::{AggregateRow, DetailSeries, GridPage};
use super::StatsBackend;
use crate::domain::Collection;
use crate::error::FetchError;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// [`StatsBackend`] over the dashboard's HTTP JSON API.
#[derive(Clone)]
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| FetchError::network(format!("failed to create HTTP client: {err}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str, query: &str) -> String {
        if query.is_empty() {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}{path}?{query}", self.base_url)
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        debug!(%url, "GET");
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::EmptyResult);
        }
        if !status.is_success() {
            return Err(FetchError::network(format!("{url} returned {status}")));
        }

        response
            .json()
            .await
            .map_err(|err| FetchError::network(format!("failed to parse {url}: {err}")))
    }

    async fn get_strings(&self, url: &str) -> Result<Vec<String>, FetchError> {
        let values: Vec<Value> = match self.get_json(url).await {
            Ok(values) => values,
            // Unknown keys simply have no values yet.
            Err(FetchError::EmptyResult) => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };
        Ok(metadata_strings(values))
    }
}

/// Nulls are skipped; numbers and booleans are shown as written.
fn metadata_strings(values: Vec<Value>) -> Vec<String> {
    values
        .into_iter()
        .filter_map(|value| match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        })
        .collect()
}

#[async_trait]
impl StatsBackend for HttpBackend {
    async fn grid_page(&self, collection: Collection, query: &str) -> Result<GridPage, FetchError> {
        let url = self.url(&format!("/api/{}", collection.as_str()), query);
        match self.get_json(&url).await {
            Err(FetchError::EmptyResult) => Err(FetchError::network(format!("{url} returned 404"))),
            other => other,
        }
    }

    async fn ranked(
        &self,
        collection: Collection,
        query: &str,
    ) -> Result<Vec<AggregateRow>, FetchError> {
        let url = self.url(&format!("/api/{}", collection.as_str()), query);
        match self.get_json(&url).await {
            Err(FetchError::EmptyResult) => Err(FetchError::network(format!("{url} returned 404"))),
            other => other,
        }
    }

    async fn detail(
        &self,
        collection: Collection,
        item_id: &str,
        query: &str,
    ) -> Result<DetailSeries, FetchError> {
        let path = format!(
            "/api/{}/{}",
            collection.as_str(),
            urlencoding::encode(item_id)
        );
        let url = self.url(&path, query);

        // The service answers with a one-element list, or an empty one.
        let series: Vec<DetailSeries> = self.get_json(&url).await?;
        series.into_iter().next().ok_or(FetchError::EmptyResult)
    }

    async fn metadata_keys(&self, collection: Collection) -> Result<Vec<String>, FetchError> {
        let query = format!("get_keys={}", collection.as_str());
        self.get_strings(&self.url("/tables/api/metadata", &query))
            .await
    }

    async fn metadata_values(&self, key: &str) -> Result<Vec<String>, FetchError> {
        let query = format!("key={}", urlencoding::encode(key));
        self.get_strings(&self.url("/tables/api/metadata", &query))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_drops_trailing_slashes() -> Result<(), FetchError> {
        let backend = HttpBackend::new("http://localhost:8080/", Duration::from_secs(1))?;
        assert_eq!(backend.base_url(), "http://localhost:8080");
        assert_eq!(
            backend.url("/api/callstacks", "sort=total&limit=6"),
            "http://localhost:8080/api/callstacks?sort=total&limit=6"
        );
        assert_eq!(
            backend.url("/api/callstacks", ""),
            "http://localhost:8080/api/callstacks"
        );
        Ok(())
    }

    #[test]
    fn metadata_strings_skip_nulls() {
        let values = vec![
            Value::Null,
            Value::String("web-1".to_string()),
            Value::from(42),
            Value::Bool(true),
        ];
        assert_eq!(metadata_strings(values), ["web-1", "42", "true"]);
    }

    #[tokio::test]
    async fn unreachable_service_is_a_network_error() -> Result<(), FetchError> {
        // Port 9 (discard) is not expected to serve HTTP.
        let backend = HttpBackend::new("http://127.0.0.1:9", Duration::from_millis(500))?;
        let result = backend.metadata_keys(Collection::CallStacks).await;
        assert!(matches!(result, Err(FetchError::Network(_))));
        Ok(())
    }
}
