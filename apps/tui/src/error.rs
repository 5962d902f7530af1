use thiserror::Error;

/// Failure of a single backend request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request failed, timed out, or returned something unreadable.
    #[error("network error: {0}")]
    Network(String),

    /// A well-formed response that carried no rows.
    #[error("no data found")]
    EmptyResult,
}

impl FetchError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Network(format!("request timed out: {err}"))
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Errors surfaced by the dashboard library.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// An entry of a page query that could not be understood.
    #[error("malformed filter state: {0}")]
    MalformedFilterState(String),

    #[error("invalid route: {0}")]
    InvalidRoute(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T, E = DashboardError> = std::result::Result<T, E>;
