use crate::error::{DashboardError, Result};
use crate::fetch::{FetchSettings, DEFAULT_RANKING_LIMIT, DEFAULT_REQUEST_TIMEOUT};
use crate::query::DEFAULT_PAGE_SIZE;
use dotenv::dotenv;
use serde::Serialize;
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_LOG_FILE: &str = "perf-dashboard.log";

pub const URL_VAR: &str = "DASHBOARD_URL";
pub const TIMEOUT_VAR: &str = "DASHBOARD_TIMEOUT_SECS";
pub const RANKING_LIMIT_VAR: &str = "DASHBOARD_RANKING_LIMIT";
pub const PAGE_SIZE_VAR: &str = "DASHBOARD_PAGE_SIZE";
pub const CARRY_FILTERS_VAR: &str = "DASHBOARD_CARRY_FILTERS";
pub const LOG_FILE_VAR: &str = "DASHBOARD_LOG_FILE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    /// Bars per chart.
    pub ranking_limit: usize,
    /// Grid rows per page.
    pub page_size: u64,
    /// Whether drill-down links keep the active filters and dates.
    pub carry_filters: bool,
    pub log_file: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            ranking_limit: DEFAULT_RANKING_LIMIT,
            page_size: DEFAULT_PAGE_SIZE,
            carry_filters: true,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl DashboardConfig {
    /// Reads every setting through `lookup`, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let base_url = lookup(URL_VAR)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.base_url);
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(DashboardError::Config(format!(
                "{URL_VAR} must be an http(s) URL, got {base_url:?}"
            )));
        }

        let timeout_secs: u64 = parsed(&lookup, TIMEOUT_VAR, defaults.request_timeout.as_secs())?;
        let ranking_limit: usize = parsed(&lookup, RANKING_LIMIT_VAR, defaults.ranking_limit)?;
        let page_size: u64 = parsed(&lookup, PAGE_SIZE_VAR, defaults.page_size)?;
        for (name, value) in [
            (TIMEOUT_VAR, timeout_secs),
            (RANKING_LIMIT_VAR, ranking_limit as u64),
            (PAGE_SIZE_VAR, page_size),
        ] {
            if value == 0 {
                return Err(DashboardError::Config(format!("{name} must be positive")));
            }
        }

        let carry_filters = match lookup(CARRY_FILTERS_VAR) {
            None => defaults.carry_filters,
            Some(raw) => parse_flag(&raw).ok_or_else(|| {
                DashboardError::Config(format!("{CARRY_FILTERS_VAR}: expected a boolean, got {raw:?}"))
            })?,
        };

        let log_file = lookup(LOG_FILE_VAR)
            .filter(|path| !path.trim().is_empty())
            .map_or(defaults.log_file, PathBuf::from);

        Ok(Self {
            base_url,
            request_timeout: Duration::from_secs(timeout_secs),
            ranking_limit,
            page_size,
            carry_filters,
            log_file,
        })
    }

    pub const fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            request_timeout: self.request_timeout,
            ranking_limit: self.ranking_limit,
        }
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|err| DashboardError::Config(format!("{name}={raw:?}: {err}"))),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Loads `.env`, then reads the dashboard settings from the environment.
pub fn init_app_config() -> Result<DashboardConfig> {
    dotenv().ok();
    DashboardConfig::from_lookup(|name| env::var(name).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<DashboardConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        DashboardConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_without_environment() -> Result<()> {
        assert_eq!(config(&[])?, DashboardConfig::default());
        Ok(())
    }

    #[test]
    fn environment_overrides_defaults() -> Result<()> {
        let config = config(&[
            (URL_VAR, "https://stats.internal:9000/"),
            (TIMEOUT_VAR, "3"),
            (PAGE_SIZE_VAR, "25"),
            (CARRY_FILTERS_VAR, "false"),
            (LOG_FILE_VAR, "/tmp/dash.log"),
        ])?;
        assert_eq!(config.base_url, "https://stats.internal:9000/");
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.page_size, 25);
        assert_eq!(config.ranking_limit, DEFAULT_RANKING_LIMIT);
        assert!(!config.carry_filters);
        assert_eq!(config.log_file, PathBuf::from("/tmp/dash.log"));
        Ok(())
    }

    #[test]
    fn invalid_values_are_config_errors() {
        for vars in [
            [(TIMEOUT_VAR, "soon")],
            [(PAGE_SIZE_VAR, "0")],
            [(CARRY_FILTERS_VAR, "maybe")],
            [(URL_VAR, "localhost:8080")],
        ] {
            assert!(
                matches!(config(&vars), Err(DashboardError::Config(_))),
                "{vars:?}"
            );
        }
    }
}
