// Synchronization core of the profiling dashboard, shared by the binary and tests
pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod filters;
pub mod navigate;
pub mod picker;
pub mod query;
pub mod sync;
pub mod view;

pub use domain::{Collection, Metric, PageKind};
pub use error::{DashboardError, FetchError};
pub use filters::{Filter, FilterSet};
pub use sync::{SyncEvent, SyncPhase, ViewSynchronizer};
