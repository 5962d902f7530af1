// Drill-down targets and navigation URLs

use crate::api::{AggregateRow, SeriesPoint};
use crate::domain::{Collection, PageKind};
use crate::error::{DashboardError, Result};
use crate::fetch::Snapshot;
use crate::query::{encode, PageWindow, QueryTarget, ViewState};
use serde::Serialize;

/// A navigable page and the query it hydrates from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub page: PageKind,
    pub query: String,
}

impl Route {
    pub fn overview(collection: Collection) -> Self {
        Self {
            page: PageKind::Overview { collection },
            query: String::new(),
        }
    }

    /// Parses `/{collection}`, `/{collection}/{id}` or `/`, each with an
    /// optional query. A scheme and host, if present, are ignored.
    pub fn parse(url: &str) -> Result<Self> {
        let url = url.trim();
        let without_host = match url.split_once("://") {
            Some((_, rest)) => rest.find('/').map_or("/", |slash| &rest[slash..]),
            None => url,
        };
        let (path, query) = without_host
            .split_once('?')
            .unwrap_or((without_host, ""));
        let query = query.split('#').next().unwrap_or_default().to_string();

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let page = match segments.as_slice() {
            [] => PageKind::Overview {
                collection: Collection::CallStacks,
            },
            [collection] => PageKind::Overview {
                collection: parse_collection(collection, url)?,
            },
            ["tables", ..] => {
                return Err(DashboardError::InvalidRoute(format!(
                    "{url} is a raw event table, open it in a browser"
                )))
            }
            [collection, item_id] => PageKind::Detail {
                collection: parse_collection(collection, url)?,
                item_id: urlencoding::decode(item_id)
                    .map_err(|err| DashboardError::InvalidRoute(format!("{url}: {err}")))?
                    .into_owned(),
            },
            _ => return Err(DashboardError::InvalidRoute(url.to_string())),
        };

        Ok(Self { page, query })
    }

    pub fn to_url(&self) -> String {
        if self.query.is_empty() {
            self.page.path()
        } else {
            format!("{}?{}", self.page.path(), self.query)
        }
    }
}

fn parse_collection(segment: &str, url: &str) -> Result<Collection> {
    Collection::parse(segment)
        .ok_or_else(|| DashboardError::InvalidRoute(format!("{url}: unknown collection {segment:?}")))
}

/// Maps selections on the current page to the next page's URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrillDownNavigator {
    collection: Collection,
    carry_filters: bool,
}

impl DrillDownNavigator {
    pub const fn new(collection: Collection, carry_filters: bool) -> Self {
        Self {
            collection,
            carry_filters,
        }
    }

    pub const fn carries_filters(&self) -> bool {
        self.carry_filters
    }

    /// Target of a bar in one of the ranking charts.
    pub fn aggregate_row_target(&self, row: &AggregateRow, current: &Snapshot) -> String {
        self.detail_target(&row.id, current)
    }

    pub fn grid_row_target(&self, row: &AggregateRow, current: &Snapshot) -> String {
        self.detail_target(&row.id, current)
    }

    /// Raw event table of one recorded event. Never carries context.
    pub fn scatter_point_target(&self, point: &SeriesPoint) -> String {
        format!(
            "/tables/{}/{}",
            self.collection.as_str(),
            urlencoding::encode(&point.event_id)
        )
    }

    /// Header link to `collection`, always with the active filters and dates.
    pub fn collection_target(&self, collection: Collection, current: &Snapshot) -> String {
        Route {
            page: PageKind::Overview { collection },
            query: context_query(current),
        }
        .to_url()
    }

    pub fn header_links(&self, current: &Snapshot) -> Vec<(Collection, String)> {
        Collection::ALL
            .into_iter()
            .map(|collection| (collection, self.collection_target(collection, current)))
            .collect()
    }

    fn detail_target(&self, item_id: &str, current: &Snapshot) -> String {
        let page = PageKind::Detail {
            collection: self.collection,
            item_id: item_id.to_string(),
        };
        let query = if self.carry_filters {
            context_query(current)
        } else {
            String::new()
        };
        Route { page, query }.to_url()
    }
}

/// Filters and dates of `current` on a fresh first page of the same size.
fn context_query(current: &Snapshot) -> String {
    let view = ViewState {
        page: PageWindow::with_size(current.view.page.size),
        date_range: current.view.date_range,
        ..ViewState::default()
    };
    encode(&current.filters, &view, QueryTarget::Page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::row;
    use crate::filters::FilterSet;
    use crate::query::{decode, DateRange};

    fn filtered() -> Snapshot {
        let mut snapshot = Snapshot {
            filters: FilterSet::new().add("host", "web-1"),
            ..Snapshot::default()
        };
        snapshot.view.date_range = DateRange {
            start: Some(100),
            end: None,
        };
        snapshot.view.page.offset = 40;
        snapshot.view.search = Some("select".to_string());
        snapshot
    }

    #[test]
    fn drill_down_carries_filters_and_dates() {
        let navigator = DrillDownNavigator::new(Collection::SqlStatements, true);
        let url = navigator.grid_row_target(&row("17", 1, 1.0), &filtered());
        assert!(url.starts_with("/sqlstatements/17?key_1=host&value_1=web-1&start_date=100"));

        let route = Route::parse(&url);
        let Ok(route) = route else {
            panic!("unparseable target {url}");
        };
        let (filters, view) = decode(&route.query);
        assert_eq!(filters, filtered().filters);
        assert_eq!(view.date_range.start, Some(100));
        assert_eq!(view.page.offset, 0);
        assert_eq!(view.search, None);
    }

    #[test]
    fn legacy_mode_drops_the_context() {
        let navigator = DrillDownNavigator::new(Collection::CallStacks, false);
        assert_eq!(
            navigator.aggregate_row_target(&row("a b", 1, 1.0), &filtered()),
            "/callstacks/a%20b"
        );
    }

    #[test]
    fn scatter_points_open_the_event_table() {
        let navigator = DrillDownNavigator::new(Collection::FileAccesses, true);
        let point = SeriesPoint {
            duration: 0.5,
            timestamp: 1.0,
            event_id: "991".to_string(),
        };
        assert_eq!(navigator.scatter_point_target(&point), "/tables/fileaccesses/991");
    }

    #[test]
    fn header_links_always_carry_filters() {
        let navigator = DrillDownNavigator::new(Collection::CallStacks, false);
        let links = navigator.header_links(&filtered());
        assert_eq!(links.len(), 3);
        assert!(links
            .iter()
            .all(|(_, url)| url.contains("key_1=host&value_1=web-1")));
        assert!(links[1].1.starts_with("/sqlstatements?"));
    }

    #[test]
    fn route_parse_understands_pages() -> Result<()> {
        assert_eq!(Route::parse("/")?, Route::overview(Collection::CallStacks));
        assert_eq!(
            Route::parse("http://localhost:8080/fileaccesses?key_1=a&value_1=b")?,
            Route {
                page: PageKind::Overview {
                    collection: Collection::FileAccesses
                },
                query: "key_1=a&value_1=b".to_string(),
            }
        );
        let detail = Route::parse("/sqlstatements/a%20b")?;
        assert_eq!(
            detail.page,
            PageKind::Detail {
                collection: Collection::SqlStatements,
                item_id: "a b".to_string()
            }
        );
        assert_eq!(detail.to_url(), "/sqlstatements/a%20b");
        Ok(())
    }

    #[test]
    fn route_parse_rejects_unknown_pages() {
        assert!(Route::parse("/handlers").is_err());
        assert!(Route::parse("/tables/callstacks/3").is_err());
        assert!(Route::parse("/callstacks/1/2").is_err());
    }
}
