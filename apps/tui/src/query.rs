// Canonical query-string form of the dashboard state
// Filters are key_i/value_i pairs, 1-based and contiguous; the backend stops at the first gap

use crate::domain::{Metric, SortColumn, SortDirection};
use crate::error::DashboardError;
use crate::filters::{is_unselected, FilterSet};
use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

pub const DEFAULT_PAGE_SIZE: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Sort {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl Default for Sort {
    fn default() -> Self {
        Self {
            column: SortColumn::Total,
            direction: SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PageWindow {
    pub offset: u64,
    pub size: u64,
}

impl Default for PageWindow {
    fn default() -> Self {
        Self {
            offset: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageWindow {
    pub fn with_size(size: u64) -> Self {
        Self {
            offset: 0,
            size: size.max(1),
        }
    }

    /// The following page, or `None` when `filtered_records` ends on this one.
    pub const fn next(self, filtered_records: u64) -> Option<Self> {
        let offset = match self.offset.checked_add(self.size) {
            Some(offset) => offset,
            None => return None,
        };
        if offset >= filtered_records {
            return None;
        }
        Some(Self {
            offset,
            size: self.size,
        })
    }

    pub const fn previous(self) -> Option<Self> {
        if self.offset == 0 {
            return None;
        }
        Some(Self {
            offset: self.offset.saturating_sub(self.size),
            size: self.size,
        })
    }

    #[must_use]
    pub const fn first(self) -> Self {
        Self {
            offset: 0,
            size: self.size,
        }
    }
}

/// Inclusive bounds in Unix seconds; `None` leaves that side open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

impl DateRange {
    pub const fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Builds a range from `YYYY-MM-DD` inputs. An empty input leaves that
    /// side open; the end date covers its whole day.
    pub fn from_date_inputs(start: &str, end: &str) -> Result<Self, DashboardError> {
        let start = parse_date(start)?
            .map(|date| date.and_time(NaiveTime::MIN).and_utc().timestamp());
        let end = parse_date(end)?.and_then(|date| {
            NaiveTime::from_hms_opt(23, 59, 59)
                .map(|time| date.and_time(time).and_utc().timestamp())
        });

        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(DashboardError::MalformedFilterState(
                    "start date is after end date".to_string(),
                ));
            }
        }

        Ok(Self { start, end })
    }
}

fn parse_date(input: &str) -> Result<Option<NaiveDate>, DashboardError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map(Some)
        .map_err(|err| DashboardError::MalformedFilterState(format!("date {input:?}: {err}")))
}

/// Sort, paging, date range and search: the view state serialized next to
/// the filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ViewState {
    pub sort: Sort,
    pub page: PageWindow,
    pub date_range: DateRange,
    pub search: Option<String>,
}

impl ViewState {
    pub fn with_page_size(size: u64) -> Self {
        Self {
            page: PageWindow::with_size(size),
            ..Self::default()
        }
    }
}

/// What a query string is being built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryTarget {
    /// Navigation URLs and page hydration.
    Page,
    /// Server-side grid request, `echo` is returned verbatim as `sEcho`.
    Grid { echo: u64 },
    /// Top-`limit` rows by `metric` for one bar chart.
    Ranked { metric: Metric, limit: usize },
    /// Stats and scatter points for one item.
    Detail,
}

pub fn encode(filters: &FilterSet, view: &ViewState, target: QueryTarget) -> String {
    let mut pairs: Vec<(String, String)> = Vec::new();

    if matches!(target, QueryTarget::Grid { .. }) {
        pairs.push(("datatables".into(), "true".into()));
    }

    for (i, filter) in filters.iter().enumerate() {
        let n = i + 1;
        pairs.push((format!("key_{n}"), filter.key.clone()));
        pairs.push((format!("value_{n}"), filter.value.clone()));
    }

    if let Some(start) = view.date_range.start {
        pairs.push(("start_date".into(), start.to_string()));
    }
    if let Some(end) = view.date_range.end {
        pairs.push(("end_date".into(), end.to_string()));
    }

    match target {
        QueryTarget::Page => {
            pairs.push(("sort_col".into(), view.sort.column.as_str().into()));
            pairs.push(("sort_dir".into(), view.sort.direction.as_str().into()));
            pairs.push(("start".into(), view.page.offset.to_string()));
            pairs.push(("length".into(), view.page.size.to_string()));
            if let Some(search) = view.search.as_deref().filter(|s| !s.is_empty()) {
                pairs.push(("search".into(), search.to_string()));
            }
        }
        QueryTarget::Grid { echo } => {
            pairs.push(("sEcho".into(), echo.to_string()));
            pairs.push(("iDisplayStart".into(), view.page.offset.to_string()));
            pairs.push(("iDisplayLength".into(), view.page.size.to_string()));
            pairs.push(("iSortingCols".into(), "1".into()));
            pairs.push((
                "iSortCol_0".into(),
                view.sort.column.wire_index().to_string(),
            ));
            pairs.push(("sSortDir_0".into(), view.sort.direction.as_str().into()));
            pairs.push((
                "sSearch".into(),
                view.search.clone().unwrap_or_default(),
            ));
        }
        QueryTarget::Ranked { metric, limit } => {
            pairs.push(("sort".into(), metric.as_str().into()));
            pairs.push(("limit".into(), limit.to_string()));
        }
        QueryTarget::Detail => {}
    }

    match serde_urlencoded::to_string(&pairs) {
        Ok(query) => query,
        Err(err) => {
            warn!(error = %err, "failed to encode query string");
            String::new()
        }
    }
}

/// Result of hydrating state from a page query, with whatever was dropped.
#[derive(Debug, Default)]
pub struct Decoded {
    pub filters: FilterSet,
    pub view: ViewState,
    pub issues: Vec<DashboardError>,
}

/// Hydrates `(FilterSet, ViewState)` from a page query. Malformed entries
/// are dropped and logged, never reported as errors.
pub fn decode(raw: &str) -> (FilterSet, ViewState) {
    let decoded = decode_with_issues(raw);
    for issue in &decoded.issues {
        debug!(%issue, "dropped query entry");
    }
    (decoded.filters, decoded.view)
}

pub fn decode_with_issues(raw: &str) -> Decoded {
    decode_with_base(raw, ViewState::default())
}

/// Like [`decode_with_issues`], but parameters absent from `raw` keep the
/// values of `base` (e.g. a configured page size).
pub fn decode_with_base(raw: &str, base: ViewState) -> Decoded {
    let raw = raw.trim_start_matches('?');
    let mut decoded = Decoded {
        view: base,
        ..Decoded::default()
    };

    let pairs: Vec<(String, String)> = match serde_urlencoded::from_str(raw) {
        Ok(pairs) => pairs,
        Err(err) => {
            decoded
                .issues
                .push(DashboardError::MalformedFilterState(err.to_string()));
            return decoded;
        }
    };

    let mut keys: BTreeMap<u32, String> = BTreeMap::new();
    let mut values: HashMap<u32, String> = HashMap::new();

    for (name, value) in pairs {
        if let Some(index) = name.strip_prefix("key_") {
            match index.parse::<u32>() {
                Ok(index) => {
                    keys.insert(index, value);
                }
                Err(_) => decoded.issues.push(malformed(&name, &value)),
            }
            continue;
        }
        if let Some(index) = name.strip_prefix("value_") {
            match index.parse::<u32>() {
                Ok(index) => {
                    values.insert(index, value);
                }
                Err(_) => decoded.issues.push(malformed(&name, &value)),
            }
            continue;
        }

        let view = &mut decoded.view;
        match name.as_str() {
            "start_date" => match value.trim().parse::<i64>() {
                Ok(ts) => view.date_range.start = Some(ts),
                Err(_) => decoded.issues.push(malformed(&name, &value)),
            },
            "end_date" => match value.trim().parse::<i64>() {
                Ok(ts) => view.date_range.end = Some(ts),
                Err(_) => decoded.issues.push(malformed(&name, &value)),
            },
            "sort_col" => match SortColumn::parse(&value) {
                Some(column) => view.sort.column = column,
                None => decoded.issues.push(malformed(&name, &value)),
            },
            "sort_dir" => match SortDirection::parse(&value) {
                Some(direction) => view.sort.direction = direction,
                None => decoded.issues.push(malformed(&name, &value)),
            },
            "start" => match value.trim().parse::<u64>() {
                Ok(offset) => view.page.offset = offset,
                Err(_) => decoded.issues.push(malformed(&name, &value)),
            },
            "length" => match value.trim().parse::<u64>() {
                Ok(size) if size > 0 => view.page.size = size,
                _ => decoded.issues.push(malformed(&name, &value)),
            },
            "search" => {
                if !value.is_empty() {
                    view.search = Some(value);
                }
            }
            // Cache busters, legacy counters and anything else are ignored.
            _ => {}
        }
    }

    for (index, key) in keys {
        match values.remove(&index) {
            Some(value) if !key.trim().is_empty() && !is_unselected(&value) => {
                decoded.filters = decoded.filters.add(&key, &value);
            }
            Some(value) => decoded
                .issues
                .push(malformed(&format!("key_{index}"), &format!("{key}={value}"))),
            None => decoded.issues.push(DashboardError::MalformedFilterState(format!(
                "key_{index} has no matching value_{index}"
            ))),
        }
    }

    for index in values.keys() {
        decoded.issues.push(DashboardError::MalformedFilterState(format!(
            "value_{index} has no matching key_{index}"
        )));
    }

    decoded
}

fn malformed(name: &str, value: &str) -> DashboardError {
    DashboardError::MalformedFilterState(format!("{name}={value:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn encode_numbers_filters_from_one() {
        let filters = FilterSet::new().add("host", "web-1").add("user", "alice");
        let query = encode(&filters, &ViewState::default(), QueryTarget::Detail);
        assert_eq!(query, "key_1=host&value_1=web-1&key_2=user&value_2=alice");
    }

    #[test]
    fn removal_leaves_no_gap_in_the_encoding() {
        let filters = FilterSet::new()
            .add("k1", "v1")
            .add("k2", "v2")
            .add("k3", "v3")
            .remove_at(1);
        let query = encode(&filters, &ViewState::default(), QueryTarget::Detail);
        assert_eq!(query, "key_1=k1&value_1=v1&key_2=k3&value_2=v3");
    }

    #[test]
    fn encode_ranked_adds_sort_and_limit_after_dates() {
        let filters = FilterSet::new().add("host", "web-1");
        let view = ViewState {
            date_range: DateRange {
                start: Some(100),
                end: Some(200),
            },
            ..ViewState::default()
        };
        let query = encode(
            &filters,
            &view,
            QueryTarget::Ranked {
                metric: Metric::Avg,
                limit: 6,
            },
        );
        assert_eq!(
            query,
            "key_1=host&value_1=web-1&start_date=100&end_date=200&sort=avg&limit=6"
        );
    }

    #[test]
    fn encode_grid_speaks_the_datatables_protocol() {
        let view = ViewState {
            sort: Sort {
                column: SortColumn::Count,
                direction: SortDirection::Asc,
            },
            page: PageWindow {
                offset: 20,
                size: 10,
            },
            search: Some("select".to_string()),
            ..ViewState::default()
        };
        let query = encode(&FilterSet::new(), &view, QueryTarget::Grid { echo: 7 });
        assert_eq!(
            query,
            "datatables=true&sEcho=7&iDisplayStart=20&iDisplayLength=10&iSortingCols=1\
             &iSortCol_0=2&sSortDir_0=asc&sSearch=select"
        );
    }

    #[test]
    fn encode_escapes_reserved_characters() {
        let filters = FilterSet::new().add("path", "/a b&c=d");
        let query = encode(&filters, &ViewState::default(), QueryTarget::Detail);
        assert_eq!(query, "key_1=path&value_1=%2Fa+b%26c%3Dd");
        let (decoded, _) = decode(&query);
        assert_eq!(decoded, filters);
    }

    #[test]
    fn decode_drops_keys_without_values() {
        let decoded = decode_with_issues("key_1=host&value_1=web-1&key_2=user");
        assert_eq!(decoded.filters.count(), 1);
        assert_eq!(decoded.issues.len(), 1);
    }

    #[test]
    fn decode_drops_sentinel_and_empty_values() {
        let (filters, _) = decode("key_1=host&value_1=0&key_2=user&value_2=");
        assert!(filters.is_empty());
    }

    #[test]
    fn decode_renumbers_gaps_in_index_order() {
        let (filters, _) = decode("key_5=c&value_5=3&key_1=a&value_1=1&key_3=b&value_3=2");
        let keys: Vec<_> = filters.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, ["a", "b", "c"]);
        let query = encode(&filters, &ViewState::default(), QueryTarget::Detail);
        assert!(query.starts_with("key_1=a&value_1=1&key_2=b&value_2=2&key_3=c"));
    }

    #[test]
    fn decode_ignores_non_numeric_dates() {
        let decoded = decode_with_issues("start_date=yesterday&end_date=1700000000");
        assert_eq!(decoded.view.date_range.start, None);
        assert_eq!(decoded.view.date_range.end, Some(1_700_000_000));
        assert_eq!(decoded.issues.len(), 1);
    }

    #[test]
    fn decode_accepts_a_leading_question_mark_and_unknown_params() {
        let (filters, view) = decode("?_=12345&num_filters=1&key_1=host&value_1=a");
        assert_eq!(filters.count(), 1);
        assert_eq!(view, ViewState::default());
    }

    #[test]
    fn decode_of_empty_input_is_the_default_state() {
        let (filters, view) = decode("");
        assert!(filters.is_empty());
        assert_eq!(view, ViewState::default());
    }

    #[test]
    fn decode_with_base_keeps_the_configured_page_size() {
        let decoded = decode_with_base("key_1=host&value_1=a", ViewState::with_page_size(25));
        assert_eq!(decoded.view.page.size, 25);
        let decoded = decode_with_base("length=50", ViewState::with_page_size(25));
        assert_eq!(decoded.view.page.size, 50);
    }

    #[test]
    fn page_window_stops_at_the_last_page() {
        let page = PageWindow {
            offset: 10,
            size: 10,
        };
        assert_eq!(page.next(25).map(|p| p.offset), Some(20));
        assert_eq!(page.next(20), None);
        assert_eq!(page.previous().map(|p| p.offset), Some(0));
        assert_eq!(page.first().previous(), None);
    }

    #[test]
    fn next_page_from_a_huge_start_offset_is_none() {
        let (_, view) = decode("start=18446744073709551615&length=10");
        assert_eq!(view.page.offset, u64::MAX);
        assert_eq!(view.page.next(100), None);
        assert_eq!(view.page.next(u64::MAX), None);
    }

    #[test]
    fn date_inputs_cover_whole_days() -> Result<(), DashboardError> {
        let range = DateRange::from_date_inputs("2024-01-01", "2024-01-01")?;
        assert_eq!(range.start, Some(1_704_067_200));
        assert_eq!(range.end, Some(1_704_067_200 + 86_399));

        let open = DateRange::from_date_inputs("", "")?;
        assert!(open.is_unbounded());
        Ok(())
    }

    #[test]
    fn date_inputs_reject_garbage_and_reversed_ranges() {
        assert!(DateRange::from_date_inputs("01/02/2024", "").is_err());
        assert!(DateRange::from_date_inputs("2024-02-01", "2024-01-01").is_err());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(String, String),
        Remove(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            ("[a-z_ ]{0,6}", "[ -~é]{0,8}").prop_map(|(k, v)| Op::Add(k, v)),
            (0usize..6).prop_map(Op::Remove),
        ]
    }

    fn view_state() -> impl Strategy<Value = ViewState> {
        (
            0usize..6,
            any::<bool>(),
            0u64..10_000,
            1u64..500,
            proptest::option::of(any::<i64>()),
            proptest::option::of(any::<i64>()),
            proptest::option::of("[a-z%& ]{1,8}"),
        )
            .prop_map(|(column, asc, offset, size, start, end, search)| ViewState {
                sort: Sort {
                    column: SortColumn::from_index(column).unwrap_or(SortColumn::Total),
                    direction: if asc {
                        SortDirection::Asc
                    } else {
                        SortDirection::Desc
                    },
                },
                page: PageWindow { offset, size },
                date_range: DateRange { start, end },
                search,
            })
    }

    proptest! {
        #[test]
        fn page_queries_round_trip(ops in proptest::collection::vec(op(), 0..12), view in view_state()) {
            let mut filters = FilterSet::new();
            for op in ops {
                filters = match op {
                    Op::Add(k, v) => filters.add(&k, &v),
                    Op::Remove(i) => filters.remove_at(i),
                };
            }

            let query = encode(&filters, &view, QueryTarget::Page);
            let decoded = decode_with_issues(&query);
            prop_assert!(decoded.issues.is_empty(), "issues: {:?}", decoded.issues);
            prop_assert_eq!(decoded.filters, filters);
            prop_assert_eq!(decoded.view, view);
        }
    }
}
