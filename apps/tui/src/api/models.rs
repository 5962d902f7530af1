use crate::domain::Metric;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One summarized statistic group, e.g. a call stack or an SQL statement.
///
/// On the wire a row is the positional array
/// `[id, label, count, total, avg, min, max]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireRow")]
pub struct AggregateRow {
    pub id: String,
    pub label: String,
    pub count: u64,
    pub total: f64,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

impl AggregateRow {
    pub const fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Total => self.total,
            Metric::Avg => self.avg,
            #[allow(clippy::cast_precision_loss)]
            Metric::Count => self.count as f64,
        }
    }
}

#[derive(Deserialize)]
struct WireRow(
    Value,
    Option<String>,
    Option<u64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
);

impl TryFrom<WireRow> for AggregateRow {
    type Error = String;

    fn try_from(row: WireRow) -> Result<Self, Self::Error> {
        let WireRow(id, label, count, total, avg, min, max) = row;
        Ok(Self {
            id: id_string(&id)?,
            label: label.unwrap_or_default(),
            count: count.unwrap_or_default(),
            total: total.unwrap_or_default(),
            avg: avg.unwrap_or_default(),
            min: min.unwrap_or_default(),
            max: max.unwrap_or_default(),
        })
    }
}

/// Ids are opaque; the backend sends numbers today but strings are accepted.
fn id_string(value: &Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(format!("unsupported row id: {other}")),
    }
}

/// One page of the server-side grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridPage {
    #[serde(rename(deserialize = "aaData"))]
    pub rows: Vec<AggregateRow>,
    #[serde(rename(deserialize = "sEcho"), default)]
    pub echo: u64,
    #[serde(rename(deserialize = "iTotalRecords"), default)]
    pub total_records: u64,
    #[serde(rename(deserialize = "iTotalDisplayRecords"), default)]
    pub filtered_records: u64,
}

impl GridPage {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// "`first` to `last` of `filtered`", 1-based, for the rows at `offset`.
    pub fn info(&self, offset: u64) -> String {
        if self.rows.is_empty() {
            return "0 to 0 of 0".to_string();
        }
        let first = offset.saturating_add(1);
        let last = offset.saturating_add(self.rows.len() as u64);
        format!("{first} to {last} of {}", self.filtered_records)
    }
}

/// Top-N rows for each chart metric. Each list is ranked independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Rankings {
    pub total: Vec<AggregateRow>,
    pub avg: Vec<AggregateRow>,
    pub count: Vec<AggregateRow>,
}

impl Rankings {
    pub fn for_metric(&self, metric: Metric) -> &[AggregateRow] {
        match metric {
            Metric::Total => &self.total,
            Metric::Avg => &self.avg,
            Metric::Count => &self.count,
        }
    }

    pub fn set(&mut self, metric: Metric, rows: Vec<AggregateRow>) {
        match metric {
            Metric::Total => self.total = rows,
            Metric::Avg => self.avg = rows,
            Metric::Count => self.count = rows,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DetailStats {
    pub count: u64,
    pub total: f64,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

/// One recorded event on the detail page's scatter chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    /// Seconds.
    pub duration: f64,
    /// Unix seconds.
    pub timestamp: f64,
    pub event_id: String,
}

#[derive(Deserialize)]
struct WirePoint(f64, f64, Value);

/// Stats and per-event durations of a single aggregate row.
///
/// Wire shape: `[id, label, count, total, avg, min, max, [[duration, ts, eventId], ...]]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireDetail")]
pub struct DetailSeries {
    pub id: String,
    pub label: String,
    pub stats: DetailStats,
    pub points: Vec<SeriesPoint>,
}

#[derive(Deserialize)]
struct WireDetail(
    Value,
    Option<String>,
    Option<u64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    #[serde(default)] Vec<WirePoint>,
);

impl TryFrom<WireDetail> for DetailSeries {
    type Error = String;

    fn try_from(detail: WireDetail) -> Result<Self, Self::Error> {
        let WireDetail(id, label, count, total, avg, min, max, points) = detail;
        let mut points = points
            .into_iter()
            .map(|WirePoint(duration, timestamp, event_id)| {
                Ok(SeriesPoint {
                    duration,
                    timestamp,
                    event_id: id_string(&event_id)?,
                })
            })
            .collect::<Result<Vec<_>, String>>()?;
        points.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

        Ok(Self {
            id: id_string(&id)?,
            label: label.unwrap_or_default(),
            stats: DetailStats {
                count: count.unwrap_or_default(),
                total: total.unwrap_or_default(),
                avg: avg.unwrap_or_default(),
                min: min.unwrap_or_default(),
                max: max.unwrap_or_default(),
            },
            points,
        })
    }
}

impl DetailSeries {
    /// `(min, max)` of timestamps and durations, or `None` without points.
    pub fn bounds(&self) -> Option<([f64; 2], [f64; 2])> {
        let first = self.points.first()?;
        let mut time = [first.timestamp, first.timestamp];
        let mut duration = [first.duration, first.duration];
        for point in &self.points {
            time[0] = time[0].min(point.timestamp);
            time[1] = time[1].max(point.timestamp);
            duration[0] = duration[0].min(point.duration);
            duration[1] = duration[1].max(point.duration);
        }
        Some((time, duration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_row_reads_the_positional_array() -> Result<(), serde_json::Error> {
        let row: AggregateRow =
            serde_json::from_str(r#"[42, "views.index", 3, 1.5, 0.5, 0.25, 0.75]"#)?;
        assert_eq!(row.id, "42");
        assert_eq!(row.label, "views.index");
        assert_eq!(row.count, 3);
        assert!((row.metric(Metric::Total) - 1.5).abs() < f64::EPSILON);
        assert!((row.metric(Metric::Count) - 3.0).abs() < f64::EPSILON);
        Ok(())
    }

    #[test]
    fn aggregate_row_tolerates_nulls() -> Result<(), serde_json::Error> {
        let row: AggregateRow = serde_json::from_str(r#"["abc", null, 0, null, null, null, null]"#)?;
        assert_eq!(row.id, "abc");
        assert_eq!(row.label, "");
        assert!(row.avg.abs() < f64::EPSILON);
        Ok(())
    }

    #[test]
    fn aggregate_row_rejects_object_ids() {
        let row = serde_json::from_str::<AggregateRow>(r#"[{}, "x", 1, 1, 1, 1, 1]"#);
        assert!(row.is_err());
    }

    #[test]
    fn grid_page_reads_the_datatables_envelope() -> Result<(), serde_json::Error> {
        let page: GridPage = serde_json::from_str(
            r#"{"aaData": [[1, "a", 2, 2.0, 1.0, 0.5, 1.5]], "sEcho": 4,
                "iTotalRecords": 40, "iTotalDisplayRecords": 12}"#,
        )?;
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.echo, 4);
        assert_eq!(page.filtered_records, 12);
        assert_eq!(page.info(10), "11 to 11 of 12");
        assert_eq!(GridPage::default().info(0), "0 to 0 of 0");
        Ok(())
    }

    #[test]
    fn grid_info_saturates_at_huge_offsets() {
        let page = GridPage {
            rows: vec![AggregateRow {
                id: "1".to_string(),
                label: "a".to_string(),
                count: 1,
                total: 1.0,
                avg: 1.0,
                min: 1.0,
                max: 1.0,
            }],
            echo: 1,
            total_records: 1,
            filtered_records: 1,
        };
        let max = u64::MAX;
        assert_eq!(page.info(max), format!("{max} to {max} of 1"));
    }

    #[test]
    fn detail_series_sorts_points_by_time() -> Result<(), serde_json::Error> {
        let series: DetailSeries = serde_json::from_str(
            r#"[7, "SELECT 1", 2, 3.0, 1.5, 1.0, 2.0, [[2.0, 200, 11], [1.0, 100, 10]]]"#,
        )?;
        assert_eq!(series.stats.count, 2);
        assert_eq!(series.points[0].event_id, "10");
        assert_eq!(series.bounds(), Some(([100.0, 200.0], [1.0, 2.0])));
        Ok(())
    }
}
