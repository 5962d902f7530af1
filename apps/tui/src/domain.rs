use serde::Serialize;

/// Maximum number of characters shown for a row label in tables and charts.
pub const LABEL_WIDTH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    CallStacks,
    SqlStatements,
    FileAccesses,
}

impl Collection {
    pub const ALL: [Self; 3] = [Self::CallStacks, Self::SqlStatements, Self::FileAccesses];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CallStacks => "callstacks",
            Self::SqlStatements => "sqlstatements",
            Self::FileAccesses => "fileaccesses",
        }
    }

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::CallStacks),
            1 => Some(Self::SqlStatements),
            2 => Some(Self::FileAccesses),
            _ => None,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "callstacks" => Some(Self::CallStacks),
            "sqlstatements" => Some(Self::SqlStatements),
            "fileaccesses" => Some(Self::FileAccesses),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::CallStacks => "Call Stacks",
            Self::SqlStatements => "SQL Statements",
            Self::FileAccesses => "File Accesses",
        }
    }

    /// Header of the label column in the grid.
    pub const fn label_column(self) -> &'static str {
        match self {
            Self::CallStacks => "Function",
            Self::SqlStatements => "Statement",
            Self::FileAccesses => "File",
        }
    }
}

/// A dashboard page: the aggregate overview of a collection, or the detail
/// page of one aggregate row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PageKind {
    Overview {
        collection: Collection,
    },
    Detail {
        collection: Collection,
        item_id: String,
    },
}

impl PageKind {
    pub const fn collection(&self) -> Collection {
        match self {
            Self::Overview { collection } | Self::Detail { collection, .. } => *collection,
        }
    }

    pub const fn is_detail(&self) -> bool {
        matches!(self, Self::Detail { .. })
    }

    pub fn path(&self) -> String {
        match self {
            Self::Overview { collection } => format!("/{}", collection.as_str()),
            Self::Detail {
                collection,
                item_id,
            } => format!("/{}/{}", collection.as_str(), urlencoding::encode(item_id)),
        }
    }
}

/// Numeric field a bar chart ranks rows by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Total,
    Avg,
    Count,
}

impl Metric {
    /// Chart order on the overview page.
    pub const ALL: [Self; 3] = [Self::Total, Self::Avg, Self::Count];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Total => "total",
            Self::Avg => "avg",
            Self::Count => "count",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "total" => Some(Self::Total),
            "avg" => Some(Self::Avg),
            "count" => Some(Self::Count),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Total => "Total Time",
            Self::Avg => "Average Time",
            Self::Count => "Call Count",
        }
    }
}

/// Sortable grid column. The index is the position in the wire row array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortColumn {
    Label,
    Count,
    Total,
    Avg,
    Min,
    Max,
}

impl SortColumn {
    pub const ALL: [Self; 6] = [
        Self::Label,
        Self::Count,
        Self::Total,
        Self::Avg,
        Self::Min,
        Self::Max,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Label => "label",
            Self::Count => "count",
            Self::Total => "total",
            Self::Avg => "avg",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "label" => Some(Self::Label),
            "count" => Some(Self::Count),
            "total" => Some(Self::Total),
            "avg" => Some(Self::Avg),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            _ => None,
        }
    }

    pub const fn wire_index(self) -> usize {
        match self {
            Self::Label => 1,
            Self::Count => 2,
            Self::Total => 3,
            Self::Avg => 4,
            Self::Min => 5,
            Self::Max => 6,
        }
    }

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Label),
            1 => Some(Self::Count),
            2 => Some(Self::Total),
            3 => Some(Self::Avg),
            4 => Some(Self::Min),
            5 => Some(Self::Max),
            _ => None,
        }
    }

    pub const fn position(self) -> usize {
        self.wire_index() - 1
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Label => "Name",
            Self::Count => "Count",
            Self::Total => "Total",
            Self::Avg => "Avg",
            Self::Min => "Min",
            Self::Max => "Max",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Shortens a label to `width` characters, ending in `...` when cut.
/// Newlines are flattened so multi-line SQL fits on one row.
pub fn truncate_label(label: &str, width: usize) -> String {
    let flat = label.replace('\n', " ");
    if flat.chars().count() <= width {
        return flat;
    }

    let keep = width.saturating_sub(3);
    let mut out: String = flat.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Rounds a metric to four decimal places for display.
pub fn round_metric(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
