use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One cell of an uploaded spreadsheet.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Blank cell.
    Empty,
    /// Text cell.
    Text(String),
    /// Numeric cell (integers are widened).
    Number(f64),
    /// Boolean cell.
    Bool(bool),
    /// Date-formatted cell.
    Date(NaiveDate),
}

impl Cell {
    /// Whether the cell holds nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(t) => t.trim().is_empty(),
            _ => false,
        }
    }

    /// Short type name used in validation messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Cell::Empty => "empty",
            Cell::Text(_) => "text",
            Cell::Number(_) => "number",
            Cell::Bool(_) => "boolean",
            Cell::Date(_) => "date",
        }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(t) => write!(f, "{t}"),
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Date(d) => write!(f, "{d}"),
        }
    }
}

/// A raw uploaded dataset: a header row and the data rows beneath it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// Column headers, in sheet order.
    pub headers: Vec<String>,
    /// Data rows. Rows may be shorter than the header row.
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    /// Create a table from headers and rows.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { headers, rows }
    }

    /// Index of the column whose trimmed header equals `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }
}

/// Names of the date and value columns in the uploaded dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Column holding the observation dates.
    #[serde(default = "default_date_column")]
    pub date_column: String,
    /// Column holding the revenue/budget values.
    #[serde(default = "default_value_column")]
    pub value_column: String,
}

fn default_date_column() -> String {
    "Date".to_string()
}

fn default_value_column() -> String {
    "Revenue".to_string()
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            date_column: default_date_column(),
            value_column: default_value_column(),
        }
    }
}

impl ColumnSpec {
    /// Spec with explicit column names.
    pub fn new(date_column: impl Into<String>, value_column: impl Into<String>) -> Self {
        Self {
            date_column: date_column.into(),
            value_column: value_column.into(),
        }
    }
}

/// One historical data point fed to the forecaster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Observation date.
    pub date: NaiveDate,
    /// Revenue/budget value.
    pub value: f64,
}

impl Observation {
    /// Create an observation.
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}
