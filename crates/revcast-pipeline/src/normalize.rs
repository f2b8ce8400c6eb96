//! Forecaster output normalization.
//!
//! The forecaster's output channel is not typed: callers may receive a native
//! record, JSON text, or text that only loosely encodes the table (JSON inside
//! prose, JSON lines, a printed text table). [`Normalizer`] runs an ordered
//! list of [`ParseStrategy`] implementations and keeps the first success.

use crate::frame::ColumnTable;
use revcast_core::ForecastError;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Raw forecaster output, tagged by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum RawForecast {
    /// A native mapping of column name to ordered values.
    Record(Map<String, Value>),
    /// A text payload.
    Text(String),
    /// Anything else.
    Unrecognized(Value),
}

impl RawForecast {
    /// Short name of the shape, for diagnostics.
    pub fn shape(&self) -> &'static str {
        match self {
            RawForecast::Record(_) => "record",
            RawForecast::Text(_) => "text",
            RawForecast::Unrecognized(Value::Null) => "null",
            RawForecast::Unrecognized(Value::Bool(_)) => "boolean",
            RawForecast::Unrecognized(Value::Number(_)) => "number",
            RawForecast::Unrecognized(Value::Array(_)) => "array",
            RawForecast::Unrecognized(_) => "unknown",
        }
    }

    /// Text form of the output, as handed to an agent or logged.
    pub fn into_text(self) -> String {
        match self {
            RawForecast::Record(map) => Value::Object(map).to_string(),
            RawForecast::Text(text) => text,
            RawForecast::Unrecognized(value) => value.to_string(),
        }
    }
}

impl From<Value> for RawForecast {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => RawForecast::Record(map),
            Value::String(text) => RawForecast::Text(text),
            other => RawForecast::Unrecognized(other),
        }
    }
}

impl From<String> for RawForecast {
    fn from(text: String) -> Self {
        RawForecast::Text(text)
    }
}

impl From<&str> for RawForecast {
    fn from(text: &str) -> Self {
        RawForecast::Text(text.to_string())
    }
}

/// Outcome of one parse strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt {
    /// The strategy produced a table.
    Parsed(ColumnTable),
    /// The payload is the forecaster reporting its own failure.
    Reported(String),
    /// The strategy applies to this shape but could not parse it.
    Failed(String),
    /// The strategy does not handle this shape.
    NotApplicable,
}

/// One way of turning raw forecaster output into a table.
pub trait ParseStrategy: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Try to parse `raw`.
    fn attempt(&self, raw: &RawForecast) -> Attempt;
}

/// Ordered chain of parse strategies, short-circuiting on the first success.
pub struct Normalizer {
    strategies: Vec<Box<dyn ParseStrategy>>,
}

impl Normalizer {
    /// A normalizer with no strategies; everything is a format error.
    pub fn empty() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Append a strategy to the end of the chain.
    pub fn with_strategy(mut self, strategy: impl ParseStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Strategy names in the order they are tried.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Normalize `raw` into a [`ColumnTable`].
    ///
    /// Fails with [`ForecastError::Unavailable`] when the payload is an error
    /// report from the forecaster, and with [`ForecastError::Format`] when no
    /// strategy can read it.
    pub fn normalize(&self, raw: &RawForecast) -> Result<ColumnTable, ForecastError> {
        let mut failures = Vec::new();

        for strategy in &self.strategies {
            match strategy.attempt(raw) {
                Attempt::Parsed(table) => {
                    debug!(
                        strategy = strategy.name(),
                        rows = table.row_count(),
                        columns = ?table.column_names(),
                        "Normalized forecaster output"
                    );
                    return Ok(table);
                }
                Attempt::Reported(message) => {
                    warn!(strategy = strategy.name(), error = %message, "Forecaster reported an error");
                    return Err(ForecastError::Unavailable(message));
                }
                Attempt::Failed(reason) => failures.push(format!("{}: {reason}", strategy.name())),
                Attempt::NotApplicable => {}
            }
        }

        warn!(shape = raw.shape(), failures = ?failures, "Forecaster output not recognized");
        if failures.is_empty() {
            Err(ForecastError::Format(format!(
                "forecaster output of shape '{}' is not a recognized format",
                raw.shape()
            )))
        } else {
            Err(ForecastError::Format(format!(
                "forecaster output could not be parsed ({})",
                failures.join("; ")
            )))
        }
    }
}

impl Default for Normalizer {
    /// Structured record, strict JSON, then the loose text strategies.
    fn default() -> Self {
        Self::empty()
            .with_strategy(StructuredRecord)
            .with_strategy(StrictJson)
            .with_strategy(EmbeddedJson)
            .with_strategy(JsonLines)
            .with_strategy(TextTable)
    }
}

// --- Strategies ---

/// Native column mapping.
pub struct StructuredRecord;

impl ParseStrategy for StructuredRecord {
    fn name(&self) -> &'static str {
        "structured_record"
    }

    fn attempt(&self, raw: &RawForecast) -> Attempt {
        match raw {
            RawForecast::Record(map) => table_from_object(map),
            _ => Attempt::NotApplicable,
        }
    }
}

/// The whole text is JSON: a column mapping or an array of records.
pub struct StrictJson;

impl ParseStrategy for StrictJson {
    fn name(&self) -> &'static str {
        "strict_json"
    }

    fn attempt(&self, raw: &RawForecast) -> Attempt {
        let RawForecast::Text(text) = raw else {
            return Attempt::NotApplicable;
        };
        match serde_json::from_str::<Value>(text.trim()) {
            Ok(value) => table_from_value(&value),
            Err(e) => Attempt::Failed(format!("invalid JSON: {e}")),
        }
    }
}

/// JSON embedded in surrounding prose or a markdown code fence, as agents
/// tend to answer.
pub struct EmbeddedJson;

impl ParseStrategy for EmbeddedJson {
    fn name(&self) -> &'static str {
        "embedded_json"
    }

    fn attempt(&self, raw: &RawForecast) -> Attempt {
        let RawForecast::Text(text) = raw else {
            return Attempt::NotApplicable;
        };
        let body = fenced_block(text).unwrap_or(text);
        let Some(candidate) = outermost_json(body) else {
            return Attempt::Failed("no embedded JSON object or array".to_string());
        };
        match serde_json::from_str::<Value>(candidate) {
            Ok(value) => table_from_value(&value),
            Err(e) => Attempt::Failed(format!("embedded JSON is invalid: {e}")),
        }
    }
}

/// One JSON record per line.
pub struct JsonLines;

impl ParseStrategy for JsonLines {
    fn name(&self) -> &'static str {
        "json_lines"
    }

    fn attempt(&self, raw: &RawForecast) -> Attempt {
        let RawForecast::Text(text) = raw else {
            return Attempt::NotApplicable;
        };
        let mut records = Vec::new();
        for (i, line) in text.lines().map(str::trim).filter(|l| !l.is_empty()).enumerate() {
            match serde_json::from_str::<Value>(line) {
                Ok(Value::Object(map)) => records.push(map),
                Ok(_) => return Attempt::Failed(format!("line {} is not a JSON record", i + 1)),
                Err(e) => return Attempt::Failed(format!("line {}: {e}", i + 1)),
            }
        }
        if records.is_empty() {
            return Attempt::Failed("no records".to_string());
        }
        Attempt::Parsed(ColumnTable::from_records(&records))
    }
}

/// A printed table: a header line followed by rows, separated by commas,
/// tabs, pipes (markdown) or runs of whitespace.
pub struct TextTable;

impl ParseStrategy for TextTable {
    fn name(&self) -> &'static str {
        "text_table"
    }

    fn attempt(&self, raw: &RawForecast) -> Attempt {
        let RawForecast::Text(text) = raw else {
            return Attempt::NotApplicable;
        };
        let body = fenced_block(text).unwrap_or(text).trim();
        let Some(header_line) = body.lines().find(|l| !l.trim().is_empty()) else {
            return Attempt::Failed("empty text".to_string());
        };

        let rows = if header_line.contains('|') {
            split_pipe_table(body)
        } else if header_line.contains('\t') {
            split_delimited(body, b'\t')
        } else if header_line.contains(',') {
            split_delimited(body, b',')
        } else {
            Ok(split_whitespace_table(body))
        };

        let rows = match rows {
            Ok(rows) => rows,
            Err(reason) => return Attempt::Failed(reason),
        };

        let mut rows = rows.into_iter();
        let Some(headers) = rows.next() else {
            return Attempt::Failed("empty text".to_string());
        };
        if headers.len() < 2 {
            return Attempt::Failed("header line has fewer than two columns".to_string());
        }

        let mut columns: Vec<(String, Vec<Value>)> =
            headers.into_iter().map(|h| (h, Vec::new())).collect();
        let mut row_count = 0;
        for (i, row) in rows.enumerate() {
            if row.len() != columns.len() {
                return Attempt::Failed(format!(
                    "row {} has {} fields, expected {}",
                    i + 1,
                    row.len(),
                    columns.len()
                ));
            }
            for (column, cell) in columns.iter_mut().zip(row) {
                column.1.push(text_cell(&cell));
            }
            row_count += 1;
        }
        if row_count == 0 {
            return Attempt::Failed("no data rows below the header".to_string());
        }

        match ColumnTable::from_columns(columns) {
            Ok(table) => Attempt::Parsed(table),
            Err(reason) => Attempt::Failed(reason),
        }
    }
}

// --- Helpers ---

fn table_from_value(value: &Value) -> Attempt {
    match value {
        Value::Object(map) => table_from_object(map),
        Value::Array(items) => {
            let mut records = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::Object(map) => records.push(map.clone()),
                    _ => return Attempt::Failed("array items are not records".to_string()),
                }
            }
            Attempt::Parsed(ColumnTable::from_records(&records))
        }
        Value::String(_) => Attempt::Failed("JSON string is not a table".to_string()),
        Value::Number(_) => Attempt::Failed("JSON number is not a table".to_string()),
        Value::Bool(_) => Attempt::Failed("JSON boolean is not a table".to_string()),
        Value::Null => Attempt::Failed("JSON null is not a table".to_string()),
    }
}

fn table_from_object(map: &Map<String, Value>) -> Attempt {
    if let Some(error) = map.get("error") {
        if map.values().all(|v| !v.is_array() && !v.is_object()) {
            let message = error
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Attempt::Reported(message);
        }
    }

    // Split orientation: {"columns": [...], "data": [[...], ...]}
    if let (Some(Value::Array(names)), Some(Value::Array(data))) = (map.get("columns"), map.get("data")) {
        return table_from_split(names, data);
    }

    let mut columns = Vec::with_capacity(map.len());
    for (name, values) in map {
        match values {
            Value::Array(items) => columns.push((name.clone(), items.clone())),
            Value::Object(indexed) => columns.push((name.clone(), index_ordered(indexed))),
            _ => return Attempt::Failed(format!("column '{name}' is not a sequence")),
        }
    }

    match ColumnTable::from_columns(columns) {
        Ok(table) => Attempt::Parsed(table),
        Err(reason) => Attempt::Failed(reason),
    }
}

fn table_from_split(names: &[Value], data: &[Value]) -> Attempt {
    let mut columns: Vec<(String, Vec<Value>)> = Vec::with_capacity(names.len());
    for name in names {
        match name.as_str() {
            Some(n) => columns.push((n.to_string(), Vec::with_capacity(data.len()))),
            None => return Attempt::Failed("split column names must be strings".to_string()),
        }
    }
    for (i, row) in data.iter().enumerate() {
        let Some(cells) = row.as_array().filter(|c| c.len() == columns.len()) else {
            return Attempt::Failed(format!("split data row {i} does not match the columns"));
        };
        for (column, cell) in columns.iter_mut().zip(cells) {
            column.1.push(cell.clone());
        }
    }
    match ColumnTable::from_columns(columns) {
        Ok(table) => Attempt::Parsed(table),
        Err(reason) => Attempt::Failed(reason),
    }
}

/// Values of an index-keyed column (`{"0": .., "1": ..}`), ordered by index
/// when every key is numeric.
fn index_ordered(indexed: &Map<String, Value>) -> Vec<Value> {
    let mut keyed: Vec<(Option<u64>, &Value)> = indexed
        .iter()
        .map(|(k, v)| (k.parse::<u64>().ok(), v))
        .collect();
    if keyed.iter().all(|(k, _)| k.is_some()) {
        keyed.sort_by_key(|(k, _)| *k);
    }
    keyed.into_iter().map(|(_, v)| v.clone()).collect()
}

/// Contents of the first markdown code fence, if any.
fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after = &text[start + 3..];
    let body_start = after.find('\n')? + 1;
    let body = &after[body_start..];
    let end = body.find("```")?;
    Some(&body[..end])
}

/// The span from the first `{` or `[` to the matching last `}` or `]`.
fn outermost_json(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let close = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

fn split_delimited(body: &str, delimiter: u8) -> Result<Vec<Vec<String>>, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| format!("delimited text: {e}"))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

fn split_pipe_table(body: &str) -> Result<Vec<Vec<String>>, String> {
    let rows = body
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter(|l| !is_separator_row(l))
        .map(|l| {
            l.trim_matches('|')
                .split('|')
                .map(|cell| cell.trim().to_string())
                .collect()
        })
        .collect();
    Ok(rows)
}

fn is_separator_row(line: &str) -> bool {
    line.chars().all(|c| matches!(c, '|' | '-' | ':' | ' ' | '+'))
}

fn split_whitespace_table(body: &str) -> Vec<Vec<String>> {
    body.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| l.split_whitespace().map(str::to_string).collect())
        .collect()
}

fn text_cell(cell: &str) -> Value {
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") || cell.eq_ignore_ascii_case("null") {
        return Value::Null;
    }
    match cell.parse::<f64>() {
        Ok(n) => serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(cell.to_string())),
        Err(_) => Value::String(cell.to_string()),
    }
}
