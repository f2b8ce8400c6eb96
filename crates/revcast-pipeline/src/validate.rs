use crate::dates::parse_date_text;
use crate::observation::{Cell, ColumnSpec, Observation, RawTable};
use chrono::NaiveDate;
use revcast_core::ForecastError;
use tracing::{debug, warn};

/// Check that `table` carries the configured date and value columns and
/// convert its rows to observations, preserving row order.
///
/// Fails with [`ForecastError::Schema`] naming every missing column, or with
/// [`ForecastError::InvalidRow`] on the first unparseable date or value.
/// Rows in which every cell is blank are spreadsheet padding and are skipped.
pub fn validate(table: &RawTable, spec: &ColumnSpec) -> Result<Vec<Observation>, ForecastError> {
    let date_idx = table.column_index(&spec.date_column);
    let value_idx = table.column_index(&spec.value_column);

    let (date_idx, value_idx) = match (date_idx, value_idx) {
        (Some(d), Some(v)) => (d, v),
        _ => {
            let mut missing = Vec::new();
            if date_idx.is_none() {
                missing.push(spec.date_column.clone());
            }
            if value_idx.is_none() {
                missing.push(spec.value_column.clone());
            }
            warn!(missing = ?missing, headers = ?table.headers, "Input is missing required columns");
            return Err(ForecastError::Schema { missing });
        }
    };

    let mut observations = Vec::with_capacity(table.rows.len());
    for (i, row) in table.rows.iter().enumerate() {
        if row.iter().all(Cell::is_empty) {
            continue;
        }
        // Header occupies spreadsheet row 1.
        let row_number = i + 2;
        let empty = Cell::Empty;

        let date = parse_date_cell(row.get(date_idx).unwrap_or(&empty)).map_err(|reason| {
            ForecastError::InvalidRow {
                row: row_number,
                column: spec.date_column.clone(),
                reason,
            }
        })?;
        let value = parse_value_cell(row.get(value_idx).unwrap_or(&empty)).map_err(|reason| {
            ForecastError::InvalidRow {
                row: row_number,
                column: spec.value_column.clone(),
                reason,
            }
        })?;

        observations.push(Observation::new(date, value));
    }

    debug!(count = observations.len(), "Validated observations");
    Ok(observations)
}

fn parse_date_cell(cell: &Cell) -> Result<NaiveDate, String> {
    match cell {
        Cell::Date(d) => Ok(*d),
        Cell::Text(t) => {
            parse_date_text(t).ok_or_else(|| format!("'{}' is not a recognizable date", t.trim()))
        }
        Cell::Empty => Err("date is missing".to_string()),
        other => Err(format!("expected a date, found {} '{other}'", other.kind())),
    }
}

fn parse_value_cell(cell: &Cell) -> Result<f64, String> {
    match cell {
        Cell::Number(n) if n.is_finite() => Ok(*n),
        Cell::Text(t) => t
            .trim()
            .replace(',', "")
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("'{}' is not a number", t.trim())),
        Cell::Empty => Err("value is missing".to_string()),
        other => Err(format!("expected a number, found {} '{other}'", other.kind())),
    }
}
