use crate::columns::{DATE, FORECAST, FORECAST_COLUMNS, LOWER, UPPER};
use crate::dates::{from_epoch_millis, parse_date_text};
use crate::frame::ColumnTable;
use chrono::NaiveDate;
use revcast_core::ForecastError;
use serde::Serialize;
use serde_json::Value;

/// One forecast period. `lower <= predicted <= upper` is expected from the
/// forecaster but not checked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    /// Period date.
    pub date: NaiveDate,
    /// Point forecast.
    pub predicted: f64,
    /// Lower confidence bound.
    pub lower: f64,
    /// Upper confidence bound.
    pub upper: f64,
}

/// Forecast points in ascending date order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ForecastTable {
    points: Vec<ForecastPoint>,
}

impl ForecastTable {
    /// Build from points, sorting them by date. The sort is stable, so points
    /// sharing a date keep their received order.
    pub fn from_points(mut points: Vec<ForecastPoint>) -> Self {
        points.sort_by_key(|p| p.date);
        Self { points }
    }

    /// Extract from a display-named column table. A table without rows is a
    /// format error; there is nothing to report on.
    pub fn from_columns(table: &ColumnTable) -> Result<Self, ForecastError> {
        let missing: Vec<&str> = FORECAST_COLUMNS
            .into_iter()
            .filter(|name| table.column(name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ForecastError::Format(format!(
                "forecast output is missing column(s): {}",
                missing.join(", ")
            )));
        }
        if table.is_empty() {
            return Err(ForecastError::Format("forecast output has no rows".into()));
        }

        let column = |name: &str| table.column(name).unwrap_or_default();
        let (dates, predicted, lower, upper) =
            (column(DATE), column(FORECAST), column(LOWER), column(UPPER));

        let mut points = Vec::with_capacity(table.row_count());
        for i in 0..table.row_count() {
            points.push(ForecastPoint {
                date: date_value(&dates[i]).ok_or_else(|| {
                    ForecastError::Format(format!("row {i}: '{}' is not a date", dates[i]))
                })?,
                predicted: number_value(&predicted[i], FORECAST, i)?,
                lower: number_value(&lower[i], LOWER, i)?,
                upper: number_value(&upper[i], UPPER, i)?,
            });
        }

        Ok(Self::from_points(points))
    }

    /// Points in date order.
    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    /// Number of periods.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether there are no periods.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point forecasts in date order.
    pub fn predicted_values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.predicted).collect()
    }
}

fn date_value(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => parse_date_text(s),
        Value::Number(n) => n.as_i64().and_then(from_epoch_millis),
        _ => None,
    }
}

fn number_value(value: &Value, column: &str, row: usize) -> Result<f64, ForecastError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).ok_or_else(|| {
        ForecastError::Format(format!("row {row}: '{column}' value {value} is not numeric"))
    })
}
