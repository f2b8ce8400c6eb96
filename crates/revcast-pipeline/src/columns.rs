use crate::frame::{Column, ColumnTable};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Display name of the forecast date column.
pub const DATE: &str = "Date";
/// Display name of the point forecast column.
pub const FORECAST: &str = "Forecast Revenue";
/// Display name of the lower confidence bound column.
pub const LOWER: &str = "Lower Estimate";
/// Display name of the upper confidence bound column.
pub const UPPER: &str = "Upper Estimate";
/// Display name of the month-over-month growth column.
pub const MOM: &str = "MoM Growth %";
/// Display name of the year-over-year summary.
pub const YOY: &str = "Year-over-Year Growth %";

/// Display columns a forecast table must carry.
pub const FORECAST_COLUMNS: [&str; 4] = [DATE, FORECAST, LOWER, UPPER];

/// Immutable rename table from forecaster field names to display names.
///
/// Deserializes from a TOML/JSON table of `source = "Target"` pairs merged over
/// [`ColumnMap::forecaster_defaults`]. Each target must be one of
/// [`FORECAST_COLUMNS`]; an override replaces the default source for its target.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "BTreeMap<String, String>")]
pub struct ColumnMap {
    entries: Vec<(String, String)>,
}

impl ColumnMap {
    /// Rename table for the forecaster's `ds`/`yhat`/`yhat_lower`/`yhat_upper`.
    pub fn forecaster_defaults() -> Self {
        let entries = ["ds", "yhat", "yhat_lower", "yhat_upper"]
            .into_iter()
            .zip(FORECAST_COLUMNS)
            .map(|(s, t)| (s.to_string(), t.to_string()))
            .collect();
        Self { entries }
    }

    /// Map `source` onto the display column `target`, replacing whichever
    /// source previously fed that column.
    pub fn with_source(mut self, source: &str, target: &str) -> Result<Self, String> {
        if !FORECAST_COLUMNS.contains(&target) {
            return Err(format!(
                "rename target '{target}' for '{source}' must be one of: {}",
                FORECAST_COLUMNS.join(", ")
            ));
        }
        self.entries.retain(|(s, t)| s != source && t != target);
        self.entries.push((source.to_string(), target.to_string()));
        Ok(self)
    }

    /// Display name for `source`, if mapped.
    pub fn target(&self, source: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(s, _)| s == source)
            .map(|(_, t)| t.as_str())
    }

    /// Forecaster field feeding the display column `target`.
    pub fn source(&self, target: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, t)| t == target)
            .map(|(s, _)| s.as_str())
    }

    /// Rename the columns of `table`.
    ///
    /// Each column is looked up once, so applying the map to an already
    /// renamed table changes nothing. Unmapped columns pass through and absent
    /// source columns are ignored.
    pub fn apply(&self, table: ColumnTable) -> ColumnTable {
        let columns = table
            .into_columns()
            .into_iter()
            .map(|column| match self.target(&column.name) {
                Some(target) => {
                    debug!(from = %column.name, to = %target, "Renamed column");
                    Column {
                        name: target.to_string(),
                        values: column.values,
                    }
                }
                None => column,
            })
            .collect();
        ColumnTable::from_parts(columns)
    }
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self::forecaster_defaults()
    }
}

impl TryFrom<BTreeMap<String, String>> for ColumnMap {
    type Error = String;

    fn try_from(overrides: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        let map = overrides
            .iter()
            .try_fold(Self::forecaster_defaults(), |map, (source, target)| {
                map.with_source(source, target)
            })?;
        match FORECAST_COLUMNS.iter().find(|t| map.source(t).is_none()) {
            Some(orphan) => Err(format!("rename table leaves '{orphan}' without a source field")),
            None => Ok(map),
        }
    }
}
