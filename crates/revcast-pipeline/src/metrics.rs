use crate::table::ForecastTable;
use serde::{Serialize, Serializer};
use std::fmt;

/// Year-over-year growth needs at least a full year of monthly points.
pub const YOY_MIN_POINTS: usize = 12;

/// A growth rate in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Growth {
    /// No predecessor, or not enough history.
    Absent,
    /// The base value is zero or not finite.
    Undefined,
    /// Percentage change.
    Pct(f64),
}

impl Growth {
    /// Percentage change from `base` to `current`.
    pub fn between(base: f64, current: f64) -> Self {
        if base == 0.0 || !base.is_finite() || !current.is_finite() {
            return Growth::Undefined;
        }
        let pct = (current - base) / base * 100.0;
        if pct.is_finite() {
            Growth::Pct(pct)
        } else {
            Growth::Undefined
        }
    }

    /// The percentage, if defined.
    pub fn pct(&self) -> Option<f64> {
        match self {
            Growth::Pct(p) => Some(*p),
            _ => None,
        }
    }
}

impl Serialize for Growth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Growth::Absent => serializer.serialize_none(),
            Growth::Undefined => serializer.serialize_str("undefined"),
            Growth::Pct(p) => serializer.serialize_f64(*p),
        }
    }
}

impl fmt::Display for Growth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Growth::Absent => Ok(()),
            Growth::Undefined => write!(f, "n/a"),
            Growth::Pct(p) => write!(f, "{p:.2}"),
        }
    }
}

/// Month-over-month growth; the first entry is always [`Growth::Absent`].
pub fn month_over_month(values: &[f64]) -> Vec<Growth> {
    let mut out = Vec::with_capacity(values.len());
    if !values.is_empty() {
        out.push(Growth::Absent);
    }
    out.extend(values.windows(2).map(|w| Growth::between(w[0], w[1])));
    out
}

/// Growth from the first to the last value, or [`Growth::Absent`] with fewer
/// than [`YOY_MIN_POINTS`] values.
pub fn year_over_year(values: &[f64]) -> Growth {
    match (values.len() >= YOY_MIN_POINTS, values.first(), values.last()) {
        (true, Some(first), Some(last)) => Growth::between(*first, *last),
        _ => Growth::Absent,
    }
}

/// Growth metrics derived from a forecast table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthSeries {
    /// One entry per forecast point.
    pub mom: Vec<Growth>,
    /// First-to-last growth over the horizon.
    pub yoy: Growth,
}

impl GrowthSeries {
    /// Derive growth from the point forecasts of `table`.
    pub fn derive(table: &ForecastTable) -> Self {
        let values = table.predicted_values();
        Self {
            mom: month_over_month(&values),
            yoy: year_over_year(&values),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::table::ForecastPoint;
    use chrono::NaiveDate;

    fn assert_pct(growth: Growth, expected: f64) {
        let pct = growth.pct().unwrap_or_else(|| panic!("expected Pct, got {growth:?}"));
        assert!((pct - expected).abs() < 1e-9, "{pct} != {expected}");
    }

    fn table(values: &[f64]) -> ForecastTable {
        let points = values
            .iter()
            .enumerate()
            .map(|(i, v)| ForecastPoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Months::new(i as u32),
                predicted: *v,
                lower: v - 1.0,
                upper: v + 1.0,
            })
            .collect();
        ForecastTable::from_points(points)
    }

    #[test]
    fn test_two_months() {
        let series = GrowthSeries::derive(&table(&[100.0, 110.0]));
        assert_eq!(series.mom[0], Growth::Absent);
        assert_pct(series.mom[1], 10.0);
        assert_eq!(series.yoy, Growth::Absent);
    }

    #[test]
    fn test_mom_shape() {
        for n in 0..15 {
            let values: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
            let mom = month_over_month(&values);
            assert_eq!(mom.len(), n);
            if n > 0 {
                assert_eq!(mom[0], Growth::Absent);
                assert!(mom[1..].iter().all(|g| *g != Growth::Absent));
            }
        }
    }

    #[test]
    fn test_yoy_needs_twelve_points() {
        let eleven: Vec<f64> = (0..11).map(|i| 100.0 + i as f64).collect();
        assert_eq!(year_over_year(&eleven), Growth::Absent);

        let twelve: Vec<f64> = (0..12).map(|i| 100.0 + i as f64 * 50.0 / 11.0).collect();
        assert_pct(year_over_year(&twelve), 50.0);
    }

    #[test]
    fn test_zero_base_is_undefined() {
        assert_eq!(month_over_month(&[0.0, 10.0])[1], Growth::Undefined);
        let mut values = vec![0.0];
        values.extend((1..12).map(|i| i as f64));
        assert_eq!(year_over_year(&values), Growth::Undefined);
        assert_eq!(Growth::between(f64::NAN, 1.0), Growth::Undefined);
    }

    #[test]
    fn test_negative_growth() {
        assert_pct(Growth::between(200.0, 150.0), -25.0);
    }

    #[test]
    fn test_serialize_and_display() {
        assert_eq!(serde_json::to_value(Growth::Absent).unwrap(), serde_json::Value::Null);
        assert_eq!(serde_json::to_value(Growth::Undefined).unwrap(), "undefined");
        assert_eq!(serde_json::to_value(Growth::Pct(2.5)).unwrap(), 2.5);
        assert_eq!(Growth::Pct(10.0).to_string(), "10.00");
        assert_eq!(Growth::Undefined.to_string(), "n/a");
        assert_eq!(Growth::Absent.to_string(), "");
    }
}
