use crate::columns::{DATE, FORECAST, LOWER, MOM, UPPER};
use crate::forecaster::Frequency;
use crate::metrics::{Growth, GrowthSeries};
use crate::table::ForecastTable;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::Write as _;

/// One rendered row of the forecast grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    /// Period date.
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    /// Point forecast.
    #[serde(rename = "Forecast Revenue")]
    pub forecast: f64,
    /// Lower bound.
    #[serde(rename = "Lower Estimate")]
    pub lower: f64,
    /// Upper bound.
    #[serde(rename = "Upper Estimate")]
    pub upper: f64,
    /// Growth from the previous period.
    #[serde(rename = "MoM Growth %")]
    pub mom_growth_pct: Growth,
}

/// A chart point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    /// X value.
    pub date: NaiveDate,
    /// Y value.
    pub value: f64,
}

/// One line of the chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    /// Legend label.
    pub name: String,
    /// Points in date order.
    pub points: Vec<ChartPoint>,
}

/// Line chart of the forecast with its confidence band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    /// Chart title.
    pub title: String,
    /// Forecast, lower and upper series.
    pub series: Vec<ChartSeries>,
}

/// Everything a presentation surface needs to display a forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastReport {
    /// Grid rows in date order.
    pub rows: Vec<ReportRow>,
    /// Year-over-year growth across the horizon.
    #[serde(rename = "Year-over-Year Growth %")]
    pub yoy_growth_pct: Growth,
    /// Human-readable YoY line.
    pub summary: String,
    /// Chart data.
    pub chart: ChartSpec,
}

impl ForecastReport {
    /// Assemble the report from a table and its derived growth. `frequency`
    /// names the horizon unit in the chart title.
    pub fn build(table: &ForecastTable, growth: &GrowthSeries, frequency: Frequency) -> Self {
        let rows: Vec<ReportRow> = table
            .points()
            .iter()
            .zip(growth.mom.iter())
            .map(|(p, mom)| ReportRow {
                date: p.date,
                forecast: p.predicted,
                lower: p.lower,
                upper: p.upper,
                mom_growth_pct: *mom,
            })
            .collect();

        let series = |name: &str, pick: fn(&ReportRow) -> f64| ChartSeries {
            name: name.to_string(),
            points: rows
                .iter()
                .map(|r| ChartPoint {
                    date: r.date,
                    value: pick(r),
                })
                .collect(),
        };
        let chart = ChartSpec {
            title: format!("Revenue Forecast (Next {} {})", rows.len(), frequency.unit()),
            series: vec![
                series(FORECAST, |r| r.forecast),
                series(LOWER, |r| r.lower),
                series(UPPER, |r| r.upper),
            ],
        };

        Self {
            summary: summary_line(growth.yoy),
            yoy_growth_pct: growth.yoy,
            chart,
            rows,
        }
    }

    /// Plain-text grid followed by the summary line.
    pub fn render_text(&self) -> String {
        let headers = [DATE, FORECAST, LOWER, UPPER, MOM];
        let cells: Vec<[String; 5]> = self
            .rows
            .iter()
            .map(|r| {
                [
                    r.date.to_string(),
                    format!("{:.2}", r.forecast),
                    format!("{:.2}", r.lower),
                    format!("{:.2}", r.upper),
                    r.mom_growth_pct.to_string(),
                ]
            })
            .collect();

        let mut widths = headers.map(str::len);
        for row in &cells {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.len());
            }
        }

        let mut out = String::new();
        let header_line: Vec<String> = headers
            .iter()
            .zip(widths)
            .map(|(h, w)| format!("{h:>w$}"))
            .collect();
        let _ = writeln!(out, "{}", header_line.join("  "));
        for row in &cells {
            let line: Vec<String> = row
                .iter()
                .zip(widths)
                .map(|(c, w)| format!("{c:>w$}"))
                .collect();
            let _ = writeln!(out, "{}", line.join("  "));
        }
        let _ = writeln!(out);
        out.push_str(&self.summary);
        out.push('\n');
        out
    }
}

fn summary_line(yoy: Growth) -> String {
    match yoy {
        Growth::Pct(p) => format!("Year-over-Year Growth: {p:.2}%"),
        Growth::Undefined => {
            "Year-over-Year Growth: undefined (first forecast value is zero)".to_string()
        }
        Growth::Absent => "Not enough months to calculate YoY growth.".to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::table::ForecastPoint;

    fn table(values: &[f64]) -> ForecastTable {
        let start = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        ForecastTable::from_points(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| ForecastPoint {
                    date: start + chrono::Days::new(30 * i as u64),
                    predicted: *v,
                    lower: v * 0.9,
                    upper: v * 1.1,
                })
                .collect(),
        )
    }

    #[test]
    fn test_short_horizon_report() {
        let t = table(&[100.0, 110.0]);
        let report = ForecastReport::build(&t, &GrowthSeries::derive(&t), Frequency::Monthly);
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.chart.title, "Revenue Forecast (Next 2 Months)");
        assert_eq!(report.chart.series.len(), 3);
        assert_eq!(report.summary, "Not enough months to calculate YoY growth.");

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["rows"][0]["MoM Growth %"], serde_json::Value::Null);
        assert_eq!(json["rows"][0]["Date"], "2024-01-31");
        assert!(json["Year-over-Year Growth %"].is_null());
    }

    #[test]
    fn test_full_year_summary() {
        let values: Vec<f64> = (0..12).map(|i| 100.0 + i as f64 * 50.0 / 11.0).collect();
        let t = table(&values);
        let report = ForecastReport::build(&t, &GrowthSeries::derive(&t), Frequency::Monthly);
        assert_eq!(report.summary, "Year-over-Year Growth: 50.00%");
        assert_eq!(report.chart.title, "Revenue Forecast (Next 12 Months)");
    }

    #[test]
    fn test_render_text() {
        let t = table(&[100.0, 110.0]);
        let text = ForecastReport::build(&t, &GrowthSeries::derive(&t), Frequency::Monthly)
            .render_text();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].contains("Forecast Revenue"));
        assert!(lines[0].contains("MoM Growth %"));
        assert!(lines[1].contains("100.00"));
        assert!(lines[2].ends_with("10.00"));
        assert!(text.trim_end().ends_with("calculate YoY growth."));
    }

    #[test]
    fn test_title_follows_frequency() {
        let t = table(&[100.0, 110.0, 120.0]);
        let growth = GrowthSeries::derive(&t);
        let title = |f| ForecastReport::build(&t, &growth, f).chart.title;
        assert_eq!(title(Frequency::Weekly), "Revenue Forecast (Next 3 Weeks)");
        assert_eq!(title(Frequency::Daily), "Revenue Forecast (Next 3 Days)");
        assert_eq!(title(Frequency::Quarterly), "Revenue Forecast (Next 3 Quarters)");
    }
}
