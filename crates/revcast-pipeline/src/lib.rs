//! The forecast pipeline: from an uploaded spreadsheet to an analysis-ready
//! forecast report.
//!
//! Forecasting itself is delegated to an external [`Forecaster`]. This crate
//! owns the glue on either side of that call:
//!
//! - [`ingest`]: upload acceptance and workbook reading.
//! - [`validate`]: required-column checks and typed [`Observation`]s.
//! - [`normalize`]: turning heterogeneous forecaster output into a [`ColumnTable`].
//! - [`columns`]: renaming forecaster fields to display names.
//! - [`table`]: the typed, date-sorted [`ForecastTable`].
//! - [`metrics`]: month-over-month and year-over-year growth.
//! - [`report`]: the rendered table, summary and chart series.
//!
//! [`ForecastPipeline`] wires these together for one request.

/// Renaming of forecaster fields to display names.
pub mod columns;
/// Lenient date parsing shared by input and output handling.
pub mod dates;
/// External forecaster client.
pub mod forecaster;
/// Column-oriented table produced by the normalizer.
pub mod frame;
/// Upload acceptance and spreadsheet reading.
pub mod ingest;
/// Growth metrics over a forecast table.
pub mod metrics;
/// Forecaster output normalization.
pub mod normalize;
/// Raw input grid and observation types.
pub mod observation;
/// Pipeline facade.
pub mod pipeline;
/// Report building and text rendering.
pub mod report;
/// Typed forecast table.
pub mod table;
/// Input validation.
pub mod validate;

pub use columns::ColumnMap;
pub use forecaster::{ForecastRequest, Forecaster, ForecasterConfig, Frequency, HttpForecaster};
pub use frame::ColumnTable;
pub use ingest::{read_workbook, SpreadsheetKind, UploadedFile};
pub use metrics::{Growth, GrowthSeries};
pub use normalize::{Attempt, Normalizer, ParseStrategy, RawForecast};
pub use observation::{Cell, ColumnSpec, Observation, RawTable};
pub use pipeline::{ForecastPipeline, PipelineConfig};
pub use report::ForecastReport;
pub use table::{ForecastPoint, ForecastTable};
pub use validate::validate;
