use crate::columns::ColumnMap;
use crate::forecaster::{ForecastRequest, Forecaster, Frequency};
use crate::ingest::{read_workbook, UploadedFile};
use crate::metrics::GrowthSeries;
use crate::normalize::{Normalizer, RawForecast};
use crate::observation::{ColumnSpec, Observation, RawTable};
use crate::report::ForecastReport;
use crate::table::ForecastTable;
use crate::validate::validate;
use revcast_core::ForecastError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Settings for one forecast run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Input column holding dates.
    #[serde(default = "default_date_column")]
    pub date_column: String,
    /// Input column holding revenue/budget values.
    #[serde(default = "default_value_column")]
    pub value_column: String,
    /// Forecast horizon.
    #[serde(default = "default_periods")]
    pub periods: u32,
    /// Horizon frequency.
    #[serde(default)]
    pub frequency: Frequency,
    /// Forecaster field overrides merged over the default rename table.
    #[serde(default, skip_serializing)]
    pub rename: Option<ColumnMap>,
}

fn default_date_column() -> String {
    ColumnSpec::default().date_column
}

fn default_value_column() -> String {
    ColumnSpec::default().value_column
}

fn default_periods() -> u32 {
    12
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            date_column: default_date_column(),
            value_column: default_value_column(),
            periods: default_periods(),
            frequency: Frequency::default(),
            rename: None,
        }
    }
}

/// Validation, normalization, mapping and metrics for one forecast request.
///
/// Every step is terminal on error; no partial report is ever produced.
pub struct ForecastPipeline {
    spec: ColumnSpec,
    periods: u32,
    frequency: Frequency,
    normalizer: Normalizer,
    columns: ColumnMap,
}

impl ForecastPipeline {
    /// Pipeline with the default parse strategies.
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            spec: ColumnSpec::new(&config.date_column, &config.value_column),
            periods: config.periods,
            frequency: config.frequency,
            normalizer: Normalizer::default(),
            columns: config.rename.clone().unwrap_or_default(),
        }
    }

    /// Replace the parse strategy chain.
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Forecaster request for `observations` with the configured horizon.
    pub fn request_for(&self, observations: Vec<Observation>) -> ForecastRequest {
        ForecastRequest {
            observations,
            periods: self.periods,
            frequency: self.frequency,
        }
    }

    /// Read and validate a workbook.
    pub fn load_observations(&self, path: &Path) -> Result<Vec<Observation>, ForecastError> {
        let table = read_workbook(path)?;
        validate(&table, &self.spec)
    }

    /// Validate an upload, forecast it and build the report.
    ///
    /// The forecaster is only invoked once the input has validated. The
    /// staged upload is released as soon as the workbook has been read.
    pub async fn run(
        &self,
        forecaster: &dyn Forecaster,
        upload: UploadedFile,
    ) -> Result<ForecastReport, ForecastError> {
        info!(file = %upload.original_name(), kind = ?upload.kind(), "Running forecast pipeline");
        let table = read_workbook(upload.path())?;
        drop(upload);
        self.run_table(forecaster, &table).await
    }

    /// Validate an already-read table, forecast it and build the report.
    pub async fn run_table(
        &self,
        forecaster: &dyn Forecaster,
        table: &RawTable,
    ) -> Result<ForecastReport, ForecastError> {
        let observations = validate(table, &self.spec)?;
        let raw = forecaster.forecast(&self.request_for(observations)).await?;
        self.process(&raw)
    }

    /// Turn raw forecaster output into a report.
    pub fn process(&self, raw: &RawForecast) -> Result<ForecastReport, ForecastError> {
        let table = self.normalizer.normalize(raw)?;
        let table = self.columns.apply(table);
        let forecast = ForecastTable::from_columns(&table)?;
        let growth = GrowthSeries::derive(&forecast);

        info!(
            periods = forecast.len(),
            yoy = ?growth.yoy,
            "Forecast processed"
        );
        Ok(ForecastReport::build(&forecast, &growth, self.frequency))
    }
}
