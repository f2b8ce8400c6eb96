use serde::Serialize;
use thiserror::Error;

/// A convenience `Result` alias using [`RevcastError`].
pub type RevcastResult<T> = Result<T, RevcastError>;

/// Top-level error type for Revcast.
///
/// Each variant corresponds to a subsystem that can produce errors.
#[derive(Error, Debug)]
pub enum RevcastError {
    /// An error originating from the agent execution loop.
    #[error("Agent error: {0}")]
    Agent(String),

    /// An error from an outbound HTTP request (LLM or forecaster call).
    #[error("HTTP error: {0}")]
    Http(String),

    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

    /// An error raised by a skill during invocation.
    #[error("Skill error: {0}")]
    Skill(String),

    /// An error from the crew orchestrator.
    #[error("Orchestrator error: {0}")]
    Orchestrator(String),

    /// An error from the upload gateway.
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// A terminal failure of the forecast pipeline.
    #[error(transparent)]
    Forecast(#[from] ForecastError),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The stage of the forecast request that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Upload acceptance and workbook reading.
    Upload,
    /// Input validation before the forecaster is called.
    Validation,
    /// The external forecaster call.
    Forecast,
    /// Normalization of the forecaster's output.
    Normalization,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Upload => write!(f, "upload"),
            Stage::Validation => write!(f, "validation"),
            Stage::Forecast => write!(f, "forecast"),
            Stage::Normalization => write!(f, "normalization"),
        }
    }
}

/// Terminal failures of one forecast request.
///
/// None of these are retried. The caller reports the message and stops
/// rendering.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// The uploaded file is not a recognized spreadsheet type.
    #[error("Unsupported file type '{extension}': upload an .xlsx or .xls spreadsheet")]
    UnsupportedFile {
        /// Extension of the rejected file (empty when it had none).
        extension: String,
    },

    /// The workbook could not be opened or read.
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    /// Required input columns are absent.
    #[error("Schema error: missing required column(s): {}", .missing.join(", "))]
    Schema {
        /// Names of every missing column.
        missing: Vec<String>,
    },

    /// A data row holds a date or value that cannot be parsed.
    #[error("Invalid row {row}: column '{column}': {reason}")]
    InvalidRow {
        /// 1-based spreadsheet row number (the header is row 1).
        row: usize,
        /// Column the bad cell belongs to.
        column: String,
        /// What was wrong with the cell.
        reason: String,
    },

    /// The external forecaster call failed.
    #[error("Forecast unavailable: {0}")]
    Unavailable(String),

    /// The forecaster's output could not be interpreted in any known shape.
    #[error("Format error: {0}")]
    Format(String),
}

impl ForecastError {
    /// The pipeline stage this error belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            ForecastError::UnsupportedFile { .. } | ForecastError::Spreadsheet(_) => Stage::Upload,
            ForecastError::Schema { .. } | ForecastError::InvalidRow { .. } => Stage::Validation,
            ForecastError::Unavailable(_) => Stage::Forecast,
            ForecastError::Format(_) => Stage::Normalization,
        }
    }

    /// One-line message naming the failed stage and the cause.
    pub fn user_message(&self) -> String {
        format!("Forecast failed during {}: {}", self.stage(), self)
    }
}
