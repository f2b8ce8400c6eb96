use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use revcast_core::{ForecastError, RevcastError, Stage};
use serde::Serialize;
use tracing::warn;

/// An error answered as `{"error": ..., "stage": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiError {
    /// HTTP status of the response.
    #[serde(skip)]
    pub status: StatusCode,
    /// One-line message for the caller.
    pub error: String,
    /// Stage the request failed in.
    pub stage: Stage,
}

impl ApiError {
    /// A malformed upload request.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: message.into(),
            stage: Stage::Upload,
        }
    }

    /// A multipart body that could not be read, oversized bodies included.
    pub fn multipart(err: MultipartError) -> Self {
        Self {
            status: err.status(),
            error: format!("cannot read upload: {}", err.body_text()),
            stage: Stage::Upload,
        }
    }
}

impl From<ForecastError> for ApiError {
    fn from(err: ForecastError) -> Self {
        let status = match &err {
            ForecastError::UnsupportedFile { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ForecastError::Spreadsheet(_)
            | ForecastError::Schema { .. }
            | ForecastError::InvalidRow { .. }
            | ForecastError::Format(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ForecastError::Unavailable(_) => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            error: err.user_message(),
            stage: err.stage(),
        }
    }
}

impl From<RevcastError> for ApiError {
    fn from(err: RevcastError) -> Self {
        match err {
            RevcastError::Forecast(inner) => inner.into(),
            // The crew could not reach its model or tools.
            RevcastError::Http(_) | RevcastError::Agent(_) | RevcastError::Skill(_) => {
                ForecastError::Unavailable(format!("crew run failed: {err}")).into()
            }
            other => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: format!("Forecast failed during {}: {other}", Stage::Forecast),
                stage: Stage::Forecast,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(status = %self.status, stage = %self.stage, error = %self.error, "Forecast request failed");
        (self.status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_per_error() {
        let cases = [
            (
                ForecastError::UnsupportedFile {
                    extension: "csv".into(),
                },
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ),
            (
                ForecastError::Schema {
                    missing: vec!["Revenue".into()],
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ForecastError::InvalidRow {
                    row: 3,
                    column: "Date".into(),
                    reason: "date is missing".into(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (ForecastError::Format("bad".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (ForecastError::Unavailable("down".into()), StatusCode::BAD_GATEWAY),
        ];
        for (err, status) in cases {
            let stage = err.stage();
            let api = ApiError::from(err);
            assert_eq!(api.status, status);
            assert_eq!(api.stage, stage);
        }
    }

    #[test]
    fn test_crew_transport_failure_is_bad_gateway() {
        let api = ApiError::from(RevcastError::Http("connection refused".into()));
        assert_eq!(api.status, StatusCode::BAD_GATEWAY);
        assert_eq!(api.stage, Stage::Forecast);
        assert!(api.error.contains("connection refused"));
    }

    #[test]
    fn test_other_failures_are_internal() {
        let api = ApiError::from(RevcastError::Orchestrator("Task deadlock".into()));
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
