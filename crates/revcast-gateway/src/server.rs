use crate::config::GatewayConfig;
use crate::error::ApiError;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use revcast_core::{RevcastError, RevcastResult};
use revcast_orchestrator::Crew;
use revcast_pipeline::{ForecastPipeline, ForecastReport, Forecaster, UploadedFile};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Multipart field carrying the spreadsheet.
pub const UPLOAD_FIELD: &str = "file";

/// Shared application state.
pub struct AppState {
    /// Validation, normalization and report building.
    pub pipeline: ForecastPipeline,
    /// Forecaster used by direct requests.
    pub forecaster: Arc<dyn Forecaster>,
    /// Crew for `mode=crew` requests, when enabled.
    pub crew: Option<Arc<Crew>>,
}

/// How a request obtains its forecast.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastMode {
    /// Call the forecaster directly.
    #[default]
    Direct,
    /// Let the agent crew produce the forecast.
    Crew,
}

/// Query string of `POST /api/forecast`.
#[derive(Debug, Default, Deserialize)]
pub struct ForecastQuery {
    /// Forecast source.
    #[serde(default)]
    pub mode: ForecastMode,
}

/// The upload gateway.
pub struct GatewayServer;

impl GatewayServer {
    /// Build the router over `state`, rejecting bodies above `max_upload_bytes`.
    pub fn build(state: AppState, max_upload_bytes: usize) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/api/forecast", post(forecast_handler))
            .layer(DefaultBodyLimit::max(max_upload_bytes))
            .with_state(Arc::new(state))
    }

    /// Bind the configured address and serve until the process exits.
    pub async fn serve(config: &GatewayConfig, state: AppState) -> RevcastResult<()> {
        let app = Self::build(state, config.max_upload_bytes);
        let listener = TcpListener::bind(config.bind_addr()).await.map_err(|e| {
            RevcastError::Gateway(format!("Failed to bind {}: {e}", config.bind_addr()))
        })?;
        info!(addr = %config.bind_addr(), "Gateway listening");
        axum::serve(listener, app).await?;
        Ok(())
    }
}

async fn health_handler() -> impl IntoResponse {
    serde_json::json!({"status": "ok", "service": "revcast"}).to_string()
}

async fn forecast_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ForecastQuery>,
    mut multipart: Multipart,
) -> Result<Json<ForecastReport>, ApiError> {
    let upload = read_upload(&mut multipart).await?;
    info!(file = %upload.original_name(), mode = ?query.mode, "Forecast request");

    let report = match query.mode {
        ForecastMode::Direct => state.pipeline.run(state.forecaster.as_ref(), upload).await?,
        ForecastMode::Crew => run_crew(&state, upload).await?,
    };
    Ok(Json(report))
}

async fn read_upload(multipart: &mut Multipart) -> Result<UploadedFile, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(ApiError::multipart)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(ApiError::multipart)?;
        return Ok(UploadedFile::from_bytes(&file_name, &bytes)?);
    }
    Err(ApiError::bad_request(format!(
        "missing multipart field '{UPLOAD_FIELD}'"
    )))
}

/// The crew reads the staged upload itself, so the upload lives until kickoff
/// returns. Input is validated first so a bad file never reaches the agents.
async fn run_crew(state: &AppState, upload: UploadedFile) -> Result<ForecastReport, ApiError> {
    let crew = state
        .crew
        .as_ref()
        .ok_or_else(|| ApiError::bad_request("crew mode is not enabled on this server"))?;

    state.pipeline.load_observations(upload.path())?;

    let inputs = HashMap::from([(
        "file_path".to_string(),
        upload.path().display().to_string(),
    )]);
    let output = crew.kickoff(&inputs).await;
    drop(upload);

    let raw = output?.into_forecast()?;
    Ok(state.pipeline.process(&raw)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use revcast_core::ForecastError;
    use revcast_pipeline::{ForecastRequest, PipelineConfig, RawForecast};
    use tower::ServiceExt;

    struct Offline;

    #[async_trait]
    impl Forecaster for Offline {
        async fn forecast(&self, _request: &ForecastRequest) -> Result<RawForecast, ForecastError> {
            Err(ForecastError::Unavailable("offline".into()))
        }
    }

    fn state() -> AppState {
        AppState {
            pipeline: ForecastPipeline::new(&PipelineConfig::default()),
            forecaster: Arc::new(Offline),
            crew: None,
        }
    }

    fn app() -> Router {
        GatewayServer::build(state(), 1024)
    }

    #[tokio::test]
    async fn test_health() {
        let resp = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_forecast_requires_multipart() {
        let resp = app()
            .oneshot(
                Request::post("/api/forecast")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(resp.status().is_client_error());
    }

    #[tokio::test]
    async fn test_unknown_mode_is_rejected() {
        let resp = app()
            .oneshot(
                Request::post("/api/forecast?mode=oracle")
                    .header("content-type", "multipart/form-data; boundary=x")
                    .body(Body::from("--x--\r\n"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_serve_reports_bind_failure() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = GatewayConfig {
            host: "127.0.0.1".into(),
            port: taken.local_addr().unwrap().port(),
            ..GatewayConfig::default()
        };
        let err = GatewayServer::serve(&config, state()).await.unwrap_err();
        assert!(matches!(err, RevcastError::Gateway(ref m) if m.contains("Failed to bind")));
    }
}
