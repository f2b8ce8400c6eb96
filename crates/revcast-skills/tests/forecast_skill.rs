//! The forecast skill wired to an HTTP forecaster through the registry.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use revcast_core::ToolCall;
use revcast_pipeline::{ForecasterConfig, HttpForecaster, PipelineConfig};
use revcast_skills::{ForecastSkill, SkillRegistry, FORECAST_SKILL_NAME};
use std::io::Write;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn registry_with(server: &MockServer) -> SkillRegistry {
    let forecaster = HttpForecaster::new(ForecasterConfig {
        base_url: server.uri(),
        timeout_secs: 5,
    })
    .unwrap();
    let mut registry = SkillRegistry::new();
    registry.register(Arc::new(ForecastSkill::new(
        PipelineConfig::default(),
        Arc::new(forecaster),
    )));
    registry
}

fn forecast_call(file_path: &str) -> ToolCall {
    ToolCall {
        id: "toolu_42".into(),
        name: FORECAST_SKILL_NAME.into(),
        arguments: serde_json::json!({ "file_path": file_path }),
    }
}

#[tokio::test]
async fn unreadable_workbook_never_calls_forecaster() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(0)
        .mount(&server)
        .await;

    let mut file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
    file.write_all(b"definitely not a workbook").unwrap();

    let registry = registry_with(&server).await;
    let result = registry
        .execute(forecast_call(&file.path().to_string_lossy()))
        .await
        .unwrap();

    assert!(result.is_error);
    assert_eq!(result.call_id, "toolu_42");
    let body: serde_json::Value = serde_json::from_str(&result.content).unwrap();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Forecast failed during upload"));
}

#[tokio::test]
async fn missing_file_is_reported_to_the_agent() {
    let server = MockServer::start().await;
    let registry = registry_with(&server).await;

    let result = registry
        .execute(forecast_call("/nonexistent/revenue.xlsx"))
        .await
        .unwrap();
    assert!(result.is_error);
    assert!(result.content.contains("\"error\""));
}

#[tokio::test]
async fn descriptor_is_listed() {
    let server = MockServer::start().await;
    let registry = registry_with(&server).await;
    let names: Vec<_> = registry
        .list_descriptors()
        .iter()
        .map(|d| d.name.clone())
        .collect();
    assert_eq!(names, vec![FORECAST_SKILL_NAME]);
}
