use crate::normalize::RawForecast;
use crate::observation::Observation;
use async_trait::async_trait;
use revcast_core::ForecastError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Sampling frequency of the forecast horizon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    /// Month-end periods.
    #[default]
    #[serde(rename = "M", alias = "monthly")]
    Monthly,
    /// Weekly periods.
    #[serde(rename = "W", alias = "weekly")]
    Weekly,
    /// Daily periods.
    #[serde(rename = "D", alias = "daily")]
    Daily,
    /// Quarter-end periods.
    #[serde(rename = "Q", alias = "quarterly")]
    Quarterly,
}

impl Frequency {
    /// Frequency code understood by the forecaster.
    pub fn code(&self) -> &'static str {
        match self {
            Frequency::Monthly => "M",
            Frequency::Weekly => "W",
            Frequency::Daily => "D",
            Frequency::Quarterly => "Q",
        }
    }

    /// Plural period name for report titles.
    pub fn unit(&self) -> &'static str {
        match self {
            Frequency::Monthly => "Months",
            Frequency::Weekly => "Weeks",
            Frequency::Daily => "Days",
            Frequency::Quarterly => "Quarters",
        }
    }
}

/// What to forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRequest {
    /// Historical observations in input order.
    pub observations: Vec<Observation>,
    /// Number of future periods.
    pub periods: u32,
    /// Period frequency.
    pub frequency: Frequency,
}

impl ForecastRequest {
    /// The forecaster's wire form: dates and values renamed to `ds` and `y`.
    pub fn to_json(&self) -> serde_json::Value {
        let ds: Vec<String> = self
            .observations
            .iter()
            .map(|o| o.date.format("%Y-%m-%d").to_string())
            .collect();
        let y: Vec<f64> = self.observations.iter().map(|o| o.value).collect();
        serde_json::json!({
            "ds": ds,
            "y": y,
            "periods": self.periods,
            "freq": self.frequency.code(),
        })
    }
}

/// The external time-series model.
#[async_trait]
pub trait Forecaster: Send + Sync {
    /// Produce a forecast. The output shape is not guaranteed; it goes through
    /// the normalizer before use.
    async fn forecast(&self, request: &ForecastRequest) -> Result<RawForecast, ForecastError>;
}

/// Connection settings for [`HttpForecaster`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecasterConfig {
    /// Service root; requests go to `{base_url}/forecast`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Whole-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8081".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for ForecasterConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Forecaster reached over HTTP.
pub struct HttpForecaster {
    config: ForecasterConfig,
    http: reqwest::Client,
}

impl HttpForecaster {
    /// Build a client with the configured timeout.
    pub fn new(config: ForecasterConfig) -> Result<Self, ForecastError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ForecastError::Unavailable(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    fn endpoint(&self) -> String {
        format!("{}/forecast", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Forecaster for HttpForecaster {
    async fn forecast(&self, request: &ForecastRequest) -> Result<RawForecast, ForecastError> {
        let url = self.endpoint();
        info!(
            url = %url,
            observations = request.observations.len(),
            periods = request.periods,
            freq = request.frequency.code(),
            "Requesting forecast"
        );

        let resp = self
            .http
            .post(&url)
            .json(&request.to_json())
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Forecaster request failed");
                ForecastError::Unavailable(format!("forecaster request failed: {e}"))
            })?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ForecastError::Unavailable(format!("cannot read forecaster response: {e}")))?;

        if !status.is_success() {
            warn!(status = %status, "Forecaster returned an error status");
            return Err(ForecastError::Unavailable(format!(
                "forecaster returned {status}: {}",
                truncate(&body, 200)
            )));
        }

        Ok(RawForecast::Text(body))
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> ForecastRequest {
        ForecastRequest {
            observations: vec![
                Observation::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 100.0),
                Observation::new(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(), 110.0),
            ],
            periods: 12,
            frequency: Frequency::Monthly,
        }
    }

    fn forecaster(server: &MockServer) -> HttpForecaster {
        HttpForecaster::new(ForecasterConfig {
            base_url: server.uri(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_wire_form() {
        assert_eq!(
            request().to_json(),
            serde_json::json!({
                "ds": ["2024-01-01", "2024-02-01"],
                "y": [100.0, 110.0],
                "periods": 12,
                "freq": "M",
            })
        );
    }

    #[test]
    fn test_frequency_names() {
        let f: Frequency = serde_json::from_str("\"monthly\"").unwrap();
        assert_eq!(f, Frequency::Monthly);
        let f: Frequency = serde_json::from_str("\"Q\"").unwrap();
        assert_eq!(f.code(), "Q");
    }

    #[tokio::test]
    async fn test_returns_body_as_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/forecast"))
            .and(body_json(request().to_json()))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ds":[],"yhat":[]}"#))
            .expect(1)
            .mount(&server)
            .await;

        let raw = forecaster(&server).forecast(&request()).await.unwrap();
        assert_eq!(raw, RawForecast::Text(r#"{"ds":[],"yhat":[]}"#.to_string()));
    }

    #[tokio::test]
    async fn test_error_status_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(503).set_body_string("model warming up"))
            .mount(&server)
            .await;

        let err = forecaster(&server).forecast(&request()).await.unwrap_err();
        match err {
            ForecastError::Unavailable(msg) => {
                assert!(msg.contains("503"));
                assert!(msg.contains("model warming up"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_is_unavailable() {
        let forecaster = HttpForecaster::new(ForecasterConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout_secs: 2,
        })
        .unwrap();
        let err = forecaster.forecast(&request()).await.unwrap_err();
        assert!(matches!(err, ForecastError::Unavailable(_)));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }
}
