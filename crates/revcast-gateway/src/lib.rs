//! HTTP upload gateway.
//!
//! Accepts a spreadsheet on `POST /api/forecast` and answers with the
//! forecast report as JSON, or with `{"error", "stage"}` when any step of the
//! pipeline fails.

/// Listen address and limits.
pub mod config;
/// Error responses.
pub mod error;
/// Router and handlers.
pub mod server;

pub use config::GatewayConfig;
pub use error::ApiError;
pub use server::{AppState, ForecastMode, GatewayServer, UPLOAD_FIELD};
