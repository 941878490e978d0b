//! Handlers 模块

pub mod fleet;
pub mod metrics;
pub mod missions;
pub mod telemetry;

pub use fleet::*;
pub use metrics::*;
pub use missions::*;
pub use telemetry::*;

use axum::{Json, response::IntoResponse};

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}
