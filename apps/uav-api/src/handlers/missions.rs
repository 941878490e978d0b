//! 任务指标 handler
//!
//! - GET /missions/{mission_id}/telemetry

use crate::AppState;
use crate::utils::normalize_required;
use crate::utils::response::{mission_sample_to_dto, not_found_error};
use api_contract::ApiResponse;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

#[derive(serde::Deserialize)]
pub struct MissionPath {
    mission_id: String,
}

pub async fn get_mission_telemetry(
    State(state): State<AppState>,
    Path(path): Path<MissionPath>,
) -> Response {
    let mission_id = match normalize_required(path.mission_id, "missionId") {
        Ok(value) => value,
        Err(response) => return response,
    };
    match state.reconciler.mission_sample(&mission_id) {
        Some(sample) => (
            StatusCode::OK,
            Json(ApiResponse::success(mission_sample_to_dto(sample))),
        )
            .into_response(),
        None => not_found_error(),
    }
}
