//! 遥测视图 handlers
//!
//! - GET /telemetry
//! - GET /telemetry/{uav_code}

use crate::AppState;
use crate::utils::normalize_required;
use crate::utils::response::{device_status_to_dto, device_view_to_dto};
use api_contract::{ApiResponse, TelemetrySnapshotDto};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

#[derive(serde::Deserialize)]
pub struct DevicePath {
    uav_code: String,
}

/// 对账表快照（按设备编码排序）
pub async fn get_telemetry_snapshot(State(state): State<AppState>) -> Response {
    let snapshot = state.reconciler.snapshot();
    let data = TelemetrySnapshotDto {
        connected: snapshot.connected,
        version: snapshot.version,
        devices: snapshot
            .devices
            .into_values()
            .map(device_view_to_dto)
            .collect(),
    };
    (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
}

/// 单台设备状态；没有记录时 telemetry 为 null
pub async fn get_device_telemetry(
    State(state): State<AppState>,
    Path(path): Path<DevicePath>,
) -> Response {
    let uav_code = match normalize_required(path.uav_code, "uavCode") {
        Ok(value) => value,
        Err(response) => return response,
    };
    let reconciler = &state.reconciler;
    let data = device_status_to_dto(
        uav_code.clone(),
        reconciler.classify(&uav_code),
        reconciler.mission_for(&uav_code),
        reconciler.record(&uav_code),
    );
    (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
}
