//! HTTP 响应辅助函数和 DTO 转换
//!
//! 所有错误返回统一的 ApiResponse 格式，HTTP 状态码与错误码对应。

use api_contract::{
    ApiResponse, DeviceStatusDto, DeviceTelemetryDto, MissionSampleDto,
};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use domain::{DeviceStatus, DeviceTelemetry, MissionSample};
use uav_reconcile::DeviceView;

/// 错误请求响应
pub fn bad_request_error(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error("INVALID.REQUEST", message.into())),
    )
        .into_response()
}

/// 资源未找到错误响应
pub fn not_found_error() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::error("RESOURCE.NOT_FOUND", "not found")),
    )
        .into_response()
}

/// DeviceTelemetry 转 DeviceTelemetryDto
pub fn telemetry_to_dto(record: DeviceTelemetry) -> DeviceTelemetryDto {
    DeviceTelemetryDto {
        battery_percent: record.battery_percent,
        status: record.status,
        lat: record.lat,
        lng: record.lng,
        alt: record.alt,
        last_updated_at_ms: record.last_updated_at_ms,
    }
}

pub fn device_status_to_dto(
    uav_code: String,
    status: DeviceStatus,
    mission_id: Option<String>,
    record: Option<DeviceTelemetry>,
) -> DeviceStatusDto {
    DeviceStatusDto {
        uav_code,
        classification: status.as_str().to_string(),
        mission_id,
        telemetry: record.map(telemetry_to_dto),
    }
}

/// DeviceView 转 DeviceStatusDto
pub fn device_view_to_dto(view: DeviceView) -> DeviceStatusDto {
    device_status_to_dto(view.uav_code, view.status, view.mission_id, Some(view.record))
}

/// MissionSample 转 MissionSampleDto
pub fn mission_sample_to_dto(sample: MissionSample) -> MissionSampleDto {
    MissionSampleDto {
        mission_id: sample.mission_id,
        uav_code: sample.uav_code,
        data: sample.data,
        received_at_ms: sample.received_at_ms,
    }
}
