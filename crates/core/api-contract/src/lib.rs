//! 稳定的 DTO 与 API 响应契约。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 标准 API 响应封装。
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

/// 失败响应的错误体。
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

/// 单台设备遥测记录。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceTelemetryDto {
    pub battery_percent: Option<f64>,
    pub status: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub alt: Option<f64>,
    pub last_updated_at_ms: i64,
}

/// 单台设备状态（记录可能为空）。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatusDto {
    pub uav_code: String,
    /// DISCONNECTED / OFFLINE / CRITICAL / WARNING / ONLINE
    pub classification: String,
    pub mission_id: Option<String>,
    pub telemetry: Option<DeviceTelemetryDto>,
}

/// 对账表快照。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySnapshotDto {
    pub connected: bool,
    pub version: u64,
    pub devices: Vec<DeviceStatusDto>,
}

/// 机队健康度查询参数，`codes` 为逗号分隔的设备编码。
#[derive(Debug, Deserialize)]
pub struct FleetHealthQuery {
    pub codes: Option<String>,
}

/// 机队健康度。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetHealthDto {
    pub connected: bool,
    pub total: usize,
    pub online: usize,
    pub link_issues: usize,
    pub max_battery: f64,
}

/// 任务最近一次指标数据。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionSampleDto {
    pub mission_id: String,
    pub uav_code: String,
    pub data: Map<String, Value>,
    pub received_at_ms: i64,
}

/// 推送客户端指标快照。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshotDto {
    pub frames_received: u64,
    pub frames_ignored: u64,
    pub payloads_dropped_malformed: u64,
    pub payloads_dropped_missing_code: u64,
    pub messages_applied: u64,
    pub handshakes_completed: u64,
    pub subscriptions_sent: u64,
    pub transport_failures: u64,
    pub reconnects_scheduled: u64,
}
