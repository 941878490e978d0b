//! 推送载荷与设备遥测记录
//!
//! 载荷在边界处一次性校验：`uavCode` 必须是非空字符串（或数字），否则整条丢弃；
//! 其余字段逐个宽松解析，类型不符的字段按"本次未上报"处理，不影响同一载荷中的其他字段。
//! 数值字段接受数字或数字字符串，任务标识接受字符串或数字。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 推送载荷校验错误。
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing uavCode")]
    MissingDeviceCode,
}

/// MESSAGE 帧 JSON 的原始形态（仅在边界处使用）。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTelemetryPayload {
    uav_code: Option<Value>,
    battery_percent: Option<Value>,
    status: Option<Value>,
    lat: Option<Value>,
    lng: Option<Value>,
    alt: Option<Value>,
    mission_id: Option<Value>,
    mission_code: Option<Value>,
    data: Option<Value>,
}

/// 校验后的单条设备遥测载荷。
///
/// `uav_code` 必定非空；其余字段缺失表示"本次未上报"，而不是"值为空"。
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryPayload {
    pub uav_code: String,
    pub battery_percent: Option<f64>,
    pub status: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub alt: Option<f64>,
    /// 任务标识（`missionId` 优先，其次 `missionCode`）。
    pub mission_id: Option<String>,
    /// 任务指标数据（监测页按任务展示）。
    pub data: Option<Map<String, Value>>,
}

impl TelemetryPayload {
    /// 只带设备编码的空载荷。
    pub fn new(uav_code: impl Into<String>) -> Self {
        Self {
            uav_code: uav_code.into(),
            battery_percent: None,
            status: None,
            lat: None,
            lng: None,
            alt: None,
            mission_id: None,
            data: None,
        }
    }

    /// 从 MESSAGE 帧 body 解析并校验。
    pub fn parse(body: &str) -> Result<Self, PayloadError> {
        let raw: RawTelemetryPayload = serde_json::from_str(body)?;
        let uav_code = identifier(raw.uav_code).ok_or(PayloadError::MissingDeviceCode)?;
        let mission_id = identifier(raw.mission_id).or_else(|| identifier(raw.mission_code));
        Ok(Self {
            uav_code,
            battery_percent: number(raw.battery_percent),
            status: text(raw.status),
            lat: number(raw.lat),
            lng: number(raw.lng),
            alt: number(raw.alt),
            mission_id,
            data: match raw.data {
                Some(Value::Object(data)) => Some(data),
                _ => None,
            },
        })
    }
}

/// 标识类字段：非空字符串（去空白）或数字。
fn identifier(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Number(number) => Some(number.to_string()),
        Value::String(text) => {
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        }
        _ => None,
    }
}

fn number(value: Option<Value>) -> Option<f64> {
    match value? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok().filter(|value| value.is_finite()),
        _ => None,
    }
}

fn text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(text) => Some(text),
        _ => None,
    }
}

/// 对账表中的单台设备遥测记录。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceTelemetry {
    pub battery_percent: Option<f64>,
    pub status: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub alt: Option<f64>,
    /// 本地接收时间（毫秒）。
    pub last_updated_at_ms: i64,
}

impl DeviceTelemetry {
    /// 合并一条载荷：出现的字段覆盖，缺失的字段保留；接收时间总是刷新。
    pub fn merge(&mut self, payload: &TelemetryPayload, received_at_ms: i64) {
        if let Some(value) = payload.battery_percent {
            self.battery_percent = Some(value);
        }
        if let Some(value) = payload.status.as_ref() {
            self.status = Some(value.clone());
        }
        if let Some(value) = payload.lat {
            self.lat = Some(value);
        }
        if let Some(value) = payload.lng {
            self.lng = Some(value);
        }
        if let Some(value) = payload.alt {
            self.alt = Some(value);
        }
        self.last_updated_at_ms = received_at_ms;
    }

    /// 电量与经纬度全部缺失。
    pub fn lacks_key_fields(&self) -> bool {
        self.battery_percent.is_none() && self.lat.is_none() && self.lng.is_none()
    }

    /// 电量、纬度、经度任一缺失（链路异常）。
    pub fn has_link_issue(&self) -> bool {
        self.battery_percent.is_none() || self.lat.is_none() || self.lng.is_none()
    }
}

/// 某个任务最近一次的指标数据。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionSample {
    pub mission_id: String,
    pub uav_code: String,
    pub data: Map<String, Value>,
    pub received_at_ms: i64,
}
