//! 设备状态分类。

use crate::data::DeviceTelemetry;
use serde::Serialize;
use std::fmt;

/// 展示给消费方的设备状态（读取时计算，不存储）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceStatus {
    /// 推送连接不可用，任何设备数据都不可信。
    Disconnected,
    /// 本次订阅以来没有收到该设备数据。
    Offline,
    Critical,
    Warning,
    Online,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Disconnected => "DISCONNECTED",
            DeviceStatus::Offline => "OFFLINE",
            DeviceStatus::Critical => "CRITICAL",
            DeviceStatus::Warning => "WARNING",
            DeviceStatus::Online => "ONLINE",
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 按优先级分类：断连 > 无记录 > 严重（自报或关键字段全缺）> 告警 > 在线。
///
/// 关键字段检查先于设备自报状态：自报 ONLINE 但没有坐标与电量的设备仍视为异常。
pub fn classify_device(connected: bool, record: Option<&DeviceTelemetry>) -> DeviceStatus {
    if !connected {
        return DeviceStatus::Disconnected;
    }
    let Some(record) = record else {
        return DeviceStatus::Offline;
    };
    let status = record.status.as_deref().map(str::trim).unwrap_or_default();
    if status.eq_ignore_ascii_case("CRITICAL") || record.lacks_key_fields() {
        return DeviceStatus::Critical;
    }
    if status.eq_ignore_ascii_case("WARNING") {
        return DeviceStatus::Warning;
    }
    DeviceStatus::Online
}
