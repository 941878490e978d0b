//! 遥测领域模型：推送载荷、设备遥测记录与状态分类。

pub mod data;
pub mod status;

pub use data::{DeviceTelemetry, MissionSample, PayloadError, TelemetryPayload};
pub use status::{DeviceStatus, classify_device};

/// 获取当前时间戳（毫秒）。
pub fn now_epoch_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
