//! 应用运行配置加载。

use std::env;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 应用运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: String,
    /// 推送通道地址（ws:// 或 wss://）。
    pub ws_url: String,
    /// 机队级订阅主题，设备主题为 `{base_topic}/{uavCode}`。
    pub base_topic: String,
    /// 额外按设备订阅的编码列表。
    pub device_codes: Vec<String>,
    pub reconnect_delay_ms: u64,
    pub heartbeat_outgoing_ms: u64,
    pub heartbeat_incoming_ms: u64,
    pub ingest_enabled: bool,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let http_addr = env::var("UAV_HTTP_ADDR").unwrap_or_else(|_| "127.0.0.1:8090".to_string());
        let ws_url = env::var("UAV_WS_URL")
            .unwrap_or_else(|_| "ws://localhost:8080/ws/uav-telemetry".to_string());
        if !(ws_url.starts_with("ws://") || ws_url.starts_with("wss://")) {
            return Err(ConfigError::Invalid("UAV_WS_URL".to_string(), ws_url));
        }
        let base_topic =
            env::var("UAV_BASE_TOPIC").unwrap_or_else(|_| "/topic/uav-telemetry".to_string());
        let base_topic = base_topic.trim_end_matches('/').to_string();
        if base_topic.is_empty() {
            return Err(ConfigError::Invalid(
                "UAV_BASE_TOPIC".to_string(),
                base_topic,
            ));
        }
        let device_codes = read_optional("UAV_DEVICE_CODES")
            .map(|value| parse_list(&value))
            .unwrap_or_default();
        let reconnect_delay_ms = read_u64_with_default("UAV_RECONNECT_DELAY_MS", 4000)?;
        let heartbeat_outgoing_ms = read_u64_with_default("UAV_HEARTBEAT_OUTGOING_MS", 10000)?;
        let heartbeat_incoming_ms = read_u64_with_default("UAV_HEARTBEAT_INCOMING_MS", 10000)?;
        let ingest_enabled = read_bool_with_default("UAV_INGEST", true);

        Ok(Self {
            http_addr,
            ws_url,
            base_topic,
            device_codes,
            reconnect_delay_ms,
            heartbeat_outgoing_ms,
            heartbeat_incoming_ms,
            ingest_enabled,
        })
    }
}

/// 解析逗号分隔列表（去空白、去空项）。
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn read_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_optional(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

fn read_bool_with_default(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "on"),
        Err(_) => default,
    }
}
