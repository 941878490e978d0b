//! 推送链路装配
//!
//! 把运行配置转换为连接配置，用 WebSocket 连接器启动连接管理器，
//! 推送回调直接写入对账器。返回的句柄用于退出时停用客户端。

use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use uav_config::AppConfig;
use uav_ingest::{ClientHandle, ConnectionConfig, ConnectionManager, WsConnector};
use uav_protocol::HeartBeat;
use uav_reconcile::Reconciler;

/// 由运行配置生成连接配置。
pub fn connection_config(config: &AppConfig) -> ConnectionConfig {
    let mut connection = ConnectionConfig::new(config.ws_url.clone(), config.base_topic.clone());
    connection.device_codes = config.device_codes.clone();
    connection.reconnect_delay = Duration::from_millis(config.reconnect_delay_ms);
    connection.heart_beat =
        HeartBeat::new(config.heartbeat_outgoing_ms, config.heartbeat_incoming_ms);
    connection
}

/// 启动推送客户端（后台事件循环）。
pub fn start_ingest(config: &AppConfig, reconciler: Arc<Reconciler>) -> ClientHandle {
    let connection = connection_config(config);
    info!(
        target: "uav.ingest",
        url = %connection.url,
        base_topic = %connection.base_topic,
        device_codes = connection.device_codes.len(),
        reconnect_delay_ms = config.reconnect_delay_ms,
        "ingest_starting"
    );
    let (manager, events) =
        ConnectionManager::new(connection, Arc::new(WsConnector), reconciler);
    let handle = manager.handle();
    tokio::spawn(manager.run(events));
    handle
}
