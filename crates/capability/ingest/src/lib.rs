//! # 推送采集能力模块
//!
//! 维护到后端推送通道的单一连接：握手、订阅、断线重连，并把 MESSAGE 载荷交给监听方。
//!
//! ## 状态机
//!
//! ```text
//! Idle ──activate──▶ Connecting ──CONNECTED──▶ Connected
//!                        │                         │
//!                        └──── close / error ──────┴──▶ Closed / Errored
//!                                                          │
//!                                          固定延迟后 ◀─────┘（should_reconnect 为真）
//! ```
//!
//! 每次打开传输层都会分配新的 generation，传输层事件携带各自的 generation；
//! 不属于当前会话的事件直接丢弃。`deactivate()` 在会话存活时先补发一次 `on_disconnect`，
//! 返回之后不再触发任何回调（`ClientHandle::deactivate` 跨任务同样成立）。
//!
//! ## 事件循环
//!
//! 传输任务、重连定时器与控制命令都写入同一个 `mpsc` 通道，由 [`ConnectionManager::run`]
//! 顺序处理，状态只在这一个任务里变更。

mod error;
mod manager;
mod subscription;
mod transport;
mod ws;

pub use error::TransportError;
pub use manager::{
    ClientHandle, ConnectionConfig, ConnectionListener, ConnectionManager, ConnectionState,
    ManagerEvent,
};
pub use subscription::{
    SUBSCRIPTION_ID_PREFIX, Subscription, SubscriptionRegistry, device_topic, plan_subscriptions,
};
pub use transport::{Connector, TransportEvent, TransportEvents, TransportHandle};
pub use ws::WsConnector;
