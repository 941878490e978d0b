//! 追踪、请求 ID 与推送客户端指标。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 请求级追踪标识。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// 客户端指标快照。
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
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

/// 客户端指标。
pub struct TelemetryMetrics {
    frames_received: AtomicU64,
    frames_ignored: AtomicU64,
    payloads_dropped_malformed: AtomicU64,
    payloads_dropped_missing_code: AtomicU64,
    messages_applied: AtomicU64,
    handshakes_completed: AtomicU64,
    subscriptions_sent: AtomicU64,
    transport_failures: AtomicU64,
    reconnects_scheduled: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            frames_received: AtomicU64::new(0),
            frames_ignored: AtomicU64::new(0),
            payloads_dropped_malformed: AtomicU64::new(0),
            payloads_dropped_missing_code: AtomicU64::new(0),
            messages_applied: AtomicU64::new(0),
            handshakes_completed: AtomicU64::new(0),
            subscriptions_sent: AtomicU64::new(0),
            transport_failures: AtomicU64::new(0),
            reconnects_scheduled: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_ignored: self.frames_ignored.load(Ordering::Relaxed),
            payloads_dropped_malformed: self.payloads_dropped_malformed.load(Ordering::Relaxed),
            payloads_dropped_missing_code: self
                .payloads_dropped_missing_code
                .load(Ordering::Relaxed),
            messages_applied: self.messages_applied.load(Ordering::Relaxed),
            handshakes_completed: self.handshakes_completed.load(Ordering::Relaxed),
            subscriptions_sent: self.subscriptions_sent.load(Ordering::Relaxed),
            transport_failures: self.transport_failures.load(Ordering::Relaxed),
            reconnects_scheduled: self.reconnects_scheduled.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 request_id 与 trace_id。
pub fn new_request_ids() -> RequestIds {
    RequestIds {
        request_id: uuid::Uuid::new_v4().to_string(),
        trace_id: uuid::Uuid::new_v4().to_string(),
    }
}

/// 记录收到的帧数（已按 NUL 切分）。
pub fn record_frame_received() {
    metrics().frames_received.fetch_add(1, Ordering::Relaxed);
}

/// 记录被忽略的帧（未识别命令或不在会话中）。
pub fn record_frame_ignored() {
    metrics().frames_ignored.fetch_add(1, Ordering::Relaxed);
}

/// 记录 body 无法解析的 MESSAGE。
pub fn record_payload_dropped_malformed() {
    metrics()
        .payloads_dropped_malformed
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录缺少 uavCode 的 MESSAGE。
pub fn record_payload_dropped_missing_code() {
    metrics()
        .payloads_dropped_missing_code
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录写入对账表的载荷数。
pub fn record_message_applied() {
    metrics().messages_applied.fetch_add(1, Ordering::Relaxed);
}

/// 记录握手完成次数。
pub fn record_handshake_completed() {
    metrics().handshakes_completed.fetch_add(1, Ordering::Relaxed);
}

/// 记录发出的 SUBSCRIBE 帧数。
pub fn record_subscriptions_sent(count: u64) {
    metrics()
        .subscriptions_sent
        .fetch_add(count, Ordering::Relaxed);
}

/// 记录传输层关闭/错误次数。
pub fn record_transport_failure() {
    metrics().transport_failures.fetch_add(1, Ordering::Relaxed);
}

/// 记录安排重连的次数（替换已有定时器也计数）。
pub fn record_reconnect_scheduled() {
    metrics()
        .reconnects_scheduled
        .fetch_add(1, Ordering::Relaxed);
}
