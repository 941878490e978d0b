//! 连接管理器

use crate::subscription::SubscriptionRegistry;
use crate::transport::{Connector, TransportEvent, TransportEvents, TransportHandle};
use domain::{PayloadError, TelemetryPayload};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tracing::{debug, info, warn};
use uav_protocol::{ACCEPT_VERSION, Command, Frame, HeartBeat, decode, split_frames};
use uav_telemetry::{
    record_frame_ignored, record_frame_received, record_handshake_completed,
    record_payload_dropped_malformed, record_payload_dropped_missing_code,
    record_reconnect_scheduled, record_subscriptions_sent, record_transport_failure,
};

/// 参考部署的固定重连间隔。
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(4000);

/// 连接状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    /// 传输已打开（或正在打开），握手帧已发出或待发出
    Connecting,
    /// 已收到 CONNECTED
    Connected,
    Closed,
    Errored,
}

impl ConnectionState {
    fn is_live(self) -> bool {
        matches!(self, ConnectionState::Connecting | ConnectionState::Connected)
    }
}

/// 连接配置。
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub url: String,
    pub base_topic: String,
    pub device_codes: Vec<String>,
    pub reconnect_delay: Duration,
    pub heart_beat: HeartBeat,
}

impl ConnectionConfig {
    pub fn new(url: impl Into<String>, base_topic: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            base_topic: base_topic.into(),
            device_codes: Vec::new(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            heart_beat: HeartBeat::new(10000, 10000),
        }
    }
}

/// 推送消费方回调。
///
/// 回调在事件循环内同步执行，不应阻塞，也不能在回调内调用 [`ClientHandle::deactivate`]
/// （两者共用同一把锁）。
pub trait ConnectionListener: Send + Sync {
    fn on_message(&self, payload: TelemetryPayload);

    fn on_connect(&self) {}

    fn on_disconnect(&self) {}
}

/// 事件循环输入。
#[derive(Debug)]
pub enum ManagerEvent {
    Transport {
        generation: u64,
        event: TransportEvent,
    },
    ReconnectDue {
        token: u64,
    },
    /// 到达协商后的心跳发送时间
    HeartBeatDue {
        generation: u64,
    },
    SetDeviceCodes(Vec<String>),
    Deactivate,
}

#[derive(Debug, Default)]
struct GateState {
    stopped: bool,
    /// 当前会话处于 Connecting/Connected，尚未通知断开
    session_live: bool,
}

/// 回调闸门：事件循环与控制句柄共享。
///
/// 所有回调在持锁状态下执行。`stop` 拿到锁时之前的回调已经结束，之后的回调全部被拦截，
/// 因此 `ClientHandle::deactivate` 返回后不会再有任何回调。
struct ListenerGate {
    listener: Arc<dyn ConnectionListener>,
    state: Mutex<GateState>,
}

impl ListenerGate {
    fn new(listener: Arc<dyn ConnectionListener>) -> Self {
        Self {
            listener,
            state: Mutex::new(GateState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    fn session_opened(&self) {
        self.lock().session_live = true;
    }

    fn connected(&self) {
        let state = self.lock();
        if !state.stopped {
            self.listener.on_connect();
        }
    }

    fn message(&self, payload: TelemetryPayload) {
        let state = self.lock();
        if !state.stopped {
            self.listener.on_message(payload);
        }
    }

    /// 会话结束：每个会话至多通知一次断开。
    fn disconnected(&self) {
        let mut state = self.lock();
        if state.stopped || !state.session_live {
            return;
        }
        state.session_live = false;
        self.listener.on_disconnect();
    }

    /// 永久关闭闸门；会话仍存活时先通知断开。返回 false 表示此前已关闭。
    fn stop(&self) -> bool {
        let mut state = self.lock();
        if state.stopped {
            return false;
        }
        if state.session_live {
            state.session_live = false;
            self.listener.on_disconnect();
        }
        state.stopped = true;
        true
    }
}

/// 控制句柄：从事件循环外部发出控制命令。
#[derive(Clone)]
pub struct ClientHandle {
    events: mpsc::UnboundedSender<ManagerEvent>,
    gate: Arc<ListenerGate>,
}

impl ClientHandle {
    /// 永久停止客户端。
    ///
    /// 返回前同步关闭回调闸门（会话存活时先触发一次 `on_disconnect`），
    /// 传输层与定时器随后由事件循环释放。可重复调用。
    pub fn deactivate(&self) {
        if self.gate.stop() {
            info!(target: "uav.ingest", "client_handle_deactivated");
        }
        let _ = self.events.send(ManagerEvent::Deactivate);
    }

    /// 更新额外订阅的设备编码，下一次握手生效。
    pub fn set_device_codes(&self, codes: Vec<String>) {
        let _ = self.events.send(ManagerEvent::SetDeviceCodes(codes));
    }
}

struct PendingReconnect {
    token: u64,
    task: JoinHandle<()>,
}

/// 连接管理器：至多一个活动传输，驱动握手与重连状态机。
pub struct ConnectionManager {
    url: String,
    reconnect_delay: Duration,
    heart_beat: HeartBeat,
    connector: Arc<dyn Connector>,
    gate: Arc<ListenerGate>,
    registry: SubscriptionRegistry,
    events: mpsc::UnboundedSender<ManagerEvent>,
    state: ConnectionState,
    generation: u64,
    should_reconnect: bool,
    transport: Option<Box<dyn TransportHandle>>,
    reconnect: Option<PendingReconnect>,
    reconnect_token: u64,
    heart_beat_task: Option<JoinHandle<()>>,
}

impl ConnectionManager {
    /// 创建管理器，同时返回事件循环的接收端。
    pub fn new(
        config: ConnectionConfig,
        connector: Arc<dyn Connector>,
        listener: Arc<dyn ConnectionListener>,
    ) -> (Self, mpsc::UnboundedReceiver<ManagerEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let registry = SubscriptionRegistry::new(config.base_topic, config.device_codes);
        let manager = Self {
            url: config.url,
            reconnect_delay: config.reconnect_delay,
            heart_beat: config.heart_beat,
            connector,
            gate: Arc::new(ListenerGate::new(listener)),
            registry,
            events,
            state: ConnectionState::Idle,
            generation: 0,
            should_reconnect: false,
            transport: None,
            reconnect: None,
            reconnect_token: 0,
            heart_beat_task: None,
        };
        (manager, receiver)
    }

    pub fn handle(&self) -> ClientHandle {
        ClientHandle {
            events: self.events.clone(),
            gate: self.gate.clone(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn reconnect_pending(&self) -> bool {
        self.reconnect.is_some()
    }

    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    /// 启动并驱动事件循环，直到收到 `Deactivate`。
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<ManagerEvent>) {
        self.activate();
        while let Some(event) = events.recv().await {
            if !self.handle_event(event) {
                break;
            }
        }
        self.deactivate();
    }

    /// 处理一个事件；返回 false 表示事件循环应当结束。
    pub fn handle_event(&mut self, event: ManagerEvent) -> bool {
        match event {
            ManagerEvent::Transport { generation, event } => {
                self.on_transport_event(generation, event)
            }
            ManagerEvent::ReconnectDue { token } => self.on_reconnect_due(token),
            ManagerEvent::HeartBeatDue { generation } => self.on_heart_beat_due(generation),
            ManagerEvent::SetDeviceCodes(codes) => self.set_device_codes(codes),
            ManagerEvent::Deactivate => {
                self.deactivate();
                return false;
            }
        }
        true
    }

    /// 打开连接；已激活时不重复打开。
    pub fn activate(&mut self) {
        if self.gate.is_stopped() {
            debug!(target: "uav.ingest", "activate_ignored_client_stopped");
            return;
        }
        if self.should_reconnect {
            debug!(target: "uav.ingest", generation = self.generation, "activate_ignored_already_active");
            return;
        }
        self.should_reconnect = true;
        self.open_session();
    }

    /// 停止：取消重连与心跳定时器、关闭传输。会话存活时在返回前触发一次
    /// `on_disconnect`，之后不再触发任何回调。可重复调用。
    pub fn deactivate(&mut self) {
        let was_active =
            self.should_reconnect || self.transport.is_some() || self.reconnect.is_some();
        self.should_reconnect = false;
        self.cancel_reconnect();
        self.cancel_heart_beat();
        self.gate.disconnected();
        if let Some(mut transport) = self.transport.take() {
            if self.state == ConnectionState::Connected {
                let _ = transport.send(Frame::disconnect().encode());
            }
            transport.close();
        }
        self.state = ConnectionState::Idle;
        if was_active {
            // 让旧会话的迟到事件全部失效
            self.generation += 1;
            info!(target: "uav.ingest", generation = self.generation, "client_deactivated");
        }
    }

    /// 更新设备编码集合；不会立即重发订阅。
    pub fn set_device_codes(&mut self, codes: Vec<String>) {
        self.registry.set_device_codes(codes);
        debug!(
            target: "uav.ingest",
            device_count = self.registry.device_codes().count(),
            "device_codes_updated"
        );
    }

    fn open_session(&mut self) {
        self.cancel_reconnect();
        self.cancel_heart_beat();
        if let Some(mut stale) = self.transport.take() {
            stale.close();
        }
        self.generation += 1;
        self.state = ConnectionState::Connecting;
        self.gate.session_opened();
        info!(
            target: "uav.ingest",
            generation = self.generation,
            url = %self.url,
            "transport_opening"
        );

        let events = TransportEvents::new(self.generation, self.events.clone());
        match self.connector.open(&self.url, events) {
            Ok(transport) => self.transport = Some(transport),
            Err(err) => {
                warn!(target: "uav.ingest", error = %err, "transport_open_failed");
                self.session_ended(ConnectionState::Errored);
            }
        }
    }

    fn on_transport_event(&mut self, generation: u64, event: TransportEvent) {
        if self.gate.is_stopped() || !self.should_reconnect || generation != self.generation {
            debug!(
                target: "uav.ingest",
                generation,
                current = self.generation,
                "stale_transport_event_dropped"
            );
            return;
        }

        match event {
            TransportEvent::Opened => {
                if self.state != ConnectionState::Connecting {
                    return;
                }
                let frame = Frame::connect(ACCEPT_VERSION, self.heart_beat);
                if let Some(transport) = self.transport.as_mut() {
                    if let Err(err) = transport.send(frame.encode()) {
                        warn!(target: "uav.ingest", error = %err, "connect_frame_send_failed");
                    }
                }
            }
            TransportEvent::Text(chunk) => {
                for raw in split_frames(&chunk) {
                    record_frame_received();
                    if !self.state.is_live() {
                        record_frame_ignored();
                        continue;
                    }
                    self.dispatch(decode(raw));
                }
            }
            TransportEvent::Closed => {
                info!(target: "uav.ingest", generation, "transport_closed");
                self.session_ended(ConnectionState::Closed);
            }
            TransportEvent::Error(message) => {
                warn!(target: "uav.ingest", generation, error = %message, "transport_error");
                self.session_ended(ConnectionState::Errored);
            }
        }
    }

    fn dispatch(&mut self, frame: Frame) {
        match frame.command() {
            Command::Connected => self.on_connected(&frame),
            Command::Message => self.on_message_frame(&frame),
            Command::Error => {
                warn!(
                    target: "uav.ingest",
                    message = frame.header("message").unwrap_or_default(),
                    body = %frame.body(),
                    "server_error_frame"
                );
            }
            Command::Disconnect => {
                info!(target: "uav.ingest", generation = self.generation, "server_disconnect_frame");
                self.session_ended(ConnectionState::Closed);
            }
            other => {
                record_frame_ignored();
                debug!(target: "uav.ingest", command = %other, "frame_ignored");
            }
        }
    }

    fn on_connected(&mut self, frame: &Frame) {
        self.state = ConnectionState::Connected;
        record_handshake_completed();
        info!(
            target: "uav.ingest",
            generation = self.generation,
            version = frame.header("version").unwrap_or_default(),
            heart_beat = frame.header("heart-beat").unwrap_or_default(),
            "handshake_completed"
        );
        self.gate.connected();
        self.resubscribe();
        self.start_heart_beat(frame);
    }

    /// 按 CONNECTED 帧协商的间隔发送心跳；服务端未声明或声明非法时不发送。
    fn start_heart_beat(&mut self, frame: &Frame) {
        self.cancel_heart_beat();
        let server = match frame.header("heart-beat").map(str::parse::<HeartBeat>) {
            Some(Ok(server)) => server,
            Some(Err(err)) => {
                warn!(target: "uav.ingest", error = %err, "server_heart_beat_invalid");
                return;
            }
            None => return,
        };
        let Some(interval_ms) = self.heart_beat.outgoing_interval(&server) else {
            return;
        };

        let period = Duration::from_millis(interval_ms);
        let generation = self.generation;
        let events = self.events.clone();
        let first_tick = Instant::now() + period;
        self.heart_beat_task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(first_tick, period);
            loop {
                ticker.tick().await;
                if events.send(ManagerEvent::HeartBeatDue { generation }).is_err() {
                    break;
                }
            }
        }));
        debug!(target: "uav.ingest", generation, interval_ms, "heart_beat_started");
    }

    fn on_heart_beat_due(&mut self, generation: u64) {
        if self.gate.is_stopped()
            || generation != self.generation
            || self.state != ConnectionState::Connected
        {
            return;
        }
        if let Some(transport) = self.transport.as_mut() {
            if let Err(err) = transport.send("\n".to_string()) {
                warn!(target: "uav.ingest", generation, error = %err, "heart_beat_send_failed");
            }
        }
    }

    fn cancel_heart_beat(&mut self) {
        if let Some(task) = self.heart_beat_task.take() {
            task.abort();
        }
    }

    /// 重发完整订阅集合。
    fn resubscribe(&mut self) {
        let frames = self.registry.subscribe_frames();
        let Some(transport) = self.transport.as_mut() else {
            return;
        };
        let mut sent = 0u64;
        for frame in frames {
            if let Err(err) = transport.send(frame.encode()) {
                warn!(target: "uav.ingest", error = %err, "subscribe_send_failed");
                break;
            }
            sent += 1;
        }
        record_subscriptions_sent(sent);
        info!(target: "uav.ingest", subscriptions = sent, "subscriptions_sent");
    }

    fn on_message_frame(&mut self, frame: &Frame) {
        match TelemetryPayload::parse(frame.body()) {
            Ok(payload) => self.gate.message(payload),
            Err(PayloadError::MissingDeviceCode) => {
                record_payload_dropped_missing_code();
                debug!(
                    target: "uav.ingest",
                    destination = frame.header("destination").unwrap_or_default(),
                    "message_dropped_missing_code"
                );
            }
            Err(err) => {
                record_payload_dropped_malformed();
                debug!(
                    target: "uav.ingest",
                    destination = frame.header("destination").unwrap_or_default(),
                    error = %err,
                    "message_dropped_malformed"
                );
            }
        }
    }

    /// 会话结束：先复位状态，再通知断开，最后安排重连。
    fn session_ended(&mut self, terminal: ConnectionState) {
        let was_live = self.state.is_live();
        self.state = terminal;
        self.cancel_heart_beat();
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
        if was_live {
            record_transport_failure();
            self.gate.disconnected();
        }
        if self.should_reconnect {
            self.schedule_reconnect();
        }
    }

    /// 安排一次重连；已有定时器时替换。
    fn schedule_reconnect(&mut self) {
        self.cancel_reconnect();
        self.reconnect_token += 1;
        let token = self.reconnect_token;
        let delay = self.reconnect_delay;
        let events = self.events.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(ManagerEvent::ReconnectDue { token });
        });
        self.reconnect = Some(PendingReconnect { token, task });
        record_reconnect_scheduled();
        info!(
            target: "uav.ingest",
            generation = self.generation,
            delay_ms = delay.as_millis() as u64,
            "reconnect_scheduled"
        );
    }

    fn cancel_reconnect(&mut self) {
        if let Some(pending) = self.reconnect.take() {
            pending.task.abort();
        }
    }

    fn on_reconnect_due(&mut self, token: u64) {
        if self.gate.is_stopped() {
            return;
        }
        match self.reconnect.as_ref() {
            Some(pending) if pending.token == token => {}
            _ => {
                debug!(target: "uav.ingest", token, "stale_reconnect_timer_dropped");
                return;
            }
        }
        self.reconnect = None;
        if self.should_reconnect {
            self.open_session();
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.cancel_reconnect();
        self.cancel_heart_beat();
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
    }
}
