//! 遥测对账
//!
//! 以设备编码为键，按到达顺序合并推送载荷（后到者覆盖，不做乱序纠正：载荷不带生产端时间戳）。
//! 同时维护"设备 → 最近任务"索引与每个任务最近一次的指标数据。
//!
//! 对账表只由推送回调写入，消费方只读快照或订阅变更通知。握手完成时清空，
//! 因此"无记录"始终表示"本次订阅以来未收到数据"。

use domain::{
    DeviceStatus, DeviceTelemetry, MissionSample, TelemetryPayload, classify_device, now_epoch_ms,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::watch;
use tracing::{debug, info};
use uav_ingest::ConnectionListener;
use uav_telemetry::record_message_applied;

/// 单台设备的只读视图。
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceView {
    pub uav_code: String,
    pub record: DeviceTelemetry,
    pub status: DeviceStatus,
    pub mission_id: Option<String>,
}

/// 对账表快照。
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySnapshot {
    pub connected: bool,
    pub version: u64,
    pub devices: BTreeMap<String, DeviceView>,
}

/// 机队健康度（针对外部给定的设备列表）。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FleetHealth {
    pub connected: bool,
    /// 有遥测记录的设备数
    pub online: usize,
    /// 电量、纬度、经度任一缺失的设备数
    pub link_issues: usize,
    /// 已上报电量中的最大值，没有时为 0
    pub max_battery: f64,
}

#[derive(Debug, Default)]
struct ReconcilerState {
    connected: bool,
    disposed: bool,
    version: u64,
    records: HashMap<String, DeviceTelemetry>,
    missions: HashMap<String, String>,
    mission_samples: HashMap<String, MissionSample>,
}

impl ReconcilerState {
    fn view(&self, uav_code: &str, record: &DeviceTelemetry) -> DeviceView {
        DeviceView {
            uav_code: uav_code.to_string(),
            record: record.clone(),
            status: classify_device(self.connected, Some(record)),
            mission_id: self.missions.get(uav_code).cloned(),
        }
    }

    fn clear(&mut self) {
        self.records.clear();
        self.missions.clear();
        self.mission_samples.clear();
    }
}

/// 遥测对账器。
pub struct Reconciler {
    state: RwLock<ReconcilerState>,
    changes: watch::Sender<u64>,
}

impl Reconciler {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            state: RwLock::new(ReconcilerState::default()),
            changes,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ReconcilerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ReconcilerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// 写操作收尾：版本号递增并通知订阅方。
    fn bump(&self, state: &mut ReconcilerState) {
        state.version += 1;
        self.changes.send_replace(state.version);
    }

    /// 合并一条载荷；已释放时返回 false。
    pub fn apply(&self, payload: &TelemetryPayload, received_at_ms: i64) -> bool {
        let mut state = self.write();
        if state.disposed {
            return false;
        }
        state
            .records
            .entry(payload.uav_code.clone())
            .or_default()
            .merge(payload, received_at_ms);

        if let Some(mission_id) = payload.mission_id.as_ref() {
            state
                .missions
                .insert(payload.uav_code.clone(), mission_id.clone());
            if let Some(data) = payload.data.as_ref() {
                state.mission_samples.insert(
                    mission_id.clone(),
                    MissionSample {
                        mission_id: mission_id.clone(),
                        uav_code: payload.uav_code.clone(),
                        data: data.clone(),
                        received_at_ms,
                    },
                );
            }
        }
        self.bump(&mut state);
        record_message_applied();
        debug!(
            target: "uav.reconcile",
            uav_code = %payload.uav_code,
            mission_id = payload.mission_id.as_deref().unwrap_or_default(),
            version = state.version,
            "telemetry_applied"
        );
        true
    }

    /// 握手完成：标记已连接并清空上一轮的数据。
    pub fn connection_established(&self) {
        let mut state = self.write();
        if state.disposed {
            return;
        }
        let dropped = state.records.len();
        state.connected = true;
        state.clear();
        self.bump(&mut state);
        info!(target: "uav.reconcile", dropped_records = dropped, "reconciler_reset_on_handshake");
    }

    /// 连接断开：所有设备立即按断连分类。
    pub fn connection_lost(&self) {
        let mut state = self.write();
        if state.disposed || !state.connected {
            return;
        }
        state.connected = false;
        self.bump(&mut state);
        info!(target: "uav.reconcile", "reconciler_marked_disconnected");
    }

    pub fn is_connected(&self) -> bool {
        self.read().connected
    }

    pub fn version(&self) -> u64 {
        self.read().version
    }

    /// 设备状态分类（断连 > 无记录 > 严重 > 告警 > 在线）。
    pub fn classify(&self, uav_code: &str) -> DeviceStatus {
        let state = self.read();
        classify_device(state.connected, state.records.get(uav_code))
    }

    pub fn record(&self, uav_code: &str) -> Option<DeviceTelemetry> {
        self.read().records.get(uav_code).cloned()
    }

    /// 设备最近一次上报的任务标识。
    pub fn mission_for(&self, uav_code: &str) -> Option<String> {
        self.read().missions.get(uav_code).cloned()
    }

    pub fn mission_sample(&self, mission_id: &str) -> Option<MissionSample> {
        self.read().mission_samples.get(mission_id).cloned()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let state = self.read();
        let devices = state
            .records
            .iter()
            .map(|(code, record)| (code.clone(), state.view(code, record)))
            .collect();
        TelemetrySnapshot {
            connected: state.connected,
            version: state.version,
            devices,
        }
    }

    /// 按外部设备列表统计机队健康度；断连时不统计任何设备。
    pub fn fleet_health<I, S>(&self, uav_codes: I) -> FleetHealth
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let state = self.read();
        let mut health = FleetHealth {
            connected: state.connected,
            ..FleetHealth::default()
        };
        if !state.connected {
            return health;
        }
        for code in uav_codes {
            let Some(record) = state.records.get(code.as_ref()) else {
                continue;
            };
            health.online += 1;
            if record.has_link_issue() {
                health.link_issues += 1;
            }
            if let Some(battery) = record.battery_percent {
                health.max_battery = health.max_battery.max(battery);
            }
        }
        health
    }

    /// 订阅变更通知（值为版本号）。
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    /// 释放：清空数据，之后的写入全部忽略。
    pub fn dispose(&self) {
        let mut state = self.write();
        if state.disposed {
            return;
        }
        state.disposed = true;
        state.connected = false;
        state.clear();
        self.bump(&mut state);
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionListener for Reconciler {
    fn on_message(&self, payload: TelemetryPayload) {
        self.apply(&payload, now_epoch_ms());
    }

    fn on_connect(&self) {
        self.connection_established();
    }

    fn on_disconnect(&self) {
        self.connection_lost();
    }
}
