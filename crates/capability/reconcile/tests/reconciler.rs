use domain::{DeviceStatus, TelemetryPayload};
use uav_ingest::ConnectionListener;
use uav_reconcile::Reconciler;

fn payload(json: &str) -> TelemetryPayload {
    TelemetryPayload::parse(json).expect("payload")
}

fn connected_reconciler() -> Reconciler {
    let reconciler = Reconciler::new();
    reconciler.on_connect();
    reconciler
}

#[test]
fn partial_update_keeps_previous_fields() {
    let reconciler = connected_reconciler();
    reconciler.apply(&payload(r#"{"uavCode":"X","batteryPercent":80,"lat":1,"lng":2}"#), 1000);
    reconciler.apply(&payload(r#"{"uavCode":"X","status":"WARNING"}"#), 2000);

    let record = reconciler.record("X").expect("record");
    assert_eq!(record.battery_percent, Some(80.0));
    assert_eq!(record.lat, Some(1.0));
    assert_eq!(record.lng, Some(2.0));
    assert_eq!(record.status.as_deref(), Some("WARNING"));
    assert_eq!(record.last_updated_at_ms, 2000);
}

#[test]
fn classification_scenarios() {
    let reconciler = connected_reconciler();
    assert_eq!(reconciler.classify("UAV-1"), DeviceStatus::Offline);

    reconciler.apply(&payload(r#"{"uavCode":"UAV-3","status":"ONLINE"}"#), 1);
    assert_eq!(reconciler.classify("UAV-3"), DeviceStatus::Critical);

    reconciler.apply(
        &payload(r#"{"uavCode":"UAV-4","status":"WARNING","lat":31.2,"lng":121.4,"batteryPercent":40}"#),
        1,
    );
    assert_eq!(reconciler.classify("UAV-4"), DeviceStatus::Warning);

    reconciler.apply(
        &payload(r#"{"uavCode":"UAV-5","status":"ONLINE","lat":31.2,"lng":121.4,"batteryPercent":90}"#),
        1,
    );
    assert_eq!(reconciler.classify("UAV-5"), DeviceStatus::Online);
}

#[test]
fn disconnect_overrides_existing_records() {
    let reconciler = connected_reconciler();
    reconciler.on_message(payload(
        r#"{"uavCode":"UAV-2","status":"ONLINE","lat":31.2,"lng":121.4,"batteryPercent":90}"#,
    ));
    assert_eq!(reconciler.classify("UAV-2"), DeviceStatus::Online);

    reconciler.on_disconnect();
    assert!(!reconciler.is_connected());
    assert_eq!(reconciler.classify("UAV-2"), DeviceStatus::Disconnected);
    assert_eq!(reconciler.classify("UAV-unknown"), DeviceStatus::Disconnected);

    let snapshot = reconciler.snapshot();
    assert!(!snapshot.connected);
    assert_eq!(
        snapshot.devices.get("UAV-2").map(|view| view.status),
        Some(DeviceStatus::Disconnected)
    );
}

#[test]
fn handshake_clears_previous_session_records() {
    let reconciler = connected_reconciler();
    reconciler.apply(&payload(r#"{"uavCode":"UAV-1","lat":1,"lng":2,"batteryPercent":50,"missionId":"M-1"}"#), 1);
    reconciler.on_disconnect();
    reconciler.on_connect();

    assert!(reconciler.record("UAV-1").is_none());
    assert!(reconciler.mission_for("UAV-1").is_none());
    assert_eq!(reconciler.classify("UAV-1"), DeviceStatus::Offline);
}

#[test]
fn mission_index_and_samples_follow_latest_payload() {
    let reconciler = connected_reconciler();
    reconciler.apply(
        &payload(r#"{"uavCode":"UAV-1","missionId":"M-1","data":{"pm25":10.5}}"#),
        100,
    );
    reconciler.apply(
        &payload(r#"{"uavCode":"UAV-1","missionCode":"M-2","data":{"pm25":11.0}}"#),
        200,
    );
    reconciler.apply(&payload(r#"{"uavCode":"UAV-1","batteryPercent":60}"#), 300);

    assert_eq!(reconciler.mission_for("UAV-1").as_deref(), Some("M-2"));
    let first = reconciler.mission_sample("M-1").expect("first mission");
    assert_eq!(first.data.get("pm25"), Some(&serde_json::json!(10.5)));
    let second = reconciler.mission_sample("M-2").expect("second mission");
    assert_eq!(second.uav_code, "UAV-1");
    assert_eq!(second.received_at_ms, 200);
    assert!(reconciler.mission_sample("M-3").is_none());
}

#[test]
fn fleet_health_counts_listed_devices() {
    let reconciler = connected_reconciler();
    reconciler.apply(&payload(r#"{"uavCode":"A","batteryPercent":70,"lat":1,"lng":2}"#), 1);
    reconciler.apply(&payload(r#"{"uavCode":"B","batteryPercent":95}"#), 1);
    reconciler.apply(&payload(r#"{"uavCode":"C","batteryPercent":99,"lat":1,"lng":2}"#), 1);

    let health = reconciler.fleet_health(["A", "B", "D"]);
    assert!(health.connected);
    assert_eq!(health.online, 2);
    assert_eq!(health.link_issues, 1);
    assert_eq!(health.max_battery, 95.0);

    reconciler.on_disconnect();
    let health = reconciler.fleet_health(["A", "B"]);
    assert!(!health.connected);
    assert_eq!(health.online, 0);
    assert_eq!(health.max_battery, 0.0);
}

#[tokio::test]
async fn subscribers_observe_version_changes() {
    let reconciler = connected_reconciler();
    let mut changes = reconciler.subscribe();
    let before = *changes.borrow_and_update();

    reconciler.apply(&payload(r#"{"uavCode":"UAV-1"}"#), 1);
    changes.changed().await.expect("changed");
    assert!(*changes.borrow() > before);
    assert_eq!(*changes.borrow(), reconciler.version());
}

#[test]
fn dispose_ignores_later_messages() {
    let reconciler = connected_reconciler();
    reconciler.apply(&payload(r#"{"uavCode":"UAV-1"}"#), 1);
    reconciler.dispose();
    reconciler.dispose();

    assert!(!reconciler.apply(&payload(r#"{"uavCode":"UAV-2"}"#), 2));
    reconciler.on_connect();
    assert!(!reconciler.is_connected());
    assert!(reconciler.snapshot().devices.is_empty());
}
