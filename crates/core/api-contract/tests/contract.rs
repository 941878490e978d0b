use api_contract::{DeviceStatusDto, DeviceTelemetryDto, FleetHealthDto, FleetHealthQuery};
use serde_json::Value;

#[test]
fn device_status_is_camel_case() {
    let dto = DeviceStatusDto {
        uav_code: "UAV-1".to_string(),
        classification: "WARNING".to_string(),
        mission_id: Some("42".to_string()),
        telemetry: Some(DeviceTelemetryDto {
            battery_percent: Some(80.0),
            status: Some("WARNING".to_string()),
            lat: Some(1.0),
            lng: Some(2.0),
            alt: None,
            last_updated_at_ms: 1_700_000_000_000,
        }),
    };
    let value = serde_json::to_value(dto).expect("serialize");
    assert_eq!(value.get("uavCode"), Some(&Value::from("UAV-1")));
    assert!(value.get("missionId").is_some());
    assert!(value.get("uav_code").is_none());
    let telemetry = value.get("telemetry").expect("telemetry");
    assert!(telemetry.get("batteryPercent").is_some());
    assert!(telemetry.get("lastUpdatedAtMs").is_some());
    assert!(matches!(telemetry.get("alt"), Some(Value::Null)));
}

#[test]
fn missing_record_serializes_as_null() {
    let dto = DeviceStatusDto {
        uav_code: "UAV-9".to_string(),
        classification: "OFFLINE".to_string(),
        mission_id: None,
        telemetry: None,
    };
    let value = serde_json::to_value(dto).expect("serialize");
    assert!(matches!(value.get("telemetry"), Some(Value::Null)));
}

#[test]
fn fleet_health_is_camel_case() {
    let dto = FleetHealthDto {
        connected: true,
        total: 3,
        online: 2,
        link_issues: 1,
        max_battery: 95.0,
    };
    let value = serde_json::to_value(dto).expect("serialize");
    assert!(value.get("linkIssues").is_some());
    assert!(value.get("maxBattery").is_some());
    assert!(value.get("link_issues").is_none());
}

#[test]
fn fleet_health_query_codes_are_optional() {
    let query: FleetHealthQuery = serde_json::from_str("{}").expect("parse");
    assert!(query.codes.is_none());
    let query: FleetHealthQuery = serde_json::from_str(r#"{"codes":"A,B"}"#).expect("parse");
    assert_eq!(query.codes.as_deref(), Some("A,B"));
}
