//! 推送客户端指标快照。
//!
//! - GET /metrics

use api_contract::{ApiResponse, MetricsSnapshotDto};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use uav_telemetry::metrics;

pub async fn get_metrics() -> Response {
    let snapshot = metrics().snapshot();
    (
        StatusCode::OK,
        Json(ApiResponse::success(MetricsSnapshotDto {
            frames_received: snapshot.frames_received,
            frames_ignored: snapshot.frames_ignored,
            payloads_dropped_malformed: snapshot.payloads_dropped_malformed,
            payloads_dropped_missing_code: snapshot.payloads_dropped_missing_code,
            messages_applied: snapshot.messages_applied,
            handshakes_completed: snapshot.handshakes_completed,
            subscriptions_sent: snapshot.subscriptions_sent,
            transport_failures: snapshot.transport_failures,
            reconnects_scheduled: snapshot.reconnects_scheduled,
        })),
    )
        .into_response()
}
