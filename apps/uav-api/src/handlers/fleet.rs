//! 机队健康度 handler
//!
//! - GET /fleet/health?codes=A,B

use crate::AppState;
use api_contract::{ApiResponse, FleetHealthDto, FleetHealthQuery};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use uav_config::parse_list;

/// 未给出 codes 时统计对账表中已有的全部设备。
pub async fn get_fleet_health(
    State(state): State<AppState>,
    Query(query): Query<FleetHealthQuery>,
) -> Response {
    let codes = match query.codes.as_deref() {
        Some(value) => parse_list(value),
        None => state.reconciler.snapshot().devices.into_keys().collect(),
    };
    let health = state.reconciler.fleet_health(&codes);
    let data = FleetHealthDto {
        connected: health.connected,
        total: codes.len(),
        online: health.online,
        link_issues: health.link_issues,
        max_battery: health.max_battery,
    };
    (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
}
