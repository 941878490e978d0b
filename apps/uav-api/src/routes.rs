//! 路由定义
//!
//! 集中管理所有只读 API 路由，将路径映射到对应的 handlers：
//! - 健康检查：/health
//! - 遥测视图：/telemetry, /telemetry/{uav_code}
//! - 机队健康度：/fleet/health
//! - 任务指标：/missions/{mission_id}/telemetry
//! - 客户端指标：/metrics

use super::{AppState, request_context};
use super::handlers::*;
use axum::{Router, middleware, routing::get};
use tower_http::trace::TraceLayer;

/// 创建 API 路由（统一挂在 /api 前缀下）
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/telemetry", get(get_telemetry_snapshot))
        .route("/telemetry/:uav_code", get(get_device_telemetry))
        .route("/fleet/health", get(get_fleet_health))
        .route("/missions/:mission_id/telemetry", get(get_mission_telemetry))
        .route("/metrics", get(get_metrics))
}

/// 完整应用路由：健康检查 + API + 请求追踪中间件
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", create_api_router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // 注入 request_id/trace_id
        .layer(middleware::from_fn(request_context))
}
