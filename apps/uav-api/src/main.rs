//! 无人机遥测只读 HTTP 服务：推送客户端 + 对账视图 + 请求追踪 ID。

mod handlers;
mod ingest;
mod routes;
mod utils;

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{Instrument, info, warn};
use uav_config::AppConfig;
use uav_reconcile::Reconciler;
use uav_telemetry::{init_tracing, new_request_ids};

#[derive(Clone)]
pub struct AppState {
    pub reconciler: Arc<Reconciler>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 从环境变量加载运行配置
    let config = AppConfig::from_env()?;
    // 初始化结构化日志
    init_tracing();

    let reconciler = Arc::new(Reconciler::new());
    // 推送客户端（UAV_INGEST=false 时只提供空视图）
    let client = if config.ingest_enabled {
        Some(ingest::start_ingest(&config, reconciler.clone()))
    } else {
        info!(target: "uav.api", "ingest_disabled");
        None
    };

    let state = AppState {
        reconciler: reconciler.clone(),
    };
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    info!(target: "uav.api", addr = %config.http_addr, "http_listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(client) = client {
        client.deactivate();
    }
    reconciler.dispose();
    info!(target: "uav.api", "shutdown_complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(target: "uav.api", error = %err, "shutdown_signal_failed");
    }
}

async fn request_context(mut req: Request<Body>, next: Next) -> Response {
    // 生成 request_id 与 trace_id，并注入请求扩展与日志
    let ids = new_request_ids();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    req.extensions_mut().insert(ids.clone());

    let span = tracing::info_span!(
        "request",
        request_id = %ids.request_id,
        trace_id = %ids.trace_id,
        method = %method,
        path = %path
    );

    let mut response = next.run(req).instrument(span).await;
    response.headers_mut().insert(
        "x-request-id",
        HeaderValue::from_str(&ids.request_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response.headers_mut().insert(
        "x-trace-id",
        HeaderValue::from_str(&ids.trace_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response
}
