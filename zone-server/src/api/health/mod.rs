//! 健康检查路由
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /health | GET | 存活检查 + 数据库探测 |

use std::time::SystemTime;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use shared::error::ApiResponse;

use crate::core::ServerState;
use crate::utils::ok;

pub fn router() -> Router<ServerState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// healthy | degraded
    status: &'static str,
    version: &'static str,
    database: bool,
    uptime_seconds: u64,
    navigation_cache_entries: usize,
    catalogue_cache_entries: usize,
}

// 服务器启动时间 (懒加载静态变量)
static START_TIME: std::sync::OnceLock<SystemTime> = std::sync::OnceLock::new();

fn uptime_seconds() -> u64 {
    let start = START_TIME.get_or_init(SystemTime::now);
    SystemTime::now()
        .duration_since(*start)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

pub async fn health(State(state): State<ServerState>) -> Json<ApiResponse<HealthResponse>> {
    let database = state.db.ping().await;
    if !database {
        tracing::warn!("Health check: database unreachable");
    }
    ok(HealthResponse {
        status: if database { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database,
        uptime_seconds: uptime_seconds(),
        navigation_cache_entries: state.navigation.len(),
        catalogue_cache_entries: state.catalogue.cache().len(),
    })
}
