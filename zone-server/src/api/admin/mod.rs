//! 运维接口
//!
//! 版本轮换缓存只会放弃旧条目而不删除，这里提供手动回收。

use axum::{Json, Router, extract::State, routing::post};
use serde::Serialize;
use shared::error::ApiResponse;

use crate::core::ServerState;
use crate::utils::ok_with_message;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/admin/cache/flush", post(flush_caches))
}

#[derive(Debug, Serialize)]
pub struct FlushResult {
    pub navigation_entries: usize,
    pub catalogue_entries: usize,
}

/// POST /api/admin/cache/flush - 清空导航缓存与房源列表缓存
pub async fn flush_caches(State(state): State<ServerState>) -> Json<ApiResponse<FlushResult>> {
    let result = FlushResult {
        navigation_entries: state.navigation.clear(),
        catalogue_entries: state.catalogue.cache().flush(),
    };
    tracing::info!(
        navigation = result.navigation_entries,
        catalogue = result.catalogue_entries,
        "Caches flushed"
    );
    ok_with_message(result, "Caches flushed")
}
