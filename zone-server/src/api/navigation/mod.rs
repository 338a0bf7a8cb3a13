//! Navigation API 模块
//!
//! 三级下钻读取：overview → building → floor。
//! 缺少层级所需参数返回 400，不做默认。

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route(
        "/api/projects/{project_id}/navigation",
        get(handler::navigate),
    )
}
