//! Apartment API 模块
//!
//! 状态、价格、上下架的修改都会使导航缓存与房源列表缓存失效。

mod handler;

use axum::{
    Router,
    routing::{patch, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/apartments", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/{id}", patch(handler::update).delete(handler::delete))
        .route("/{id}/status", put(handler::update_status))
}
