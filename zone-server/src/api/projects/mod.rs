//! Project API 模块
//!
//! 项目与楼栋的最小管理接口，以及楼栋下的房源创建。

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/projects", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create))
        .route("/{project_id}", get(handler::get_by_id))
        .route(
            "/{project_id}/buildings",
            get(handler::list_buildings).post(handler::create_building),
        )
        .route(
            "/{project_id}/buildings/{building_id}/apartments",
            post(handler::create_apartment),
        )
}
