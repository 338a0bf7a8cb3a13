//! Zone API 模块
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/projects/{project_id}/zones | GET | 按层级上下文列出 |
//! | /api/projects/{project_id}/zones | POST | 创建区域 |
//! | /api/projects/{project_id}/zones/{zone_id} | GET/PUT/DELETE | 读取/更新/删除 |
//! | /api/projects/{project_id}/zones/{zone_id}/outline | GET | SVG 轮廓路径 |
//! | /api/projects/{project_id}/zones/bulk-delete | POST | 批量删除 |
//! | /api/projects/{project_id}/zones/bulk-template | POST | 按楼层复制模板 |
//! | /api/projects/{project_id}/zones/import | POST | 逐项导入 (识别结果) |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/projects/{project_id}/zones", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/bulk-delete", post(handler::bulk_delete))
        .route("/bulk-template", post(handler::bulk_template))
        .route("/import", post(handler::import))
        .route(
            "/{zone_id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
        .route("/{zone_id}/outline", get(handler::outline))
}
