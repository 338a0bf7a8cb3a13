//! Zone Image API 模块
//!
//! 每个 (项目, 层级, 楼栋?, 楼层?, 类型) 槽位只保留一张图片，
//! 重复上传即替换。
//!
//! | Method | Path | 说明 |
//! |--------|------|------|
//! | GET | / | 列表 |
//! | POST | / | 注册 (或替换) |
//! | POST | /bulk | 按楼层批量上传 |
//! | PUT | /{image_id} | 修改元数据 / 替换文件 |
//! | DELETE | /{image_id} | 删除 |

mod handler;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};

use crate::core::ServerState;
use crate::images::manager::MAX_BATCH_FILES;

/// Request body cap of a floor batch
const BATCH_BODY_LIMIT: usize = MAX_BATCH_FILES * 10 * 1024 * 1024;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/projects/{project_id}/zone-images", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::register))
        .route(
            "/bulk",
            post(handler::bulk_register).layer(DefaultBodyLimit::max(BATCH_BODY_LIMIT)),
        )
        .route("/{image_id}", put(handler::update).delete(handler::delete))
}
