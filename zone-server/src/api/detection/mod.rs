//! Detection API 模块
//!
//! 上传平面图 PDF (可选目标图片)，调用外部识别程序，
//! 返回百分比坐标；提供 image_width / image_height 时同时返回像素坐标。

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/detection", post(handler::detect))
}
