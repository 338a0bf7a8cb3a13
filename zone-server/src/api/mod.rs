//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`projects`] - 项目、楼栋、房源创建
//! - [`apartments`] - 房源状态/价格/上下架
//! - [`zones`] - 区域绘制、模板复制、批量导入
//! - [`zone_images`] - 层级底图
//! - [`navigation`] - 三级导航读取
//! - [`detection`] - 区域自动识别
//! - [`catalogue`] - 房源列表
//! - [`admin`] - 缓存运维

pub mod admin;
pub mod apartments;
pub mod catalogue;
pub mod detection;
pub mod health;
pub mod navigation;
pub mod projects;
pub mod zone_images;
pub mod zones;

use axum::Router;

use crate::core::ServerState;

/// 合并所有资源路由
pub fn router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(projects::router())
        .merge(apartments::router())
        .merge(zones::router())
        .merge(zone_images::router())
        .merge(navigation::router())
        .merge(detection::router())
        .merge(catalogue::router())
        .merge(admin::router())
}

/// Read a multipart text field
pub(crate) async fn field_text(
    field: axum::extract::multipart::Field<'_>,
) -> Result<String, shared::error::AppError> {
    let name = field.name().unwrap_or_default().to_string();
    field
        .text()
        .await
        .map(|t| t.trim().to_string())
        .map_err(|e| shared::error::AppError::invalid_field(name, format!("Multipart error: {e}")))
}

/// Parse an optional multipart number; empty text counts as absent
pub(crate) fn parse_field<T: std::str::FromStr>(
    name: &str,
    value: &str,
) -> Result<Option<T>, shared::error::AppError> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| shared::error::AppError::invalid_field(name, format!("{name} must be a number")))
}
