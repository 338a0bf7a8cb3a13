//! 工具模块 - 通用工具函数和类型
//!
//! # 内容
//!
//! - [`logger`] - 日志初始化与审计日志宏
//! - [`validation`] - 请求字段校验
//! - [`ok`] - 成功响应封装

pub mod logger;
pub mod validation;

use axum::Json;
use serde::Serialize;

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCode};

/// Handler return type: enveloped JSON or an [`AppError`] response
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

/// Create a successful response
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::success(data))
}

/// Create a successful response with custom message
pub fn ok_with_message<T: Serialize>(data: T, message: impl Into<String>) -> Json<ApiResponse<T>> {
    Json(ApiResponse::success_with_message(message, data))
}
