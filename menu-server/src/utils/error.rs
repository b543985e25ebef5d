//! 统一错误处理
//!
//! 应用级错误类型和响应结构统一来自 `shared::error`：
//! - [`AppError`] - 带错误码的应用错误
//! - [`ApiResponse`] - API 响应结构
//!
//! # 使用示例
//!
//! ```ignore
//! // 返回错误
//! Err(AppError::item_not_found(id))
//!
//! // 返回成功响应
//! Ok(ok(view))
//! ```

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

/// Create a successful response
pub fn ok<T>(data: T) -> ApiResponse<T> {
    ApiResponse::success(data)
}

/// Create a successful response with custom message
pub fn ok_with_message<T>(data: T, message: impl Into<String>) -> ApiResponse<T> {
    ApiResponse::success_with_message(message, data)
}
