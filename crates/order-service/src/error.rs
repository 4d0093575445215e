//! 订单接入服务错误类型
//!
//! 订单接入是唯一有外部调用方的阶段，错误需要映射为 HTTP 响应；
//! 其余阶段的失败只通过日志与死信队列体现。

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use relay_shared::error::RelayError;
use serde_json::json;

/// 订单接入错误
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    /// 请求参数校验失败
    #[error("参数验证失败: {0}")]
    Validation(String),

    /// 订单事件发布失败（重试已在发布器内部耗尽）
    #[error("订单事件发布失败: {0}")]
    Publish(#[from] RelayError),
}

impl OrderError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Publish(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for OrderError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 发布失败属于系统级错误，只返回通用提示，细节记录日志
        let message = match &self {
            Self::Publish(e) => {
                tracing::error!(error = %e, "订单事件发布失败");
                "Failed to publish order event".to_string()
            }
            other => other.to_string(),
        };

        (status, axum::Json(json!({ "error": message }))).into_response()
    }
}

/// 从 validator 错误转换
impl From<validator::ValidationErrors> for OrderError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}
