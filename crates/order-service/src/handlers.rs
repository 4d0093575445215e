//! HTTP 处理函数

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use relay_shared::messages::OrderMessage;
use validator::Validate;

use crate::dto::CreateOrderRequest;
use crate::error::OrderError;
use crate::state::AppState;

/// POST /orders
///
/// 校验请求 -> 发布订单事件 -> 返回 201 与完整订单 JSON。
/// 校验失败返回 400，发布失败返回 500。
pub async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderMessage>), OrderError> {
    request.validate()?;

    let order = state.service.create_order(request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders
///
/// 读回本进程已成功发布的订单
pub async fn list_orders(State(state): State<AppState>) -> Json<Vec<OrderMessage>> {
    Json(state.service.list_orders())
}

/// 存活探针
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "order-service"
    }))
}
