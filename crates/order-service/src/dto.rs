//! 订单接入服务请求 DTO
//!
//! HTTP 下单请求的参数结构与校验规则。

use relay_shared::messages::OrderItem;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// 创建订单请求
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(range(min = 1, message = "customer_id 必须为正整数"))]
    pub customer_id: i64,

    #[validate(range(min = 1, message = "restaurant_id 必须为正整数"))]
    pub restaurant_id: i64,

    #[validate(length(min = 1, message = "订单必须至少包含一个商品"), nested)]
    pub items: Vec<OrderItemRequest>,
}

/// 订单商品行
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct OrderItemRequest {
    #[validate(range(min = 1, message = "item_id 必须为正整数"))]
    pub item_id: i64,

    #[validate(range(min = 1, message = "数量必须至少为 1"))]
    pub quantity: u32,

    #[validate(range(min = 0.0, message = "单价不能为负"))]
    pub price: f64,
}

impl From<OrderItemRequest> for OrderItem {
    fn from(item: OrderItemRequest) -> Self {
        Self {
            item_id: item.item_id,
            quantity: item.quantity,
            price: item.price,
        }
    }
}
