//! 订单流水线的消息模型
//!
//! 定义在 Kafka topic 之间流转的两种消息：订单事件（OrderMessage）与
//! 支付结果事件（PaymentResult）。线上格式为 snake_case JSON，
//! 字段命名是各阶段之间的契约，不可随意变更。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// OrderMessage — 订单事件
// ---------------------------------------------------------------------------

/// 订单中的单个商品行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub item_id: i64,
    pub quantity: u32,
    pub price: f64,
}

/// 订单状态
///
/// 订单事件创建时固定为 PENDING，发布后不再变更。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
        }
    }
}

/// 订单事件
///
/// 由订单接入服务创建并发布到 order-events，一经发布即不可变。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderMessage {
    pub order_id: Uuid,
    pub customer_id: i64,
    pub restaurant_id: i64,
    pub items: Vec<OrderItem>,
    pub order_date: DateTime<Utc>,
    pub total_amount: f64,
    pub status: OrderStatus,
}

impl OrderMessage {
    /// 构造新订单
    ///
    /// order_id 使用 UUID v7，时间有序且多实例部署下不会冲突；
    /// total_amount 在此一次性算定，下游阶段只读不重算。
    pub fn new(customer_id: i64, restaurant_id: i64, items: Vec<OrderItem>) -> Self {
        let total_amount = items
            .iter()
            .map(|item| item.price * f64::from(item.quantity))
            .sum();

        Self {
            order_id: Uuid::now_v7(),
            customer_id,
            restaurant_id,
            items,
            order_date: Utc::now(),
            total_amount,
            status: OrderStatus::Pending,
        }
    }

    /// Kafka 分区键：订单 ID 的文本形式
    ///
    /// 同一订单生命周期内的全部消息使用同一个键，
    /// 在多分区 topic 上仍按订单维度保持有序。
    pub fn partition_key(&self) -> String {
        self.order_id.to_string()
    }
}

// ---------------------------------------------------------------------------
// PaymentResult — 支付结果事件
// ---------------------------------------------------------------------------

/// 支付状态
///
/// 支付阶段目前只产出 COMPLETED；FAILED 是 schema 的一部分，
/// 仅出现在外部系统写入的结果中。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Completed,
    Failed,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "COMPLETED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// 支付结果事件
///
/// 由支付服务针对每条成功解析的订单事件构造一次，发布到 payment-events
/// 后不再变更。没有对应订单事件就不存在支付结果。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentResult {
    pub order_id: Uuid,
    pub customer_id: i64,
    pub restaurant_id: i64,
    pub total_amount: f64,
    pub payment_status: PaymentStatus,
    pub transaction_id: String,
    pub processed_at: DateTime<Utc>,
}

impl PaymentResult {
    /// 从成功处理的订单构造支付结果
    ///
    /// 金额从订单原样透传，不做重算。
    pub fn completed(
        order: &OrderMessage,
        transaction_id: String,
        processed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            order_id: order.order_id,
            customer_id: order.customer_id,
            restaurant_id: order.restaurant_id,
            total_amount: order.total_amount,
            payment_status: PaymentStatus::Completed,
            transaction_id,
            processed_at,
        }
    }

    /// 分区键与上游订单事件保持一致
    pub fn partition_key(&self) -> String {
        self.order_id.to_string()
    }
}

// ---------------------------------------------------------------------------
// 单元测试
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_items() -> Vec<OrderItem> {
        vec![
            OrderItem {
                item_id: 1,
                quantity: 2,
                price: 10.0,
            },
            OrderItem {
                item_id: 2,
                quantity: 1,
                price: 5.5,
            },
        ]
    }

    #[test]
    fn test_total_amount_computed_at_creation() {
        let order = OrderMessage::new(100, 200, make_items());
        // 10.0 * 2 + 5.5 * 1 = 25.5
        assert_eq!(order.total_amount, 25.5);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.customer_id, 100);
        assert_eq!(order.restaurant_id, 200);
    }

    #[test]
    fn test_total_amount_empty_items() {
        let order = OrderMessage::new(1, 1, Vec::new());
        assert_eq!(order.total_amount, 0.0);
    }

    #[test]
    fn test_order_message_round_trip() {
        let order = OrderMessage::new(100, 200, make_items());

        let json = serde_json::to_string(&order).unwrap();
        let deserialized: OrderMessage = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized, order);
    }

    #[test]
    fn test_order_message_wire_format() {
        let order = OrderMessage::new(100, 200, make_items());
        let json = serde_json::to_string(&order).unwrap();

        // 字段命名是阶段间契约，必须保持 snake_case
        assert!(json.contains("\"order_id\""));
        assert!(json.contains("\"customer_id\""));
        assert!(json.contains("\"restaurant_id\""));
        assert!(json.contains("\"order_date\""));
        assert!(json.contains("\"total_amount\""));
        assert!(json.contains("\"item_id\""));
        // 状态序列化为固定的大写文本
        assert!(json.contains("\"PENDING\""));
    }

    #[test]
    fn test_partition_key_is_order_id_text() {
        let order = OrderMessage::new(100, 200, make_items());
        assert_eq!(order.partition_key(), order.order_id.to_string());
    }

    #[test]
    fn test_payment_result_from_order() {
        let order = OrderMessage::new(100, 200, make_items());
        let processed_at = Utc::now();
        let result =
            PaymentResult::completed(&order, "TXN-20250115103000".to_string(), processed_at);

        assert_eq!(result.order_id, order.order_id);
        assert_eq!(result.customer_id, 100);
        assert_eq!(result.restaurant_id, 200);
        // 金额透传，不重算
        assert_eq!(result.total_amount, order.total_amount);
        assert_eq!(result.payment_status, PaymentStatus::Completed);
        assert_eq!(result.processed_at, processed_at);
        // 支付结果沿用订单的分区键
        assert_eq!(result.partition_key(), order.partition_key());
    }

    #[test]
    fn test_payment_result_round_trip() {
        let order = OrderMessage::new(7, 8, make_items());
        let result = PaymentResult::completed(&order, "TXN-20250115103000".to_string(), Utc::now());

        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"payment_status\""));
        assert!(json.contains("\"COMPLETED\""));
        assert!(json.contains("\"transaction_id\""));

        let deserialized: PaymentResult = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, result);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(OrderStatus::Pending.to_string(), "PENDING");
        assert_eq!(PaymentStatus::Completed.to_string(), "COMPLETED");
        assert_eq!(PaymentStatus::Failed.to_string(), "FAILED");
    }
}
