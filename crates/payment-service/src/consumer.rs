//! 支付阶段装配
//!
//! 将共享的事件中继绑定到支付阶段的上下游：
//! 消费 order-events，经 PaymentProcessor 转换后发布到 payment-events。

use relay_shared::config::AppConfig;
use relay_shared::error::RelayError;
use relay_shared::kafka::topics;
use relay_shared::relay::RelayStage;
use tokio::sync::watch;

use crate::processor::PaymentProcessor;

/// 支付中继阶段
pub struct PaymentStage {
    stage: RelayStage<PaymentProcessor>,
}

impl PaymentStage {
    pub fn new(config: &AppConfig) -> Result<Self, RelayError> {
        let stage = RelayStage::new(
            "payment",
            config,
            topics::ORDER_EVENTS,
            Some(topics::PAYMENT_EVENTS),
            PaymentProcessor::new(),
        )?;

        Ok(Self { stage })
    }

    /// 启动消费循环，直到收到 shutdown 信号
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> Result<(), RelayError> {
        self.stage.run(shutdown).await
    }
}

#[cfg(test)]
mod tests {
    use relay_shared::kafka::{ConsumerMessage, topics};
    use relay_shared::messages::{OrderItem, OrderMessage};

    /// 构造携带订单事件的测试消息
    fn make_order_message(order: &OrderMessage) -> ConsumerMessage {
        let payload = serde_json::to_vec(order).expect("序列化测试订单失败");
        ConsumerMessage {
            topic: topics::ORDER_EVENTS.to_string(),
            partition: 0,
            offset: 1,
            key: Some(order.partition_key()),
            payload,
            timestamp: None,
        }
    }

    /// 上游发布的订单事件必须能按约定的消息类型解析
    #[test]
    fn test_order_event_deserializes() {
        let order = OrderMessage::new(
            100,
            200,
            vec![OrderItem {
                item_id: 1,
                quantity: 2,
                price: 10.0,
            }],
        );
        let msg = make_order_message(&order);

        let deserialized: OrderMessage = msg.deserialize_payload().expect("反序列化失败");
        assert_eq!(deserialized, order);
    }

    /// 无法解析的负载必须报错，由中继转入死信队列
    #[test]
    fn test_malformed_order_event_rejected() {
        let msg = ConsumerMessage {
            topic: topics::ORDER_EVENTS.to_string(),
            partition: 0,
            offset: 1,
            key: None,
            payload: b"{\"order_id\": 42}".to_vec(),
            timestamp: None,
        };

        let result: Result<OrderMessage, _> = msg.deserialize_payload();
        assert!(result.is_err());
    }
}
