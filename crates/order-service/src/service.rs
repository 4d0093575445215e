//! 订单服务
//!
//! 接收创建请求，构造订单事件并发布，同时维护进程内订单列表供读回查询。
//! 列表只由请求路径写入，不与其他进程共享。

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use relay_shared::error::RelayError;
use relay_shared::kafka::{KafkaProducer, topics};
use relay_shared::messages::OrderMessage;
use tracing::info;

use crate::dto::CreateOrderRequest;
use crate::error::OrderError;

// ---------------------------------------------------------------------------
// OrderEventPublisher — 发布抽象
// ---------------------------------------------------------------------------

/// 订单事件发布抽象
///
/// 以 trait 分离发布行为，服务逻辑可在测试中用 mock 替换真实 Kafka 生产者。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderEventPublisher: Send + Sync {
    /// 发布订单事件，返回 broker 分配的 (partition, offset)
    async fn publish_order(&self, order: &OrderMessage) -> Result<(i32, i64), RelayError>;
}

#[async_trait]
impl OrderEventPublisher for KafkaProducer {
    async fn publish_order(&self, order: &OrderMessage) -> Result<(i32, i64), RelayError> {
        // 以订单 ID 文本作为分区键，订单生命周期内的消息保持分区有序
        self.send_json(topics::ORDER_EVENTS, Some(&order.partition_key()), order)
            .await
    }
}

// ---------------------------------------------------------------------------
// OrderService
// ---------------------------------------------------------------------------

/// 订单服务
pub struct OrderService {
    publisher: Arc<dyn OrderEventPublisher>,
    /// 进程内订单列表，仅由请求路径写入，供 GET /orders 读回
    orders: RwLock<Vec<OrderMessage>>,
}

impl OrderService {
    pub fn new(publisher: Arc<dyn OrderEventPublisher>) -> Self {
        Self {
            publisher,
            orders: RwLock::new(Vec::new()),
        }
    }

    /// 创建订单：构造消息 -> 发布 -> 记录
    ///
    /// 先发布后入列表，发布失败的订单不对读回查询可见。
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderMessage, OrderError> {
        let items = request.items.into_iter().map(Into::into).collect();
        let order = OrderMessage::new(request.customer_id, request.restaurant_id, items);

        let (partition, offset) = self.publisher.publish_order(&order).await?;
        info!(
            order_id = %order.order_id,
            partition,
            offset,
            total_amount = order.total_amount,
            "订单事件已发布"
        );

        self.orders.write().push(order.clone());
        Ok(order)
    }

    /// 返回本进程已成功发布的订单列表
    pub fn list_orders(&self) -> Vec<OrderMessage> {
        self.orders.read().clone()
    }
}

// ---------------------------------------------------------------------------
// 单元测试
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::OrderItemRequest;
    use relay_shared::messages::OrderStatus;

    fn make_request() -> CreateOrderRequest {
        CreateOrderRequest {
            customer_id: 100,
            restaurant_id: 200,
            items: vec![
                OrderItemRequest {
                    item_id: 1,
                    quantity: 2,
                    price: 10.0,
                },
                OrderItemRequest {
                    item_id: 2,
                    quantity: 1,
                    price: 5.0,
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_create_order_publishes_and_stores() {
        let mut publisher = MockOrderEventPublisher::new();
        publisher
            .expect_publish_order()
            .withf(|order: &OrderMessage| {
                // 总额在创建时算定: 10.0*2 + 5.0*1 = 25.0
                order.total_amount == 25.0 && order.status == OrderStatus::Pending
            })
            .returning(|_| Ok((0, 42)));

        let service = OrderService::new(Arc::new(publisher));
        let order = service.create_order(make_request()).await.unwrap();

        assert_eq!(order.total_amount, 25.0);
        assert_eq!(order.customer_id, 100);
        assert_eq!(order.items.len(), 2);

        // 发布成功的订单进入读回列表
        let orders = service.list_orders();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order_id, order.order_id);
    }

    #[tokio::test]
    async fn test_create_order_publish_failure_not_stored() {
        let mut publisher = MockOrderEventPublisher::new();
        publisher
            .expect_publish_order()
            .returning(|_| Err(RelayError::Kafka("重试已耗尽".to_string())));

        let service = OrderService::new(Arc::new(publisher));
        let result = service.create_order(make_request()).await;

        assert!(matches!(result, Err(OrderError::Publish(_))));
        // 发布失败的订单不可见
        assert!(service.list_orders().is_empty());
    }

    #[tokio::test]
    async fn test_each_order_gets_unique_id() {
        let mut publisher = MockOrderEventPublisher::new();
        publisher
            .expect_publish_order()
            .times(2)
            .returning(|_| Ok((0, 1)));

        let service = OrderService::new(Arc::new(publisher));
        let first = service.create_order(make_request()).await.unwrap();
        let second = service.create_order(make_request()).await.unwrap();

        // UUID 订单号在多实例部署下也不会冲突，这里至少验证进程内不重复
        assert_ne!(first.order_id, second.order_id);
        assert_eq!(service.list_orders().len(), 2);
    }
}
