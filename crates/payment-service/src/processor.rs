//! 支付处理器
//!
//! 对每条成功解析的订单事件执行一次支付处理并产出支付结果。
//! 真实系统中这里会调用支付网关；当前版本以固定延迟模拟处理耗时，
//! 交易号由处理时间戳派生。

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use relay_shared::messages::{OrderMessage, PaymentResult};
use relay_shared::relay::{StageError, StageTransform};
use tracing::info;

/// 模拟支付网关处理耗时的默认值
const DEFAULT_PROCESSING_DELAY: Duration = Duration::from_secs(2);

/// 支付处理器
pub struct PaymentProcessor {
    processing_delay: Duration,
}

impl PaymentProcessor {
    pub fn new() -> Self {
        Self {
            processing_delay: DEFAULT_PROCESSING_DELAY,
        }
    }

    /// 指定处理延迟，测试场景下可调为零
    pub fn with_delay(processing_delay: Duration) -> Self {
        Self { processing_delay }
    }
}

impl Default for PaymentProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// 以处理时间戳派生交易号，格式 TXN-YYYYMMDDHHMMSS
fn transaction_id(processed_at: DateTime<Utc>) -> String {
    format!("TXN-{}", processed_at.format("%Y%m%d%H%M%S"))
}

#[async_trait]
impl StageTransform for PaymentProcessor {
    type Input = OrderMessage;
    type Output = PaymentResult;

    async fn transform(
        &self,
        order: OrderMessage,
    ) -> Result<Option<(String, PaymentResult)>, StageError> {
        info!(
            order_id = %order.order_id,
            total_amount = order.total_amount,
            "处理订单支付"
        );

        // 模拟支付网关处理耗时
        tokio::time::sleep(self.processing_delay).await;

        let processed_at = Utc::now();
        let result = PaymentResult::completed(&order, transaction_id(processed_at), processed_at);

        // 沿用订单的分区键，订单生命周期内的消息落在同一分区
        Ok(Some((order.partition_key(), result)))
    }
}
