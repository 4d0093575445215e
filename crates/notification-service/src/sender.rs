//! 通知发送
//!
//! 当前版本为模拟发送（仅记录结构化日志），未来接入邮件/短信渠道时
//! 只需替换 notify 的实现，消费管道不变。

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use relay_shared::messages::PaymentResult;
use relay_shared::relay::{StageError, StageTransform};
use tracing::info;

/// 通知发送器
///
/// sent 计数器是本阶段唯一的进程内状态，用于观察通知吞吐。
pub struct NotificationSender {
    sent: AtomicU64,
}

impl NotificationSender {
    pub fn new() -> Self {
        Self {
            sent: AtomicU64::new(0),
        }
    }

    /// 已发送的通知总数
    pub fn sent_count(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    /// 发送单条通知（模拟）
    ///
    /// 每条支付结果恰好产生一条通知日志，日志即通知本体。
    fn notify(&self, payment: &PaymentResult) -> u64 {
        let sent_total = self.sent.fetch_add(1, Ordering::Relaxed) + 1;

        info!(
            order_id = %payment.order_id,
            customer_id = payment.customer_id,
            restaurant_id = payment.restaurant_id,
            total_amount = payment.total_amount,
            payment_status = %payment.payment_status,
            transaction_id = %payment.transaction_id,
            processed_at = %payment.processed_at,
            sent_total,
            "支付结果通知已发送"
        );

        sent_total
    }
}

impl Default for NotificationSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StageTransform for NotificationSender {
    type Input = PaymentResult;
    type Output = ();

    /// 终端阶段：执行通知副作用，不产出下游消息
    async fn transform(
        &self,
        payment: PaymentResult,
    ) -> Result<Option<(String, ())>, StageError> {
        self.notify(&payment);
        Ok(None)
    }
}
