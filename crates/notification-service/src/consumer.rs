//! 通知阶段装配
//!
//! 将共享的事件中继绑定到通知阶段：消费 payment-events，
//! 下游 topic 为空，转换只执行通知副作用。

use relay_shared::config::AppConfig;
use relay_shared::error::RelayError;
use relay_shared::kafka::topics;
use relay_shared::relay::RelayStage;
use tokio::sync::watch;

use crate::sender::NotificationSender;

/// 通知终端阶段
pub struct NotificationStage {
    stage: RelayStage<NotificationSender>,
}

impl NotificationStage {
    pub fn new(config: &AppConfig) -> Result<Self, RelayError> {
        let stage = RelayStage::new(
            "notification",
            config,
            topics::PAYMENT_EVENTS,
            // 终端阶段：没有下游 topic
            None,
            NotificationSender::new(),
        )?;

        Ok(Self { stage })
    }

    /// 启动消费循环，直到收到 shutdown 信号
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> Result<(), RelayError> {
        self.stage.run(shutdown).await
    }
}
