//! 通知服务
//!
//! 消费支付结果事件并向用户发送通知，是流水线的终端阶段。

use notification_service::consumer::NotificationStage;
use relay_shared::config::AppConfig;
use relay_shared::{lifecycle, observability};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load("notification-service").unwrap_or_default();
    observability::init(&config.observability)?;

    info!("Starting notification-service...");

    // broker 不可达属于启动期致命错误，进程以非零退出码终止
    let stage = NotificationStage::new(&config)?;

    lifecycle::run_until_shutdown("notification", |shutdown| stage.run(shutdown)).await?;

    info!("notification-service shutdown complete");

    Ok(())
}
