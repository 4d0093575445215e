//! 支付服务
//!
//! 消费订单事件，模拟支付处理后将支付结果发布到 payment-events topic。

use payment_service::consumer::PaymentStage;
use relay_shared::config::AppConfig;
use relay_shared::{lifecycle, observability};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load("payment-service").unwrap_or_default();
    observability::init(&config.observability)?;

    info!("Starting payment-service...");

    // broker 不可达属于启动期致命错误，进程以非零退出码终止
    let stage = PaymentStage::new(&config)?;

    lifecycle::run_until_shutdown("payment", |shutdown| stage.run(shutdown)).await?;

    info!("payment-service shutdown complete");

    Ok(())
}
