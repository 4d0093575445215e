//! 订单接入服务
//!
//! 接收 HTTP 下单请求，计算订单总额后将订单事件发布到 order-events topic。

use std::sync::Arc;

use order_service::routes;
use order_service::service::OrderService;
use order_service::state::AppState;
use relay_shared::config::AppConfig;
use relay_shared::kafka::KafkaProducer;
use relay_shared::{lifecycle, observability};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load("order-service").unwrap_or_default();
    observability::init(&config.observability)?;

    info!("Starting order-service on {}", config.server_addr());

    // broker 不可达属于启动期致命错误，进程以非零退出码终止
    let producer = KafkaProducer::new(&config.kafka)?;
    let service = Arc::new(OrderService::new(Arc::new(producer)));
    let app = routes::router(AppState::new(service));

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    // 优雅关闭：收到 SIGTERM 或 Ctrl+C 时停止接收新连接，
    // 等待已有请求处理完毕后退出
    axum::serve(listener, app)
        .with_graceful_shutdown(lifecycle::shutdown_signal())
        .await?;

    info!("Server shutdown complete");

    Ok(())
}
