//! 生命周期与关闭协调
//!
//! 进程的关闭路径：收到 SIGINT/SIGTERM -> 翻转 watch 信号 ->
//! 消费任务在消息间隙观察到信号后自然退出 -> 主任务等待其完成后返回。
//! 正在执行的 handler 总是先完成位点登记再退出，不会有消息停在
//! "已开始处理但既未确认也未放弃"的中间状态。

use std::future::Future;

use tokio::sync::watch;
use tracing::info;

use crate::error::RelayError;

/// 监听进程终止信号
///
/// K8s 通过 SIGTERM 通知 Pod 停止；本地开发通过 Ctrl+C。
/// 收到任一信号后返回，由调用方触发各自的优雅关闭流程。
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("注册 Ctrl+C 处理器失败");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("注册 SIGTERM 处理器失败")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}

/// 在独立任务上启动消费循环并阻塞到关闭完成
///
/// `start` 接收 shutdown 接收端并返回消费任务的 future。
/// 主任务等待终止信号，之后翻转信号并等待消费任务完整退出，
/// 保证进程结束时没有消息处理到一半。
pub async fn run_until_shutdown<F, Fut>(stage_name: &'static str, start: F) -> Result<(), RelayError>
where
    F: FnOnce(watch::Receiver<bool>) -> Fut,
    Fut: Future<Output = Result<(), RelayError>> + Send + 'static,
{
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(start(shutdown_rx));

    shutdown_signal().await;
    info!(stage = stage_name, "收到终止信号，等待消费任务退出");

    // 接收端若已自行退出，send 失败也无妨
    let _ = shutdown_tx.send(true);

    match task.await {
        Ok(result) => result,
        Err(e) => Err(RelayError::Internal(format!("消费任务异常终止: {e}"))),
    }
}
