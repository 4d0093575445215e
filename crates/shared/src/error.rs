//! 统一错误处理模块
//!
//! 定义各服务共享的错误类型，使用 thiserror 提供良好的错误信息。

use thiserror::Error;

/// 事件中继系统的共享错误类型
#[derive(Debug, Error)]
pub enum RelayError {
    /// 与 Kafka 集群交互失败（连接、发布、订阅、位点提交）
    #[error("Kafka 错误: {0}")]
    Kafka(String),

    /// 消息负载无法解析为该 topic 约定的消息类型
    #[error("反序列化失败: {0}")]
    Deserialization(String),

    /// 消息序列化为 JSON 失败
    #[error("序列化失败: {0}")]
    Serialization(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    Internal(String),
}

/// 错误结果类型别名
pub type Result<T> = std::result::Result<T, RelayError>;

impl RelayError {
    /// 是否为可重试的瞬时错误
    ///
    /// Kafka 层面的失败（网络抖动、broker 暂时不可用）值得重试；
    /// 同一份负载的序列化/反序列化失败重试多少次结果都一样。
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Kafka(_))
    }
}
