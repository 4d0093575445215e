//! 共享库
//!
//! 包含订单接入、支付、通知三个服务共用的配置、错误处理、Kafka 封装、
//! 消息模型、事件中继抽象、死信队列与生命周期协调等基础设施代码。

pub mod config;
pub mod dlq;
pub mod error;
pub mod kafka;
pub mod lifecycle;
pub mod messages;
pub mod observability;
pub mod relay;
pub mod retry;
