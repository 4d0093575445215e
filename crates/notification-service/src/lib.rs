//! 通知服务
//!
//! 流水线的终端阶段：消费 payment-events 中的支付结果，
//! 向用户发送通知。不再产出下游消息。

pub mod consumer;
pub mod sender;
