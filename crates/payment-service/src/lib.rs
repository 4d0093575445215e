//! 支付服务
//!
//! 消费 order-events 中的订单事件，模拟支付处理后将支付结果
//! 发布到 payment-events，是流水线的中间中继阶段。

pub mod consumer;
pub mod processor;
