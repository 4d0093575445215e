//! 订单接入服务
//!
//! 事件流水线的入口：接收 HTTP 下单请求，计算订单总额后将订单事件
//! 发布到 order-events topic，并在进程内保留已发布订单供读回查询。

pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod service;
pub mod state;
