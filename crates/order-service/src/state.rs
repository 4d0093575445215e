//! 应用状态

use std::sync::Arc;

use crate::service::OrderService;

/// 注入到 axum 各处理函数的共享状态
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<OrderService>,
}

impl AppState {
    pub fn new(service: Arc<OrderService>) -> Self {
        Self { service }
    }
}
