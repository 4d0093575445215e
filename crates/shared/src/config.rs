//! 配置管理模块
//!
//! 支持多层配置文件加载，环境变量覆盖，以及类型安全的配置访问。

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Kafka 配置
///
/// 字段级默认值保证部分覆盖（只配 consumer_group 或只配 brokers）
/// 也能得到完整配置。
#[derive(Debug, Clone, Deserialize)]
pub struct KafkaConfig {
    /// broker 地址列表（逗号分隔）
    #[serde(default = "default_brokers")]
    pub brokers: String,
    /// 消费组 ID，各阶段固定不变，重启后从已提交位点续传
    #[serde(default = "default_consumer_group")]
    pub consumer_group: String,
    /// 新消费组首次启动时的位点策略
    ///
    /// 全系统统一为 earliest：新上线的消费组从最早保留的消息开始消费，
    /// 不会静默跳过积压。
    #[serde(default = "default_auto_offset_reset")]
    pub auto_offset_reset: String,
}

fn default_brokers() -> String {
    "localhost:9092".to_string()
}

fn default_consumer_group() -> String {
    "order-relay".to_string()
}

fn default_auto_offset_reset() -> String {
    "earliest".to_string()
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            brokers: default_brokers(),
            consumer_group: default_consumer_group(),
            auto_offset_reset: default_auto_offset_reset(),
        }
    }
}

/// HTTP 服务配置（仅订单接入服务监听端口）
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// 可观测性配置
#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 日志输出格式：json（结构化）或 pretty（人类可读）
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub service_name: String,
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub kafka: KafkaConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. config/default.toml（默认配置）
    /// 2. config/{environment}.toml（环境特定配置）
    /// 3. config/{service_name}.toml（服务特定配置）
    /// 4. 环境变量（RELAY_ 前缀，如 RELAY_KAFKA_BROKERS -> kafka.brokers）
    /// 5. KAFKA_BROKERS 环境变量（历史部署契约，直接覆盖 broker 地址）
    pub fn load(service_name: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("RELAY_ENV").unwrap_or_else(|_| "development".to_string());

        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        let builder = Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", env.clone())?
            // 消费组默认取服务名，天然满足"每个阶段一个稳定消费组"
            .set_default("kafka.consumer_group", service_name)?
            // 加载默认配置文件
            .add_source(File::from(Path::new(&config_dir).join("default.toml")).required(false))
            // 加载环境特定配置
            .add_source(
                File::from(Path::new(&config_dir).join(format!("{env}.toml"))).required(false),
            )
            // 加载服务特定配置（如 payment-service.toml）
            .add_source(
                File::from(Path::new(&config_dir).join(format!("{service_name}.toml")))
                    .required(false),
            )
            // 环境变量覆盖（RELAY_KAFKA_BROKERS -> kafka.brokers）
            .add_source(
                Environment::with_prefix("RELAY")
                    .separator("_")
                    .try_parsing(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;

        // 原部署通过 KAFKA_BROKERS 注入 broker 地址，保留该契约
        if let Ok(brokers) = std::env::var("KAFKA_BROKERS")
            && !brokers.trim().is_empty()
        {
            config.kafka.brokers = brokers.trim().to_string();
        }

        Ok(config)
    }

    /// 获取 HTTP 监听地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.kafka.brokers, "localhost:9092");
        assert_eq!(config.kafka.auto_offset_reset, "earliest");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_server_addr() {
        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            ..Default::default()
        };
        assert_eq!(config.server_addr(), "127.0.0.1:3000");
    }

    #[test]
    fn test_load_sets_consumer_group_to_service_name() {
        let config = AppConfig::load("payment-service").expect("加载配置失败");
        assert_eq!(config.service_name, "payment-service");
        // 未显式配置时消费组取服务名，保证位点跟踪跨重启稳定
        assert_eq!(config.kafka.consumer_group, "payment-service");
    }

    #[test]
    fn test_kafka_brokers_env_override() {
        // SAFETY: 测试进程内单线程访问该环境变量
        unsafe {
            std::env::set_var("KAFKA_BROKERS", " kafka-1:9092,kafka-2:9092 ");
        }

        let config = AppConfig::load("notification-service").expect("加载配置失败");
        // 首尾空白应被裁剪
        assert_eq!(config.kafka.brokers, "kafka-1:9092,kafka-2:9092");

        unsafe {
            std::env::remove_var("KAFKA_BROKERS");
        }
    }
}
