//! Kafka 基础设施封装
//!
//! 将 rdkafka 的底层 API 封装为业务友好的 Producer/Consumer 抽象，
//! 统一消息序列化、错误映射、位点提交和优雅关闭语义，
//! 避免各服务重复编写样板代码。

use std::time::Duration;

use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::{BorrowedMessage, Message};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::KafkaConfig;
use crate::error::RelayError;
use crate::retry::{RetryPolicy, retry_with_policy};

/// 构造期集群可达性探测的超时时间
const BOOTSTRAP_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Topic 常量
// ---------------------------------------------------------------------------

/// 集中管理所有 Kafka topic 名称，防止字符串散落在各服务中导致拼写不一致
pub mod topics {
    /// 订单事件（OrderMessage 负载），订单接入服务写入，支付服务消费
    pub const ORDER_EVENTS: &str = "order-events";
    /// 支付结果事件（PaymentResult 负载），支付服务写入，通知服务消费
    pub const PAYMENT_EVENTS: &str = "payment-events";
    /// 死信队列，各阶段的永久性坏消息统一写入此处
    pub const DEAD_LETTER_QUEUE: &str = "relay.dlq";
}

// ---------------------------------------------------------------------------
// ConsumerMessage
// ---------------------------------------------------------------------------

/// 消费到的 Kafka 消息的统一表示
///
/// 将 rdkafka 的 `BorrowedMessage`（带生命周期约束）转换为拥有所有权的结构体，
/// 使消息可以安全地跨 await 点传递给异步处理函数。
#[derive(Debug, Clone)]
pub struct ConsumerMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Option<String>,
    pub payload: Vec<u8>,
    pub timestamp: Option<i64>,
}

impl ConsumerMessage {
    /// 从 rdkafka 的借用消息构造，提取并拥有所有字段
    fn from_borrowed(msg: &BorrowedMessage<'_>) -> Self {
        let key = msg
            .key()
            .and_then(|k| std::str::from_utf8(k).ok())
            .map(String::from);

        let payload = msg.payload().map(|p| p.to_vec()).unwrap_or_default();

        Self {
            topic: msg.topic().to_string(),
            partition: msg.partition(),
            offset: msg.offset(),
            key,
            payload,
            timestamp: msg.timestamp().to_millis(),
        }
    }

    /// 将负载视为 UTF-8 字符串返回
    pub fn payload_str(&self) -> Result<&str, RelayError> {
        std::str::from_utf8(&self.payload)
            .map_err(|e| RelayError::Deserialization(format!("负载非 UTF-8 编码: {e}")))
    }

    /// 将 JSON 格式负载反序列化为该 topic 约定的消息类型
    pub fn deserialize_payload<T: DeserializeOwned>(&self) -> Result<T, RelayError> {
        serde_json::from_slice(&self.payload)
            .map_err(|e| RelayError::Deserialization(format!("负载反序列化失败: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Ack — 位点处置
// ---------------------------------------------------------------------------

/// 单条消息处理完成后的位点处置
///
/// 位点只能随 Commit 前进，同一条消息在一次消费中不会被乱序确认。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    /// 消息已妥善处理（成功，或已写入死信队列），提交位点
    Commit,
    /// 瞬时失败，保留位点，消息在重平衡或重启后重投
    Hold,
}

// ---------------------------------------------------------------------------
// KafkaProducer
// ---------------------------------------------------------------------------

/// 面向业务的 Kafka 生产者
///
/// 封装 `FutureProducer`，等待全部 ISR 确认后才视为发布成功，
/// 并在内部对瞬时错误做有界重试。`FutureProducer` 本身是 Arc 包装的，
/// 因此派生 Clone 开销极低。
#[derive(Clone)]
pub struct KafkaProducer {
    producer: FutureProducer,
    retry_policy: RetryPolicy,
}

impl KafkaProducer {
    /// 根据配置创建生产者
    ///
    /// `acks=all` 要求全部同步副本确认，以延迟换持久性。
    /// 构造时即探测集群可达性：broker 不可达属于启动期致命错误，
    /// 由调用方决定终止进程，而非运行到发布时才暴露。
    pub fn new(config: &KafkaConfig) -> Result<Self, RelayError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("acks", "all")
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|e| RelayError::Kafka(format!("创建生产者失败: {e}")))?;

        producer
            .client()
            .fetch_metadata(None, BOOTSTRAP_TIMEOUT)
            .map_err(|e| RelayError::Kafka(format!("Kafka 集群不可达: {e}")))?;

        info!(brokers = %config.brokers, "Kafka 生产者已初始化");
        Ok(Self {
            producer,
            retry_policy: RetryPolicy::for_publish(),
        })
    }

    /// 发送原始字节消息，返回 broker 分配的 (partition, offset)
    ///
    /// 分区键必须是文本编码（十进制数字或 UUID 字符串），
    /// 同一个键的消息落在同一分区。内部对瞬时 broker 错误
    /// 按退避策略重试，最多 5 次，耗尽后才向调用方返回失败。
    pub async fn send(
        &self,
        topic: &str,
        key: Option<&str>,
        payload: &[u8],
    ) -> Result<(i32, i64), RelayError> {
        let (partition, offset) = retry_with_policy(
            &self.retry_policy,
            "kafka_publish",
            RelayError::is_retryable,
            || self.send_once(topic, key, payload),
        )
        .await?;

        debug!(topic, key, partition, offset, "消息已发送");
        Ok((partition, offset))
    }

    /// 单次发送尝试
    async fn send_once(
        &self,
        topic: &str,
        key: Option<&str>,
        payload: &[u8],
    ) -> Result<(i32, i64), RelayError> {
        let mut record: FutureRecord<'_, str, [u8]> = FutureRecord::to(topic).payload(payload);
        if let Some(key) = key {
            record = record.key(key);
        }

        // rdkafka 0.39+ 返回 Delivery 结构体而非元组
        let delivery = self
            .producer
            .send(record, Duration::from_secs(5))
            .await
            .map_err(|(e, _)| RelayError::Kafka(format!("发送消息失败: {e}")))?;

        Ok((delivery.partition, delivery.offset))
    }

    /// 将值序列化为 JSON 后发送
    ///
    /// 序列化与网络发送拆分为两步，便于独立定位故障原因。
    pub async fn send_json<T: Serialize>(
        &self,
        topic: &str,
        key: Option<&str>,
        value: &T,
    ) -> Result<(i32, i64), RelayError> {
        let payload =
            serde_json::to_vec(value).map_err(|e| RelayError::Serialization(e.to_string()))?;

        self.send(topic, key, &payload).await
    }
}

// ---------------------------------------------------------------------------
// KafkaConsumer
// ---------------------------------------------------------------------------

/// 面向业务的 Kafka 消费组消费者
///
/// 封装 `StreamConsumer`：以 round-robin 策略加入消费组，
/// 关闭自动提交，由调用方逐条决定位点处置，实现 at-least-once 语义。
/// 优雅关闭基于 `watch` channel，进程退出时不会丢弃正在处理的消息。
pub struct KafkaConsumer {
    consumer: StreamConsumer,
}

impl KafkaConsumer {
    /// 创建消费者
    ///
    /// 位点初始策略从配置读取，全系统统一为 earliest，
    /// 新消费组首次启动时从最早保留的消息开始，不会静默跳过积压。
    pub fn new(config: &KafkaConfig) -> Result<Self, RelayError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("group.id", &config.consumer_group)
            .set("auto.offset.reset", &config.auto_offset_reset)
            .set("partition.assignment.strategy", "roundrobin")
            .set("enable.auto.commit", "false")
            .create()
            .map_err(|e| RelayError::Kafka(format!("创建消费者失败: {e}")))?;

        consumer
            .fetch_metadata(None, BOOTSTRAP_TIMEOUT)
            .map_err(|e| RelayError::Kafka(format!("Kafka 集群不可达: {e}")))?;

        info!(
            brokers = %config.brokers,
            group_id = %config.consumer_group,
            "Kafka 消费者已初始化"
        );
        Ok(Self { consumer })
    }

    /// 订阅指定的 topic 列表
    pub fn subscribe(&self, topics: &[&str]) -> Result<(), RelayError> {
        self.consumer
            .subscribe(topics)
            .map_err(|e| RelayError::Kafka(format!("订阅 topic 失败: {e}")))?;

        info!(?topics, "已订阅 Kafka topics");
        Ok(())
    }

    /// 启动消费循环
    ///
    /// 使用 `tokio::select!` 同时监听消息流和关闭信号：
    /// - 同一分区的消息逐条顺序处理，handler 完成后按其返回的 `Ack`
    ///   决定是否提交位点；提交失败只记录日志，消息最坏情况下被重投。
    /// - handler 的任何结果都不会中断循环，单条坏消息不会卡住分区。
    /// - 关闭信号只在消息间隙被观察，正在执行的 handler 总能自然完成。
    ///
    /// 消费组重平衡由 rdkafka 在流内部透明处理，分区被收回再分配
    /// 对本循环而言只是消息来源的变化，不是错误。
    pub async fn start<F, Fut>(self, mut shutdown: watch::Receiver<bool>, handler: F)
    where
        F: Fn(ConsumerMessage) -> Fut,
        Fut: std::future::Future<Output = Ack>,
    {
        use futures::StreamExt;

        let stream = self.consumer.stream();
        futures::pin_mut!(stream);

        info!("Kafka 消费循环已启动");

        loop {
            tokio::select! {
                // 偏向关闭信号，保证收到关闭时能尽快退出
                biased;

                changed = shutdown.changed() => {
                    // 发送端被丢弃等同于收到关闭信号，避免空转
                    if changed.is_err() || *shutdown.borrow() {
                        info!("收到关闭信号，Kafka 消费循环退出");
                        break;
                    }
                }

                msg_result = stream.next() => {
                    let Some(msg_result) = msg_result else {
                        warn!("Kafka 消息流意外结束");
                        break;
                    };

                    match msg_result {
                        Ok(borrowed_msg) => {
                            let msg = ConsumerMessage::from_borrowed(&borrowed_msg);
                            debug!(
                                topic = %msg.topic,
                                partition = msg.partition,
                                offset = msg.offset,
                                "收到 Kafka 消息"
                            );

                            match handler(msg).await {
                                Ack::Commit => {
                                    if let Err(e) = self
                                        .consumer
                                        .commit_message(&borrowed_msg, CommitMode::Async)
                                    {
                                        error!(error = %e, "提交位点失败");
                                    }
                                }
                                Ack::Hold => {
                                    debug!(
                                        topic = %borrowed_msg.topic(),
                                        partition = borrowed_msg.partition(),
                                        offset = borrowed_msg.offset(),
                                        "位点未提交，消息等待重投"
                                    );
                                }
                            }
                        }
                        Err(e) => {
                            error!(error = %e, "接收 Kafka 消息出错");
                        }
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// 测试
// ---------------------------------------------------------------------------
