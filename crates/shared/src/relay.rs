//! 事件中继抽象
//!
//! 三个服务共享的中继形态：消费上游 topic -> 转换 -> 发布到下游 topic
//! （或执行终端副作用）。消费、转换、发布、死信的编排只在这里实现一次，
//! 各服务仅提供自己的转换逻辑和上下游 topic 绑定。

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::dlq::DlqProducer;
use crate::error::RelayError;
use crate::kafka::{Ack, ConsumerMessage, KafkaConsumer, KafkaProducer};

// ---------------------------------------------------------------------------
// StageError — 处理失败的分类
// ---------------------------------------------------------------------------

/// 阶段处理失败的分类
///
/// 两类失败的位点处置完全相反，转换逻辑必须显式声明失败属于哪一类：
/// - 瞬时失败（下游暂时不可用等）：位点不提交，消息等待重投；
/// - 永久失败（负载本身有问题）：写入死信队列后提交位点，
///   避免一条永远处理不成功的消息被无限重投。
#[derive(Debug, Error)]
pub enum StageError {
    #[error("瞬时失败: {0}")]
    Transient(#[source] RelayError),

    #[error("永久失败: {0}")]
    Permanent(#[source] RelayError),
}

impl StageError {
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent(_))
    }
}

// ---------------------------------------------------------------------------
// StageTransform — 各阶段的转换逻辑
// ---------------------------------------------------------------------------

/// 阶段转换逻辑
///
/// 输入是上游 topic 约定的消息类型（信封反序列化由中继完成），
/// 输出是 `Some((分区键, 下游消息))`，终端阶段返回 `None` 表示
/// 副作用已执行、无下游消息需要发布。
#[async_trait]
pub trait StageTransform: Send + Sync {
    type Input: DeserializeOwned + Send;
    type Output: Serialize + Send + Sync;

    async fn transform(
        &self,
        input: Self::Input,
    ) -> Result<Option<(String, Self::Output)>, StageError>;
}

// ---------------------------------------------------------------------------
// RelayStage — 中继阶段
// ---------------------------------------------------------------------------

/// 中继阶段
///
/// 组合 KafkaConsumer（消息拉取）、StageTransform（业务转换）、
/// KafkaProducer（下游投递）和 DlqProducer（坏消息隔离），
/// 形成一条完整的 at-least-once 消费管道。
pub struct RelayStage<T: StageTransform> {
    stage_name: &'static str,
    consumer: KafkaConsumer,
    producer: KafkaProducer,
    dlq: DlqProducer,
    upstream: &'static str,
    downstream: Option<&'static str>,
    transform: T,
}

impl<T: StageTransform> RelayStage<T> {
    /// 创建中继阶段
    ///
    /// 生产者在终端阶段同样需要创建，死信投递复用同一条发布通道。
    /// 任一组件构造失败（broker 不可达）都向调用方返回错误，
    /// 由进程入口决定退出。
    pub fn new(
        stage_name: &'static str,
        config: &AppConfig,
        upstream: &'static str,
        downstream: Option<&'static str>,
        transform: T,
    ) -> Result<Self, RelayError> {
        let consumer = KafkaConsumer::new(&config.kafka)?;
        let producer = KafkaProducer::new(&config.kafka)?;
        let dlq = DlqProducer::new(producer.clone(), &config.service_name);

        Ok(Self {
            stage_name,
            consumer,
            producer,
            dlq,
            upstream,
            downstream,
            transform,
        })
    }

    /// 启动消费循环，直到收到 shutdown 信号
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> Result<(), RelayError> {
        let RelayStage {
            stage_name,
            consumer,
            producer,
            dlq,
            upstream,
            downstream,
            transform,
        } = self;

        consumer.subscribe(&[upstream])?;

        info!(stage = stage_name, topic = upstream, "事件中继已启动");

        consumer
            .start(shutdown, |msg| {
                let producer = &producer;
                let dlq = &dlq;
                let transform = &transform;
                async move {
                    process_message(stage_name, transform, producer, dlq, downstream, msg).await
                }
            })
            .await;

        info!(stage = stage_name, "事件中继已停止");
        Ok(())
    }
}

/// 处理单条消息的完整流程，返回位点处置
///
/// 流程：反序列化 -> 转换 -> 发布下游（若有）。
/// 拆分为独立函数而非方法，避免泛型 self 在闭包中的借用纠缠。
async fn process_message<T: StageTransform>(
    stage: &'static str,
    transform: &T,
    producer: &KafkaProducer,
    dlq: &DlqProducer,
    downstream: Option<&'static str>,
    msg: ConsumerMessage,
) -> Ack {
    // 1. 反序列化。失败属于永久错误：同一份负载重试多少次都不会成功
    let input: T::Input = match msg.deserialize_payload() {
        Ok(input) => input,
        Err(e) => {
            warn!(
                stage,
                topic = %msg.topic,
                partition = msg.partition,
                offset = msg.offset,
                error = %e,
                "消息无法解析，转入死信队列"
            );
            return quarantine(dlq, &msg, &e).await;
        }
    };

    // 2. 业务转换
    match transform.transform(input).await {
        Ok(Some((key, output))) => {
            let Some(topic) = downstream else {
                // 终端阶段不应产出下游消息，属于装配错误而非消息问题
                error!(stage, "阶段未配置下游 topic，转换输出被丢弃");
                return Ack::Commit;
            };

            // 3. 发布下游。重试已在生产者内部耗尽，
            //    此处失败视同瞬时处理失败，整条消息等待重投
            match producer.send_json(topic, Some(&key), &output).await {
                Ok((partition, offset)) => {
                    info!(stage, topic, key = %key, partition, offset, "下游事件已发布");
                    Ack::Commit
                }
                Err(e) => {
                    warn!(stage, topic, error = %e, "下游发布失败，位点不提交");
                    Ack::Hold
                }
            }
        }
        Ok(None) => {
            debug!(stage, offset = msg.offset, "终端副作用已完成");
            Ack::Commit
        }
        Err(StageError::Transient(e)) => {
            warn!(
                stage,
                topic = %msg.topic,
                offset = msg.offset,
                error = %e,
                "瞬时处理失败，位点不提交等待重投"
            );
            Ack::Hold
        }
        Err(StageError::Permanent(e)) => {
            warn!(
                stage,
                topic = %msg.topic,
                offset = msg.offset,
                error = %e,
                "永久处理失败，转入死信队列"
            );
            quarantine(dlq, &msg, &e).await
        }
    }
}

/// 将坏消息写入死信队列并决定位点处置
///
/// 写入成功才提交位点；写入失败则保留位点，整条消息之后重投，
/// 坏消息绝不会被静默丢弃。
async fn quarantine(dlq: &DlqProducer, msg: &ConsumerMessage, error: &RelayError) -> Ack {
    let message_id = dead_letter_id(msg);
    let payload = String::from_utf8_lossy(&msg.payload);

    match dlq
        .send_to_dlq(&message_id, &msg.topic, &payload, &error.to_string())
        .await
    {
        Ok(()) => Ack::Commit,
        Err(e) => {
            error!(message_id = %message_id, error = %e, "死信写入失败，位点不提交");
            Ack::Hold
        }
    }
}

/// 死信消息标识：优先取消息键，无键时退化为 topic-partition-offset 组合
fn dead_letter_id(msg: &ConsumerMessage) -> String {
    msg.key
        .clone()
        .unwrap_or_else(|| format!("{}-{}-{}", msg.topic, msg.partition, msg.offset))
}

// ---------------------------------------------------------------------------
// 单元测试
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_message(key: Option<&str>) -> ConsumerMessage {
        ConsumerMessage {
            topic: "order-events".to_string(),
            partition: 2,
            offset: 17,
            key: key.map(String::from),
            payload: b"not json".to_vec(),
            timestamp: None,
        }
    }

    #[test]
    fn test_stage_error_classification() {
        let transient = StageError::Transient(RelayError::Kafka("broker 繁忙".to_string()));
        assert!(!transient.is_permanent());

        let permanent =
            StageError::Permanent(RelayError::Deserialization("bad payload".to_string()));
        assert!(permanent.is_permanent());
    }

    #[test]
    fn test_stage_error_display() {
        let err = StageError::Transient(RelayError::Kafka("timeout".to_string()));
        assert_eq!(err.to_string(), "瞬时失败: Kafka 错误: timeout");

        let err = StageError::Permanent(RelayError::Deserialization("eof".to_string()));
        assert_eq!(err.to_string(), "永久失败: 反序列化失败: eof");
    }

    #[test]
    fn test_dead_letter_id_prefers_message_key() {
        let msg = make_message(Some("order-123"));
        assert_eq!(dead_letter_id(&msg), "order-123");
    }

    #[test]
    fn test_dead_letter_id_falls_back_to_coordinates() {
        // 无键消息退化为坐标组合，仍然全局唯一
        let msg = make_message(None);
        assert_eq!(dead_letter_id(&msg), "order-events-2-17");
    }
}
