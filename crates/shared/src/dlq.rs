//! 死信队列
//!
//! 永久性处理失败的消息（反序列化失败等）写入死信 topic 后才提交位点，
//! 既不会无限重投卡住分区，也不会被静默丢弃，留待人工排查或离线重放。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::RelayError;
use crate::kafka::{KafkaProducer, topics};

// ---------------------------------------------------------------------------
// DeadLetterMessage — 死信消息信封
// ---------------------------------------------------------------------------

/// 死信消息信封
///
/// 包装原始负载并附加来源与失败原因，排查时无需回查原始 topic。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadLetterMessage {
    /// 原始消息标识（消息键，或 topic-partition-offset 组合）
    pub message_id: String,
    /// 原始 topic
    pub source_topic: String,
    /// 产生死信的服务
    pub source_service: String,
    /// 原始消息内容
    pub payload: String,
    /// 失败原因
    pub error: String,
    /// 失败时间
    pub failed_at: DateTime<Utc>,
}

impl DeadLetterMessage {
    pub fn new(
        message_id: impl Into<String>,
        source_topic: impl Into<String>,
        payload: impl Into<String>,
        error: impl Into<String>,
        source_service: impl Into<String>,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            source_topic: source_topic.into(),
            source_service: source_service.into(),
            payload: payload.into(),
            error: error.into(),
            failed_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// DlqProducer — 将坏消息写入死信队列
// ---------------------------------------------------------------------------

/// DLQ 生产者
///
/// 各阶段在遇到永久性坏消息时调用此组件将其写入死信队列。
/// 调用方必须在写入成功后才提交原消息的位点，保证坏消息要么进入
/// 死信队列，要么留在原分区等待重投，不存在第三种去向。
pub struct DlqProducer {
    producer: KafkaProducer,
    source_service: String,
}

impl DlqProducer {
    pub fn new(producer: KafkaProducer, source_service: &str) -> Self {
        Self {
            producer,
            source_service: source_service.to_string(),
        }
    }

    /// 将坏消息写入死信队列
    pub async fn send_to_dlq(
        &self,
        message_id: &str,
        source_topic: &str,
        payload: &str,
        error: &str,
    ) -> Result<(), RelayError> {
        let dlq_msg = DeadLetterMessage::new(
            message_id,
            source_topic,
            payload,
            error,
            self.source_service.as_str(),
        );

        self.producer
            .send_json(topics::DEAD_LETTER_QUEUE, Some(message_id), &dlq_msg)
            .await?;

        warn!(message_id, source_topic, error, "消息已写入死信队列");

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// 单元测试
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dead_letter_message_creation() {
        let msg = DeadLetterMessage::new(
            "order-events-0-42",
            "order-events",
            "not json",
            "反序列化失败: expected value",
            "payment-service",
        );

        assert_eq!(msg.message_id, "order-events-0-42");
        assert_eq!(msg.source_topic, "order-events");
        assert_eq!(msg.source_service, "payment-service");
        assert_eq!(msg.payload, "not json");
        assert_eq!(msg.error, "反序列化失败: expected value");
    }

    #[test]
    fn test_dead_letter_serialization() {
        let msg = DeadLetterMessage::new(
            "payment-events-1-7",
            "payment-events",
            r#"{"broken":"#,
            "负载反序列化失败",
            "notification-service",
        );

        let json = serde_json::to_string(&msg).unwrap();

        // 验证 camelCase 序列化
        assert!(json.contains("messageId"));
        assert!(json.contains("sourceTopic"));
        assert!(json.contains("sourceService"));
        assert!(json.contains("failedAt"));

        // 验证能反序列化回来
        let deserialized: DeadLetterMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.message_id, "payment-events-1-7");
        assert_eq!(deserialized.source_topic, "payment-events");
        assert_eq!(deserialized.source_service, "notification-service");
        assert_eq!(deserialized.failed_at, msg.failed_at);
    }
}
