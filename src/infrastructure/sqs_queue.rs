//! SQS送信モジュール
//!
//! CSVから解析した商品行をカタログキューへ送信する。

use async_trait::async_trait;
use aws_sdk_sqs::Client as SqsClient;
use thiserror::Error;
use tracing::debug;

/// キュー送信のエラー型
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueueError {
    #[error("Failed to send message to {queue_url}: {message}")]
    SendError { queue_url: String, message: String },
}

/// メッセージキュー送信トレイト
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// メッセージ本文をキューへ送信し、メッセージIDを返す
    async fn send_message(&self, body: &str) -> Result<String, QueueError>;
}

/// AWS SQS SDKを使用した実装
#[derive(Debug, Clone)]
pub struct SqsMessageQueue {
    client: SqsClient,
    queue_url: String,
}

impl SqsMessageQueue {
    pub fn new(client: SqsClient, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }

    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }
}

#[async_trait]
impl MessageQueue for SqsMessageQueue {
    async fn send_message(&self, body: &str) -> Result<String, QueueError> {
        let output = self
            .client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| QueueError::SendError {
                queue_url: self.queue_url.clone(),
                message: e.into_service_error().to_string(),
            })?;

        let message_id = output.message_id().unwrap_or("unknown").to_string();
        debug!(message_id = %message_id, "SQSメッセージ送信");

        Ok(message_id)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// テスト用のモックキュー
    #[derive(Debug, Clone, Default)]
    pub struct MockMessageQueue {
        sent: Arc<Mutex<Vec<String>>>,
        /// 指定件数の送信成功後に失敗させる
        fail_after: Arc<Mutex<Option<usize>>>,
    }

    impl MockMessageQueue {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_after(&self, successes: usize) {
            *self.fail_after.lock().unwrap() = Some(successes);
        }

        pub fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MessageQueue for MockMessageQueue {
        async fn send_message(&self, body: &str) -> Result<String, QueueError> {
            let mut sent = self.sent.lock().unwrap();
            if let Some(limit) = *self.fail_after.lock().unwrap() {
                if sent.len() >= limit {
                    return Err(QueueError::SendError {
                        queue_url: "mock".to_string(),
                        message: "mock error".to_string(),
                    });
                }
            }
            sent.push(body.to_string());
            Ok(format!("mock-{}", sent.len()))
        }
    }

    #[test]
    fn test_queue_error_display() {
        let error = QueueError::SendError {
            queue_url: "https://sqs.eu-west-1.amazonaws.com/123456789012/catalogItemsQueue".to_string(),
            message: "AccessDenied".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to send message to https://sqs.eu-west-1.amazonaws.com/123456789012/catalogItemsQueue: AccessDenied"
        );
    }

    #[tokio::test]
    async fn test_mock_queue_records_and_fails() {
        let queue = MockMessageQueue::new();
        queue.fail_after(1);

        assert_eq!(queue.send_message("a").await.unwrap(), "mock-1");
        assert!(queue.send_message("b").await.is_err());
        assert_eq!(queue.sent(), vec!["a".to_string()]);
    }
}
