//! SNS通知モジュール
//!
//! 商品作成通知をSNSトピックへ発行する。
//! サブスクリプション側のフィルターポリシー用にメッセージ属性を付与できる。

use async_trait::async_trait;
use aws_sdk_sns::Client as SnsClient;
use aws_sdk_sns::types::MessageAttributeValue;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::NotificationAttribute;

/// SNS発行のエラー型
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PublishError {
    /// AWS SDK エラー
    #[error("AWS SNS APIエラー: {0}")]
    AwsSdkError(String),
    /// JSON シリアライズエラー
    #[error("JSONシリアライズエラー: {0}")]
    SerializeError(String),
    /// メッセージ属性の構築エラー
    #[error("メッセージ属性エラー: {0}")]
    InvalidAttribute(String),
}

/// SNSメッセージ発行結果
#[derive(Debug, Clone, PartialEq)]
pub struct PublishResult {
    /// メッセージID
    pub message_id: String,
    /// 発行先トピックARN
    pub topic_arn: String,
}

/// 通知発行トレイト（テスト用の抽象化）
#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    /// メッセージをSNSトピックに発行する
    ///
    /// # 引数
    /// * `topic_arn` - SNSトピックARN
    /// * `message` - 発行するメッセージ（JSON文字列）
    /// * `subject` - メッセージの件名（オプション）
    /// * `attributes` - フィルター用メッセージ属性
    async fn publish(
        &self,
        topic_arn: &str,
        message: &str,
        subject: Option<&str>,
        attributes: &[(String, NotificationAttribute)],
    ) -> Result<PublishResult, PublishError>;

    /// シリアライズ可能な値をJSONとしてSNSトピックに発行する
    async fn publish_json<T: Serialize + Send + Sync>(
        &self,
        topic_arn: &str,
        value: &T,
        subject: Option<&str>,
        attributes: &[(String, NotificationAttribute)],
    ) -> Result<PublishResult, PublishError> {
        let message =
            serde_json::to_string(value).map_err(|e| PublishError::SerializeError(e.to_string()))?;

        self.publish(topic_arn, &message, subject, attributes).await
    }
}

/// 実際のAWS SNS SDKを使用した実装
pub struct SnsNotificationPublisher {
    client: SnsClient,
}

impl SnsNotificationPublisher {
    pub fn new(client: SnsClient) -> Self {
        Self { client }
    }

    /// ドメインの属性をSNSのMessageAttributeValueに変換する
    fn to_message_attribute(
        attribute: &NotificationAttribute,
    ) -> Result<MessageAttributeValue, PublishError> {
        MessageAttributeValue::builder()
            .data_type(attribute.data_type())
            .string_value(attribute.string_value())
            .build()
            .map_err(|e| PublishError::InvalidAttribute(e.to_string()))
    }
}

#[async_trait]
impl NotificationPublisher for SnsNotificationPublisher {
    async fn publish(
        &self,
        topic_arn: &str,
        message: &str,
        subject: Option<&str>,
        attributes: &[(String, NotificationAttribute)],
    ) -> Result<PublishResult, PublishError> {
        info!(
            topic_arn = %topic_arn,
            message_length = message.len(),
            attribute_count = attributes.len(),
            "SNSメッセージ発行開始"
        );

        let mut request = self
            .client
            .publish()
            .topic_arn(topic_arn)
            .message(message)
            .set_subject(subject.map(str::to_string));

        for (name, attribute) in attributes {
            request = request.message_attributes(name, Self::to_message_attribute(attribute)?);
        }

        match request.send().await {
            Ok(response) => {
                let message_id = response.message_id().unwrap_or("unknown").to_string();

                info!(
                    topic_arn = %topic_arn,
                    message_id = %message_id,
                    "SNS Publish成功"
                );

                Ok(PublishResult {
                    message_id,
                    topic_arn: topic_arn.to_string(),
                })
            }
            Err(err) => {
                let err = err.into_service_error();
                warn!(
                    topic_arn = %topic_arn,
                    error = %err,
                    "SNS Publishエラー"
                );
                Err(PublishError::AwsSdkError(err.to_string()))
            }
        }
    }
}
