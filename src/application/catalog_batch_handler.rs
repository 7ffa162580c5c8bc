/// カタログバッチ登録ハンドラー
///
/// CSVインポートでキューに投入された商品メッセージを受け取り、
/// 商品と在庫をトランザクションで登録してから作成通知をSNSへ発行する。
use aws_lambda_events::event::sqs::{BatchItemFailure, SqsBatchResponse, SqsEvent, SqsMessage};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::domain::{ProductCreatedNotification, ProductDraft, ProductWithStock};
use crate::infrastructure::{NotificationPublisher, ProductRepository};

/// メッセージ1件の処理結果
#[derive(Debug, Clone, PartialEq)]
pub enum MessageOutcome {
    /// 登録と通知に成功
    Created(ProductWithStock),
    /// 不正なメッセージのため破棄（再試行しない）
    Dropped(String),
    /// 登録または通知に失敗（SQSに再配信させる）
    Failed(String),
}

/// カタログバッチ登録ハンドラー
pub struct CatalogBatchHandler<R, N>
where
    R: ProductRepository,
    N: NotificationPublisher,
{
    repository: R,
    publisher: N,
    topic_arn: String,
}

impl<R, N> CatalogBatchHandler<R, N>
where
    R: ProductRepository,
    N: NotificationPublisher,
{
    pub fn new(repository: R, publisher: N, topic_arn: impl Into<String>) -> Self {
        Self {
            repository,
            publisher,
            topic_arn: topic_arn.into(),
        }
    }

    /// SQSイベントを処理し、部分バッチレスポンスを返す
    ///
    /// 失敗したメッセージのIDだけを`batchItemFailures`に含める。
    pub async fn handle(&self, event: &SqsEvent) -> SqsBatchResponse {
        let mut batch_item_failures = Vec::new();
        let mut created = 0usize;
        let mut dropped = 0usize;

        for message in &event.records {
            let message_id = message.message_id.as_deref().unwrap_or_default();

            match self.process_message(message).await {
                MessageOutcome::Created(product) => {
                    info!(message_id = %message_id, product_id = %product.product.id, "商品を登録");
                    created += 1;
                }
                MessageOutcome::Dropped(reason) => {
                    warn!(message_id = %message_id, reason = %reason, "不正なメッセージを破棄");
                    dropped += 1;
                }
                MessageOutcome::Failed(reason) => {
                    error!(message_id = %message_id, reason = %reason, "メッセージ処理に失敗");
                    // IDの無いメッセージは再配信対象として指定できない
                    if let Some(id) = &message.message_id {
                        batch_item_failures.push(BatchItemFailure {
                            item_identifier: id.clone(),
                        });
                    }
                }
            }
        }

        info!(
            total = event.records.len(),
            created = created,
            dropped = dropped,
            failed = batch_item_failures.len(),
            "バッチ処理完了"
        );

        SqsBatchResponse {
            batch_item_failures,
        }
    }

    /// メッセージ1件を処理する
    pub async fn process_message(&self, message: &SqsMessage) -> MessageOutcome {
        let Some(body) = message.body.as_deref() else {
            return MessageOutcome::Dropped("メッセージ本文がありません".to_string());
        };

        let value: Value = match serde_json::from_str(body) {
            Ok(value) => value,
            Err(err) => return MessageOutcome::Dropped(format!("JSONとして解析できません: {}", err)),
        };

        let draft = match ProductDraft::from_value(&value) {
            Ok(draft) => draft,
            Err(err) => return MessageOutcome::Dropped(err.to_string()),
        };

        // 再配信で商品が重複しないよう、メッセージIDから商品IDを決める
        let (product, stock) = match message.message_id.as_deref() {
            Some(message_id) => draft.into_records_for_message(message_id),
            None => draft.into_new_records(),
        };

        if let Err(err) = self
            .repository
            .create_product_with_stock(&product, &stock)
            .await
        {
            return MessageOutcome::Failed(err.to_string());
        }

        let created = ProductWithStock::from_parts(product, Some(&stock));
        let notification = ProductCreatedNotification::new(created.clone());

        match self
            .publisher
            .publish_json(
                &self.topic_arn,
                &notification,
                Some(notification.subject()),
                &notification.attributes(),
            )
            .await
        {
            Ok(result) => {
                info!(message_id = %result.message_id, "作成通知を発行");
                MessageOutcome::Created(created)
            }
            Err(err) => MessageOutcome::Failed(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NotificationAttribute;
    use crate::infrastructure::RepositoryError;
    use crate::infrastructure::logging::init_test_logging;
    use crate::infrastructure::product_repository::tests::MockProductRepository;
    use crate::infrastructure::sns_publisher::tests::MockNotificationPublisher;
    use serde_json::json;

    const TOPIC: &str = "arn:aws:sns:eu-west-1:123456789012:createProductTopic";

    fn message(id: &str, body: Option<&str>) -> SqsMessage {
        SqsMessage {
            message_id: Some(id.to_string()),
            body: body.map(str::to_string),
            ..Default::default()
        }
    }

    fn sqs_event(messages: Vec<SqsMessage>) -> SqsEvent {
        SqsEvent { records: messages }
    }

    fn create_handler() -> (
        CatalogBatchHandler<MockProductRepository, MockNotificationPublisher>,
        MockProductRepository,
        MockNotificationPublisher,
    ) {
        let repository = MockProductRepository::new();
        let publisher = MockNotificationPublisher::new();
        let handler = CatalogBatchHandler::new(repository.clone(), publisher.clone(), TOPIC);
        (handler, repository, publisher)
    }

    /// CSV由来の文字列値を持つメッセージを登録し、通知を発行する
    #[tokio::test]
    async fn test_creates_product_and_publishes() {
        init_test_logging();
        let (handler, repository, publisher) = create_handler();
        let body = json!({
            "title": "iPhone 14 Pro",
            "description": "Latest iPhone",
            "price": "999",
            "count": "5"
        })
        .to_string();

        let response = handler.handle(&sqs_event(vec![message("m-1", Some(&body))])).await;

        assert!(response.batch_item_failures.is_empty());

        let products = repository.products();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].title, "iPhone 14 Pro");
        assert_eq!(products[0].price, 999.0);
        assert_eq!(repository.stocks()[0].product_id, products[0].id);
        assert_eq!(repository.stocks()[0].count, 5);

        let published = publisher.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].topic_arn, TOPIC);
        assert_eq!(published[0].subject.as_deref(), Some("New Product Created"));
        assert!(published[0].attributes.contains(&(
            "price".to_string(),
            NotificationAttribute::Number("999".to_string())
        )));

        let message: Value = serde_json::from_str(&published[0].message).unwrap();
        assert_eq!(message["message"], "New product created");
        assert_eq!(message["product"]["id"], products[0].id.as_str());
        assert_eq!(message["product"]["count"], 5);
    }

    /// 不正な価格のメッセージは何も書き込まずに破棄する
    #[tokio::test]
    async fn test_invalid_price_is_dropped_without_writes() {
        let (handler, repository, publisher) = create_handler();
        let negative = json!({"title": "Broken", "price": -5}).to_string();
        let not_numeric = json!({"title": "Broken", "price": "abc"}).to_string();

        let response = handler
            .handle(&sqs_event(vec![
                message("m-1", Some(&negative)),
                message("m-2", Some(&not_numeric)),
            ]))
            .await;

        assert!(response.batch_item_failures.is_empty());
        assert_eq!(repository.transaction_count(), 0);
        assert!(repository.products().is_empty());
        assert!(publisher.published().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_and_empty_bodies_are_dropped() {
        let (handler, repository, _) = create_handler();

        let outcome = handler.process_message(&message("m-1", Some("not json"))).await;
        assert!(matches!(outcome, MessageOutcome::Dropped(_)));

        let outcome = handler.process_message(&message("m-2", None)).await;
        assert!(matches!(outcome, MessageOutcome::Dropped(_)));

        let outcome = handler.process_message(&message("m-3", Some("[1,2]"))).await;
        assert!(matches!(outcome, MessageOutcome::Dropped(_)));

        assert_eq!(repository.transaction_count(), 0);
    }

    /// 書き込み失敗は部分バッチ失敗として報告する
    #[tokio::test]
    async fn test_write_failure_reported_as_batch_item_failure() {
        let (handler, repository, publisher) = create_handler();
        repository.fail_writes(RepositoryError::WriteError("TransactionCanceled".to_string()));
        let body = json!({"title": "Mouse", "price": 49}).to_string();

        let response = handler
            .handle(&sqs_event(vec![message("m-1", Some(&body))]))
            .await;

        assert_eq!(
            response.batch_item_failures,
            vec![BatchItemFailure {
                item_identifier: "m-1".to_string()
            }]
        );
        assert!(publisher.published().is_empty());
    }

    #[tokio::test]
    async fn test_publish_failure_reported_as_batch_item_failure() {
        let (handler, repository, publisher) = create_handler();
        publisher.fail_all();
        let good = json!({"title": "Mouse", "price": 49}).to_string();
        let bad = json!({"title": "", "price": 49}).to_string();

        let response = handler
            .handle(&sqs_event(vec![
                message("m-1", Some(&good)),
                message("m-2", Some(&bad)),
            ]))
            .await;

        let failed: Vec<&str> = response
            .batch_item_failures
            .iter()
            .map(|f| f.item_identifier.as_str())
            .collect();
        assert_eq!(failed, vec!["m-1"]);
        assert_eq!(repository.transaction_count(), 1);
    }

    /// 通知失敗後に再配信された同じメッセージは商品を重複登録しない
    #[tokio::test]
    async fn test_redelivery_after_publish_failure_keeps_single_product() {
        let repository = MockProductRepository::new();
        let failing = MockNotificationPublisher::new();
        failing.fail_all();
        let healthy = MockNotificationPublisher::new();
        let body = json!({"title": "Mouse", "price": 49, "count": 3}).to_string();
        let event = sqs_event(vec![message("m-1", Some(&body))]);

        let first = CatalogBatchHandler::new(repository.clone(), failing, TOPIC)
            .handle(&event)
            .await;
        assert_eq!(first.batch_item_failures.len(), 1);

        let second = CatalogBatchHandler::new(repository.clone(), healthy.clone(), TOPIC)
            .handle(&event)
            .await;
        assert!(second.batch_item_failures.is_empty());

        let products = repository.products();
        assert_eq!(products.len(), 1);
        assert_eq!(repository.stocks().len(), 1);
        assert_eq!(repository.transaction_count(), 2);

        let published = healthy.published();
        assert_eq!(published.len(), 1);
        let message: Value = serde_json::from_str(&published[0].message).unwrap();
        assert_eq!(message["product"]["id"], products[0].id.as_str());
    }

    #[tokio::test]
    async fn test_empty_event() {
        let (handler, _, _) = create_handler();

        let response = handler.handle(&sqs_event(vec![])).await;

        assert_eq!(response, SqsBatchResponse::default());
    }
}
