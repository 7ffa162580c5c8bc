/// カタログバッチ登録Lambdaエントリポイント
///
/// カタログキューのメッセージを受け取り、商品と在庫を登録して
/// 作成通知をSNSトピックへ発行する。部分バッチレスポンスで
/// 失敗したメッセージだけを再配信させる。
use aws_lambda_events::event::sqs::{SqsBatchResponse, SqsEvent};
use catalog_service::application::CatalogBatchHandler;
use catalog_service::infrastructure::{
    CatalogConfig, DynamoProductRepository, NotificationConfig, SnsNotificationPublisher,
    init_logging, load_aws_config,
};
use lambda_runtime::{Error, LambdaEvent, service_fn};
use tracing::info;

type Handler = CatalogBatchHandler<DynamoProductRepository, SnsNotificationPublisher>;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 構造化ログを初期化
    init_logging();

    let catalog = CatalogConfig::from_env()?;
    let notification = NotificationConfig::from_env()?;
    let aws_config = load_aws_config().await;

    info!(
        products_table = %catalog.products_table,
        stocks_table = %catalog.stocks_table,
        topic_arn = %notification.topic_arn,
        "カタログバッチ登録Lambdaを初期化"
    );

    let handler = CatalogBatchHandler::new(
        DynamoProductRepository::new(
            aws_sdk_dynamodb::Client::new(&aws_config),
            catalog.products_table,
            catalog.stocks_table,
        ),
        SnsNotificationPublisher::new(aws_sdk_sns::Client::new(&aws_config)),
        notification.topic_arn,
    );
    let handler = &handler;

    lambda_runtime::run(service_fn(move |event| async move { process(handler, event).await })).await
}

/// SQSイベントハンドラー
async fn process(handler: &Handler, event: LambdaEvent<SqsEvent>) -> Result<SqsBatchResponse, Error> {
    info!(message_count = event.payload.records.len(), "SQSイベント受信");
    Ok(handler.handle(&event.payload).await)
}
