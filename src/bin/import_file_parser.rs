/// インポートファイル解析Lambdaエントリポイント
///
/// インポート用バケットの`uploaded/`配下へのObjectCreatedイベントで起動し、
/// CSVの各行をカタログキューへ送信してからファイルを`parsed/`へ移動する。
use aws_lambda_events::event::s3::S3Event;
use catalog_service::application::{ImportFileParser, ImportSummary};
use catalog_service::infrastructure::{
    ImportConfig, S3ObjectStorage, SqsMessageQueue, init_logging, load_aws_config,
};
use lambda_runtime::{Error, LambdaEvent, service_fn};
use tracing::{error, info};

type Parser = ImportFileParser<S3ObjectStorage, SqsMessageQueue>;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 構造化ログを初期化
    init_logging();

    let config = ImportConfig::from_env()?;
    let queue_url = config.require_queue_url()?.to_string();
    let aws_config = load_aws_config().await;

    info!(bucket = %config.bucket_name, queue_url = %queue_url, "インポートファイル解析Lambdaを初期化");

    let parser = ImportFileParser::new(
        S3ObjectStorage::new(aws_sdk_s3::Client::new(&aws_config)),
        SqsMessageQueue::new(aws_sdk_sqs::Client::new(&aws_config), queue_url),
    );
    let parser = &parser;

    lambda_runtime::run(service_fn(move |event| async move { handler(parser, event).await })).await
}

/// S3イベントハンドラー
///
/// 解析に失敗した場合はエラーを返し、Lambdaの非同期再試行に任せる。
/// 失敗したファイルは`uploaded/`に残るため再試行で再解析される。
async fn handler(parser: &Parser, event: LambdaEvent<S3Event>) -> Result<ImportSummary, Error> {
    info!(record_count = event.payload.records.len(), "S3イベント受信");

    match parser.handle(&event.payload).await {
        Ok(summary) => {
            info!(
                files_processed = summary.files_processed,
                files_skipped = summary.files_skipped,
                rows_forwarded = summary.rows_forwarded,
                "インポートファイル解析完了"
            );
            Ok(summary)
        }
        Err(err) => {
            error!(error = %err, "インポートファイル解析に失敗");
            Err(err.into())
        }
    }
}
