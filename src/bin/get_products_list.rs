/// 商品一覧取得Lambdaエントリポイント
///
/// `GET /products`に対して、在庫数を結合した全商品をJSON配列で返す。
use catalog_service::application::{ApiResponder, ProductHandler};
use catalog_service::infrastructure::{
    CatalogConfig, DynamoProductRepository, init_logging, load_aws_config,
};
use lambda_http::{Body, Error, Request, Response, run, service_fn};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 構造化ログを初期化
    init_logging();

    let config = CatalogConfig::from_env()?;
    let aws_config = load_aws_config().await;

    info!(
        products_table = %config.products_table,
        stocks_table = %config.stocks_table,
        "商品一覧Lambdaを初期化"
    );

    let handler = ProductHandler::new(
        DynamoProductRepository::new(
            aws_sdk_dynamodb::Client::new(&aws_config),
            config.products_table,
            config.stocks_table,
        ),
        ApiResponder::new(&config.allowed_origin, config.runtime_env),
    );
    let handler = &handler;

    run(service_fn(move |request: Request| async move {
        handle_request(handler, request).await
    }))
    .await
}

/// HTTPリクエストハンドラー
async fn handle_request(
    handler: &ProductHandler<DynamoProductRepository>,
    request: Request,
) -> Result<Response<Body>, Error> {
    info!(method = %request.method(), "商品一覧リクエスト受信");
    Ok(handler.list(request.method()).await)
}
