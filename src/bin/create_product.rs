/// 商品作成Lambdaエントリポイント
///
/// `POST /products`に対して、商品と在庫をトランザクションで登録し、
/// 作成した商品を201で返す。
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
        "商品作成Lambdaを初期化"
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
    info!(
        method = %request.method(),
        body_length = request.body().len(),
        "商品作成リクエスト受信"
    );
    Ok(handler.create(request.method(), request.body()).await)
}
