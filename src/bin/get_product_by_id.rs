/// 商品取得Lambdaエントリポイント
///
/// `GET /products/{productId}`に対して、在庫数を結合した商品を返す。
use catalog_service::application::{ApiResponder, ProductHandler};
use catalog_service::infrastructure::{
    CatalogConfig, DynamoProductRepository, init_logging, load_aws_config,
};
use lambda_http::{Body, Error, Request, RequestExt, Response, run, service_fn};
use tracing::info;

/// 商品IDのパスパラメータ名
const PRODUCT_ID_PARAM: &str = "productId";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 構造化ログを初期化
    init_logging();

    let config = CatalogConfig::from_env()?;
    let aws_config = load_aws_config().await;

    info!(
        products_table = %config.products_table,
        stocks_table = %config.stocks_table,
        "商品取得Lambdaを初期化"
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
    let product_id = product_id_param(&request);
    info!(method = %request.method(), product_id = ?product_id, "商品取得リクエスト受信");
    Ok(handler
        .get_by_id(request.method(), product_id.as_deref())
        .await)
}

/// パスパラメータ`productId`を取り出す
fn product_id_param(request: &Request) -> Option<String> {
    request
        .path_parameters_ref()
        .and_then(|params| params.first(PRODUCT_ID_PARAM))
        .map(str::to_string)
}
