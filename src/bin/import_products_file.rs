/// インポート用署名付きURL発行Lambdaエントリポイント
///
/// `GET /import?name=<file>.csv`に対して、インポート用バケットの
/// `uploaded/`配下へPUTするための署名付きURLを返す。
use catalog_service::application::{ApiResponder, ImportUrlHandler};
use catalog_service::infrastructure::{ImportConfig, S3ObjectStorage, init_logging, load_aws_config};
use chrono::Utc;
use lambda_http::{Body, Error, Request, RequestExt, Response, run, service_fn};
use tracing::info;

/// ファイル名を受け取るクエリパラメータ
const FILE_NAME_PARAM: &str = "name";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 構造化ログを初期化
    init_logging();

    let config = ImportConfig::from_env()?;
    let aws_config = load_aws_config().await;

    info!(
        bucket = %config.bucket_name,
        expires_in_secs = config.upload_url_expires_in.as_secs(),
        "インポートURL発行Lambdaを初期化"
    );

    let handler = ImportUrlHandler::new(
        S3ObjectStorage::new(aws_sdk_s3::Client::new(&aws_config)),
        config.bucket_name.clone(),
        config.upload_url_expires_in,
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
    handler: &ImportUrlHandler<S3ObjectStorage>,
    request: Request,
) -> Result<Response<Body>, Error> {
    let file_name = file_name_param(&request);
    info!(method = %request.method(), file_name = ?file_name, "インポートURLリクエスト受信");

    Ok(handler
        .handle(
            request.method(),
            file_name.as_deref(),
            Utc::now().timestamp_millis(),
        )
        .await)
}

/// クエリパラメータ`name`を取り出す
fn file_name_param(request: &Request) -> Option<String> {
    request
        .query_string_parameters_ref()
        .and_then(|params| params.first(FILE_NAME_PARAM))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambda_http::http::Request as HttpRequest;
    use std::collections::HashMap;

    #[test]
    fn test_file_name_param() {
        let request = HttpRequest::builder()
            .method("GET")
            .uri("/import")
            .body(Body::Empty)
            .unwrap()
            .with_query_string_parameters(HashMap::from([(
                "name".to_string(),
                "products.csv".to_string(),
            )]));

        assert_eq!(file_name_param(&request).as_deref(), Some("products.csv"));
    }

    #[test]
    fn test_file_name_param_missing() {
        let request = HttpRequest::builder()
            .method("GET")
            .uri("/import")
            .body(Body::Empty)
            .unwrap();

        assert_eq!(file_name_param(&request), None);
    }
}
