/// Basic認証オーソライザーLambdaエントリポイント
///
/// API GatewayのTOKEN型オーソライザーとして`/import`を保護する。
/// 資格情報は環境変数`CREDENTIALS`から起動時に一度だけ読み込む。
use catalog_service::application::BasicAuthorizer;
use catalog_service::domain::{AuthorizerResponse, CredentialStore, TokenAuthorizerEvent};
use catalog_service::infrastructure::{AuthorizerConfig, init_logging};
use lambda_runtime::{Error, LambdaEvent, service_fn};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 構造化ログを初期化
    init_logging();

    let config = AuthorizerConfig::from_env();
    let credentials = CredentialStore::parse(&config.credentials);
    if credentials.is_empty() {
        warn!("CREDENTIALSが未設定のため全リクエストを拒否");
    }
    info!(user_count = credentials.len(), "Basic認証オーソライザーを初期化");

    let authorizer = BasicAuthorizer::new(credentials);
    let authorizer = &authorizer;

    lambda_runtime::run(service_fn(move |event| async move { handler(authorizer, event).await })).await
}

/// オーソライザーイベントハンドラー
///
/// 認証結果は常にポリシーとして返し、Lambdaとしてはエラーにしない。
async fn handler(
    authorizer: &BasicAuthorizer,
    event: LambdaEvent<TokenAuthorizerEvent>,
) -> Result<AuthorizerResponse, Error> {
    Ok(authorizer.authorize(&event.payload))
}
