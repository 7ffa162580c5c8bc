/// 環境変数からの設定読み込み
///
/// 各Lambda関数はデプロイ時に設定された環境変数から必要な設定だけを読み込む。
/// AWS認証情報とリージョンは`aws-config`の既定の解決順序に従う。
use std::time::Duration;

use aws_config::SdkConfig;
use thiserror::Error;

/// 設定読み込みのエラー型
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for environment variable {name}: {value}")]
    InvalidValue { name: String, value: String },
}

/// 実行環境
///
/// 開発環境でのみ、エラーレスポンスに詳細を含める。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeEnv {
    Development,
    Production,
}

impl RuntimeEnv {
    /// `APP_ENV`の値を解釈する（`development`/`dev`以外はすべて本番扱い）
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("development") | Some("dev") => RuntimeEnv::Development,
            _ => RuntimeEnv::Production,
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, RuntimeEnv::Development)
    }
}

/// CORSヘッダーの既定値
pub const DEFAULT_ALLOWED_ORIGIN: &str = "*";

/// 署名付きアップロードURLの既定有効期限（秒）
pub const DEFAULT_UPLOAD_URL_EXPIRES_SECS: u64 = 60;

/// 必須の環境変数を読み込む
fn required_var(name: &str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

/// 任意の環境変数を読み込む（空文字は未設定扱い）
fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// AWS SDK共通設定を環境から読み込む
pub async fn load_aws_config() -> SdkConfig {
    aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await
}

/// 商品カタログ（DynamoDB + HTTPレスポンス）設定
///
/// 環境変数:
/// - PRODUCTS_TABLE: 商品テーブル名（必須）
/// - STOCKS_TABLE: 在庫テーブル名（必須）
/// - ALLOWED_ORIGIN: CORS許可オリジン（既定`*`）
/// - APP_ENV: 実行環境（既定は本番扱い）
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogConfig {
    pub products_table: String,
    pub stocks_table: String,
    pub allowed_origin: String,
    pub runtime_env: RuntimeEnv,
}

impl CatalogConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            products_table: required_var("PRODUCTS_TABLE")?,
            stocks_table: required_var("STOCKS_TABLE")?,
            allowed_origin: optional_var("ALLOWED_ORIGIN")
                .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_string()),
            runtime_env: RuntimeEnv::parse(optional_var("APP_ENV").as_deref()),
        })
    }
}

/// 商品作成通知の設定
///
/// 環境変数:
/// - SNS_TOPIC_ARN: 通知先トピックARN（必須）
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationConfig {
    pub topic_arn: String,
}

impl NotificationConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            topic_arn: required_var("SNS_TOPIC_ARN")?,
        })
    }
}

/// CSVインポートの設定
///
/// 環境変数:
/// - BUCKET_NAME: インポート用バケット名（必須）
/// - SQS_URL: カタログキューのURL（パーサーのみ必須）
/// - UPLOAD_URL_EXPIRES_SECS: 署名付きURLの有効期限（既定60秒）
/// - ALLOWED_ORIGIN / APP_ENV: `CatalogConfig`と同じ
#[derive(Debug, Clone, PartialEq)]
pub struct ImportConfig {
    pub bucket_name: String,
    pub queue_url: Option<String>,
    pub upload_url_expires_in: Duration,
    pub allowed_origin: String,
    pub runtime_env: RuntimeEnv,
}

impl ImportConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let upload_url_expires_in = match optional_var("UPLOAD_URL_EXPIRES_SECS") {
            None => Duration::from_secs(DEFAULT_UPLOAD_URL_EXPIRES_SECS),
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::InvalidValue {
                    name: "UPLOAD_URL_EXPIRES_SECS".to_string(),
                    value: raw,
                })?,
        };

        Ok(Self {
            bucket_name: required_var("BUCKET_NAME")?,
            queue_url: optional_var("SQS_URL"),
            upload_url_expires_in,
            allowed_origin: optional_var("ALLOWED_ORIGIN")
                .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_string()),
            runtime_env: RuntimeEnv::parse(optional_var("APP_ENV").as_deref()),
        })
    }

    /// キューURLを取得する（パーサー用、未設定ならエラー）
    pub fn require_queue_url(&self) -> Result<&str, ConfigError> {
        self.queue_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("SQS_URL".to_string()))
    }
}

/// Basic認証オーソライザーの設定
///
/// 環境変数:
/// - CREDENTIALS: `user1:pass1,user2:pass2`形式（未設定時は全リクエスト拒否）
#[derive(Clone, Default)]
pub struct AuthorizerConfig {
    pub credentials: String,
}

impl std::fmt::Debug for AuthorizerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizerConfig")
            .field("credentials", &"***")
            .finish()
    }
}

impl AuthorizerConfig {
    pub fn from_env() -> Self {
        Self {
            credentials: std::env::var("CREDENTIALS").unwrap_or_default(),
        }
    }
}
