/// インポート用署名付きURL発行ハンドラー
///
/// `GET /import?name=<file>.csv`を処理し、`uploaded/`配下へのPUT用の
/// 期限付きURLをプレーンテキストで返す。
use std::time::Duration;

use lambda_http::http::{Method, StatusCode};
use lambda_http::{Body, Response};
use tracing::{error, info};

use crate::application::ApiResponder;
use crate::domain::{upload_key, validate_import_file_name};
use crate::infrastructure::UploadUrlSigner;

/// アップロードするCSVのContent-Type
pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// 署名付きURL発行ハンドラー
pub struct ImportUrlHandler<S>
where
    S: UploadUrlSigner,
{
    signer: S,
    bucket: String,
    expires_in: Duration,
    responder: ApiResponder,
}

impl<S> ImportUrlHandler<S>
where
    S: UploadUrlSigner,
{
    pub fn new(signer: S, bucket: impl Into<String>, expires_in: Duration, responder: ApiResponder) -> Self {
        Self {
            signer,
            bucket: bucket.into(),
            expires_in,
            responder,
        }
    }

    /// リクエストを処理する
    ///
    /// # 引数
    /// * `method` - HTTPメソッド
    /// * `file_name` - クエリパラメータ`name`の値
    /// * `timestamp_millis` - アップロードキーに前置するタイムスタンプ
    pub async fn handle(
        &self,
        method: &Method,
        file_name: Option<&str>,
        timestamp_millis: i64,
    ) -> Response<Body> {
        if *method == Method::OPTIONS {
            return self.responder.preflight();
        }

        let file_name = match validate_import_file_name(file_name) {
            Ok(name) => name,
            Err(err) => {
                info!(error = %err, "不正なファイル名");
                return self.responder.bad_request(err.to_string());
            }
        };

        let key = upload_key(file_name, timestamp_millis);

        match self
            .signer
            .presign_put(&self.bucket, &key, CSV_CONTENT_TYPE, self.expires_in)
            .await
        {
            Ok(url) => {
                info!(bucket = %self.bucket, key = %key, "署名付きURLを発行");
                self.responder.text(StatusCode::OK, url)
            }
            Err(err) => {
                error!(error = %err, "署名付きURLの発行に失敗");
                self.responder.internal_error(Some(err.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::api_response::body_text;
    use crate::infrastructure::RuntimeEnv;
    use crate::infrastructure::s3_storage::tests::{MockObjectStorage, StorageCall};
    use serde_json::Value;

    fn create_handler() -> (ImportUrlHandler<MockObjectStorage>, MockObjectStorage) {
        let signer = MockObjectStorage::new();
        let handler = ImportUrlHandler::new(
            signer.clone(),
            "import-bucket",
            Duration::from_secs(60),
            ApiResponder::new("*", RuntimeEnv::Production),
        );
        (handler, signer)
    }

    #[tokio::test]
    async fn test_issues_signed_url_under_uploaded_prefix() {
        let (handler, signer) = create_handler();

        let response = handler
            .handle(&Method::GET, Some("products.csv"), 1700000000123)
            .await;

        assert_eq!(response.status(), 200);
        assert_eq!(response.headers()["content-type"], "text/plain");
        assert_eq!(
            body_text(&response),
            "https://import-bucket.s3.eu-west-1.amazonaws.com/uploaded/1700000000123_products.csv?X-Amz-Expires=60"
        );
        assert_eq!(
            signer.calls(),
            vec![StorageCall::Presign(
                "uploaded/1700000000123_products.csv".to_string(),
                "text/csv".to_string(),
                Duration::from_secs(60),
            )]
        );
    }

    #[tokio::test]
    async fn test_missing_name_is_bad_request() {
        let (handler, signer) = create_handler();

        let response = handler.handle(&Method::GET, None, 1).await;

        assert_eq!(response.status(), 400);
        let body: Value = serde_json::from_str(&body_text(&response)).unwrap();
        assert_eq!(
            body["error"]["message"],
            "File name is required as a query parameter"
        );
        assert!(signer.calls().is_empty());
    }

    #[tokio::test]
    async fn test_non_csv_is_bad_request() {
        let (handler, signer) = create_handler();

        let response = handler.handle(&Method::GET, Some("products.txt"), 1).await;

        assert_eq!(response.status(), 400);
        let body: Value = serde_json::from_str(&body_text(&response)).unwrap();
        assert_eq!(body["error"]["message"], "Only CSV files are allowed");
        assert!(signer.calls().is_empty());
    }

    #[tokio::test]
    async fn test_options_preflight() {
        let (handler, signer) = create_handler();

        let response = handler.handle(&Method::OPTIONS, None, 1).await;

        assert_eq!(response.status(), 200);
        assert!(response.headers().get("access-control-allow-methods").is_some());
        assert!(signer.calls().is_empty());
    }

    #[tokio::test]
    async fn test_signing_failure_is_internal_error() {
        let (handler, signer) = create_handler();
        signer.fail_presign();

        let response = handler.handle(&Method::GET, Some("products.csv"), 1).await;

        assert_eq!(response.status(), 500);
        let body: Value = serde_json::from_str(&body_text(&response)).unwrap();
        assert_eq!(body["error"]["message"], "Internal server error");
    }
}
