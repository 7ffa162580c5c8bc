// API Gatewayレスポンス生成
//
// すべてのHTTPレスポンスにCORSヘッダーを付与し、
// エラーは`{"success": false, "error": {...}}`形式のJSONで返す。

use lambda_http::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    CONTENT_TYPE, HeaderMap, HeaderValue,
};
use lambda_http::http::StatusCode;
use lambda_http::{Body, Response};
use serde::Serialize;
use tracing::warn;

use crate::infrastructure::RuntimeEnv;

/// 許可するHTTPメソッド
pub const ALLOWED_METHODS: &str = "GET,POST,OPTIONS";

/// 許可するリクエストヘッダー
pub const ALLOWED_HEADERS: &str =
    "Content-Type,X-Amz-Date,Authorization,X-Api-Key,X-Amz-Security-Token";

/// エラーレスポンスの`error`フィールド
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// エラーレスポンスのボディ
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: ErrorDetail,
}

/// CORSヘッダーと実行環境を保持するレスポンスビルダー
#[derive(Debug, Clone)]
pub struct ApiResponder {
    allowed_origin: HeaderValue,
    runtime_env: RuntimeEnv,
}

impl ApiResponder {
    /// 新しいレスポンスビルダーを作成
    ///
    /// ヘッダー値として不正なオリジンは`*`に置き換える。
    pub fn new(allowed_origin: &str, runtime_env: RuntimeEnv) -> Self {
        let allowed_origin = HeaderValue::from_str(allowed_origin).unwrap_or_else(|_| {
            warn!(allowed_origin = allowed_origin, "不正なALLOWED_ORIGINのため*を使用");
            HeaderValue::from_static("*")
        });
        Self {
            allowed_origin,
            runtime_env,
        }
    }

    /// CORSヘッダーを生成
    pub fn cors_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.allowed_origin.clone());
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        );
        headers
    }

    fn build(&self, status: StatusCode, content_type: Option<&'static str>, body: Body) -> Response<Body> {
        let mut response = Response::new(body);
        *response.status_mut() = status;
        *response.headers_mut() = self.cors_headers();
        if let Some(content_type) = content_type {
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        response
    }

    /// JSONレスポンス
    pub fn json<T: Serialize>(&self, status: StatusCode, value: &T) -> Response<Body> {
        match serde_json::to_string(value) {
            Ok(json) => self.build(status, Some("application/json"), Body::Text(json)),
            Err(err) => self.internal_error(Some(err.to_string())),
        }
    }

    /// プレーンテキストレスポンス
    pub fn text(&self, status: StatusCode, text: impl Into<String>) -> Response<Body> {
        self.build(status, Some("text/plain"), Body::Text(text.into()))
    }

    /// CORSプリフライト（OPTIONS）への応答
    pub fn preflight(&self) -> Response<Body> {
        self.build(StatusCode::OK, None, Body::Empty)
    }

    /// エラーレスポンス
    ///
    /// `details`は開発環境でのみボディに含める。
    pub fn error(
        &self,
        status: StatusCode,
        message: impl Into<String>,
        details: Option<String>,
    ) -> Response<Body> {
        let body = ErrorBody {
            success: false,
            error: ErrorDetail {
                message: message.into(),
                details: details.filter(|_| self.runtime_env.is_development()),
            },
        };
        self.json(status, &body)
    }

    /// 400 Bad Request
    pub fn bad_request(&self, message: impl Into<String>) -> Response<Body> {
        self.error(StatusCode::BAD_REQUEST, message, None)
    }

    /// 404 Not Found
    pub fn not_found(&self, message: impl Into<String>) -> Response<Body> {
        self.error(StatusCode::NOT_FOUND, message, None)
    }

    /// 500 Internal Server Error
    pub fn internal_error(&self, details: Option<String>) -> Response<Body> {
        self.error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", details)
    }
}

/// テスト用: レスポンスボディを文字列として取り出す
#[cfg(test)]
pub(crate) fn body_text(response: &Response<Body>) -> String {
    match response.body() {
        Body::Text(text) => text.clone(),
        Body::Binary(bytes) => String::from_utf8(bytes.clone()).unwrap(),
        Body::Empty => String::new(),
        _ => panic!("予期しないBody型"),
    }
}
