/// Basic認証オーソライザー
///
/// API GatewayのTOKEN型オーソライザーとして呼び出され、
/// `Authorization`ヘッダーの資格情報を照合してAllow/Denyポリシーを返す。
use tracing::{info, warn};

use crate::domain::{
    ANONYMOUS_PRINCIPAL, AuthorizerResponse, BasicCredentials, CredentialError, CredentialStore,
    FORBIDDEN_PRINCIPAL, TokenAuthorizerEvent, UNAUTHORIZED_PRINCIPAL, allow_policy, deny_policy,
    http_method_from_method_arn,
};

/// Basic認証オーソライザー
#[derive(Debug, Clone)]
pub struct BasicAuthorizer {
    credentials: CredentialStore,
}

impl BasicAuthorizer {
    pub fn new(credentials: CredentialStore) -> Self {
        Self { credentials }
    }

    /// オーソライザーイベントを評価してポリシーを返す
    ///
    /// # 判定
    /// 1. CORSプリフライト（OPTIONS）は`anonymous`で許可
    /// 2. トークン欠落は`Unauthorized`で拒否
    /// 3. Basic以外のスキームは`Forbidden`で拒否
    /// 4. デコード不能な資格情報は`Unauthorized`で拒否
    /// 5. 資格情報の不一致は`Forbidden`で拒否
    /// 6. 一致した場合はユーザー名をプリンシパルとして許可
    pub fn authorize(&self, event: &TokenAuthorizerEvent) -> AuthorizerResponse {
        let method_arn = event.method_arn.as_deref().unwrap_or_default();

        if http_method_from_method_arn(method_arn) == Some("OPTIONS") {
            info!("OPTIONSリクエストのため認証なしで許可");
            return allow_policy(ANONYMOUS_PRINCIPAL, method_arn);
        }

        let token = match event.authorization_token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => token,
            _ => {
                info!("Authorizationヘッダーがありません");
                return deny_policy(UNAUTHORIZED_PRINCIPAL, method_arn);
            }
        };

        let credentials = match BasicCredentials::from_authorization_header(token) {
            Ok(credentials) => credentials,
            Err(CredentialError::NotBasicScheme) => {
                info!("Basic認証トークンではありません");
                return deny_policy(FORBIDDEN_PRINCIPAL, method_arn);
            }
            Err(err) => {
                warn!(error = %err, "資格情報をデコードできません");
                return deny_policy(UNAUTHORIZED_PRINCIPAL, method_arn);
            }
        };

        if !self.credentials.verify(&credentials) {
            info!(username = %credentials.username, "資格情報が一致しません");
            return deny_policy(FORBIDDEN_PRINCIPAL, method_arn);
        }

        info!(username = %credentials.username, "認証成功");
        allow_policy(credentials.username, method_arn)
    }
}
