/// Basic認証の資格情報
///
/// 環境変数`CREDENTIALS`（`user1:pass1,user2:pass2`形式）から許可済み資格情報を構築し、
/// `Authorization: Basic <base64>`ヘッダーの値と照合する。
use std::collections::HashMap;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use thiserror::Error;

/// Basic認証ヘッダーのスキーム接頭辞
pub const BASIC_SCHEME_PREFIX: &str = "Basic ";

/// 資格情報デコードのエラー型
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CredentialError {
    /// `Basic `で始まらない
    #[error("Not a Basic authorization token")]
    NotBasicScheme,

    /// Base64としてデコードできない
    #[error("Invalid base64 credentials: {0}")]
    InvalidBase64(String),

    /// UTF-8として解釈できない
    #[error("Credentials are not valid UTF-8")]
    InvalidUtf8,

    /// `user:password`形式ではない
    #[error("Credentials must be in user:password form")]
    MissingSeparator,
}

/// リクエストから取り出したユーザー名とパスワード
#[derive(Clone, PartialEq)]
pub struct BasicCredentials {
    pub username: String,
    password: String,
}

// パスワードをログに出さない
impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl BasicCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// `Basic <base64>`形式のヘッダー値をデコードする
    ///
    /// デコード後の文字列は最初の`:`で分割するため、パスワードに`:`を含められる。
    pub fn from_authorization_header(header: &str) -> Result<Self, CredentialError> {
        let encoded = header
            .strip_prefix(BASIC_SCHEME_PREFIX)
            .ok_or(CredentialError::NotBasicScheme)?
            .trim();

        let decoded = STANDARD
            .decode(encoded)
            .map_err(|e| CredentialError::InvalidBase64(e.to_string()))?;
        let decoded = String::from_utf8(decoded).map_err(|_| CredentialError::InvalidUtf8)?;

        let (username, password) = decoded
            .split_once(':')
            .ok_or(CredentialError::MissingSeparator)?;

        Ok(Self::new(username, password))
    }
}

/// 許可済み資格情報の一覧
#[derive(Clone, Default)]
pub struct CredentialStore {
    entries: HashMap<String, String>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut users: Vec<&String> = self.entries.keys().collect();
        users.sort();
        f.debug_struct("CredentialStore").field("users", &users).finish()
    }
}

impl CredentialStore {
    /// `user1:pass1,user2:pass2`形式の文字列を解析する
    ///
    /// 各エントリは最初の`:`で分割し、前後の空白を除去する。
    /// ユーザー名またはパスワードが空のエントリは無視する。
    pub fn parse(raw: &str) -> Self {
        let entries = raw
            .split(',')
            .filter_map(|entry| {
                let (user, pass) = entry.split_once(':')?;
                let (user, pass) = (user.trim(), pass.trim());
                if user.is_empty() || pass.is_empty() {
                    return None;
                }
                Some((user.to_string(), pass.to_string()))
            })
            .collect();

        Self { entries }
    }

    /// 登録済みユーザー数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// ユーザー名とパスワードが登録済みの組と一致するか
    pub fn verify(&self, credentials: &BasicCredentials) -> bool {
        self.entries
            .get(&credentials.username)
            .is_some_and(|expected| *expected == credentials.password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_basic_header() {
        // "user:pass"
        let credentials = BasicCredentials::from_authorization_header("Basic dXNlcjpwYXNz").unwrap();
        assert_eq!(credentials, BasicCredentials::new("user", "pass"));
    }

    #[test]
    fn test_decode_password_containing_colon() {
        let encoded = STANDARD.encode("admin:se:cret");
        let credentials =
            BasicCredentials::from_authorization_header(&format!("Basic {}", encoded)).unwrap();

        assert_eq!(credentials.username, "admin");
        assert_eq!(credentials, BasicCredentials::new("admin", "se:cret"));
    }

    #[test]
    fn test_decode_rejects_other_schemes() {
        assert_eq!(
            BasicCredentials::from_authorization_header("Bearer abc"),
            Err(CredentialError::NotBasicScheme)
        );
    }

    #[test]
    fn test_decode_rejects_invalid_base64() {
        let result = BasicCredentials::from_authorization_header("Basic !!!not-base64!!!");
        assert!(matches!(result, Err(CredentialError::InvalidBase64(_))));
    }

    #[test]
    fn test_decode_rejects_missing_separator() {
        let encoded = STANDARD.encode("nocolon");
        let result = BasicCredentials::from_authorization_header(&format!("Basic {}", encoded));
        assert_eq!(result, Err(CredentialError::MissingSeparator));
    }

    #[test]
    fn test_debug_hides_password() {
        let debug = format!("{:?}", BasicCredentials::new("user", "hunter2"));
        assert!(debug.contains("user"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_parse_store_trims_and_skips_invalid_entries() {
        let store = CredentialStore::parse(" alice : wonder , bob:builder,broken,:nouser,nopass:");

        assert_eq!(store.len(), 2);
        assert!(store.verify(&BasicCredentials::new("alice", "wonder")));
        assert!(store.verify(&BasicCredentials::new("bob", "builder")));
    }

    #[test]
    fn test_parse_empty_store() {
        let store = CredentialStore::parse("");
        assert!(store.is_empty());
        assert!(!store.verify(&BasicCredentials::new("user", "pass")));
    }

    #[test]
    fn test_verify_rejects_wrong_password_and_unknown_user() {
        let store = CredentialStore::parse("user:pass");

        assert!(store.verify(&BasicCredentials::new("user", "pass")));
        assert!(!store.verify(&BasicCredentials::new("user", "wrong")));
        assert!(!store.verify(&BasicCredentials::new("other", "pass")));
    }

    #[test]
    fn test_store_debug_lists_users_only() {
        let store = CredentialStore::parse("user:topsecret");
        let debug = format!("{:?}", store);
        assert!(debug.contains("user"));
        assert!(!debug.contains("topsecret"));
    }
}
