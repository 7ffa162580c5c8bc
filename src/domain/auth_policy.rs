/// API Gateway Lambdaオーソライザーの入出力
///
/// TOKEN型オーソライザーのイベントとIAMポリシー形式のレスポンスは
/// `aws_lambda_events`の型を使い、ここではポリシーの組み立てだけを行う。
use std::collections::HashMap;

use aws_lambda_events::event::apigw::{
    ApiGatewayCustomAuthorizerPolicy, ApiGatewayCustomAuthorizerRequest,
    ApiGatewayCustomAuthorizerResponse,
};
use aws_lambda_events::event::iam::{IamPolicyEffect, IamPolicyStatement};

/// IAMポリシーのバージョン
pub const POLICY_VERSION: &str = "2012-10-17";

/// API Gateway呼び出しのアクション
pub const INVOKE_ACTION: &str = "execute-api:Invoke";

/// 資格情報が欠落・不正な場合のプリンシパル
pub const UNAUTHORIZED_PRINCIPAL: &str = "Unauthorized";

/// 資格情報が一致しない場合のプリンシパル
pub const FORBIDDEN_PRINCIPAL: &str = "Forbidden";

/// CORSプリフライトを許可する際のプリンシパル
pub const ANONYMOUS_PRINCIPAL: &str = "anonymous";

/// TOKEN型オーソライザーのイベント
pub type TokenAuthorizerEvent = ApiGatewayCustomAuthorizerRequest;

/// オーソライザーのレスポンス（`context`は空のオブジェクト）
pub type AuthorizerResponse = ApiGatewayCustomAuthorizerResponse<HashMap<String, String>>;

/// 単一ステートメントのポリシーを生成する
pub fn authorizer_policy(
    principal_id: impl Into<String>,
    effect: IamPolicyEffect,
    resource: impl Into<String>,
) -> AuthorizerResponse {
    AuthorizerResponse {
        principal_id: Some(principal_id.into()),
        policy_document: ApiGatewayCustomAuthorizerPolicy {
            version: Some(POLICY_VERSION.to_string()),
            statement: vec![IamPolicyStatement {
                action: vec![INVOKE_ACTION.to_string()],
                effect,
                resource: vec![resource.into()],
                condition: None,
            }],
        },
        context: HashMap::new(),
        usage_identifier_key: None,
    }
}

pub fn allow_policy(principal_id: impl Into<String>, resource: impl Into<String>) -> AuthorizerResponse {
    authorizer_policy(principal_id, IamPolicyEffect::Allow, resource)
}

pub fn deny_policy(principal_id: impl Into<String>, resource: impl Into<String>) -> AuthorizerResponse {
    authorizer_policy(principal_id, IamPolicyEffect::Deny, resource)
}

/// ポリシーの効果（単一ステートメント前提）
pub fn policy_effect(response: &AuthorizerResponse) -> Option<&IamPolicyEffect> {
    response
        .policy_document
        .statement
        .first()
        .map(|statement| &statement.effect)
}

/// メソッドARNからHTTPメソッドを取り出す
///
/// `arn:aws:execute-api:{region}:{account}:{apiId}/{stage}/{METHOD}/{resourcePath}`
/// の`{METHOD}`部分を返す。形式が異なる場合は`None`。
pub fn http_method_from_method_arn(method_arn: &str) -> Option<&str> {
    method_arn
        .split(':')
        .nth(5)?
        .split('/')
        .nth(2)
        .filter(|method| !method.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const METHOD_ARN: &str =
        "arn:aws:execute-api:eu-west-1:123456789012:abcdef1234/dev/GET/import";

    #[test]
    fn test_http_method_from_method_arn() {
        assert_eq!(http_method_from_method_arn(METHOD_ARN), Some("GET"));
        assert_eq!(
            http_method_from_method_arn(
                "arn:aws:execute-api:eu-west-1:123456789012:abcdef1234/dev/OPTIONS/products/abc"
            ),
            Some("OPTIONS")
        );
    }

    #[test]
    fn test_http_method_from_malformed_arn() {
        assert_eq!(http_method_from_method_arn(""), None);
        assert_eq!(http_method_from_method_arn("arn:aws:execute-api"), None);
        assert_eq!(
            http_method_from_method_arn("arn:aws:execute-api:eu-west-1:123456789012:abcdef1234/dev"),
            None
        );
    }

    /// API Gatewayが要求するキー名でシリアライズされる
    #[test]
    fn test_authorizer_response_serialization() {
        let response = allow_policy("user", METHOD_ARN);

        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["principalId"], "user");
        assert_eq!(
            value["policyDocument"],
            json!({
                "Version": "2012-10-17",
                "Statement": [{
                    "Action": ["execute-api:Invoke"],
                    "Effect": "Allow",
                    "Resource": [METHOD_ARN]
                }]
            })
        );
        assert_eq!(value["context"], json!({}));
    }

    #[test]
    fn test_deny_response() {
        let response = deny_policy(FORBIDDEN_PRINCIPAL, METHOD_ARN);
        assert_eq!(response.principal_id.as_deref(), Some("Forbidden"));
        assert_eq!(policy_effect(&response), Some(&IamPolicyEffect::Deny));
        assert_eq!(response.policy_document.statement[0].resource, vec![METHOD_ARN]);
    }

    #[test]
    fn test_token_event_deserialization() {
        let event: TokenAuthorizerEvent = serde_json::from_value(json!({
            "type": "TOKEN",
            "authorizationToken": "Basic dXNlcjpwYXNz",
            "methodArn": METHOD_ARN
        }))
        .unwrap();

        assert_eq!(event.authorization_token.as_deref(), Some("Basic dXNlcjpwYXNz"));
        assert_eq!(event.method_arn.as_deref(), Some(METHOD_ARN));
    }

    #[test]
    fn test_token_event_without_token() {
        let event: TokenAuthorizerEvent =
            serde_json::from_value(json!({"type": "TOKEN", "methodArn": METHOD_ARN})).unwrap();
        assert!(event.authorization_token.is_none());
    }
}
