/// 商品作成通知
///
/// バッチ登録で商品が作成されるたびにSNSトピックへ発行するメッセージ。
/// サブスクリプションのフィルターポリシー用に価格とタイトルをメッセージ属性として付与する。
use serde::Serialize;

use super::product::ProductWithStock;

/// 通知メッセージ本文の`message`フィールド
pub const PRODUCT_CREATED_MESSAGE: &str = "New product created";

/// 通知の件名
pub const PRODUCT_CREATED_SUBJECT: &str = "New Product Created";

/// SNSメッセージ属性
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationAttribute {
    /// `Number`データ型（数値フィルター用）
    Number(String),
    /// `String`データ型
    String(String),
}

impl NotificationAttribute {
    /// SNSのDataType名
    pub fn data_type(&self) -> &'static str {
        match self {
            NotificationAttribute::Number(_) => "Number",
            NotificationAttribute::String(_) => "String",
        }
    }

    /// 属性値（SNSでは数値も文字列で送る）
    pub fn string_value(&self) -> &str {
        match self {
            NotificationAttribute::Number(v) | NotificationAttribute::String(v) => v,
        }
    }
}

/// 商品作成通知の本文
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductCreatedNotification {
    pub message: String,
    pub product: ProductWithStock,
}

impl ProductCreatedNotification {
    pub fn new(product: ProductWithStock) -> Self {
        Self {
            message: PRODUCT_CREATED_MESSAGE.to_string(),
            product,
        }
    }

    pub fn subject(&self) -> &'static str {
        PRODUCT_CREATED_SUBJECT
    }

    /// フィルター用メッセージ属性（`price`と`title`）
    pub fn attributes(&self) -> Vec<(String, NotificationAttribute)> {
        vec![
            (
                "price".to_string(),
                NotificationAttribute::Number(self.product.product.price.to_string()),
            ),
            (
                "title".to_string(),
                NotificationAttribute::String(self.product.product.title.clone()),
            ),
        ]
    }
}
