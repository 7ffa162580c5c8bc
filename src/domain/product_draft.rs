/// 商品作成リクエストの検証
///
/// `POST /products`のボディとSQSメッセージのボディは同じ形式
/// `{title, description?, price, count?}`を持つ。CSV由来のメッセージでは
/// 数値が文字列で届くため、数値と数値文字列の両方を受け付ける。
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use super::product::{Product, Stock};

/// DynamoDBのNumber型が表せる値の上限（これ以上は書き込みで拒否される）
const PRICE_UPPER_BOUND: f64 = 1e126;

/// メッセージIDから商品IDを導出する際の名前空間
const MESSAGE_PRODUCT_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a8e_4b7d_4c39_9e15_d3a0_b8c7_5e42);

/// 商品作成リクエストの検証エラー
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProductValidationError {
    /// ボディがJSONオブジェクトではない
    #[error("Request body must be a JSON object")]
    NotAnObject,

    /// titleが欠落または空
    #[error("Missing required fields: title and price are required")]
    MissingTitle,

    /// priceが欠落
    #[error("Missing required fields: title and price are required")]
    MissingPrice,

    /// priceが数値でない、負数、またはDynamoDBで扱えない大きさ
    #[error("Price must be a non-negative number")]
    InvalidPrice,

    /// countが整数でない、または負数
    #[error("Count must be a non-negative integer")]
    InvalidCount,
}

/// 検証済みの商品作成リクエスト
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub count: i64,
}

impl ProductDraft {
    /// JSON値から商品作成リクエストを検証して構築する
    ///
    /// # 検証ルール
    /// - `title`: 空でない文字列
    /// - `price`: 必須。数値または数値文字列で、0以上かつ1e126未満
    /// - `count`: 任意（既定0）。数値または数値文字列で、0以上の整数
    /// - `description`: 任意（既定は空文字）
    pub fn from_value(value: &Value) -> Result<Self, ProductValidationError> {
        let object = value.as_object().ok_or(ProductValidationError::NotAnObject)?;

        let title = object
            .get("title")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ProductValidationError::MissingTitle)?
            .to_string();

        let price = match object.get("price") {
            None | Some(Value::Null) => return Err(ProductValidationError::MissingPrice),
            Some(raw) => parse_number(raw).ok_or(ProductValidationError::InvalidPrice)?,
        };
        if !(0.0..PRICE_UPPER_BOUND).contains(&price) {
            return Err(ProductValidationError::InvalidPrice);
        }

        let count = match object.get("count") {
            None | Some(Value::Null) => 0,
            Some(Value::String(s)) if s.trim().is_empty() => 0,
            Some(raw) => parse_count(raw).ok_or(ProductValidationError::InvalidCount)?,
        };

        let description = object
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            title,
            description,
            price,
            count,
        })
    }

    /// JSON文字列から商品作成リクエストを検証して構築する
    ///
    /// JSON構文エラーは外側の`Err`、検証エラーは内側の`Err`で返す。
    pub fn from_json(body: &str) -> Result<Result<Self, ProductValidationError>, serde_json::Error> {
        let value: Value = serde_json::from_str(body)?;
        Ok(Self::from_value(&value))
    }

    /// 指定したIDで商品レコードと在庫レコードを生成する
    pub fn into_records(self, id: impl Into<String>) -> (Product, Stock) {
        let id = id.into();
        let stock = Stock {
            product_id: id.clone(),
            count: self.count,
        };
        let product = Product {
            id,
            title: self.title,
            description: self.description,
            price: self.price,
        };
        (product, stock)
    }

    /// 新しいUUID v4を採番して商品レコードと在庫レコードを生成する
    pub fn into_new_records(self) -> (Product, Stock) {
        self.into_records(Uuid::new_v4().to_string())
    }

    /// SQSメッセージIDからUUID v5を導出して商品レコードと在庫レコードを生成する
    ///
    /// 再配信された同じメッセージは同じ商品IDになり、書き込みは上書きになる。
    pub fn into_records_for_message(self, message_id: &str) -> (Product, Stock) {
        let id = Uuid::new_v5(&MESSAGE_PRODUCT_NAMESPACE, message_id.as_bytes());
        self.into_records(id.to_string())
    }
}

/// 数値または数値文字列を有限のf64として解析する
fn parse_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        _ => return None,
    };
    number.is_finite().then_some(number)
}

/// 数値または数値文字列を0以上の整数として解析する
fn parse_count(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return (n >= 0).then_some(n);
    }
    let number = parse_number(value)?;
    if number < 0.0 || number.fract() != 0.0 || number > i64::MAX as f64 {
        return None;
    }
    Some(number as i64)
}
