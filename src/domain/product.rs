/// 商品と在庫のドメインモデル
///
/// productsテーブルとstocksテーブルの1アイテムをそれぞれ表現し、
/// APIレスポンス用に在庫数を結合した`ProductWithStock`を提供する。
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// productsテーブルの1アイテム
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// 商品ID（パーティションキー、UUID v4）
    pub id: String,
    /// 商品名
    pub title: String,
    /// 商品説明（未指定時は空文字）
    #[serde(default)]
    pub description: String,
    /// 価格
    pub price: f64,
}

/// stocksテーブルの1アイテム
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    /// 対応する商品ID（パーティションキー）
    pub product_id: String,
    /// 在庫数
    pub count: i64,
}

/// 在庫数を結合した商品
///
/// JSON上は商品フィールドと`count`がフラットに並ぶ。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductWithStock {
    #[serde(flatten)]
    pub product: Product,
    pub count: i64,
}

impl ProductWithStock {
    /// 商品と（存在すれば）在庫を結合する
    ///
    /// 在庫レコードが無い商品は在庫数0として扱う。
    pub fn from_parts(product: Product, stock: Option<&Stock>) -> Self {
        let count = stock.map(|s| s.count).unwrap_or(0);
        Self { product, count }
    }
}

/// 商品一覧に在庫数を結合する
///
/// 商品の並び順を維持し、在庫レコードが無い商品は`count: 0`になる。
/// 商品に対応しない在庫レコードは無視する。
pub fn join_stocks(products: Vec<Product>, stocks: &[Stock]) -> Vec<ProductWithStock> {
    let by_product: HashMap<&str, &Stock> = stocks
        .iter()
        .map(|stock| (stock.product_id.as_str(), stock))
        .collect();

    products
        .into_iter()
        .map(|product| {
            let stock = by_product.get(product.id.as_str()).copied();
            ProductWithStock::from_parts(product, stock)
        })
        .collect()
}
