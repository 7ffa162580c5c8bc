/// DynamoDBで商品と在庫を管理するリポジトリ
///
/// productsテーブル（パーティションキー`id`）とstocksテーブル（パーティションキー
/// `product_id`）を扱う。商品作成時は2テーブルへの書き込みを1つのトランザクションで行う。
use async_trait::async_trait;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_dynamodb::types::{AttributeValue, Put, PutRequest, TransactWriteItem, WriteRequest};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_dynamo::aws_sdk_dynamodb_1::{from_item, from_items, to_item};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{Product, Stock};

/// BatchWriteItemの1リクエストあたりの上限件数
pub const BATCH_WRITE_LIMIT: usize = 25;

/// リポジトリ操作のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RepositoryError {
    /// DynamoDBへの書き込みに失敗
    #[error("Write error: {0}")]
    WriteError(String),

    /// DynamoDBからの読み取りに失敗
    #[error("Read error: {0}")]
    ReadError(String),

    /// データのシリアライズ/デシリアライズに失敗
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// 商品・在庫の永続化トレイト
///
/// 実際のDynamoDB実装とテスト用モックを差し替えられるようにする。
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// 全商品を取得
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError>;

    /// 全在庫を取得
    async fn list_stocks(&self) -> Result<Vec<Stock>, RepositoryError>;

    /// 商品IDで商品を取得（存在しなければ`Ok(None)`）
    async fn get_product(&self, id: &str) -> Result<Option<Product>, RepositoryError>;

    /// 商品IDで在庫を取得（存在しなければ`Ok(None)`）
    async fn get_stock(&self, product_id: &str) -> Result<Option<Stock>, RepositoryError>;

    /// 商品と在庫を1トランザクションで作成
    ///
    /// どちらか一方だけが書き込まれることはない。
    async fn create_product_with_stock(
        &self,
        product: &Product,
        stock: &Stock,
    ) -> Result<(), RepositoryError>;

    /// 商品を一括書き込み（シード用）
    async fn put_products(&self, products: &[Product]) -> Result<(), RepositoryError>;

    /// 在庫を一括書き込み（シード用）
    async fn put_stocks(&self, stocks: &[Stock]) -> Result<(), RepositoryError>;
}

/// ProductRepositoryのDynamoDB実装
#[derive(Debug, Clone)]
pub struct DynamoProductRepository {
    client: DynamoDbClient,
    products_table: String,
    stocks_table: String,
}

impl DynamoProductRepository {
    pub fn new(
        client: DynamoDbClient,
        products_table: impl Into<String>,
        stocks_table: impl Into<String>,
    ) -> Self {
        Self {
            client,
            products_table: products_table.into(),
            stocks_table: stocks_table.into(),
        }
    }

    pub fn products_table(&self) -> &str {
        &self.products_table
    }

    pub fn stocks_table(&self) -> &str {
        &self.stocks_table
    }

    /// テーブル全件をページングしながらスキャンする
    async fn scan_all<T: DeserializeOwned>(&self, table: &str) -> Result<Vec<T>, RepositoryError> {
        let mut items = Vec::new();
        let mut exclusive_start_key = None;

        loop {
            let output = self
                .client
                .scan()
                .table_name(table)
                .set_exclusive_start_key(exclusive_start_key)
                .send()
                .await
                .map_err(|e| RepositoryError::ReadError(e.into_service_error().to_string()))?;

            items.extend(output.items.unwrap_or_default());

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => exclusive_start_key = Some(key),
                _ => break,
            }
        }

        debug!(table = table, item_count = items.len(), "スキャン完了");

        from_items(items).map_err(|e| RepositoryError::SerializationError(e.to_string()))
    }

    /// パーティションキーで1件取得する
    async fn get_by_key<T: DeserializeOwned>(
        &self,
        table: &str,
        key_name: &str,
        key_value: &str,
    ) -> Result<Option<T>, RepositoryError> {
        let output = self
            .client
            .get_item()
            .table_name(table)
            .key(key_name, AttributeValue::S(key_value.to_string()))
            .send()
            .await
            .map_err(|e| RepositoryError::ReadError(e.into_service_error().to_string()))?;

        output
            .item
            .map(|item| from_item(item).map_err(|e| RepositoryError::SerializationError(e.to_string())))
            .transpose()
    }

    /// BatchWriteItemで上限件数ごとに書き込む
    ///
    /// 未処理アイテムが返された場合は同じリクエストで再送する。
    async fn batch_put<T: Serialize>(&self, table: &str, values: &[T]) -> Result<(), RepositoryError> {
        for (index, chunk) in values.chunks(BATCH_WRITE_LIMIT).enumerate() {
            let requests = chunk
                .iter()
                .map(|value| -> Result<WriteRequest, RepositoryError> {
                    let item = to_serialized_item(value)?;
                    let put = PutRequest::builder()
                        .set_item(Some(item))
                        .build()
                        .map_err(|e| RepositoryError::WriteError(e.to_string()))?;
                    Ok(WriteRequest::builder().put_request(put).build())
                })
                .collect::<Result<Vec<_>, _>>()?;

            let mut pending = HashMap::from([(table.to_string(), requests)]);

            while !pending.is_empty() {
                let output = self
                    .client
                    .batch_write_item()
                    .set_request_items(Some(pending))
                    .send()
                    .await
                    .map_err(|e| RepositoryError::WriteError(e.into_service_error().to_string()))?;

                pending = output
                    .unprocessed_items
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|(_, requests)| !requests.is_empty())
                    .collect();

                if !pending.is_empty() {
                    warn!(table = table, batch = index + 1, "未処理アイテムを再送");
                }
            }

            info!(table = table, batch = index + 1, item_count = chunk.len(), "バッチ書き込み完了");
        }

        Ok(())
    }
}

/// serde型をDynamoDBアイテムに変換する
fn to_serialized_item<T: Serialize>(value: &T) -> Result<HashMap<String, AttributeValue>, RepositoryError> {
    to_item(value).map_err(|e| RepositoryError::SerializationError(e.to_string()))
}

#[async_trait]
impl ProductRepository for DynamoProductRepository {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        self.scan_all(&self.products_table).await
    }

    async fn list_stocks(&self) -> Result<Vec<Stock>, RepositoryError> {
        self.scan_all(&self.stocks_table).await
    }

    async fn get_product(&self, id: &str) -> Result<Option<Product>, RepositoryError> {
        self.get_by_key(&self.products_table, "id", id).await
    }

    async fn get_stock(&self, product_id: &str) -> Result<Option<Stock>, RepositoryError> {
        self.get_by_key(&self.stocks_table, "product_id", product_id)
            .await
    }

    async fn create_product_with_stock(
        &self,
        product: &Product,
        stock: &Stock,
    ) -> Result<(), RepositoryError> {
        let put_product = Put::builder()
            .table_name(&self.products_table)
            .set_item(Some(to_serialized_item(product)?))
            .build()
            .map_err(|e| RepositoryError::WriteError(e.to_string()))?;

        let put_stock = Put::builder()
            .table_name(&self.stocks_table)
            .set_item(Some(to_serialized_item(stock)?))
            .build()
            .map_err(|e| RepositoryError::WriteError(e.to_string()))?;

        self.client
            .transact_write_items()
            .transact_items(TransactWriteItem::builder().put(put_product).build())
            .transact_items(TransactWriteItem::builder().put(put_stock).build())
            .send()
            .await
            .map_err(|e| RepositoryError::WriteError(e.into_service_error().to_string()))?;

        Ok(())
    }

    async fn put_products(&self, products: &[Product]) -> Result<(), RepositoryError> {
        self.batch_put(&self.products_table, products).await
    }

    async fn put_stocks(&self, stocks: &[Stock]) -> Result<(), RepositoryError> {
        self.batch_put(&self.stocks_table, stocks).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_repository_error_display() {
        assert_eq!(
            RepositoryError::WriteError("transaction cancelled".to_string()).to_string(),
            "Write error: transaction cancelled"
        );
        assert_eq!(
            RepositoryError::ReadError("throttled".to_string()).to_string(),
            "Read error: throttled"
        );
        assert_eq!(
            RepositoryError::SerializationError("missing field".to_string()).to_string(),
            "Serialization error: missing field"
        );
    }

    /// 商品がDynamoDBの属性型に正しく変換される
    #[test]
    fn test_product_to_item() {
        let product = Product {
            id: "p-1".to_string(),
            title: "iPhone 14 Pro".to_string(),
            description: "Latest iPhone".to_string(),
            price: 999.0,
        };

        let item = to_serialized_item(&product).unwrap();

        assert_eq!(item.get("id"), Some(&AttributeValue::S("p-1".to_string())));
        assert_eq!(item.get("title"), Some(&AttributeValue::S("iPhone 14 Pro".to_string())));
        assert!(matches!(item.get("price"), Some(AttributeValue::N(_))));
        let price: f64 = item.get("price").unwrap().as_n().unwrap().parse().unwrap();
        assert_eq!(price, 999.0);
    }

    #[test]
    fn test_stock_item_round_trip() {
        let item = HashMap::from([
            ("product_id".to_string(), AttributeValue::S("p-1".to_string())),
            ("count".to_string(), AttributeValue::N("17".to_string())),
        ]);

        let stock: Stock = from_item(item).unwrap();

        assert_eq!(stock.product_id, "p-1");
        assert_eq!(stock.count, 17);
    }

    /// 説明が欠落したアイテムも読み込める（既定は空文字）
    #[test]
    fn test_product_item_without_description() {
        let item = HashMap::from([
            ("id".to_string(), AttributeValue::S("p-1".to_string())),
            ("title".to_string(), AttributeValue::S("Arlo Pro 4".to_string())),
            ("price".to_string(), AttributeValue::N("199".to_string())),
        ]);

        let product: Product = from_item(item).unwrap();

        assert_eq!(product.description, "");
        assert_eq!(product.price, 199.0);
    }

    /// ユニットテスト用のモックProductRepository
    #[derive(Debug, Clone, Default)]
    pub struct MockProductRepository {
        products: Arc<Mutex<Vec<Product>>>,
        stocks: Arc<Mutex<Vec<Stock>>>,
        /// 書き込み時に返すエラー
        write_error: Arc<Mutex<Option<RepositoryError>>>,
        /// 読み込み時に返すエラー
        read_error: Arc<Mutex<Option<RepositoryError>>>,
        /// create_product_with_stockの呼び出し回数
        transaction_count: Arc<Mutex<usize>>,
    }

    impl MockProductRepository {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_data(products: Vec<Product>, stocks: Vec<Stock>) -> Self {
            let repo = Self::new();
            *repo.products.lock().unwrap() = products;
            *repo.stocks.lock().unwrap() = stocks;
            repo
        }

        pub fn fail_writes(&self, error: RepositoryError) {
            *self.write_error.lock().unwrap() = Some(error);
        }

        pub fn fail_reads(&self, error: RepositoryError) {
            *self.read_error.lock().unwrap() = Some(error);
        }

        pub fn products(&self) -> Vec<Product> {
            self.products.lock().unwrap().clone()
        }

        pub fn stocks(&self) -> Vec<Stock> {
            self.stocks.lock().unwrap().clone()
        }

        pub fn transaction_count(&self) -> usize {
            *self.transaction_count.lock().unwrap()
        }

        fn check_read(&self) -> Result<(), RepositoryError> {
            match self.read_error.lock().unwrap().clone() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }

        fn check_write(&self) -> Result<(), RepositoryError> {
            match self.write_error.lock().unwrap().clone() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl ProductRepository for MockProductRepository {
        async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
            self.check_read()?;
            Ok(self.products())
        }

        async fn list_stocks(&self) -> Result<Vec<Stock>, RepositoryError> {
            self.check_read()?;
            Ok(self.stocks())
        }

        async fn get_product(&self, id: &str) -> Result<Option<Product>, RepositoryError> {
            self.check_read()?;
            Ok(self.products().into_iter().find(|p| p.id == id))
        }

        async fn get_stock(&self, product_id: &str) -> Result<Option<Stock>, RepositoryError> {
            self.check_read()?;
            Ok(self.stocks().into_iter().find(|s| s.product_id == product_id))
        }

        async fn create_product_with_stock(
            &self,
            product: &Product,
            stock: &Stock,
        ) -> Result<(), RepositoryError> {
            *self.transaction_count.lock().unwrap() += 1;
            self.check_write()?;
            // DynamoDBのPutと同じく同一キーは上書き
            let mut products = self.products.lock().unwrap();
            products.retain(|p| p.id != product.id);
            products.push(product.clone());
            let mut stocks = self.stocks.lock().unwrap();
            stocks.retain(|s| s.product_id != stock.product_id);
            stocks.push(stock.clone());
            Ok(())
        }

        async fn put_products(&self, products: &[Product]) -> Result<(), RepositoryError> {
            self.check_write()?;
            self.products.lock().unwrap().extend_from_slice(products);
            Ok(())
        }

        async fn put_stocks(&self, stocks: &[Stock]) -> Result<(), RepositoryError> {
            self.check_write()?;
            self.stocks.lock().unwrap().extend_from_slice(stocks);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_mock_transaction_is_all_or_nothing() {
        let repo = MockProductRepository::new();
        repo.fail_writes(RepositoryError::WriteError("cancelled".to_string()));

        let product = Product {
            id: "p-1".to_string(),
            title: "T".to_string(),
            description: String::new(),
            price: 1.0,
        };
        let stock = Stock {
            product_id: "p-1".to_string(),
            count: 1,
        };

        assert!(repo.create_product_with_stock(&product, &stock).await.is_err());
        assert!(repo.products().is_empty());
        assert!(repo.stocks().is_empty());
        assert_eq!(repo.transaction_count(), 1);
    }
}
