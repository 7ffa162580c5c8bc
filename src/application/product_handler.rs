/// 商品APIハンドラー
///
/// `GET /products`、`GET /products/{productId}`、`POST /products`を処理する。
/// 各エンドポイントは別々のLambda関数として配置され、このハンドラーを共有する。
use lambda_http::http::{Method, StatusCode};
use lambda_http::{Body, Response};
use tracing::{error, info};

use crate::application::ApiResponder;
use crate::domain::{ProductDraft, ProductWithStock, join_stocks};
use crate::infrastructure::ProductRepository;

/// 商品APIハンドラー
pub struct ProductHandler<R>
where
    R: ProductRepository,
{
    repository: R,
    responder: ApiResponder,
}

impl<R> ProductHandler<R>
where
    R: ProductRepository,
{
    pub fn new(repository: R, responder: ApiResponder) -> Self {
        Self {
            repository,
            responder,
        }
    }

    /// `GET /products`: 在庫数を結合した全商品を返す
    pub async fn list(&self, method: &Method) -> Response<Body> {
        if *method == Method::OPTIONS {
            return self.responder.preflight();
        }

        let products = match self.repository.list_products().await {
            Ok(products) => products,
            Err(err) => {
                error!(error = %err, "商品一覧の取得に失敗");
                return self.responder.internal_error(Some(err.to_string()));
            }
        };
        let stocks = match self.repository.list_stocks().await {
            Ok(stocks) => stocks,
            Err(err) => {
                error!(error = %err, "在庫一覧の取得に失敗");
                return self.responder.internal_error(Some(err.to_string()));
            }
        };

        let joined = join_stocks(products, &stocks);
        info!(count = joined.len(), "商品一覧を返却");
        self.responder.json(StatusCode::OK, &joined)
    }

    /// `GET /products/{productId}`: 指定した商品を返す
    pub async fn get_by_id(&self, method: &Method, product_id: Option<&str>) -> Response<Body> {
        if *method == Method::OPTIONS {
            return self.responder.preflight();
        }

        let product_id = match product_id.map(str::trim) {
            Some(id) if !id.is_empty() => id,
            _ => return self.responder.bad_request("Product ID is required"),
        };

        let product = match self.repository.get_product(product_id).await {
            Ok(Some(product)) => product,
            Ok(None) => {
                info!(product_id = %product_id, "商品が見つかりません");
                return self
                    .responder
                    .not_found(format!("Product with ID {} not found", product_id));
            }
            Err(err) => {
                error!(product_id = %product_id, error = %err, "商品の取得に失敗");
                return self.responder.internal_error(Some(err.to_string()));
            }
        };

        match self.repository.get_stock(product_id).await {
            Ok(stock) => {
                let body = ProductWithStock::from_parts(product, stock.as_ref());
                self.responder.json(StatusCode::OK, &body)
            }
            Err(err) => {
                error!(product_id = %product_id, error = %err, "在庫の取得に失敗");
                self.responder.internal_error(Some(err.to_string()))
            }
        }
    }

    /// `POST /products`: 商品と在庫を登録し、作成した商品を返す
    pub async fn create(&self, method: &Method, body: &[u8]) -> Response<Body> {
        if *method == Method::OPTIONS {
            return self.responder.preflight();
        }

        let body = match std::str::from_utf8(body) {
            Ok(body) if !body.trim().is_empty() => body,
            _ => return self.responder.bad_request("Request body is required"),
        };

        let draft = match ProductDraft::from_json(body) {
            Ok(Ok(draft)) => draft,
            Ok(Err(err)) => {
                info!(error = %err, "不正な商品作成リクエスト");
                return self.responder.bad_request(err.to_string());
            }
            Err(err) => {
                info!(error = %err, "リクエストボディがJSONではありません");
                return self.responder.bad_request("Invalid JSON in request body");
            }
        };

        let (product, stock) = draft.into_new_records();

        if let Err(err) = self
            .repository
            .create_product_with_stock(&product, &stock)
            .await
        {
            error!(product_id = %product.id, error = %err, "商品の登録に失敗");
            return self.responder.internal_error(Some(err.to_string()));
        }

        info!(product_id = %product.id, "商品を登録");
        let created = ProductWithStock::from_parts(product, Some(&stock));
        self.responder.json(StatusCode::CREATED, &created)
    }
}
