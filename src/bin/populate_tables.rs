/// 商品・在庫テーブル初期データ投入スクリプト
///
/// サンプル商品10件をproductsテーブルへ、各商品に1〜100のランダムな在庫数を
/// stocksテーブルへ書き込む。書き込みは25件ずつのバッチで行う。
///
/// # 環境変数
/// - PRODUCTS_TABLE: 商品テーブル名（`--products-table`で上書き可能）
/// - STOCKS_TABLE: 在庫テーブル名（`--stocks-table`で上書き可能）
///
/// # ローカル実行
/// ```bash
/// export PRODUCTS_TABLE=products
/// export STOCKS_TABLE=stocks
///
/// # 投入内容の確認のみ
/// cargo run --bin populate_tables -- --dry-run
///
/// # 投入
/// cargo run --bin populate_tables
/// ```
use catalog_service::domain::{Product, Stock};
use catalog_service::infrastructure::{
    DynamoProductRepository, ProductRepository, init_logging, load_aws_config,
};
use clap::Parser;
use lambda_runtime::Error;
use tracing::info;

/// コマンドライン引数
#[derive(Parser, Debug)]
#[command(name = "populate_tables")]
#[command(about = "商品・在庫テーブルにサンプルデータを投入")]
struct CliArgs {
    /// 商品テーブル名
    #[arg(long, env = "PRODUCTS_TABLE")]
    products_table: String,

    /// 在庫テーブル名
    #[arg(long, env = "STOCKS_TABLE")]
    stocks_table: String,

    /// 書き込まずに投入内容を表示する
    #[arg(long)]
    dry_run: bool,
}

/// サンプル商品（id, title, description, price）
const SAMPLE_PRODUCTS: [(&str, &str, &str, f64); 10] = [
    (
        "7567ec4b-b10c-48c5-9345-fc73c48a80aa",
        "iPhone 14 Pro",
        "Latest iPhone model with A16 Bionic chip, featuring a 6.1-inch Super Retina XDR display",
        999.0,
    ),
    (
        "7567ec4b-b10c-48c5-9345-fc73c48a80a1",
        "Sony WH-1000XM4",
        "Noise-cancelling wireless headphones with up to 30 hours of battery life",
        379.0,
    ),
    (
        "7567ec4b-b10c-48c5-9345-fc73c48a80a3",
        "Samsung 55-inch Crystal UHD",
        "4K Ultra HD Smart LED TV with Alexa compatibility and HDR support",
        549.0,
    ),
    (
        "7567ec4b-b10c-48c5-9345-fc73348a80a1",
        "ASUS ROG Strix G15",
        "Powerful gaming laptop with RTX 3060, 16GB RAM, and 512GB SSD",
        1299.0,
    ),
    (
        "7567ec4b-b10c-48c5-9445-fc73c48a80a2",
        "Arlo Pro 4",
        "Smart home security camera with 2K resolution and two-way audio",
        199.0,
    ),
    (
        "7567ec4b-b10c-45c5-9345-fc73c48a80a1",
        "Corsair K70 RGB",
        "Mechanical gaming keyboard with RGB backlight and Cherry MX switches",
        149.0,
    ),
    (
        "7567ec4b-b10c-45c5-9345-fc73c48a80b2",
        "Razer DeathAdder V3 Pro",
        "Wireless gaming mouse with 25K DPI sensor and 70-hour battery life",
        149.0,
    ),
    (
        "7567ec4b-b10c-45c5-9345-fc73c48a80c3",
        "LG UltraGear 27GL850-B",
        "27-inch QHD gaming monitor with 165Hz refresh rate and 1ms response time",
        329.0,
    ),
    (
        "7567ec4b-b10c-45c5-9345-fc73c48a80d4",
        "Sony Alpha a6400",
        "Compact mirrorless camera with 24.2MP sensor and 4K video capability",
        899.0,
    ),
    (
        "7567ec4b-b10c-45c5-9345-fc73c48a80e5",
        "Garmin Fenix 7",
        "Smart watch with health monitoring and GPS tracking",
        399.0,
    ),
];

/// 在庫数の上限
const MAX_STOCK_COUNT: i64 = 100;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 構造化ログを初期化
    init_logging();

    let args = CliArgs::parse();

    let products = sample_products();
    let stocks = generate_stocks(&products);

    if args.dry_run {
        info!("dry-runのため書き込みを行わない");
        for (product, stock) in products.iter().zip(&stocks) {
            println!("{}\t{}\t{}\t{}", product.id, product.title, product.price, stock.count);
        }
        return Ok(());
    }

    let aws_config = load_aws_config().await;
    let repository = DynamoProductRepository::new(
        aws_sdk_dynamodb::Client::new(&aws_config),
        args.products_table,
        args.stocks_table,
    );

    info!(
        products_table = %repository.products_table(),
        product_count = products.len(),
        "商品を投入"
    );
    repository.put_products(&products).await?;

    info!(
        stocks_table = %repository.stocks_table(),
        stock_count = stocks.len(),
        "在庫を投入"
    );
    repository.put_stocks(&stocks).await?;

    info!(
        product_count = products.len(),
        stock_count = stocks.len(),
        "テーブルへの投入完了"
    );
    for product in &products {
        info!(product_id = %product.id, title = %product.title, "投入した商品");
    }

    Ok(())
}

/// サンプル商品を生成
fn sample_products() -> Vec<Product> {
    SAMPLE_PRODUCTS
        .iter()
        .map(|(id, title, description, price)| Product {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            price: *price,
        })
        .collect()
}

/// 各商品に1〜100のランダムな在庫数を割り当てる
fn generate_stocks(products: &[Product]) -> Vec<Stock> {
    products
        .iter()
        .map(|product| Stock {
            product_id: product.id.clone(),
            count: random_stock_count(),
        })
        .collect()
}

fn random_stock_count() -> i64 {
    rand::random_range(1..=MAX_STOCK_COUNT)
}
