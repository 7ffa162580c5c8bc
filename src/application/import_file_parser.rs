/// インポートファイル解析ハンドラー
///
/// S3のObjectCreatedイベントで呼び出され、`uploaded/`配下のCSVを読み込み、
/// 各行をJSONオブジェクトとしてカタログキューへ送信した後、
/// ファイルを`parsed/`配下へ移動する。
use aws_lambda_events::event::s3::S3Event;
use csv_async::{AsyncReader, AsyncReaderBuilder, StringRecord};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::io::AsyncRead;
use tracing::{info, warn};

use crate::domain::{decode_event_key, parsed_key_for};
use crate::infrastructure::{MessageQueue, ObjectStorage, QueueError, StorageError};

/// UTF-8 BOM
const UTF8_BOM: char = '\u{feff}';

/// インポート処理のエラー型
#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("Failed to parse CSV {key}: {message}")]
    Csv { key: String, message: String },

    #[error("Failed to serialize row: {0}")]
    SerializeError(#[from] serde_json::Error),
}

/// イベントから取り出した対象オブジェクト
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

/// 1回の呼び出しの処理結果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    /// 解析して移動したファイル数
    pub files_processed: usize,
    /// `uploaded/`配下でないため無視したファイル数
    pub files_skipped: usize,
    /// キューへ送信した行数
    pub rows_forwarded: usize,
}

/// S3イベントから対象オブジェクトを取り出す
///
/// キーはデコード済みの値で返す。バケット名やキーが欠落したレコードは無視する。
pub fn object_refs(event: &S3Event) -> Vec<ObjectRef> {
    event
        .records
        .iter()
        .filter_map(|record| {
            let bucket = record.s3.bucket.name.clone()?;
            let key = record.s3.object.key.as_deref()?;
            Some(ObjectRef {
                bucket,
                key: decode_event_key(key),
            })
        })
        .collect()
}

/// ヘッダー行を列名に変換する（先頭のBOMと前後の空白を除去）
fn normalize_headers(headers: &StringRecord) -> Vec<String> {
    headers
        .iter()
        .map(|h| h.trim_start_matches(UTF8_BOM).trim().to_string())
        .collect()
}

/// CSVを1行ずつ読み込み、ヘッダー名をキーとするJSONオブジェクトに変換する
///
/// 値はすべて文字列のまま保持する（数値の解釈はバッチ登録側で行う）。
/// 列数がヘッダーより少ない行は不足分を欠落として扱い、多い分は無視する。
pub struct CsvRowReader<R>
where
    R: AsyncRead + Unpin + Send,
{
    reader: AsyncReader<R>,
    headers: Vec<String>,
    record: StringRecord,
}

impl<R> CsvRowReader<R>
where
    R: AsyncRead + Unpin + Send,
{
    /// ヘッダー行を読み込んでリーダーを作成する
    pub async fn new(source: R) -> Result<Self, csv_async::Error> {
        let mut reader = AsyncReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .create_reader(source);
        let headers = normalize_headers(reader.headers().await?);

        Ok(Self {
            reader,
            headers,
            record: StringRecord::new(),
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// 次のデータ行を返す。終端に達したら`None`
    pub async fn next_row(&mut self) -> Result<Option<Map<String, Value>>, csv_async::Error> {
        while self.reader.read_record(&mut self.record).await? {
            let row: Map<String, Value> = self
                .headers
                .iter()
                .zip(self.record.iter())
                .filter(|(header, _)| !header.is_empty())
                .map(|(header, value)| (header.clone(), Value::String(value.to_string())))
                .collect();
            if !row.is_empty() {
                return Ok(Some(row));
            }
        }
        Ok(None)
    }
}

/// インポートファイル解析ハンドラー
pub struct ImportFileParser<S, Q>
where
    S: ObjectStorage,
    Q: MessageQueue,
{
    storage: S,
    queue: Q,
}

impl<S, Q> ImportFileParser<S, Q>
where
    S: ObjectStorage,
    Q: MessageQueue,
{
    pub fn new(storage: S, queue: Q) -> Self {
        Self { storage, queue }
    }

    /// S3イベントの全レコードを処理する
    ///
    /// いずれかのファイルで失敗した場合はその時点でエラーを返す。
    /// 再試行はLambdaの非同期呼び出し設定に委ねる。
    pub async fn handle(&self, event: &S3Event) -> Result<ImportSummary, ImportError> {
        let mut summary = ImportSummary::default();

        for object in object_refs(event) {
            match parsed_key_for(&object.key) {
                Some(parsed_key) => {
                    let rows = self.process_object(&object, &parsed_key).await?;
                    summary.files_processed += 1;
                    summary.rows_forwarded += rows;
                }
                None => {
                    info!(bucket = %object.bucket, key = %object.key, "uploaded/配下ではないためスキップ");
                    summary.files_skipped += 1;
                }
            }
        }

        Ok(summary)
    }

    /// 1ファイルを解析・送信・移動する
    ///
    /// 本文をストリームとして読み、1行解析するごとにキューへ送信する。
    /// 全行の送信が終わってから`parsed/`へ移動する。
    async fn process_object(&self, object: &ObjectRef, parsed_key: &str) -> Result<usize, ImportError> {
        info!(bucket = %object.bucket, key = %object.key, "CSV解析開始");

        let body = self.storage.get_object(&object.bucket, &object.key).await?;

        let mut rows = CsvRowReader::new(body)
            .await
            .map_err(|e| csv_error(&object.key, e))?;

        let mut forwarded = 0usize;
        while let Some(row) = rows.next_row().await.map_err(|e| csv_error(&object.key, e))? {
            let message = serde_json::to_string(&row)?;
            self.queue.send_message(&message).await?;
            forwarded += 1;
        }

        if forwarded == 0 {
            warn!(key = %object.key, "データ行がありません");
        }

        info!(key = %object.key, row_count = forwarded, "CSV解析完了");

        self.storage
            .move_object(&object.bucket, &object.key, parsed_key)
            .await?;

        info!(from_key = %object.key, to_key = %parsed_key, "解析済みファイルを移動");

        Ok(forwarded)
    }
}

fn csv_error(key: &str, error: csv_async::Error) -> ImportError {
    ImportError::Csv {
        key: key.to_string(),
        message: error.to_string(),
    }
}
