/// インポート用S3オブジェクトキーの規則
///
/// アップロードされたCSVは`uploaded/`配下に置かれ、解析後に`parsed/`配下へ移動する。
use std::borrow::Cow;

use percent_encoding::percent_decode_str;
use thiserror::Error;

/// 解析対象ファイルの接頭辞
pub const UPLOADED_PREFIX: &str = "uploaded/";

/// 解析済みファイルの接頭辞
pub const PARSED_PREFIX: &str = "parsed/";

/// 受け付けるファイル拡張子
pub const CSV_EXTENSION: &str = ".csv";

/// インポートファイル名の検証エラー
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImportFileNameError {
    #[error("File name is required as a query parameter")]
    Missing,

    #[error("Only CSV files are allowed")]
    NotCsv,
}

/// クエリパラメータのファイル名を検証する
pub fn validate_import_file_name(name: Option<&str>) -> Result<&str, ImportFileNameError> {
    let name = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or(ImportFileNameError::Missing)?;

    if !name.ends_with(CSV_EXTENSION) {
        return Err(ImportFileNameError::NotCsv);
    }

    Ok(name)
}

/// 署名付きURLのアップロード先キーを生成する
///
/// 同名ファイルの上書きを避けるため、ミリ秒タイムスタンプを前置する。
pub fn upload_key(file_name: &str, timestamp_millis: i64) -> String {
    format!("{}{}_{}", UPLOADED_PREFIX, timestamp_millis, file_name)
}

/// S3イベント通知のオブジェクトキーをデコードする
///
/// イベント内のキーはフォームエンコードされているため、`+`を空白に戻してから
/// パーセントデコードする。
pub fn decode_event_key(raw_key: &str) -> String {
    let spaced = raw_key.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(Cow::into_owned)
        .unwrap_or_else(|_| spaced.clone())
}

/// 解析済みファイルの移動先キーを返す
///
/// `uploaded/`配下でないキーは対象外として`None`を返す。
pub fn parsed_key_for(key: &str) -> Option<String> {
    key.strip_prefix(UPLOADED_PREFIX)
        .filter(|rest| !rest.is_empty())
        .map(|rest| format!("{}{}", PARSED_PREFIX, rest))
}
