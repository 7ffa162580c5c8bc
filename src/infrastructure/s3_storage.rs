//! S3操作モジュール
//!
//! インポート用バケットに対する以下の操作を提供する:
//! - アップロード用の署名付きPUT URL発行
//! - CSVオブジェクトの取得
//! - 解析済みファイルの移動（コピー + 削除）

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::presigning::PresigningConfig;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use thiserror::Error;
use tokio::io::AsyncRead;
use tracing::info;

/// CopySourceでエンコードしない文字（パス区切りと非予約文字）
const COPY_SOURCE_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// S3操作のエラー型
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StorageError {
    #[error("Failed to read s3://{bucket}/{key}: {message}")]
    ReadError {
        bucket: String,
        key: String,
        message: String,
    },

    #[error("Failed to write s3://{bucket}/{key}: {message}")]
    WriteError {
        bucket: String,
        key: String,
        message: String,
    },

    #[error("Failed to presign upload URL: {0}")]
    PresignError(String),
}

/// オブジェクト本文のストリーム
pub type ObjectBody = Pin<Box<dyn AsyncRead + Send>>;

/// オブジェクトストレージ操作トレイト
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// オブジェクト本文をストリームとして取得する
    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody, StorageError>;

    /// 同一バケット内でオブジェクトをコピーする
    async fn copy_object(&self, bucket: &str, from_key: &str, to_key: &str) -> Result<(), StorageError>;

    /// オブジェクトを削除する
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StorageError>;

    /// オブジェクトを移動する（コピー後に元を削除）
    async fn move_object(&self, bucket: &str, from_key: &str, to_key: &str) -> Result<(), StorageError> {
        self.copy_object(bucket, from_key, to_key).await?;
        self.delete_object(bucket, from_key).await
    }
}

/// 署名付きアップロードURL発行トレイト
#[async_trait]
pub trait UploadUrlSigner: Send + Sync {
    /// PUT用の署名付きURLを発行する
    async fn presign_put(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<String, StorageError>;
}

/// AWS S3 SDKを使用した実装
#[derive(Debug, Clone)]
pub struct S3ObjectStorage {
    client: S3Client,
}

impl S3ObjectStorage {
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }
}

/// CopySource用の`{bucket}/{key}`をURLエンコードする
pub fn encode_copy_source(bucket: &str, key: &str) -> String {
    format!("{}/{}", bucket, utf8_percent_encode(key, COPY_SOURCE_ENCODE_SET))
}

#[async_trait]
impl ObjectStorage for S3ObjectStorage {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::ReadError {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: e.into_service_error().to_string(),
            })?;

        info!(
            bucket = bucket,
            key = key,
            content_length = ?output.content_length(),
            "オブジェクト取得"
        );

        Ok(Box::pin(output.body.into_async_read()))
    }

    async fn copy_object(&self, bucket: &str, from_key: &str, to_key: &str) -> Result<(), StorageError> {
        self.client
            .copy_object()
            .bucket(bucket)
            .copy_source(encode_copy_source(bucket, from_key))
            .key(to_key)
            .send()
            .await
            .map_err(|e| StorageError::WriteError {
                bucket: bucket.to_string(),
                key: to_key.to_string(),
                message: e.into_service_error().to_string(),
            })?;

        info!(bucket = bucket, from_key = from_key, to_key = to_key, "オブジェクトをコピー");
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::WriteError {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: e.into_service_error().to_string(),
            })?;

        info!(bucket = bucket, key = key, "オブジェクトを削除");
        Ok(())
    }
}

#[async_trait]
impl UploadUrlSigner for S3ObjectStorage {
    async fn presign_put(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<String, StorageError> {
        let presigning_config =
            PresigningConfig::expires_in(expires_in).map_err(|e| StorageError::PresignError(e.to_string()))?;

        let request = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .presigned(presigning_config)
            .await
            .map_err(|e| StorageError::PresignError(e.to_string()))?;

        Ok(request.uri().to_string())
    }
}
