// Infrastructure layer modules
pub mod config;
pub mod logging;
pub mod product_repository;
pub mod s3_storage;
pub mod sns_publisher;
pub mod sqs_queue;

// Re-exports
pub use config::{
    AuthorizerConfig, CatalogConfig, ConfigError, ImportConfig, NotificationConfig, RuntimeEnv,
    load_aws_config,
};
pub use logging::init_logging;
pub use product_repository::{DynamoProductRepository, ProductRepository, RepositoryError};
pub use s3_storage::{ObjectBody, ObjectStorage, S3ObjectStorage, StorageError, UploadUrlSigner};
pub use sns_publisher::{NotificationPublisher, PublishError, PublishResult, SnsNotificationPublisher};
pub use sqs_queue::{MessageQueue, QueueError, SqsMessageQueue};
