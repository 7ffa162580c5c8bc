// Domain layer modules
pub mod auth_policy;
pub mod credentials;
pub mod import_key;
pub mod notification;
pub mod product;
pub mod product_draft;

// Re-exports
pub use auth_policy::{
    ANONYMOUS_PRINCIPAL, AuthorizerResponse, FORBIDDEN_PRINCIPAL, TokenAuthorizerEvent,
    UNAUTHORIZED_PRINCIPAL, allow_policy, authorizer_policy, deny_policy, http_method_from_method_arn,
    policy_effect,
};
pub use credentials::{BasicCredentials, CredentialError, CredentialStore};
pub use import_key::{
    ImportFileNameError, PARSED_PREFIX, UPLOADED_PREFIX, decode_event_key, parsed_key_for,
    upload_key, validate_import_file_name,
};
pub use notification::{NotificationAttribute, ProductCreatedNotification};
pub use product::{Product, ProductWithStock, Stock, join_stocks};
pub use product_draft::{ProductDraft, ProductValidationError};
