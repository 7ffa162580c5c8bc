// Application layer modules
pub mod api_response;
pub mod authorizer_handler;
pub mod catalog_batch_handler;
pub mod import_file_parser;
pub mod import_url_handler;
pub mod product_handler;

// Re-exports
pub use api_response::{ALLOWED_HEADERS, ALLOWED_METHODS, ApiResponder, ErrorBody, ErrorDetail};
pub use authorizer_handler::BasicAuthorizer;
pub use catalog_batch_handler::{CatalogBatchHandler, MessageOutcome};
pub use import_file_parser::{
    CsvRowReader, ImportError, ImportFileParser, ImportSummary, ObjectRef, object_refs,
};
pub use import_url_handler::{CSV_CONTENT_TYPE, ImportUrlHandler};
pub use product_handler::ProductHandler;
