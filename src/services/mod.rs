pub mod error_collector;
pub mod grouper;
pub mod standardizer;
pub mod validator;

pub use error_collector::{ErrorCollector, ErrorKind, ErrorSummary};
pub use grouper::{group_by_document, DocumentGroup};
pub use standardizer::{standardize_record, standardize_upload};
pub use validator::{validate_record, validate_upload, ValidationReport};
