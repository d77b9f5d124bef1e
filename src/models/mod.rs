pub mod grade;
pub mod loaders;
pub mod record;
pub mod report;

pub use loaders::{load_upload_file, parse_upload};
pub use record::{
    AltTextRecord, Metadata, RawAltTextRecord, RawMetadata, RawUpload, UploadData, DEFAULT_CREDIT,
};
pub use report::{
    DocumentError, FailedImage, FigureNeeded, ImageResults, PatchOutcome, PatchStatus, RunReport,
};
