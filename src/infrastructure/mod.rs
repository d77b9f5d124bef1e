pub mod document_store;
pub mod markup;

pub use document_store::{
    store_from_config, DocumentStore, FsDocumentStore, HttpDocumentStore, MemoryDocumentStore,
};
pub use markup::{ImageLocator, ImageRef, MarkupLocator};
