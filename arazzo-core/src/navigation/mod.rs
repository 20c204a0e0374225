pub mod cache;
pub mod discovery;
pub mod index;
pub mod indexer;
pub mod openapi;
pub mod types;
pub mod uri;

pub use cache::{CacheStats, FileCache};
pub use discovery::discover;
pub use index::SymbolIndex;
pub use indexer::Indexer;
pub use openapi::{extract, Extraction};
pub use types::{IndexReport, OperationRecord, ParsedOpenApiFile};
pub use uri::{path_to_uri, uri_to_path};
