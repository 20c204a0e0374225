pub mod config;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod model;
pub mod navigation;
pub mod parser;
pub mod session;
pub mod validation;

pub use config::ServiceConfig;
pub use error::{Error, Result};
pub use model::ArazzoDocument;
pub use navigation::{Indexer, OperationRecord, SymbolIndex};
pub use parser::Parser;
pub use session::LanguageSession;
pub use validation::{Finding, Severity, Validator};
