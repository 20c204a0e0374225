pub mod document;
pub mod expressions;
pub mod workflows;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::model::ArazzoDocument;
use crate::navigation::SymbolIndex;

pub use expressions::{scan_runtime_expressions, ExpressionPrefix, RuntimeExpression};

pub const SUPPORTED_VERSIONS: [&str; 2] = ["1.0.0", "1.0.1"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub line: usize,
    pub column: usize,
    pub message: String,
    pub severity: Severity,
}

impl Finding {
    pub fn error(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column: 0,
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn warning(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column: 0,
            message: message.into(),
            severity: Severity::Warning,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

#[derive(Debug, Clone, Default)]
pub struct Validator {
    index: Option<Arc<SymbolIndex>>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables the operation resolution check against `index`.
    pub fn with_index(index: Arc<SymbolIndex>) -> Self {
        Self { index: Some(index) }
    }

    pub fn validate(&self, document: &ArazzoDocument) -> Vec<Finding> {
        let mut findings = Vec::new();
        document::check_document(document, &mut findings);
        document::check_source_descriptions(document, &mut findings);
        workflows::check_workflows(document, self.index.as_deref(), &mut findings);
        findings
    }
}
