use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub operation_id: String,
    /// Upper-case HTTP method.
    pub method: String,
    pub path: String,
    pub summary: String,
    pub description: String,
    pub file_uri: String,
    pub file_name: String,
    /// Zero-based line of the `operationId` declaration, 0 when unknown.
    pub line: usize,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedOpenApiFile {
    pub uri: String,
    pub version: String,
    pub title: String,
    pub description: String,
    pub operations: Vec<OperationRecord>,
    pub parsed_at: DateTime<Utc>,
}

impl ParsedOpenApiFile {
    pub fn empty(uri: &str) -> Self {
        Self {
            uri: uri.to_owned(),
            version: String::new(),
            title: String::new(),
            description: String::new(),
            operations: Vec::new(),
            parsed_at: Utc::now(),
        }
    }
}

/// Outcome of one `build_index` pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexReport {
    pub discovered: usize,
    pub indexed: usize,
    pub failed: usize,
    pub operations: usize,
}
