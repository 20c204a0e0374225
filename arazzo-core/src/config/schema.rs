use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServiceConfig {
    pub log_level: String,
    pub cache: CacheConfig,
    pub discovery: DiscoveryConfig,
    pub diagnostics: DiagnosticsConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            cache: CacheConfig::default(),
            discovery: DiscoveryConfig::default(),
            diagnostics: DiagnosticsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_seconds: 300 }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

/// Where to look for API descriptions next to a workflow document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub max_depth: usize,
    /// Directory names never descended into. Hidden directories are always skipped.
    pub excluded_dirs: Vec<String>,
    pub extensions: Vec<String>,
    pub marker_bytes: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            excluded_dirs: [
                "node_modules",
                "target",
                "dist",
                "build",
                "vendor",
                "out",
                "__pycache__",
            ]
            .into_iter()
            .map(str::to_owned)
            .collect(),
            extensions: ["yaml", "yml", "json"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            marker_bytes: 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Findings carry no end position; ranges are widened to this column.
    pub end_column: u32,
    pub source: String,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            end_column: 100,
            source: "arazzo-lsp".to_owned(),
        }
    }
}
