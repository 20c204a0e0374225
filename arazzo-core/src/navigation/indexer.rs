use std::sync::Arc;

use crate::config::schema::DiscoveryConfig;
use crate::error::Result;
use crate::navigation::cache::FileCache;
use crate::navigation::discovery::discover;
use crate::navigation::index::SymbolIndex;
use crate::navigation::openapi::extract;
use crate::navigation::types::IndexReport;
use crate::navigation::uri::{canonical_uri, uri_key};

/// Feeds API descriptions found next to workflow documents into the shared
/// index, going through the cache so unchanged files are not re-read.
#[derive(Debug)]
pub struct Indexer {
    index: Arc<SymbolIndex>,
    cache: Arc<FileCache>,
    discovery: DiscoveryConfig,
}

impl Indexer {
    pub fn new(index: Arc<SymbolIndex>, cache: Arc<FileCache>, discovery: DiscoveryConfig) -> Self {
        Self {
            index,
            cache,
            discovery,
        }
    }

    pub fn index(&self) -> &Arc<SymbolIndex> {
        &self.index
    }

    // A file that fails is counted and skipped; only an invalid workflow uri
    // fails the whole build.
    pub fn build_index(&self, workflow_uri: &str) -> Result<IndexReport> {
        let candidates = discover(workflow_uri, &self.discovery)?;
        let mut report = IndexReport {
            discovered: candidates.len(),
            ..IndexReport::default()
        };

        if candidates.is_empty() {
            tracing::info!(uri = workflow_uri, "no api descriptions found near workflow");
            return Ok(report);
        }

        for uri in &candidates {
            match self.index_file(uri) {
                Ok(added) => {
                    report.indexed += 1;
                    report.operations += added;
                }
                Err(err) => {
                    report.failed += 1;
                    tracing::warn!(uri = %uri, "failed to index api description: {err}");
                }
            }
        }

        tracing::info!(
            uri = workflow_uri,
            discovered = report.discovered,
            indexed = report.indexed,
            failed = report.failed,
            operations = report.operations,
            total = self.index.count(),
            "index build finished"
        );
        Ok(report)
    }

    /// Returns how many operations the file contributed. Ids already owned by
    /// another file are dropped.
    pub fn index_file(&self, uri: &str) -> Result<usize> {
        let canonical = canonical_uri(uri)?;
        let uri = canonical.as_str();
        let file = match self.cache.get(uri) {
            Some(file) => {
                tracing::debug!(uri, "using cached api description");
                file
            }
            None => {
                let extraction = extract(uri)?;
                if let Some(warning) = &extraction.warning {
                    tracing::warn!(uri, "{warning}");
                }
                if let Err(err) = self.cache.put(uri, extraction.file.clone()) {
                    tracing::debug!(uri, "not caching api description: {err}");
                }
                extraction.file
            }
        };

        // Drop what this file registered before so a re-run sees fresh lines.
        self.index.remove_file(uri);

        let mut added = 0;
        for record in &file.operations {
            if self.index.add_operation(record.clone()) {
                added += 1;
            } else {
                tracing::debug!(
                    uri,
                    operation_id = %record.operation_id,
                    "duplicate operation id, keeping first registration"
                );
            }
        }
        self.index.add_file(file);
        Ok(added)
    }

    pub fn reindex_file(&self, uri: &str) -> Result<usize> {
        self.invalidate_file(uri);
        self.index_file(uri)
    }

    pub fn invalidate_file(&self, uri: &str) {
        let key = uri_key(uri);
        self.cache.invalidate(&key);
        self.index.remove_file(&key);
        tracing::debug!(uri = %key, "api description invalidated");
    }
}
