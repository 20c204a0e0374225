use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::navigation::types::{OperationRecord, ParsedOpenApiFile};
use crate::navigation::uri::uri_key;

#[derive(Debug, Default)]
struct IndexState {
    operations: HashMap<String, OperationRecord>,
    files: HashMap<String, ParsedOpenApiFile>,
}

/// Operation id -> record, plus the files the records came from, keyed by
/// canonical uri. Both maps sit behind one lock.
#[derive(Debug, Default)]
pub struct SymbolIndex {
    state: RwLock<IndexState>,
}

impl SymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, IndexState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_operation(&self, record: OperationRecord) -> bool {
        let mut state = self.write();
        if state.operations.contains_key(&record.operation_id) {
            return false;
        }
        state
            .operations
            .insert(record.operation_id.clone(), record);
        true
    }

    pub fn add_file(&self, file: ParsedOpenApiFile) {
        self.write().files.insert(uri_key(&file.uri), file);
    }

    pub fn lookup(&self, operation_id: &str) -> Option<OperationRecord> {
        self.read().operations.get(operation_id).cloned()
    }

    pub fn remove_file(&self, file_uri: &str) {
        let key = uri_key(file_uri);
        let mut state = self.write();
        state.files.remove(&key);
        state
            .operations
            .retain(|_, record| record.file_uri != key && record.file_uri != file_uri);
    }

    pub fn list_all(&self) -> Vec<OperationRecord> {
        let mut records = self
            .read()
            .operations
            .values()
            .cloned()
            .collect::<Vec<_>>();
        records.sort_by(|left, right| left.operation_id.cmp(&right.operation_id));
        records
    }

    pub fn count(&self) -> usize {
        self.read().operations.len()
    }

    pub fn file_count(&self) -> usize {
        self.read().files.len()
    }

    pub fn contains_file(&self, file_uri: &str) -> bool {
        self.read().files.contains_key(&uri_key(file_uri))
    }

    pub fn file(&self, file_uri: &str) -> Option<ParsedOpenApiFile> {
        self.read().files.get(&uri_key(file_uri)).cloned()
    }

    pub fn clear(&self) {
        let mut state = self.write();
        state.operations.clear();
        state.files.clear();
    }
}
