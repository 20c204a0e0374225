use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant, SystemTime};

use crate::error::Result;
use crate::navigation::types::ParsedOpenApiFile;
use crate::navigation::uri::{canonical_uri, uri_key, uri_to_path};

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

#[derive(Debug)]
struct CacheEntry {
    file: ParsedOpenApiFile,
    modified: SystemTime,
    cached_at: Instant,
    hits: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub total_hits: u64,
}

/// Parsed descriptions keyed by canonical uri, served while younger than the
/// TTL and the file's mtime is unchanged.
#[derive(Debug)]
pub struct FileCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl Default for FileCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

fn modified_at(path: &Path) -> std::io::Result<SystemTime> {
    std::fs::metadata(path)?.modified()
}

impl FileCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, uri: &str) -> Option<ParsedOpenApiFile> {
        let key = canonical_uri(uri).ok()?;
        // Stat before locking; a file we cannot stat is treated as changed.
        let live_modified = uri_to_path(&key)
            .ok()
            .and_then(|path| modified_at(&path).ok());

        let entries = self.read();
        let entry = entries.get(&key)?;
        if entry.cached_at.elapsed() > self.ttl {
            tracing::debug!(uri = %key, "cache entry expired");
            return None;
        }
        if live_modified != Some(entry.modified) {
            tracing::debug!(uri = %key, "cache entry stale: file modified since caching");
            return None;
        }

        entry.hits.fetch_add(1, Ordering::Relaxed);
        Some(entry.file.clone())
    }

    pub fn put(&self, uri: &str, file: ParsedOpenApiFile) -> Result<()> {
        let key = canonical_uri(uri)?;
        let modified = modified_at(&uri_to_path(&key)?)?;

        self.write().insert(
            key,
            CacheEntry {
                file,
                modified,
                cached_at: Instant::now(),
                hits: AtomicU64::new(0),
            },
        );
        Ok(())
    }

    pub fn invalidate(&self, uri: &str) {
        self.write().remove(&uri_key(uri));
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    // Changed-on-disk entries are left for `get` to skip.
    pub fn clean_expired(&self) -> usize {
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.cached_at.elapsed() <= self.ttl);
        before - entries.len()
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.read();
        CacheStats {
            entries: entries.len(),
            total_hits: entries
                .values()
                .map(|entry| entry.hits.load(Ordering::Relaxed))
                .sum(),
        }
    }

    pub fn hits(&self, uri: &str) -> Option<u64> {
        self.read()
            .get(&uri_key(uri))
            .map(|entry| entry.hits.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::{CacheStats, FileCache};
    use std::sync::Arc;
    use crate::navigation::types::ParsedOpenApiFile;
    use crate::navigation::uri::path_to_uri;
    use std::fs::File;
    use std::path::Path;
    use std::time::{Duration, SystemTime};

    fn write_spec(dir: &Path, name: &str) -> String {
        let path = dir.join(name);
        std::fs::write(&path, "openapi: 3.0.0\npaths: {}\n").expect("write spec");
        path_to_uri(&path).expect("absolute temp path")
    }

    #[test]
    fn put_then_get_is_a_hit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let uri = write_spec(dir.path(), "pets.yaml");
        let cache = FileCache::default();

        cache
            .put(&uri, ParsedOpenApiFile::empty(&uri))
            .expect("put succeeds");

        let cached = cache.get(&uri).expect("cache hit");
        assert_eq!(cached.uri, uri);
        assert_eq!(cache.hits(&uri), Some(1));
        assert_eq!(
            cache.stats(),
            CacheStats {
                entries: 1,
                total_hits: 1
            }
        );
    }

    #[test]
    fn expired_entry_is_a_miss_and_is_swept() {
        let dir = tempfile::tempdir().expect("tempdir");
        let uri = write_spec(dir.path(), "pets.yaml");
        let cache = FileCache::new(Duration::from_millis(20));

        cache
            .put(&uri, ParsedOpenApiFile::empty(&uri))
            .expect("put succeeds");
        std::thread::sleep(Duration::from_millis(60));

        assert!(cache.get(&uri).is_none());
        assert_eq!(cache.clean_expired(), 1);
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn modification_time_change_is_a_miss() {
        let dir = tempfile::tempdir().expect("tempdir");
        let uri = write_spec(dir.path(), "pets.yaml");
        let cache = FileCache::default();
        cache
            .put(&uri, ParsedOpenApiFile::empty(&uri))
            .expect("put succeeds");

        let file = File::options()
            .write(true)
            .open(dir.path().join("pets.yaml"))
            .expect("open spec");
        file.set_modified(SystemTime::now() + Duration::from_secs(30))
            .expect("set mtime");

        assert!(cache.get(&uri).is_none());
        // Stale but not expired: the sweep leaves it alone.
        assert_eq!(cache.clean_expired(), 0);
    }

    #[test]
    fn put_fails_for_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = path_to_uri(&dir.path().join("nope.yaml")).expect("absolute path");
        let cache = FileCache::default();

        assert!(cache.put(&missing, ParsedOpenApiFile::empty(&missing)).is_err());
        assert!(cache.put("not a uri", ParsedOpenApiFile::empty("x")).is_err());
    }

    #[test]
    fn equivalent_uri_spellings_share_an_entry() {
        let dir = tempfile::tempdir().expect("tempdir");
        let uri = write_spec(dir.path(), "pets.yaml");
        let localhost = uri.replacen("file://", "file://localhost", 1);
        let cache = FileCache::default();

        cache
            .put(&localhost, ParsedOpenApiFile::empty(&uri))
            .expect("put succeeds");
        assert!(cache.get(&uri).is_some());
        assert_eq!(cache.hits(&localhost), Some(1));

        cache.invalidate(&localhost);
        assert!(cache.get(&uri).is_none());
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn concurrent_readers_all_count_as_hits() {
        let dir = tempfile::tempdir().expect("tempdir");
        let uri = write_spec(dir.path(), "pets.yaml");
        let cache = Arc::new(FileCache::default());
        cache
            .put(&uri, ParsedOpenApiFile::empty(&uri))
            .expect("put succeeds");

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let cache = cache.clone();
                let uri = uri.clone();
                scope.spawn(move || {
                    for _ in 0..25 {
                        assert!(cache.get(&uri).is_some());
                    }
                });
            }
        });

        assert_eq!(cache.hits(&uri), Some(200));
    }

    #[test]
    fn invalidate_and_clear_remove_entries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let first = write_spec(dir.path(), "a.yaml");
        let second = write_spec(dir.path(), "b.yaml");
        let cache = FileCache::default();
        cache.put(&first, ParsedOpenApiFile::empty(&first)).expect("put");
        cache.put(&second, ParsedOpenApiFile::empty(&second)).expect("put");

        cache.invalidate(&first);
        assert!(cache.get(&first).is_none());
        assert!(cache.get(&second).is_some());

        cache.clear();
        assert_eq!(cache.stats().entries, 0);
    }
}
