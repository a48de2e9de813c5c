//! Storage backend contract and implementations
//!
//! The state-transition core only needs a byte-string key-value store with
//! ordered prefix scans. `RocksBackend` is the production implementation;
//! `MemoryBackend` backs tests and speculative block validation. Backend
//! failures surface as `CoreError::StorageUnavailable` and are not retried
//! here.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use atlas_common::prelude::{CoreError, CoreResult};
use rocksdb::{Direction, IteratorMode, Options, WriteBatch, DB};

/// Ordered scan direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDirection {
    Ascending,
    Descending,
}

/// Storage collaborator contract required by the persistence context
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Point lookup; `None` when the key is absent
    async fn get(&self, key: &[u8]) -> CoreResult<Option<Vec<u8>>>;

    /// Upsert a key-value pair
    async fn set(&self, key: &[u8], value: &[u8]) -> CoreResult<()>;

    /// Remove a key; absent keys are not an error
    async fn delete(&self, key: &[u8]) -> CoreResult<()>;

    /// Check key presence
    async fn exists(&self, key: &[u8]) -> CoreResult<bool>;

    /// Ordered scan of every pair whose key starts with `prefix`
    async fn scan_prefix(
        &self,
        prefix: &[u8],
        direction: ScanDirection,
    ) -> CoreResult<Vec<(Vec<u8>, Vec<u8>)>>;

    /// Remove every key. Test/reset use only.
    async fn clear_all(&self) -> CoreResult<()>;

    /// Release the backend (pooled-connection lifecycle)
    async fn stop(&self) -> CoreResult<()>;
}

/// RocksDB-backed storage
pub struct RocksBackend {
    db: Arc<DB>,
}

impl RocksBackend {
    /// Open (or create) a database at `path`
    pub fn open(path: &str) -> CoreResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_max_open_files(1000);
        opts.set_use_fsync(false);
        opts.set_bytes_per_sync(8388608);
        opts.set_max_write_buffer_number(32);
        opts.set_write_buffer_size(536870912);
        opts.set_target_file_size_base(1073741824);
        opts.set_min_write_buffer_number_to_merge(4);
        opts.set_compaction_style(rocksdb::DBCompactionStyle::Universal);

        let db = DB::open(&opts, path)
            .map_err(|e| CoreError::storage(format!("failed to open database: {e}")))?;

        Ok(Self { db: Arc::new(db) })
    }
}

#[async_trait]
impl StorageBackend for RocksBackend {
    async fn get(&self, key: &[u8]) -> CoreResult<Option<Vec<u8>>> {
        self.db
            .get(key)
            .map_err(|e| CoreError::storage(e.to_string()))
    }

    async fn set(&self, key: &[u8], value: &[u8]) -> CoreResult<()> {
        self.db
            .put(key, value)
            .map_err(|e| CoreError::storage(e.to_string()))
    }

    async fn delete(&self, key: &[u8]) -> CoreResult<()> {
        self.db
            .delete(key)
            .map_err(|e| CoreError::storage(e.to_string()))
    }

    async fn exists(&self, key: &[u8]) -> CoreResult<bool> {
        Ok(self.get(key).await?.is_some())
    }

    async fn scan_prefix(
        &self,
        prefix: &[u8],
        direction: ScanDirection,
    ) -> CoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let mode = if prefix.is_empty() {
            IteratorMode::Start
        } else {
            IteratorMode::From(prefix, Direction::Forward)
        };

        let mut pairs = Vec::new();
        for item in self.db.iterator(mode) {
            let (key, value) = item.map_err(|e| CoreError::storage(e.to_string()))?;
            if !key.starts_with(prefix) {
                break;
            }
            pairs.push((key.to_vec(), value.to_vec()));
        }

        if direction == ScanDirection::Descending {
            pairs.reverse();
        }
        Ok(pairs)
    }

    async fn clear_all(&self) -> CoreResult<()> {
        let keys: Vec<Vec<u8>> = self
            .scan_prefix(&[], ScanDirection::Ascending)
            .await?
            .into_iter()
            .map(|(k, _)| k)
            .collect();

        let mut batch = WriteBatch::default();
        for key in keys {
            batch.delete(&key);
        }
        self.db
            .write(batch)
            .map_err(|e| CoreError::storage(e.to_string()))
    }

    async fn stop(&self) -> CoreResult<()> {
        self.db
            .flush()
            .map_err(|e| CoreError::storage(e.to_string()))
    }
}

/// In-memory storage for tests and speculative validation.
/// Each instance is an isolated keyspace, which gives the snapshot
/// isolation the context contract requires across unit-of-work instances.
#[derive(Default)]
pub struct MemoryBackend {
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_entries(&self) -> CoreResult<std::sync::RwLockReadGuard<'_, BTreeMap<Vec<u8>, Vec<u8>>>> {
        self.entries
            .read()
            .map_err(|_| CoreError::storage("lock poisoned"))
    }

    fn write_entries(
        &self,
    ) -> CoreResult<std::sync::RwLockWriteGuard<'_, BTreeMap<Vec<u8>, Vec<u8>>>> {
        self.entries
            .write()
            .map_err(|_| CoreError::storage("lock poisoned"))
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, key: &[u8]) -> CoreResult<Option<Vec<u8>>> {
        Ok(self.read_entries()?.get(key).cloned())
    }

    async fn set(&self, key: &[u8], value: &[u8]) -> CoreResult<()> {
        self.write_entries()?.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &[u8]) -> CoreResult<()> {
        self.write_entries()?.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &[u8]) -> CoreResult<bool> {
        Ok(self.read_entries()?.contains_key(key))
    }

    async fn scan_prefix(
        &self,
        prefix: &[u8],
        direction: ScanDirection,
    ) -> CoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let entries = self.read_entries()?;
        let mut pairs: Vec<(Vec<u8>, Vec<u8>)> = entries
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        if direction == ScanDirection::Descending {
            pairs.reverse();
        }
        Ok(pairs)
    }

    async fn clear_all(&self) -> CoreResult<()> {
        self.write_entries()?.clear();
        Ok(())
    }

    async fn stop(&self) -> CoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn exercise_backend(backend: &dyn StorageBackend) {
        backend.set(b"a/one", b"1").await.unwrap();
        backend.set(b"a/two", b"2").await.unwrap();
        backend.set(b"p/fee", b"10000").await.unwrap();

        assert_eq!(backend.get(b"a/one").await.unwrap(), Some(b"1".to_vec()));
        assert_eq!(backend.get(b"a/missing").await.unwrap(), None);
        assert!(backend.exists(b"p/fee").await.unwrap());

        let ascending = backend
            .scan_prefix(b"a/", ScanDirection::Ascending)
            .await
            .unwrap();
        assert_eq!(ascending.len(), 2);
        assert_eq!(ascending[0].0, b"a/one".to_vec());

        let descending = backend
            .scan_prefix(b"a/", ScanDirection::Descending)
            .await
            .unwrap();
        assert_eq!(descending[0].0, b"a/two".to_vec());

        backend.delete(b"a/one").await.unwrap();
        assert!(!backend.exists(b"a/one").await.unwrap());

        backend.clear_all().await.unwrap();
        assert_eq!(
            backend
                .scan_prefix(&[], ScanDirection::Ascending)
                .await
                .unwrap()
                .len(),
            0
        );
        backend.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_backend_contract() {
        let backend = MemoryBackend::new();
        exercise_backend(&backend).await;
    }

    #[tokio::test]
    async fn test_rocks_backend_contract() {
        let dir = tempdir().unwrap();
        let backend = RocksBackend::open(dir.path().join("db").to_str().unwrap()).unwrap();
        exercise_backend(&backend).await;
    }

    #[tokio::test]
    async fn test_memory_backends_are_isolated() {
        let one = MemoryBackend::new();
        let two = MemoryBackend::new();
        one.set(b"k", b"v").await.unwrap();
        assert_eq!(two.get(b"k").await.unwrap(), None);
    }
}
