//! Storage engine: bounded cache in front of a digest-keyed main table
//! and a logical-key index.
//!
//! **Read path**: cache first; on a miss, hash the key and read the main
//! table in a read-only transaction, then populate the cache.
//! **Write path**: cache first, then the main table (digest -> value), then
//! the index (key -> digest). In the split layout these are two separate
//! transactions; in the shared layout they commit together.
//! **Scan path**: prefix cursor over the index, each hit resolved through
//! the main table.

use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};
use redb::{Database, ReadableTable};
use tracing::{debug, info, warn};

use crate::cache::BoundedCache;
use crate::config::{Config, OrphanPolicy};
use crate::cursor::scan_prefix;
use crate::digest::Digest;
use crate::env::{Environments, Layout};
use crate::error::{render, StoreError, StoreResult};
use crate::tables::{INDEX_TABLE, MAIN_TABLE};

/// Content-addressed key-value engine.
///
/// All public methods take `&self`; the engine can be shared across threads
/// behind an `Arc`. The cache mutex is held across the persistent read in
/// `get` and the commit in `put`, so cache and store never disagree about
/// the latest committed value. Isolation between
/// operations is whatever redb provides: one writer per database at a time,
/// readers see a snapshot taken when their transaction began.
pub struct StorageEngine {
    /// Decoded values by logical key
    cache: Mutex<BoundedCache>,
    /// `None` once closed
    envs: RwLock<Option<Environments>>,
    store_path: PathBuf,
    index_path: PathBuf,
    config: Config,
}

impl StorageEngine {
    /// Open or create the engine over a main store and an index store.
    ///
    /// Equal paths select the shared layout.
    pub fn open<P, Q>(store_path: P, index_path: Q, config: Config) -> StoreResult<Self>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let store_path = store_path.as_ref();
        let index_path = index_path.as_ref();
        if store_path == index_path {
            return Self::open_shared(store_path, config);
        }
        config.validate().map_err(StoreError::InvalidConfig)?;

        let envs = Environments::open_split(store_path, index_path, config.max_tables)?;
        info!(
            store = %store_path.display(),
            index = %index_path.display(),
            cache_capacity = config.cache_capacity,
            "storage engine opened (split layout)"
        );
        Ok(Self::assemble(envs, config))
    }

    /// Open or create the engine with both tables in one database file.
    pub fn open_shared<P: AsRef<Path>>(path: P, config: Config) -> StoreResult<Self> {
        let path = path.as_ref();
        config.validate().map_err(StoreError::InvalidConfig)?;

        let envs = Environments::open_shared(path, config.max_tables)?;
        info!(
            path = %path.display(),
            cache_capacity = config.cache_capacity,
            "storage engine opened (shared layout)"
        );
        Ok(Self::assemble(envs, config))
    }

    fn assemble(envs: Environments, config: Config) -> Self {
        let (store_path, index_path) = envs.paths();
        let (store_path, index_path) = (store_path.to_path_buf(), index_path.to_path_buf());
        Self {
            cache: Mutex::new(BoundedCache::new(config.cache_capacity)),
            envs: RwLock::new(Some(envs)),
            store_path,
            index_path,
            config,
        }
    }

    /// Get the value stored under `key`.
    ///
    /// A cache hit never touches the persistent store.
    pub fn get(&self, key: impl AsRef<[u8]>) -> StoreResult<Vec<u8>> {
        let key = key.as_ref();
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }

        let envs = self.envs.read();
        let envs = envs.as_ref().ok_or(StoreError::Closed)?;

        // Held through the store read so a concurrent put can't be
        // overwritten by the stale value read here
        let mut cache = self.cache.lock();
        if let Some(value) = cache.get(key) {
            debug!(key = %render(key), "cache hit");
            return Ok(value.to_vec());
        }

        let digest = Digest::of(key);
        let value = read_main(envs.main(), &digest)?.ok_or_else(|| StoreError::not_found(key))?;
        debug!(key = %render(key), digest = %digest, "cache miss served from main table");

        cache.set(key, &value);
        Ok(value)
    }

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// The cache is updated before the persistent writes, so a failed write
    /// can leave a cached value that was never committed.
    pub fn put(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> StoreResult<()> {
        let (key, value) = (key.as_ref(), value.as_ref());
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        if value.is_empty() {
            return Err(StoreError::EmptyValue);
        }

        let envs = self.envs.read();
        let envs = envs.as_ref().ok_or(StoreError::Closed)?;

        // Held until the commit so cache and store agree on the last writer
        let mut cache = self.cache.lock();
        if let Some(evicted) = cache.set(key, value) {
            debug!(evicted = %render(&evicted), "cache eviction");
        }

        let digest = Digest::of(key);
        let written = match envs {
            Environments::Split { .. } => write_main(envs.main(), &digest, value)
                .and_then(|()| write_index(envs.index(), key, &digest)),
            Environments::Shared(env) => write_both(env.database(), key, &digest, value),
        };
        drop(cache);
        written.map_err(|e| StoreError::write(key, value, e))?;

        debug!(key = %render(key), digest = %digest, bytes = value.len(), "put committed");
        Ok(())
    }

    /// Collect every `(key, value)` whose key starts with `prefix`, in key
    /// order. An empty prefix returns everything.
    ///
    /// Index entries whose digest is missing from the main table are handled
    /// per [`OrphanPolicy`].
    pub fn iterate(&self, prefix: impl AsRef<[u8]>) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let prefix = prefix.as_ref();
        let envs = self.envs.read();
        let envs = envs.as_ref().ok_or(StoreError::Closed)?;

        let index_txn = envs.index().begin_read().map_err(StoreError::read)?;
        let index = index_txn.open_table(INDEX_TABLE).map_err(StoreError::read)?;

        // Shared layout reads both tables from one snapshot
        let main_txn = match envs.layout() {
            Layout::Split => Some(envs.main().begin_read().map_err(StoreError::read)?),
            Layout::Shared => None,
        };
        let main = main_txn
            .as_ref()
            .unwrap_or(&index_txn)
            .open_table(MAIN_TABLE)
            .map_err(StoreError::read)?;

        let mut results = Vec::new();
        let mut orphans = 0usize;
        scan_prefix(&index, prefix, |key, digest| {
            match main.get(digest).map_err(StoreError::read)? {
                Some(value) => results.push((key.to_vec(), value.value().to_vec())),
                None => match self.config.orphan_policy {
                    OrphanPolicy::Skip => {
                        warn!(key = %render(key), "index entry has no value, skipping");
                        orphans += 1;
                    }
                    OrphanPolicy::Fail => {
                        return Err(StoreError::DanglingIndex { key: render(key) });
                    }
                },
            }
            Ok(())
        })?;

        debug!(
            prefix = %render(prefix),
            matched = results.len(),
            skipped = orphans,
            "prefix scan complete"
        );
        Ok(results)
    }

    /// Clear the cache and close both environments.
    ///
    /// Every later operation, including another `close`, fails with
    /// `StoreError::Closed`.
    pub fn close(&self) -> StoreResult<()> {
        let mut envs = self.envs.write();
        let taken = envs.take().ok_or(StoreError::Closed)?;
        self.cache.lock().clear();
        drop(taken);
        info!(store = %self.store_path.display(), "storage engine closed");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.envs.read().is_none()
    }

    /// Number of entries resident in the cache.
    pub fn cache_len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Whether `key` is resident in the cache.
    pub fn is_cached(&self, key: impl AsRef<[u8]>) -> bool {
        self.cache.lock().contains(key.as_ref())
    }

    /// Drop every cached entry; the persistent store is untouched.
    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }

    pub fn layout(&self) -> Option<Layout> {
        self.envs.read().as_ref().map(Environments::layout)
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl std::fmt::Debug for StorageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageEngine")
            .field("store_path", &self.store_path)
            .field("index_path", &self.index_path)
            .field("layout", &self.layout())
            .field("cached", &self.cache_len())
            .finish()
    }
}

fn read_main(db: &Database, digest: &Digest) -> StoreResult<Option<Vec<u8>>> {
    let txn = db.begin_read().map_err(StoreError::read)?;
    let table = txn.open_table(MAIN_TABLE).map_err(StoreError::read)?;
    let value = table.get(digest.as_ref()).map_err(StoreError::read)?;
    Ok(value.map(|v| v.value().to_vec()))
}

fn write_main(db: &Database, digest: &Digest, value: &[u8]) -> Result<(), redb::Error> {
    let txn = db.begin_write()?;
    {
        let mut table = txn.open_table(MAIN_TABLE)?;
        table.insert(digest.as_ref(), value)?;
    }
    txn.commit()?;
    Ok(())
}

fn write_index(db: &Database, key: &[u8], digest: &Digest) -> Result<(), redb::Error> {
    let txn = db.begin_write()?;
    {
        let mut table = txn.open_table(INDEX_TABLE)?;
        table.insert(key, digest.as_ref())?;
    }
    txn.commit()?;
    Ok(())
}

fn write_both(
    db: &Database,
    key: &[u8],
    digest: &Digest,
    value: &[u8],
) -> Result<(), redb::Error> {
    let txn = db.begin_write()?;
    {
        let mut main = txn.open_table(MAIN_TABLE)?;
        main.insert(digest.as_ref(), value)?;
        let mut index = txn.open_table(INDEX_TABLE)?;
        index.insert(key, digest.as_ref())?;
    }
    txn.commit()?;
    Ok(())
}
