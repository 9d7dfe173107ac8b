use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::synth::declaration::declares_interface;
use crate::types::{Address, CacheScope, Origin};
use crate::utils::atomic_write;

const INDEX_FILE: &str = "index.json";
const LOCK_FILE: &str = "index.lock";

/// Identity of a generated interface: name, bound address and chain
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey {
    pub name: String,
    pub address: Option<Address>,
    pub chain_id: u64,
}

impl CacheKey {
    pub fn new(name: impl Into<String>, address: Option<Address>, chain_id: u64) -> Self {
        Self {
            name: name.into(),
            address,
            chain_id,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.address {
            Some(address) => write!(f, "{}@{}#{}", self.name, address, self.chain_id),
            None => write!(f, "{}#{}", self.name, self.chain_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub source_text: String,
    pub abi_digest: String,
    pub origin: Origin,
    /// Unix seconds
    pub created_at: u64,
}

impl CacheEntry {
    pub fn new(key: CacheKey, source_text: String, abi_digest: String, origin: Origin) -> Self {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self {
            key,
            source_text,
            abi_digest,
            origin,
            created_at,
        }
    }
}

type CacheIndex = BTreeMap<String, CacheEntry>;

/// Advisory lock on a store directory, held across a read-modify-write of
/// its index so separate processes do not drop each other's entries.
struct IndexLock {
    file: File,
}

impl IndexLock {
    fn acquire(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| Error::CacheError(format!("open cache lock {}: {e}", path.display())))?;
        file.lock_exclusive()
            .map_err(|e| Error::CacheError(format!("acquire cache lock {}: {e}", path.display())))?;
        Ok(Self { file })
    }
}

impl Drop for IndexLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// One scope: a directory holding a single `index.json`
#[derive(Debug)]
struct CacheStore {
    scope: CacheScope,
    dir: PathBuf,
    lock: RwLock<()>,
}

impl CacheStore {
    fn new(scope: CacheScope, dir: PathBuf) -> Self {
        Self {
            scope,
            dir,
            lock: RwLock::new(()),
        }
    }

    fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    /// Unreadable or corrupt indexes read as empty
    fn read_index(&self) -> CacheIndex {
        let path = self.index_path();
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return CacheIndex::new(),
            Err(e) => {
                warn!("Ignoring unreadable {} cache {:?}: {}", self.scope, path, e);
                return CacheIndex::new();
            }
        };
        serde_json::from_str(&contents).unwrap_or_else(|e| {
            warn!("Ignoring corrupt {} cache {:?}: {}", self.scope, path, e);
            CacheIndex::new()
        })
    }

    fn write_index(&self, index: &CacheIndex) -> Result<()> {
        let contents = serde_json::to_string_pretty(index)
            .map_err(|e| Error::CacheError(format!("Failed to serialize cache index: {}", e)))?;
        atomic_write(&self.index_path(), contents.as_bytes())
    }

    fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let _guard = self.lock.read().unwrap_or_else(|p| p.into_inner());
        let entry = self.read_index().remove(&key.to_string())?;

        if entry.key != *key || !declares_interface(&entry.source_text, &key.name) {
            warn!("Ignoring invalid {} cache entry for {}", self.scope, key);
            return None;
        }
        Some(entry)
    }

    fn put(&self, entry: CacheEntry) -> Result<()> {
        let _guard = self.lock.write().unwrap_or_else(|p| p.into_inner());
        let _file_lock = IndexLock::acquire(&self.dir)?;
        let mut index = self.read_index();
        debug!("Caching {} in {} scope", entry.key, self.scope);
        index.insert(entry.key.to_string(), entry);
        self.write_index(&index)
    }

    fn list(&self) -> Vec<CacheEntry> {
        let _guard = self.lock.read().unwrap_or_else(|p| p.into_inner());
        let mut entries: Vec<CacheEntry> = self.read_index().into_values().collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        entries
    }

    fn clear(&self) -> Result<usize> {
        let _guard = self.lock.write().unwrap_or_else(|p| p.into_inner());
        let _file_lock = IndexLock::acquire(&self.dir)?;
        let count = self.read_index().len();
        match std::fs::remove_file(self.index_path()) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(count)
    }
}

/// Two-tier store of generated interfaces. Local entries shadow global ones.
#[derive(Debug, Default)]
pub struct InterfaceCache {
    local: Option<CacheStore>,
    global: Option<CacheStore>,
}

impl InterfaceCache {
    pub fn new(local_dir: Option<PathBuf>, global_dir: Option<PathBuf>) -> Self {
        Self {
            local: local_dir.map(|dir| CacheStore::new(CacheScope::Local, dir)),
            global: global_dir.map(|dir| CacheStore::new(CacheScope::Global, dir)),
        }
    }

    /// A cache that stores nothing
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn dir(&self, scope: CacheScope) -> Option<&Path> {
        self.store(scope).map(|s| s.dir.as_path())
    }

    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        [&self.local, &self.global]
            .into_iter()
            .flatten()
            .find_map(|store| store.get(key))
    }

    pub fn put(&self, scope: CacheScope, entry: CacheEntry) -> Result<()> {
        self.require(scope)?.put(entry)
    }

    pub fn list(&self, scope: CacheScope) -> Vec<CacheEntry> {
        self.store(scope).map(CacheStore::list).unwrap_or_default()
    }

    pub fn clear(&self, scope: CacheScope) -> Result<usize> {
        let count = self.require(scope)?.clear()?;
        debug!("Cleared {} entries from {} cache", count, scope);
        Ok(count)
    }

    fn store(&self, scope: CacheScope) -> Option<&CacheStore> {
        match scope {
            CacheScope::Local => self.local.as_ref(),
            CacheScope::Global => self.global.as_ref(),
        }
    }

    fn require(&self, scope: CacheScope) -> Result<&CacheStore> {
        self.store(scope)
            .ok_or_else(|| Error::CacheError(format!("no {scope} cache directory configured")))
    }
}
