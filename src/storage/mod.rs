//! Local key-value persistence
//!
//! The client keeps a small amount of state between runs: the bearer token and
//! the per-user chat sessions. [`KeyValueStore`] is the narrow string-keyed
//! interface the rest of the crate depends on; [`SledStore`] backs it with an
//! embedded `sled` database and [`MemoryStore`] keeps everything in memory.

use crate::error::{Result, VaaniError};
use directories::ProjectDirs;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub mod keys;

/// String key-value storage
///
/// Writes are expected to be durable once they return `Ok`. Callers that treat
/// persistence as best-effort log and drop the error themselves.
pub trait KeyValueStore: Send + Sync {
    /// Read a value
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or overwrite a value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

/// `sled`-backed store living in the user's data directory
pub struct SledStore {
    db: sled::Db,
    path: PathBuf,
}

impl SledStore {
    /// Open the store in the default application data directory
    ///
    /// # Errors
    ///
    /// Returns `VaaniError::Storage` if the data directory cannot be
    /// determined or created, or the database cannot be opened.
    pub fn open_default() -> Result<Self> {
        Self::open(default_storage_path()?)
    }

    /// Open (or create) the store at `path`
    ///
    /// # Examples
    ///
    /// ```
    /// use astravaani::storage::{KeyValueStore, SledStore};
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let store = SledStore::open(dir.path().join("store")).unwrap();
    /// store.set("token", "abc").unwrap();
    /// assert_eq!(store.get("token").unwrap().as_deref(), Some("abc"));
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                VaaniError::Storage(format!("Failed to create storage directory: {}", e))
            })?;
        }

        let db = sled::open(&path)
            .map_err(|e| VaaniError::Storage(format!("Failed to open database: {}", e)))?;

        tracing::debug!("Opened local store at {}", path.display());
        Ok(Self { db, path })
    }

    /// Location of the database on disk
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .db
            .get(key.as_bytes())
            .map_err(|e| VaaniError::Storage(format!("Get failed: {}", e)))?;

        match value {
            Some(bytes) => {
                let text = String::from_utf8(bytes.to_vec()).map_err(|e| {
                    VaaniError::Storage(format!("Value for {} is not UTF-8: {}", key, e))
                })?;
                Ok(Some(text))
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.db
            .insert(key.as_bytes(), value.as_bytes())
            .map_err(|e| VaaniError::Storage(format!("Insert failed: {}", e)))?;
        self.db
            .flush()
            .map_err(|e| VaaniError::Storage(format!("Flush failed: {}", e)))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.db
            .remove(key.as_bytes())
            .map_err(|e| VaaniError::Storage(format!("Remove failed: {}", e)))?;
        self.db
            .flush()
            .map_err(|e| VaaniError::Storage(format!("Flush failed: {}", e)))?;
        Ok(())
    }
}

/// In-memory store
///
/// Used by tests and as the fallback when the on-disk store cannot be opened.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether the store holds no keys
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| poisoned())?;
        entries.remove(key);
        Ok(())
    }
}

fn poisoned() -> VaaniError {
    VaaniError::Storage("Memory store lock poisoned".to_string())
}

/// Default database location: `$ASTRAVAANI_STORAGE_PATH` or the platform data dir
pub fn default_storage_path() -> Result<PathBuf> {
    if let Ok(override_path) = std::env::var("ASTRAVAANI_STORAGE_PATH") {
        return Ok(PathBuf::from(override_path));
    }

    let proj_dirs = ProjectDirs::from("com", "astravaani", "astravaani")
        .ok_or_else(|| VaaniError::Storage("Could not determine data directory".into()))?;

    Ok(proj_dirs.data_dir().join("store"))
}
