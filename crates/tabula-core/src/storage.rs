//! Key-value persistence for table configurations.
//!
//! Tables persist their [`UserConfig`](crate::user_config::UserConfig) as a
//! JSON string under their table identifier. The store itself is an external
//! collaborator consumed through [`ConfigStorage`]; two backends ship here:
//!
//! - [`MemoryStorage`]: process-local, used by tests and embedders
//! - [`FileStorage`]: a single JSON map on disk
//!
//! ## File Format
//!
//! ```text
//! {
//!   "<table identifier>": "<serialized user configuration>",
//!   ...
//! }
//! ```
//!
//! Writes are atomic (write to temp, then rename) and the previous file is
//! kept as a `.bak`. Writes are last-write-wins per key.

use crate::error::{Result, TabulaError};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File name of the on-disk store
pub const STORAGE_FILE: &str = "tables.json";

/// A keyed string store.
///
/// Keys are compared exactly (case-sensitive).
pub trait ConfigStorage: Send + Sync {
    /// Fetch the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete the value under `key`, if any
    fn remove(&self, key: &str) -> Result<()>;

    /// Delete everything
    fn clear(&self) -> Result<()>;

    /// List stored keys
    fn keys(&self) -> Result<Vec<String>>;
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl ConfigStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.entries.write().clear();
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.read().keys().cloned().collect())
    }
}

/// Store backed by a JSON file in a directory.
///
/// The file is read once on open and mirrored in memory; every mutation
/// rewrites the file.
///
/// ## Example
///
/// ```rust,ignore
/// use tabula_core::{ConfigStorage, FileStorage};
///
/// let storage = FileStorage::open("./data")?;
/// storage.set("hosts", r#"{"limit":25}"#)?;
/// assert!(storage.get("hosts")?.is_some());
/// ```
#[derive(Debug)]
pub struct FileStorage {
    /// Base directory for the store file
    base_dir: PathBuf,

    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open (or lazily create) the store in `base_dir`.
    ///
    /// A corrupted store file is logged and treated as empty; it is replaced
    /// on the next write.
    pub fn open(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let path = base_dir.join(STORAGE_FILE);

        let entries = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            match serde_json::from_str::<BTreeMap<String, String>>(&contents) {
                Ok(entries) => {
                    info!(path = %path.display(), tables = entries.len(), "Loaded table storage");
                    entries
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Table storage is corrupted, starting fresh");
                    BTreeMap::new()
                }
            }
        } else {
            debug!(path = %path.display(), "Table storage not found, starting empty");
            BTreeMap::new()
        };

        Ok(FileStorage {
            base_dir,
            entries: RwLock::new(entries),
        })
    }

    /// Get the path to the store file.
    pub fn storage_path(&self) -> PathBuf {
        self.base_dir.join(STORAGE_FILE)
    }

    fn backup_path(&self) -> PathBuf {
        self.base_dir.join(format!("{}.bak", STORAGE_FILE))
    }

    fn temp_path(&self) -> PathBuf {
        self.base_dir.join(format!("{}.tmp", STORAGE_FILE))
    }

    /// Check if the store file exists.
    pub fn exists(&self) -> bool {
        self.storage_path().exists()
    }

    /// Write the given entries to disk atomically.
    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        fs::create_dir_all(&self.base_dir)?;

        let temp_path = self.temp_path();
        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, entries)?;
            writer.flush()?;
        }

        let storage_path = self.storage_path();
        let backup_path = self.backup_path();
        if storage_path.exists() {
            let _ = fs::remove_file(&backup_path);
            let _ = fs::rename(&storage_path, &backup_path);
        }

        fs::rename(&temp_path, &storage_path).map_err(|e| {
            TabulaError::storage("rename", format!("{}: {}", storage_path.display(), e))
        })?;

        debug!(path = %storage_path.display(), tables = entries.len(), "Table storage written");
        Ok(())
    }
}

impl ConfigStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write();
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write();
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.entries.write().clear();

        for path in [self.storage_path(), self.backup_path()] {
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.read().keys().cloned().collect())
    }
}
