//! Per-table user configuration.
//!
//! A [`UserConfig`] captures everything a user changes about a table's
//! presentation: sort definition, column visibility, search text and page
//! limit. The [`ConfigStore`] persists it under the table identifier after
//! every change and restores it when the table initializes.
//!
//! ## Snapshot Format
//!
//! ```json
//! {
//!   "sorts": [{ "prop": "a", "dir": "asc" }],
//!   "columns": [{ "prop": "a", "isHidden": false }],
//!   "search": "",
//!   "limit": 10
//! }
//! ```

use crate::error::{Result, TabulaError};
use crate::sort::SortDefinition;
use crate::storage::ConfigStorage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Visibility state of one column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnState {
    pub prop: String,
    pub is_hidden: bool,
}

/// The persisted display configuration of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    /// Active sort definition
    pub sorts: SortDefinition,

    /// Visibility per declared column, in declaration order
    pub columns: Vec<ColumnState>,

    /// Current search text
    pub search: String,

    /// Page size, always at least 1
    pub limit: usize,
}

/// A stored snapshot, every field optional so it can be merged over defaults.
#[derive(Debug, Default, Deserialize)]
struct StoredUserConfig {
    sorts: Option<SortDefinition>,
    columns: Option<Vec<ColumnState>>,
    search: Option<String>,
    limit: Option<usize>,
}

impl UserConfig {
    /// Serialize to the snapshot format
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize a complete snapshot
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Overlay the fields present in a stored snapshot onto `self`.
    ///
    /// Column states are matched by prop; props unknown to `self` are ignored.
    fn merge(&mut self, stored: StoredUserConfig) {
        if let Some(sorts) = stored.sorts {
            self.sorts = sorts;
        }
        if let Some(columns) = stored.columns {
            for state in &mut self.columns {
                if let Some(saved) = columns.iter().find(|c| c.prop == state.prop) {
                    state.is_hidden = saved.is_hidden;
                }
            }
        }
        if let Some(search) = stored.search {
            self.search = search;
        }
        if let Some(limit) = stored.limit {
            self.limit = limit.max(1);
        }
    }

    /// Whether the column with `prop` is hidden
    pub fn is_hidden(&self, prop: &str) -> bool {
        self.columns
            .iter()
            .any(|c| c.prop == prop && c.is_hidden)
    }
}

/// Persists one table's [`UserConfig`] in a shared [`ConfigStorage`].
#[derive(Clone)]
pub struct ConfigStore {
    storage: Arc<dyn ConfigStorage>,
    key: String,
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore").field("key", &self.key).finish()
    }
}

impl ConfigStore {
    /// Create a store for the table identified by `key`
    pub fn new(storage: Arc<dyn ConfigStorage>, key: impl Into<String>) -> Self {
        ConfigStore {
            storage,
            key: key.into(),
        }
    }

    /// The storage key (table identifier)
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the raw stored snapshot, if any
    pub fn snapshot(&self) -> Result<Option<String>> {
        self.storage.get(&self.key)
    }

    /// Load the stored snapshot merged over `defaults`.
    ///
    /// Returns `Ok(None)` when nothing is stored and an error when the
    /// stored snapshot cannot be decoded.
    pub fn load(&self, defaults: &UserConfig) -> Result<Option<UserConfig>> {
        let Some(json) = self.storage.get(&self.key)? else {
            return Ok(None);
        };

        let stored: StoredUserConfig =
            serde_json::from_str(&json).map_err(|e| TabulaError::SnapshotCorrupted {
                key: self.key.clone(),
                reason: e.to_string(),
            })?;

        let mut config = defaults.clone();
        config.merge(stored);
        Ok(Some(config))
    }

    /// Restore the configuration, falling back to `defaults`.
    ///
    /// When nothing usable is stored, the defaults are persisted immediately.
    pub fn restore(&self, defaults: UserConfig) -> Result<UserConfig> {
        match self.load(&defaults) {
            Ok(Some(config)) => {
                debug!(table = %self.key, "Restored user configuration");
                Ok(config)
            }
            Ok(None) => {
                debug!(table = %self.key, "No stored user configuration, using defaults");
                self.persist(&defaults)?;
                Ok(defaults)
            }
            Err(e) if !e.is_recoverable() => {
                warn!(table = %self.key, error = %e, "Discarding stored user configuration");
                self.persist(&defaults)?;
                Ok(defaults)
            }
            Err(e) => Err(e),
        }
    }

    /// Write the configuration under the table key
    pub fn persist(&self, config: &UserConfig) -> Result<()> {
        self.storage.set(&self.key, &config.to_json()?)
    }

    /// Forget the stored configuration
    pub fn remove(&self) -> Result<()> {
        self.storage.remove(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sort::create_sorting_definition;
    use crate::storage::MemoryStorage;

    fn defaults() -> UserConfig {
        UserConfig {
            sorts: create_sorting_definition("a"),
            columns: vec![
                ColumnState {
                    prop: "a".to_string(),
                    is_hidden: false,
                },
                ColumnState {
                    prop: "b".to_string(),
                    is_hidden: false,
                },
            ],
            search: String::new(),
            limit: 10,
        }
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = defaults();
        config.search = "index:5".to_string();
        config.columns[1].is_hidden = true;

        let json = config.to_json().unwrap();
        assert_eq!(UserConfig::from_json(&json).unwrap(), config);
        assert!(json.contains(r#""isHidden":true"#));
    }

    #[test]
    fn test_restore_persists_defaults() {
        let storage = Arc::new(MemoryStorage::new());
        let store = ConfigStore::new(storage.clone(), "a");

        let config = store.restore(defaults()).unwrap();
        assert_eq!(config, defaults());
        assert_eq!(
            storage.get("a").unwrap(),
            Some(defaults().to_json().unwrap())
        );
    }

    #[test]
    fn test_restore_merges_partial_snapshot() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set(
                "a",
                r#"{"limit":25,"columns":[{"prop":"b","isHidden":true},{"prop":"zz","isHidden":true}]}"#,
            )
            .unwrap();
        let store = ConfigStore::new(storage, "a");

        let config = store.restore(defaults()).unwrap();
        assert_eq!(config.limit, 25);
        assert_eq!(config.sorts, create_sorting_definition("a"));
        assert!(config.is_hidden("b"));
        assert!(!config.is_hidden("a"));
        assert_eq!(config.columns.len(), 2);
    }

    #[test]
    fn test_restore_clamps_stored_limit() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set("a", r#"{"limit":0}"#).unwrap();
        let store = ConfigStore::new(storage, "a");

        assert_eq!(store.restore(defaults()).unwrap().limit, 1);
    }

    #[test]
    fn test_corrupted_snapshot_replaced_by_defaults() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set("a", "{broken").unwrap();
        let store = ConfigStore::new(storage.clone(), "a");

        assert!(matches!(
            store.load(&defaults()),
            Err(TabulaError::SnapshotCorrupted { .. })
        ));
        assert_eq!(store.restore(defaults()).unwrap(), defaults());
        assert_eq!(
            storage.get("a").unwrap(),
            Some(defaults().to_json().unwrap())
        );
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let storage = Arc::new(MemoryStorage::new());
        let lower = ConfigStore::new(storage.clone(), "hosts");
        let upper = ConfigStore::new(storage, "Hosts");

        let mut config = defaults();
        config.limit = 3;
        lower.persist(&config).unwrap();

        assert!(upper.snapshot().unwrap().is_none());
        lower.remove().unwrap();
        assert!(lower.snapshot().unwrap().is_none());
    }
}
