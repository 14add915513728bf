//! Last-Known-Good (LKG) cache for module outputs.
//!
//! Stores the most recent successful output of each module so a provider
//! outage degrades to data from earlier in the same day instead of empty
//! strings. Entries are day-scoped to the canonical timezone and a read
//! only succeeds when every requested key was saved today; stale entries
//! are never served.
//!
//! The backing store is a single redb file. A corrupt store degrades to
//! "no cache": it is deleted and recreated from empty rather than
//! aborting the run.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use redb::{Database, ReadableTable, TableDefinition};
use tracing::{debug, warn};

use crate::datetime::today_string;
use crate::error::CacheError;

/// Key: (module_name, field_key). Value: (value, saved_date).
const LKG: TableDefinition<(&str, &str), (&str, &str)> = TableDefinition::new("lkg");

/// Day-scoped key/value store of each module's most recent good output.
///
/// Safe for concurrent use from the fan-out worker threads: redb
/// serializes writers and gives readers a consistent snapshot.
pub struct LkgCache {
    db: Database,
    path: PathBuf,
}

impl LkgCache {
    /// Open the store at the default state-dir location.
    pub fn open_default() -> Result<Self, CacheError> {
        Self::open(&crate::paths::lkg_cache_path())
    }

    /// Open (or create) the store at `path`, recreating it from empty if
    /// the existing file is unreadable or corrupt.
    pub fn open(path: &Path) -> Result<Self, CacheError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| CacheError::Store(e.to_string()))?;
        }
        match Self::try_open(path) {
            Ok(db) => Ok(Self {
                db,
                path: path.to_path_buf(),
            }),
            Err(first) => {
                warn!(path = %path.display(), error = %first, "LKG cache corrupt, recreating");
                fs::remove_file(path).map_err(|e| CacheError::Store(e.to_string()))?;
                let db = Self::try_open(path)?;
                Ok(Self {
                    db,
                    path: path.to_path_buf(),
                })
            }
        }
    }

    fn try_open(path: &Path) -> Result<Database, CacheError> {
        let db = Database::create(path).map_err(|e| CacheError::Store(e.to_string()))?;
        // Ensure the table exists before any reads
        let wt = db
            .begin_write()
            .map_err(|e| CacheError::Store(e.to_string()))?;
        wt.open_table(LKG)
            .map_err(|e| CacheError::Store(e.to_string()))?;
        wt.commit().map_err(|e| CacheError::Store(e.to_string()))?;
        Ok(db)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Upsert every field under today's date. Overwrites any previous
    /// date for the same keys; no-op on an empty map.
    pub fn save(&self, module: &str, fields: &BTreeMap<String, String>) -> Result<(), CacheError> {
        self.save_as_of(module, fields, &today_string())
    }

    pub(crate) fn save_as_of(
        &self,
        module: &str,
        fields: &BTreeMap<String, String>,
        date: &str,
    ) -> Result<(), CacheError> {
        if fields.is_empty() {
            return Ok(());
        }
        let wt = self
            .db
            .begin_write()
            .map_err(|e| CacheError::Store(e.to_string()))?;
        {
            let mut table = wt
                .open_table(LKG)
                .map_err(|e| CacheError::Store(e.to_string()))?;
            for (key, value) in fields {
                table
                    .insert((module, key.as_str()), (value.as_str(), date))
                    .map_err(|e| CacheError::Store(e.to_string()))?;
            }
        }
        wt.commit().map_err(|e| CacheError::Store(e.to_string()))?;
        debug!(module, fields = fields.len(), "saved LKG data");
        Ok(())
    }

    /// Load today's data for a module.
    ///
    /// Returns the full map only if EVERY requested key exists and was
    /// saved today; otherwise returns `None`, never a partial map.
    pub fn load(
        &self,
        module: &str,
        keys: &[&str],
    ) -> Result<Option<BTreeMap<String, String>>, CacheError> {
        self.load_as_of(module, keys, &today_string())
    }

    pub(crate) fn load_as_of(
        &self,
        module: &str,
        keys: &[&str],
        date: &str,
    ) -> Result<Option<BTreeMap<String, String>>, CacheError> {
        let rt = self
            .db
            .begin_read()
            .map_err(|e| CacheError::Store(e.to_string()))?;
        let table = rt
            .open_table(LKG)
            .map_err(|e| CacheError::Store(e.to_string()))?;

        let mut results = BTreeMap::new();
        for key in keys {
            let row = table
                .get((module, *key))
                .map_err(|e| CacheError::Store(e.to_string()))?;
            match row {
                Some(guard) => {
                    let (value, saved_date) = guard.value();
                    if saved_date != date {
                        return Ok(None);
                    }
                    results.insert((*key).to_string(), value.to_string());
                }
                None => return Ok(None),
            }
        }
        Ok(Some(results))
    }

    /// Delete all entries for each named module. Used by `--force` to
    /// make date-seeded modules recompute instead of reusing today's pick.
    pub fn clear(&self, modules: &[&str]) -> Result<(), CacheError> {
        let wt = self
            .db
            .begin_write()
            .map_err(|e| CacheError::Store(e.to_string()))?;
        {
            let mut table = wt
                .open_table(LKG)
                .map_err(|e| CacheError::Store(e.to_string()))?;
            for module in modules {
                let doomed: Vec<(String, String)> = table
                    .iter()
                    .map_err(|e| CacheError::Store(e.to_string()))?
                    .filter_map(Result::ok)
                    .map(|(k, _)| {
                        let (m, f) = k.value();
                        (m.to_string(), f.to_string())
                    })
                    .filter(|(m, _)| m == module)
                    .collect();
                for (m, f) in doomed {
                    table
                        .remove((m.as_str(), f.as_str()))
                        .map_err(|e| CacheError::Store(e.to_string()))?;
                }
            }
        }
        wt.commit().map_err(|e| CacheError::Store(e.to_string()))?;
        Ok(())
    }
}

impl std::fmt::Debug for LkgCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LkgCache").field("path", &self.path).finish()
    }
}
