//! The embedded database handle and its scoped transactions.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, instrument, warn};

use curator_core::error::{Error, StorageError};
use curator_core::schema::SchemaRegistry;
use curator_core::Result;

use crate::config::StoreConfig;
use crate::store::{Layout, Manifest, StoreData, StoreManifest, map_io, read_json};
use crate::upgrade;

/// An open database.
///
/// Holds a shared lock on `curator.lock` for as long as it lives, which
/// blocks upgrades from any other connection.
#[derive(Debug)]
pub struct Database {
    layout: Layout,
    manifest: Manifest,
    registry_version: u32,
    store_locks: HashMap<String, tokio::sync::Mutex<()>>,
    _lock: File,
}

impl Database {
    /// Open the database described by `config` at `registry`'s version,
    /// upgrading it first if needed.
    ///
    /// This always opens a new connection; see
    /// [`Gateway::open`](crate::Gateway::open) for the cached one.
    #[instrument(
        skip(config, registry),
        fields(database = %config.database(), version = registry.version())
    )]
    pub fn open(config: &StoreConfig, registry: &SchemaRegistry) -> Result<Self> {
        let layout = Layout::new(config.database_dir());
        fs::create_dir_all(layout.dir()).map_err(map_io)?;

        let lock = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(layout.lock_path())
            .map_err(map_io)?;

        let manifest = Self::read_manifest(&layout, config.database())?;
        let plan = upgrade::plan(&manifest, registry)?;

        let manifest = if plan.is_empty() {
            lock.try_lock_shared().map_err(|_| blocked(&layout))?;
            manifest
        } else {
            lock.try_lock_exclusive().map_err(|_| blocked(&layout))?;
            let upgraded = Self::upgrade_locked(&layout, config.database(), registry);
            // Hand back to a shared lock whatever the outcome.
            lock.unlock().map_err(map_io)?;
            let upgraded = upgraded?;
            lock.try_lock_shared().map_err(|_| blocked(&layout))?;
            upgraded
        };

        let store_locks = manifest
            .stores
            .keys()
            .map(|name| (name.clone(), tokio::sync::Mutex::new(())))
            .collect();

        debug!(
            path = %layout.dir().display(),
            version = manifest.version,
            stores = manifest.stores.len(),
            "Opened database"
        );

        Ok(Self {
            layout,
            manifest,
            registry_version: registry.version(),
            store_locks,
            _lock: lock,
        })
    }

    fn read_manifest(layout: &Layout, database: &str) -> Result<Manifest> {
        Ok(read_json(&layout.manifest_path())?.unwrap_or_else(|| Manifest::empty(database)))
    }

    // Re-plan under the exclusive lock: another connection may have
    // upgraded between the first read and acquiring the lock.
    fn upgrade_locked(
        layout: &Layout,
        database: &str,
        registry: &SchemaRegistry,
    ) -> Result<Manifest> {
        let manifest = Self::read_manifest(layout, database)?;
        let plan = upgrade::plan(&manifest, registry)?;
        if plan.is_empty() {
            return Ok(manifest);
        }
        upgrade::apply(layout, &manifest, &plan)
    }

    /// Directory holding this database.
    pub fn path(&self) -> &Path {
        self.layout.dir()
    }

    /// The manifest as of opening.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Engine version.
    pub fn version(&self) -> u32 {
        self.manifest.version
    }

    /// Registry version this handle was opened at.
    pub fn registry_version(&self) -> u32 {
        self.registry_version
    }

    pub fn has_store(&self, store: &str) -> bool {
        self.manifest.stores.contains_key(store)
    }

    fn store_entry(
        &self,
        store: &str,
    ) -> Result<(&StoreManifest, &tokio::sync::Mutex<()>, PathBuf)> {
        match (self.manifest.stores.get(store), self.store_locks.get(store)) {
            (Some(entry), Some(lock)) => Ok((entry, lock, self.layout.store_path(store))),
            _ => Err(Error::StorageUnavailable(StorageError::UnknownStore {
                store: store.to_string(),
            })),
        }
    }

    /// Run `op` against a snapshot of `store`.
    pub async fn run_read_transaction<T, F>(&self, store: &str, op: F) -> Result<T>
    where
        F: FnOnce(&StoreData) -> Result<T>,
    {
        let (_, lock, path) = self.store_entry(store)?;
        let _guard = lock.lock().await;
        let data = StoreData::load(&path)?;
        op(&data)
    }

    /// Run `op` against a working copy of `store` and commit it if `op`
    /// succeeds and every unique index still holds.
    ///
    /// Nothing is written when `op` fails or panics.
    pub async fn run_write_transaction<T, F>(&self, store: &str, op: F) -> Result<T>
    where
        F: FnOnce(&mut StoreData) -> Result<T>,
    {
        let (entry, lock, path) = self.store_entry(store)?;
        let _guard = lock.lock().await;
        let mut data = StoreData::load(&path)?;

        let output = op(&mut data)?;

        for index in entry.indexes.iter().filter(|i| i.unique) {
            if let Some(value) = data.first_duplicate(index) {
                return Err(Error::UniqueViolation {
                    store: store.to_string(),
                    index: index.name.clone(),
                    value: value.to_string(),
                });
            }
        }

        data.save(&path)?;
        debug!(store = %store, records = data.len(), "Committed transaction");
        Ok(output)
    }
}

fn blocked(layout: &Layout) -> Error {
    warn!(path = %layout.dir().display(), "Database is locked by another connection");
    Error::StorageUnavailable(StorageError::Blocked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use tempfile::TempDir;

    use curator_core::schema::{IndexSpec, KeyPolicy, StoreSchema};
    use curator_core::{CollectionName, ContentRecord, Payload, RecordKey};

    fn registry(version: u32) -> SchemaRegistry {
        SchemaRegistry::new("db", version).with_store(
            StoreSchema::new(CollectionName::new("issues").unwrap(), "issues", KeyPolicy::External)
                .with_index(IndexSpec::unique("by-issue", "fields.issueNumber")),
        )
    }

    fn issue(key: &str, number: i64) -> ContentRecord {
        let now = Utc::now();
        ContentRecord {
            key: RecordKey::external(key).unwrap(),
            position: Some(1),
            status: false,
            fields: Payload::new(json!({"issueNumber": number})).unwrap(),
            asset: None,
            created_at: now,
            updated_at: now,
            created_by: String::new(),
            edited_by: String::new(),
        }
    }

    #[tokio::test]
    async fn fresh_open_writes_manifest_and_stores() {
        let tmp = TempDir::new().unwrap();
        let config = StoreConfig::new(tmp.path(), "db");
        let db = Database::open(&config, &registry(1)).unwrap();

        assert_eq!(db.version(), 1);
        assert_eq!(db.manifest().schema_version, 1);
        assert!(db.has_store("issues"));
        assert!(tmp.path().join("db/stores/issues.json").exists());
        assert!(tmp.path().join("db/manifest.json").exists());
    }

    #[tokio::test]
    async fn failed_write_transaction_is_not_committed() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open(&StoreConfig::new(tmp.path(), "db"), &registry(1)).unwrap();

        let result: Result<()> = db
            .run_write_transaction("issues", |data| {
                data.put(issue("a", 1));
                Err(Error::not_found("issues", "b"))
            })
            .await;
        assert!(result.is_err());

        let count = db
            .run_read_transaction("issues", |data| Ok(data.len()))
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn unique_index_rejects_duplicates() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open(&StoreConfig::new(tmp.path(), "db"), &registry(1)).unwrap();

        db.run_write_transaction("issues", |data| {
            data.put(issue("a", 7));
            Ok(())
        })
        .await
        .unwrap();

        let err = db
            .run_write_transaction("issues", |data| {
                data.put(issue("b", 7));
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UniqueViolation { ref index, .. } if index == "by-issue"));
    }

    #[tokio::test]
    async fn unknown_store_is_storage_error() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open(&StoreConfig::new(tmp.path(), "db"), &registry(1)).unwrap();
        let err = db
            .run_read_transaction("nope", |_| Ok(()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::StorageUnavailable(StorageError::UnknownStore { .. })
        ));
    }

    #[tokio::test]
    async fn upgrade_is_blocked_by_open_connection() {
        let tmp = TempDir::new().unwrap();
        let config = StoreConfig::new(tmp.path(), "db");
        let _first = Database::open(&config, &registry(1)).unwrap();

        // Same version: shares the lock.
        let _second = Database::open(&config, &registry(1)).unwrap();

        let err = Database::open(&config, &registry(2)).unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable(StorageError::Blocked)));
    }

    #[tokio::test]
    async fn unique_index_over_duplicates_fails_upgrade() {
        let tmp = TempDir::new().unwrap();
        let config = StoreConfig::new(tmp.path(), "db");
        let plain = SchemaRegistry::new("db", 1).with_store(StoreSchema::new(
            CollectionName::new("issues").unwrap(),
            "issues",
            KeyPolicy::External,
        ));

        {
            let db = Database::open(&config, &plain).unwrap();
            db.run_write_transaction("issues", |data| {
                data.put(issue("a", 3));
                data.put(issue("b", 3));
                Ok(())
            })
            .await
            .unwrap();
        }

        let err = Database::open(&config, &registry(2)).unwrap_err();
        assert!(matches!(
            err,
            Error::StorageUnavailable(StorageError::SchemaConflict { .. })
        ));

        // The failed upgrade left the database at its old version.
        let db = Database::open(&config, &plain).unwrap();
        assert_eq!(db.manifest().schema_version, 1);
        assert_eq!(db.version(), 1);
    }
}
