//! Database gateway: the process-wide connection cache.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing::{debug, instrument};

use curator_core::schema::SchemaRegistry;
use curator_core::Result;

use crate::config::StoreConfig;
use crate::engine::Database;

fn connections() -> &'static Mutex<HashMap<PathBuf, Arc<Database>>> {
    static CONNECTIONS: OnceLock<Mutex<HashMap<PathBuf, Arc<Database>>>> = OnceLock::new();
    CONNECTIONS.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Opens databases and caches their handles.
///
/// One handle is kept per database directory. It is reused for as long as
/// callers ask for the same registry version; a different version evicts
/// it and opens (and, if needed, upgrades) a new one.
pub struct Gateway;

impl Gateway {
    /// Return the cached handle for `config`, opening it if needed.
    ///
    /// An upgrade needs every other handle to the database closed,
    /// including ones previously returned here. Drop them first.
    #[instrument(skip(config, registry), fields(database = %config.database()))]
    pub async fn open(config: &StoreConfig, registry: &SchemaRegistry) -> Result<Arc<Database>> {
        let dir = config.database_dir();
        let mut cache = connections().lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(db) = cache.get(&dir) {
            if db.registry_version() == registry.version() {
                debug!("Reusing cached connection");
                return Ok(Arc::clone(db));
            }
            debug!(
                cached = db.registry_version(),
                requested = registry.version(),
                "Registry version changed, reopening"
            );
            cache.remove(&dir);
        }

        let db = Arc::new(Database::open(config, registry)?);
        cache.insert(dir, Arc::clone(&db));
        Ok(db)
    }

    /// Drop the cached handle for `config`. Returns whether one was cached.
    pub fn evict(config: &StoreConfig) -> bool {
        connections()
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&config.database_dir())
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    use curator_core::schema::{KeyPolicy, StoreSchema};
    use curator_core::CollectionName;

    fn registry(version: u32) -> SchemaRegistry {
        SchemaRegistry::new("db", version).with_store(StoreSchema::new(
            CollectionName::new("notes").unwrap(),
            "notes",
            KeyPolicy::Auto,
        ))
    }

    #[tokio::test]
    async fn same_version_reuses_handle() {
        let tmp = TempDir::new().unwrap();
        let config = StoreConfig::new(tmp.path(), "db");

        let a = Gateway::open(&config, &registry(1)).await.unwrap();
        let b = Gateway::open(&config, &registry(1)).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        drop((a, b));
        assert!(Gateway::evict(&config));
        assert!(!Gateway::evict(&config));
    }

    #[tokio::test]
    async fn version_bump_reopens() {
        let tmp = TempDir::new().unwrap();
        let config = StoreConfig::new(tmp.path(), "db");

        let v1 = Gateway::open(&config, &registry(1)).await.unwrap();
        assert_eq!(v1.version(), 1);
        drop(v1);

        let v2 = Gateway::open(&config, &registry(2)).await.unwrap();
        assert_eq!(v2.version(), 2);
        assert_eq!(v2.registry_version(), 2);
        Gateway::evict(&config);
    }
}
