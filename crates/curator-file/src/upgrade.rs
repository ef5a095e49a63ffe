//! Additive schema upgrades.
//!
//! An upgrade is planned by diffing the registry against the manifest, then
//! applied under the exclusive lock. New store files are written first and
//! the manifest last; stores replaced by a new declaration are removed only
//! after the manifest is committed.

use std::fs;

use tracing::{debug, info};

use curator_core::error::{Error, StorageError};
use curator_core::schema::{IndexSpec, SchemaRegistry};
use curator_core::Result;

use crate::store::{Layout, Manifest, StoreData, StoreManifest, map_io};

#[derive(Debug, Default, PartialEq)]
pub(crate) struct UpgradePlan {
    pub create: Vec<(String, StoreManifest)>,
    pub add_indexes: Vec<(String, IndexSpec)>,
    pub drop: Vec<String>,
    pub schema_version: u32,
    bump_version: bool,
}

impl UpgradePlan {
    pub fn is_empty(&self) -> bool {
        !self.bump_version
            && self.create.is_empty()
            && self.add_indexes.is_empty()
            && self.drop.is_empty()
    }
}

fn conflict(store: &str, reason: String) -> Error {
    Error::StorageUnavailable(StorageError::SchemaConflict {
        store: store.to_string(),
        reason,
    })
}

/// Work out what `registry` needs that `manifest` lacks.
pub(crate) fn plan(manifest: &Manifest, registry: &SchemaRegistry) -> Result<UpgradePlan> {
    if registry.version() < manifest.schema_version {
        return Err(Error::StorageUnavailable(StorageError::Downgrade {
            found: manifest.schema_version,
            requested: registry.version(),
        }));
    }

    let mut plan = UpgradePlan {
        schema_version: registry.version(),
        bump_version: manifest.version == 0 || registry.version() > manifest.schema_version,
        ..UpgradePlan::default()
    };

    for schema in registry.stores() {
        let name = &schema.store_name;
        match manifest.stores.get(name) {
            Some(existing) => {
                if existing.key_policy != schema.key_policy {
                    return Err(conflict(
                        name,
                        format!(
                            "stored key policy is {}, registry declares {}",
                            existing.key_policy, schema.key_policy
                        ),
                    ));
                }
                for index in &schema.indexes {
                    match existing.index(&index.name) {
                        None => plan.add_indexes.push((name.clone(), index.clone())),
                        Some(current) if current != index => {
                            return Err(conflict(
                                name,
                                format!("index {} changed definition", index.name),
                            ));
                        }
                        Some(_) => {}
                    }
                }
            }
            None => {
                plan.create.push((
                    name.clone(),
                    StoreManifest {
                        key_policy: schema.key_policy,
                        indexes: schema.indexes.clone(),
                    },
                ));
                if let Some(old) = &schema.replaces {
                    if manifest.stores.contains_key(old) && registry.store(old).is_none() {
                        plan.drop.push(old.clone());
                    }
                }
            }
        }
    }

    Ok(plan)
}

/// Apply `plan` to the database at `layout`. The caller holds the
/// exclusive lock.
pub(crate) fn apply(layout: &Layout, manifest: &Manifest, plan: &UpgradePlan) -> Result<Manifest> {
    let mut next = manifest.clone();

    for (store, index) in &plan.add_indexes {
        if index.unique {
            let data = StoreData::load(&layout.store_path(store))?;
            if let Some(value) = data.first_duplicate(index) {
                return Err(conflict(
                    store,
                    format!(
                        "cannot add unique index {}: {} appears more than once",
                        index.name, value
                    ),
                ));
            }
        }
        if let Some(entry) = next.stores.get_mut(store) {
            entry.indexes.push(index.clone());
        }
        debug!(store = %store, index = %index.name, "Added index");
    }

    for (store, entry) in &plan.create {
        StoreData::default().save(&layout.store_path(store))?;
        next.stores.insert(store.clone(), entry.clone());
        debug!(store = %store, "Created store");
    }

    for store in &plan.drop {
        next.stores.remove(store);
    }

    next.version += 1;
    next.schema_version = plan.schema_version;
    crate::store::write_json_atomic(&layout.manifest_path(), &next)?;

    for store in &plan.drop {
        let path = layout.store_path(store);
        if path.exists() {
            fs::remove_file(&path).map_err(map_io)?;
        }
        debug!(store = %store, "Dropped replaced store");
    }

    info!(
        database = %next.database,
        version = next.version,
        schema_version = next.schema_version,
        "Upgraded database"
    );

    Ok(next)
}
