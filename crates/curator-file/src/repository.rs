//! File-backed collection repository.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use curator_core::error::{Error, InvalidInputError, StorageError};
use curator_core::schema::{KeyPolicy, SchemaRegistry, StoreSchema};
use curator_core::traits::Repository;
use curator_core::{
    AssetPolicy, CollectionName, ContentRecord, NewRecord, RecordKey, RecordPatch, Result,
    StatusFilter,
};

use crate::config::StoreConfig;
use crate::engine::Database;
use crate::gateway::Gateway;

#[derive(Debug, Clone)]
enum Backend {
    Ready(Arc<Database>),
    /// The database could not be opened this session.
    Degraded(StorageError),
}

/// A [`Repository`] over one store of a file-backed database.
#[derive(Debug, Clone)]
pub struct FileRepository {
    schema: StoreSchema,
    assets: AssetPolicy,
    backend: Backend,
}

impl FileRepository {
    /// Open the repository for `collection` through the [`Gateway`].
    ///
    /// Never fails because of the storage engine: if the database cannot
    /// be opened the repository is returned in degraded mode, where reads
    /// are empty and writes fail. An undeclared collection is still an
    /// error.
    #[instrument(skip(config, registry), fields(database = %config.database()))]
    pub async fn open(
        config: &StoreConfig,
        registry: &SchemaRegistry,
        collection: &CollectionName,
    ) -> Result<Self> {
        let schema = registry.require(collection)?.clone();
        let assets = config.asset_policy(&schema);

        let backend = match Gateway::open(config, registry).await {
            Ok(db) => Backend::Ready(db),
            Err(Error::StorageUnavailable(reason)) => {
                warn!(error = %reason, "Storage unavailable, continuing read-only");
                Backend::Degraded(reason)
            }
            Err(err) => return Err(err),
        };

        Ok(Self {
            schema,
            assets,
            backend,
        })
    }

    /// Build a repository over an already open database.
    pub fn with_database(db: Arc<Database>, schema: StoreSchema, assets: AssetPolicy) -> Self {
        Self {
            schema,
            assets,
            backend: Backend::Ready(db),
        }
    }

    /// Whether the store can be used this session.
    pub fn is_available(&self) -> bool {
        matches!(self.backend, Backend::Ready(_))
    }

    pub fn schema(&self) -> &StoreSchema {
        &self.schema
    }

    /// The asset policy in force, after any global ceiling.
    pub fn asset_policy(&self) -> &AssetPolicy {
        &self.assets
    }

    fn store(&self) -> &str {
        &self.schema.store_name
    }

    fn db(&self) -> Result<&Database> {
        match &self.backend {
            Backend::Ready(db) => Ok(db.as_ref()),
            Backend::Degraded(reason) => Err(Error::StorageUnavailable(reason.clone())),
        }
    }

    /// Records whose value under the named index equals `value`.
    pub async fn find_by_index(&self, index: &str, value: &Value) -> Result<Vec<ContentRecord>> {
        let spec = self.schema.index(index).cloned().ok_or_else(|| {
            Error::InvalidInput(InvalidInputError::Other {
                message: format!("{} has no index named {}", self.schema.collection, index),
            })
        })?;

        let Ok(db) = self.db() else {
            return Ok(Vec::new());
        };
        db.run_read_transaction(self.store(), |data| {
            Ok(data.find_by(&spec, value).into_iter().cloned().collect())
        })
        .await
    }

    fn supplied_key(&self, key: Option<&str>) -> Result<Option<RecordKey>> {
        match (self.schema.key_policy, key) {
            (_, None) => Ok(None),
            (KeyPolicy::Auto, Some(key)) => Err(InvalidInputError::RecordKey {
                value: key.to_string(),
                reason: format!("{} assigns its own keys", self.schema.collection),
            }
            .into()),
            (KeyPolicy::External, Some(key)) => RecordKey::external(key).map(Some),
        }
    }
}

#[async_trait]
impl Repository for FileRepository {
    fn collection(&self) -> &CollectionName {
        &self.schema.collection
    }

    #[instrument(skip(self, record), fields(collection = %self.schema.collection))]
    async fn create(&self, record: NewRecord) -> Result<RecordKey> {
        let supplied = self.supplied_key(record.key.as_deref())?;
        let prepared = record.prepare(&self.assets)?;
        let db = self.db()?;

        let collection = &self.schema.collection;
        let policy = self.schema.key_policy;
        let key = db
            .run_write_transaction(self.store(), |data| {
                let key = match supplied {
                    Some(key) => {
                        if data.contains(&key) || data.is_retired(&key) {
                            return Err(Error::duplicate_key(collection, &key));
                        }
                        key
                    }
                    None => match policy {
                        KeyPolicy::Auto => data.allocate_key(),
                        KeyPolicy::External => RecordKey::External(Uuid::new_v4().to_string()),
                    },
                };
                let position = data.max_position() + 1;
                data.put(prepared.into_record(key.clone(), position, Utc::now()));
                Ok(key)
            })
            .await?;

        debug!(key = %key, "Created record");
        Ok(key)
    }

    #[instrument(skip(self), fields(collection = %self.schema.collection))]
    async fn get_all(&self, filter: StatusFilter) -> Result<Vec<ContentRecord>> {
        let db = match self.db() {
            Ok(db) => db,
            Err(err) => {
                warn!(error = %err, "Reading from unavailable store, returning nothing");
                return Ok(Vec::new());
            }
        };

        db.run_read_transaction(self.store(), |data| {
            Ok(data
                .records()
                .filter(|r| filter.matches(r.status))
                .cloned()
                .collect())
        })
        .await
    }

    #[instrument(skip(self), fields(collection = %self.schema.collection))]
    async fn get_one(&self, key: &RecordKey) -> Result<ContentRecord> {
        let collection = &self.schema.collection;
        self.db()?
            .run_read_transaction(self.store(), |data| {
                data.get(key)
                    .cloned()
                    .ok_or_else(|| Error::not_found(collection, key))
            })
            .await
    }

    async fn exists(&self, key: &RecordKey) -> Result<bool> {
        let Ok(db) = self.db() else {
            return Ok(false);
        };
        db.run_read_transaction(self.store(), |data| Ok(data.contains(key)))
            .await
    }

    #[instrument(skip(self, patch), fields(collection = %self.schema.collection))]
    async fn update(&self, key: &RecordKey, patch: RecordPatch) -> Result<ContentRecord> {
        let prepared = patch.prepare(&self.assets)?;
        let collection = &self.schema.collection;

        let updated = self
            .db()?
            .run_write_transaction(self.store(), |data| {
                let record = data
                    .get_mut(key)
                    .ok_or_else(|| Error::not_found(collection, key))?;
                prepared.apply(record, Utc::now());
                Ok(record.clone())
            })
            .await?;

        debug!(key = %key, "Updated record");
        Ok(updated)
    }

    #[instrument(skip(self), fields(collection = %self.schema.collection))]
    async fn delete(&self, key: &RecordKey) -> Result<()> {
        let removed = self
            .db()?
            .run_write_transaction(self.store(), |data| Ok(data.remove(key).is_some()))
            .await?;

        if removed {
            debug!(key = %key, "Deleted record");
        }
        Ok(())
    }

    /// Applies every update in one write transaction, so either all
    /// positions are stored or none are.
    #[instrument(
        skip(self, updates),
        fields(collection = %self.schema.collection, total = updates.len())
    )]
    async fn reposition(&self, updates: &[(RecordKey, u32)]) -> Result<()> {
        if updates.is_empty() {
            return Ok(());
        }

        let collection = &self.schema.collection;
        let result = match self.db() {
            Ok(db) => {
                db.run_write_transaction(self.store(), |data| {
                    let now = Utc::now();
                    for (key, position) in updates {
                        let record = data
                            .get_mut(key)
                            .ok_or_else(|| Error::not_found(collection, key))?;
                        record.position = Some(*position);
                        record.updated_at = now.max(record.created_at);
                    }
                    Ok(())
                })
                .await
            }
            Err(err) => Err(err),
        };

        result.map_err(|source| Error::ReorderPersistFailed {
            persisted: 0,
            total: updates.len(),
            source: Box::new(source),
        })
    }

    #[instrument(
        skip(self, records),
        fields(collection = %self.schema.collection, count = records.len())
    )]
    async fn adopt(&self, records: Vec<ContentRecord>) -> Result<usize> {
        let policy = self.schema.key_policy;
        if let Some(bad) = records.iter().find(|r| r.key.policy() != policy) {
            return Err(InvalidInputError::RecordKey {
                value: bad.key.to_string(),
                reason: format!("{} uses {} keys", self.schema.collection, policy),
            }
            .into());
        }

        let count = self
            .db()?
            .run_write_transaction(self.store(), |data| {
                let count = records.len();
                for record in records {
                    data.advance_past(&record.key);
                    data.put(record);
                }
                Ok(count)
            })
            .await?;

        debug!(count, "Adopted remote records");
        Ok(count)
    }
}
