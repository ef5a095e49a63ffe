//! Collection repository trait.

use async_trait::async_trait;

use crate::record::{ContentRecord, NewRecord, RecordPatch, StatusFilter};
use crate::types::{CollectionName, RecordKey};
use crate::{Error, Result};

/// CRUD over one collection's store.
#[async_trait]
pub trait Repository: Send + Sync {
    /// The collection this repository owns.
    fn collection(&self) -> &CollectionName;

    /// Insert a record at the end of the collection and return its key.
    ///
    /// The asset is validated and encoded before any write. Timestamps are
    /// stamped by the repository, and the position is one past the highest
    /// stored position.
    async fn create(&self, record: NewRecord) -> Result<RecordKey>;

    /// Every record matching `filter`, in key order.
    async fn get_all(&self, filter: StatusFilter) -> Result<Vec<ContentRecord>>;

    /// One record, or [`Error::NotFound`].
    async fn get_one(&self, key: &RecordKey) -> Result<ContentRecord>;

    /// Whether a record with `key` exists.
    async fn exists(&self, key: &RecordKey) -> Result<bool>;

    /// Merge `patch` into the stored record and return the result.
    async fn update(&self, key: &RecordKey, patch: RecordPatch) -> Result<ContentRecord>;

    /// Set the active flag.
    async fn toggle_status(&self, key: &RecordKey, status: bool) -> Result<ContentRecord> {
        self.update(key, RecordPatch::status(status)).await
    }

    /// Remove a record. Removing an absent key succeeds.
    async fn delete(&self, key: &RecordKey) -> Result<()>;

    /// Store new positions for a batch of records.
    ///
    /// The default applies the updates one at a time; a failure reports
    /// how many had already been persisted.
    async fn reposition(&self, updates: &[(RecordKey, u32)]) -> Result<()> {
        let total = updates.len();
        for (persisted, (key, position)) in updates.iter().enumerate() {
            if let Err(source) = self.update(key, RecordPatch::position(*position)).await {
                return Err(Error::ReorderPersistFailed {
                    persisted,
                    total,
                    source: Box::new(source),
                });
            }
        }
        Ok(())
    }

    /// Store records from the remote source as they are, replacing any
    /// local record with the same key. Returns how many were stored.
    async fn adopt(&self, records: Vec<ContentRecord>) -> Result<usize>;
}
