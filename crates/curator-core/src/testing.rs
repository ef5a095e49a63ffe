//! In-memory repository for unit tests.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::asset::AssetPolicy;
use crate::error::{Error, StorageError};
use crate::record::{ContentRecord, NewRecord, RecordPatch, StatusFilter};
use crate::traits::Repository;
use crate::types::{CollectionName, RecordKey};
use crate::Result;

#[derive(Default)]
struct Inner {
    records: BTreeMap<RecordKey, ContentRecord>,
    next_key: u64,
    updates: usize,
    fail_after: Option<usize>,
    delay: Option<Duration>,
}

pub struct MemoryRepository {
    collection: CollectionName,
    inner: Mutex<Inner>,
}

impl MemoryRepository {
    pub fn new(collection: &str) -> Self {
        Self {
            collection: CollectionName::new(collection).unwrap(),
            inner: Mutex::new(Inner {
                next_key: 1,
                ..Inner::default()
            }),
        }
    }

    pub fn snapshot(&self) -> Vec<ContentRecord> {
        self.inner.lock().unwrap().records.values().cloned().collect()
    }

    pub fn update_count(&self) -> usize {
        self.inner.lock().unwrap().updates
    }

    /// Updates beyond the first `n` fail.
    pub fn fail_updates_after(&self, n: usize) {
        self.inner.lock().unwrap().fail_after = Some(n);
    }

    pub fn clear_failures(&self) {
        self.inner.lock().unwrap().fail_after = None;
    }

    pub fn set_delay(&self, delay: Duration) {
        self.inner.lock().unwrap().delay = Some(delay);
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    fn collection(&self) -> &CollectionName {
        &self.collection
    }

    async fn create(&self, record: NewRecord) -> Result<RecordKey> {
        let prepared = record.prepare(&AssetPolicy::images(1024 * 1024))?;
        let mut inner = self.inner.lock().unwrap();
        let key = RecordKey::Auto(inner.next_key);
        inner.next_key += 1;
        let position = inner.records.values().filter_map(|r| r.position).max().unwrap_or(0) + 1;
        inner
            .records
            .insert(key.clone(), prepared.into_record(key.clone(), position, Utc::now()));
        Ok(key)
    }

    async fn get_all(&self, filter: StatusFilter) -> Result<Vec<ContentRecord>> {
        Ok(self
            .snapshot()
            .into_iter()
            .filter(|r| filter.matches(r.status))
            .collect())
    }

    async fn get_one(&self, key: &RecordKey) -> Result<ContentRecord> {
        self.inner
            .lock()
            .unwrap()
            .records
            .get(key)
            .cloned()
            .ok_or_else(|| Error::not_found(&self.collection, key))
    }

    async fn exists(&self, key: &RecordKey) -> Result<bool> {
        Ok(self.inner.lock().unwrap().records.contains_key(key))
    }

    async fn update(&self, key: &RecordKey, patch: RecordPatch) -> Result<ContentRecord> {
        let delay = self.inner.lock().unwrap().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let prepared = patch.prepare(&AssetPolicy::images(1024 * 1024))?;
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_after.is_some_and(|n| inner.updates >= n) {
            return Err(StorageError::Io {
                message: "disk full".to_string(),
            }
            .into());
        }
        let record = inner
            .records
            .get_mut(key)
            .ok_or_else(|| Error::not_found(&self.collection, key))?;
        prepared.apply(record, Utc::now());
        let updated = record.clone();
        inner.updates += 1;
        Ok(updated)
    }

    async fn delete(&self, key: &RecordKey) -> Result<()> {
        self.inner.lock().unwrap().records.remove(key);
        Ok(())
    }

    async fn adopt(&self, records: Vec<ContentRecord>) -> Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        let count = records.len();
        for record in records {
            inner.records.insert(record.key.clone(), record);
        }
        Ok(count)
    }
}
