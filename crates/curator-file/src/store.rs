//! On-disk formats and file helpers for the embedded engine.
//!
//! ```text
//! <root>/<database>/
//! ├── manifest.json
//! ├── curator.lock
//! └── stores/<store>.json
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use curator_core::error::{Error, StorageError};
use curator_core::schema::{IndexSpec, KeyPolicy};
use curator_core::{ContentRecord, RecordKey, Result};

pub(crate) fn map_io(err: std::io::Error) -> Error {
    Error::StorageUnavailable(StorageError::Io {
        message: format!("IO error: {}", err),
    })
}

fn corrupt(path: &Path, reason: impl ToString) -> Error {
    Error::StorageUnavailable(StorageError::Corrupt {
        path: path.display().to_string(),
        reason: reason.to_string(),
    })
}

/// Paths of one database directory.
#[derive(Debug, Clone)]
pub(crate) struct Layout {
    dir: PathBuf,
}

impl Layout {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join("manifest.json")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.dir.join("curator.lock")
    }

    pub fn stores_dir(&self) -> PathBuf {
        self.dir.join("stores")
    }

    pub fn store_path(&self, store: &str) -> PathBuf {
        self.stores_dir().join(format!("{}.json", store))
    }
}

/// Read a JSON file. `Ok(None)` if it does not exist.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(map_io)?;
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| corrupt(path, e))
}

/// Write a JSON file by writing a sibling temp file and renaming it over
/// the target.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(map_io)?;
    }

    let content = serde_json::to_string_pretty(value).map_err(|e| {
        Error::StorageUnavailable(StorageError::Io {
            message: format!("cannot serialize {}: {}", path.display(), e),
        })
    })?;

    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, &content).map_err(map_io)?;
    fs::rename(&temp_path, path).map_err(map_io)?;
    Ok(())
}

/// The database manifest. Writing it is the commit point of an upgrade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub database: String,
    /// Engine version, bumped by one per upgrade.
    pub version: u32,
    /// Registry version last applied.
    pub schema_version: u32,
    pub stores: BTreeMap<String, StoreManifest>,
}

impl Manifest {
    pub(crate) fn empty(database: &str) -> Self {
        Self {
            database: database.to_string(),
            version: 0,
            schema_version: 0,
            stores: BTreeMap::new(),
        }
    }
}

/// What the manifest records about one store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreManifest {
    pub key_policy: KeyPolicy,
    #[serde(default)]
    pub indexes: Vec<IndexSpec>,
}

impl StoreManifest {
    pub fn index(&self, name: &str) -> Option<&IndexSpec> {
        self.indexes.iter().find(|i| i.name == name)
    }
}

/// File form of a store: records as a list in key order.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreFile {
    next_key: u64,
    #[serde(default)]
    retired_keys: Vec<RecordKey>,
    #[serde(default)]
    records: Vec<ContentRecord>,
}

/// The contents of one store, as seen inside a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreData {
    next_key: u64,
    retired: BTreeSet<RecordKey>,
    records: BTreeMap<RecordKey, ContentRecord>,
}

impl Default for StoreData {
    fn default() -> Self {
        Self {
            next_key: 1,
            retired: BTreeSet::new(),
            records: BTreeMap::new(),
        }
    }
}

impl From<StoreFile> for StoreData {
    fn from(file: StoreFile) -> Self {
        Self {
            next_key: file.next_key.max(1),
            retired: file.retired_keys.into_iter().collect(),
            records: file
                .records
                .into_iter()
                .map(|r| (r.key.clone(), r))
                .collect(),
        }
    }
}

impl From<&StoreData> for StoreFile {
    fn from(data: &StoreData) -> Self {
        Self {
            next_key: data.next_key,
            retired_keys: data.retired.iter().cloned().collect(),
            records: data.records.values().cloned().collect(),
        }
    }
}

impl StoreData {
    pub(crate) fn load(path: &Path) -> Result<Self> {
        match read_json::<StoreFile>(path)? {
            Some(file) => Ok(file.into()),
            None => Err(corrupt(path, "store file is missing")),
        }
    }

    pub(crate) fn save(&self, path: &Path) -> Result<()> {
        write_json_atomic(path, &StoreFile::from(self))
    }

    /// Records in key order.
    pub fn records(&self) -> impl Iterator<Item = &ContentRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: &RecordKey) -> Option<&ContentRecord> {
        self.records.get(key)
    }

    pub fn get_mut(&mut self, key: &RecordKey) -> Option<&mut ContentRecord> {
        self.records.get_mut(key)
    }

    pub fn contains(&self, key: &RecordKey) -> bool {
        self.records.contains_key(key)
    }

    /// Whether `key` belonged to a deleted record.
    pub fn is_retired(&self, key: &RecordKey) -> bool {
        self.retired.contains(key)
    }

    /// Highest stored position, 0 when none.
    pub fn max_position(&self) -> u32 {
        self.records
            .values()
            .filter_map(|r| r.position)
            .max()
            .unwrap_or(0)
    }

    /// Take the next auto key.
    pub fn allocate_key(&mut self) -> RecordKey {
        let key = RecordKey::Auto(self.next_key);
        self.next_key += 1;
        key
    }

    /// Make sure auto keys are allocated past `key`.
    pub fn advance_past(&mut self, key: &RecordKey) {
        if let RecordKey::Auto(n) = key {
            self.next_key = self.next_key.max(n.saturating_add(1));
        }
    }

    /// Insert or replace a record.
    pub fn put(&mut self, record: ContentRecord) -> Option<ContentRecord> {
        self.records.insert(record.key.clone(), record)
    }

    /// Remove a record and retire its key.
    pub fn remove(&mut self, key: &RecordKey) -> Option<ContentRecord> {
        let removed = self.records.remove(key);
        if removed.is_some() {
            self.retired.insert(key.clone());
        }
        removed
    }

    /// Records whose `index` value equals `value`.
    pub fn find_by(&self, index: &IndexSpec, value: &Value) -> Vec<&ContentRecord> {
        self.records
            .values()
            .filter(|r| index.extract(r).as_ref() == Some(value))
            .collect()
    }

    /// The first value shared by two records under `index`, if any.
    pub(crate) fn first_duplicate(&self, index: &IndexSpec) -> Option<Value> {
        let mut seen = BTreeSet::new();
        self.records
            .values()
            .filter_map(|r| index.extract(r))
            .find(|v| !seen.insert(v.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use tempfile::TempDir;

    use curator_core::Payload;

    fn record(key: RecordKey, issue: i64) -> ContentRecord {
        let now = Utc::now();
        ContentRecord {
            key,
            position: Some(1),
            status: false,
            fields: Payload::new(json!({"issueNumber": issue})).unwrap(),
            asset: None,
            created_at: now,
            updated_at: now,
            created_by: String::new(),
            edited_by: String::new(),
        }
    }

    #[test]
    fn store_file_round_trip_keeps_key_order_and_retired_keys() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("stores").join("banners.json");

        let mut data = StoreData::default();
        let k1 = data.allocate_key();
        let k2 = data.allocate_key();
        data.put(record(k2.clone(), 2));
        data.put(record(k1.clone(), 1));
        data.remove(&k1);
        data.save(&path).unwrap();

        let loaded = StoreData::load(&path).unwrap();
        assert_eq!(loaded, data);
        assert!(loaded.is_retired(&k1));
        assert_eq!(loaded.records().map(|r| r.key.clone()).collect::<Vec<_>>(), vec![k2]);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn missing_store_file_is_corrupt() {
        let tmp = TempDir::new().unwrap();
        let err = StoreData::load(&tmp.path().join("nope.json")).unwrap_err();
        assert!(matches!(
            err,
            Error::StorageUnavailable(StorageError::Corrupt { .. })
        ));
    }

    #[test]
    fn unparseable_json_is_corrupt() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("manifest.json");
        fs::write(&path, "{not json").unwrap();
        let err = read_json::<Manifest>(&path).unwrap_err();
        assert!(err.is_storage_unavailable());
    }

    #[test]
    fn advance_past_only_moves_forward() {
        let mut data = StoreData::default();
        data.advance_past(&RecordKey::Auto(10));
        data.advance_past(&RecordKey::Auto(3));
        assert_eq!(data.allocate_key(), RecordKey::Auto(11));
    }

    #[test]
    fn duplicates_under_index() {
        let index = IndexSpec::unique("by-issue", "fields.issueNumber");
        let mut data = StoreData::default();
        data.put(record(RecordKey::external("a").unwrap(), 1));
        data.put(record(RecordKey::external("b").unwrap(), 2));
        assert_eq!(data.first_duplicate(&index), None);
        assert_eq!(data.find_by(&index, &json!(2)).len(), 1);

        data.put(record(RecordKey::external("c").unwrap(), 2));
        assert_eq!(data.first_duplicate(&index), Some(json!(2)));
    }
}
