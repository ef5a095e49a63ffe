//! Schema registry.
//!
//! The registry is the single, static description of every store the
//! database must contain. The database gateway diffs it against what is on
//! disk to decide which stores and indexes an upgrade creates, so no call
//! site ever hard-codes its own upgrade steps.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::asset::AssetPolicy;
use crate::error::{Error, InvalidInputError};
use crate::record::ContentRecord;
use crate::types::CollectionName;

/// How a store assigns primary keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyPolicy {
    /// The store assigns an increasing integer.
    Auto,
    /// The caller supplies a string key.
    External,
}

impl std::fmt::Display for KeyPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyPolicy::Auto => write!(f, "auto"),
            KeyPolicy::External => write!(f, "external"),
        }
    }
}

/// A secondary index over one record field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    /// Index name, unique within its store.
    pub name: String,
    /// Field path: a top-level record field or `fields.<name>`.
    pub field: String,
    /// Whether two records may share a value.
    pub unique: bool,
}

impl IndexSpec {
    /// A non-unique index.
    pub fn new(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field: field.into(),
            unique: false,
        }
    }

    /// A unique index.
    pub fn unique(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field: field.into(),
            unique: true,
        }
    }

    /// Resolve this index's field against a record.
    ///
    /// Returns `None` when the record has no value for the field; such
    /// records are not indexed.
    pub fn extract(&self, record: &ContentRecord) -> Option<Value> {
        if let Some(name) = self.field.strip_prefix("fields.") {
            return record.fields.get(name).filter(|v| !v.is_null()).cloned();
        }

        match self.field.as_str() {
            "status" => Some(Value::Bool(record.status)),
            "position" => record.position.map(Value::from),
            "createdAt" => Some(Value::String(record.created_at.to_rfc3339())),
            "updatedAt" => Some(Value::String(record.updated_at.to_rfc3339())),
            "createdBy" => Some(Value::String(record.created_by.clone())),
            "editedBy" => Some(Value::String(record.edited_by.clone())),
            _ => None,
        }
    }
}

/// Everything the database needs to know about one collection's store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSchema {
    /// Logical collection name.
    pub collection: CollectionName,
    /// Name of the store holding the collection.
    pub store_name: String,
    /// Primary key policy.
    pub key_policy: KeyPolicy,
    /// Required secondary indexes.
    pub indexes: Vec<IndexSpec>,
    /// Accepted asset types and size ceiling.
    pub assets: AssetPolicy,
    /// A store this one supersedes; the old store is dropped on upgrade.
    pub replaces: Option<String>,
}

impl StoreSchema {
    /// Declare a store with no indexes and the default image policy.
    pub fn new(
        collection: CollectionName,
        store_name: impl Into<String>,
        key_policy: KeyPolicy,
    ) -> Self {
        Self {
            collection,
            store_name: store_name.into(),
            key_policy,
            indexes: Vec::new(),
            assets: AssetPolicy::images(10 * MIB),
            replaces: None,
        }
    }

    /// Add a secondary index.
    pub fn with_index(mut self, index: IndexSpec) -> Self {
        self.indexes.push(index);
        self
    }

    /// Replace the asset policy.
    pub fn with_assets(mut self, assets: AssetPolicy) -> Self {
        self.assets = assets;
        self
    }

    /// Mark this store as the replacement of an older one.
    pub fn replacing(mut self, old_store: impl Into<String>) -> Self {
        self.replaces = Some(old_store.into());
        self
    }

    /// Look up an index by name.
    pub fn index(&self, name: &str) -> Option<&IndexSpec> {
        self.indexes.iter().find(|i| i.name == name)
    }
}

const MIB: u64 = 1024 * 1024;

/// The versioned set of stores a database must contain.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaRegistry {
    database: String,
    version: u32,
    stores: Vec<StoreSchema>,
}

impl SchemaRegistry {
    /// An empty registry.
    pub fn new(database: impl Into<String>, version: u32) -> Self {
        Self {
            database: database.into(),
            version,
            stores: Vec::new(),
        }
    }

    /// The registry of the content console: banners, news drafts,
    /// magazine drafts and multimedia entries.
    pub fn builtin() -> Self {
        let pdf_and_images = AssetPolicy::images(20 * MIB).allowing("application/pdf");

        Self::new("content", 5)
            .with_store(
                StoreSchema::new(collection("banners"), "banners", KeyPolicy::Auto)
                    .with_index(IndexSpec::new("by-status", "status"))
                    .with_index(IndexSpec::new("by-position", "position"))
                    .with_assets(AssetPolicy::images(10 * MIB)),
            )
            .with_store(
                StoreSchema::new(collection("news"), "news-drafts", KeyPolicy::External)
                    .with_index(IndexSpec::new("by-status", "status"))
                    .with_index(IndexSpec::new("by-type", "fields.type"))
                    .with_assets(AssetPolicy::images(5 * MIB)),
            )
            .with_store(
                StoreSchema::new(collection("magazines"), "magazine-drafts", KeyPolicy::External)
                    .with_index(IndexSpec::new("by-status", "status"))
                    .with_index(IndexSpec::unique("by-issue", "fields.issueNumber"))
                    .with_assets(pdf_and_images),
            )
            .with_store(
                StoreSchema::new(collection("multimedia"), "media", KeyPolicy::External)
                    .with_index(IndexSpec::new("by-status", "status"))
                    .with_index(IndexSpec::new("by-created-by", "createdBy"))
                    .with_index(IndexSpec::new("by-created-date", "createdAt"))
                    .with_index(IndexSpec::new("by-updated-date", "updatedAt"))
                    .with_assets(AssetPolicy::images(10 * MIB)),
            )
    }

    /// Add or replace the declaration for a collection.
    pub fn with_store(mut self, store: StoreSchema) -> Self {
        self.stores.retain(|s| s.collection != store.collection);
        self.stores.push(store);
        self
    }

    /// Set the schema version.
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Set the database name.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Database name.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Schema version.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// All declared stores, in declaration order.
    pub fn stores(&self) -> &[StoreSchema] {
        &self.stores
    }

    /// Look up a collection.
    pub fn lookup(&self, collection: &CollectionName) -> Option<&StoreSchema> {
        self.stores.iter().find(|s| &s.collection == collection)
    }

    /// Look up a collection, failing if the registry does not declare it.
    pub fn require(&self, collection: &CollectionName) -> Result<&StoreSchema, Error> {
        self.lookup(collection).ok_or_else(|| {
            InvalidInputError::Collection {
                value: collection.to_string(),
                reason: "not declared in the schema registry".to_string(),
            }
            .into()
        })
    }

    /// Look up a store by its store name.
    pub fn store(&self, store_name: &str) -> Option<&StoreSchema> {
        self.stores.iter().find(|s| s.store_name == store_name)
    }
}

fn collection(name: &'static str) -> CollectionName {
    // Builtin names are constants known to be valid.
    CollectionName::new(name).unwrap_or_else(|_| unreachable!("invalid builtin collection {name}"))
}
