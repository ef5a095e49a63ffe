//! Content records and the inputs that create and modify them.

mod payload;

pub use payload::Payload;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::asset::{AssetPolicy, EncodedAsset, RawAsset};
use crate::error::Error;
use crate::types::RecordKey;

/// One item of a collection, as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    /// Stable identifier, immutable once assigned.
    pub key: RecordKey,

    /// 1-based display position. Absent on some records adopted from the
    /// remote API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,

    /// Active/published when true.
    #[serde(default)]
    pub status: bool,

    #[serde(default)]
    pub fields: Payload,

    #[serde(default)]
    pub asset: Option<EncodedAsset>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub edited_by: String,
}

impl ContentRecord {
    /// A display title, taken from the first title-like payload field.
    pub fn title(&self) -> Option<&str> {
        ["title", "headline", "name"]
            .iter()
            .find_map(|f| self.fields.get_str(f))
    }
}

/// Which records a read returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Inactive,
}

impl StatusFilter {
    /// Build a filter from a pair of mutually exclusive flags.
    pub fn from_flags(active: bool, inactive: bool) -> Self {
        match (active, inactive) {
            (true, false) => StatusFilter::Active,
            (false, true) => StatusFilter::Inactive,
            _ => StatusFilter::All,
        }
    }

    pub fn matches(self, status: bool) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => status,
            StatusFilter::Inactive => !status,
        }
    }
}

/// Input to `create`. Timestamps and position are assigned by the store.
#[derive(Debug, Clone, Default)]
pub struct NewRecord {
    /// Caller-supplied key, only valid for external-key stores.
    pub key: Option<String>,
    pub status: bool,
    pub fields: Payload,
    pub asset: Option<RawAsset>,
    pub created_by: String,
}

impl NewRecord {
    pub fn new(fields: Payload) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_status(mut self, status: bool) -> Self {
        self.status = status;
        self
    }

    pub fn with_asset(mut self, asset: RawAsset) -> Self {
        self.asset = Some(asset);
        self
    }

    pub fn created_by(mut self, name: impl Into<String>) -> Self {
        self.created_by = name.into();
        self
    }

    /// Encode the asset against `policy`.
    ///
    /// Runs before a write transaction is opened, so a rejected asset
    /// never reaches the store.
    pub fn prepare(self, policy: &AssetPolicy) -> Result<PreparedRecord, Error> {
        let asset = self.asset.as_ref().map(|a| a.encode(policy)).transpose()?;
        Ok(PreparedRecord {
            key: self.key,
            status: self.status,
            fields: self.fields,
            asset,
            created_by: self.created_by,
        })
    }
}

/// A [`NewRecord`] whose asset has been validated and encoded.
#[derive(Debug, Clone)]
pub struct PreparedRecord {
    pub key: Option<String>,
    pub status: bool,
    pub fields: Payload,
    pub asset: Option<EncodedAsset>,
    pub created_by: String,
}

impl PreparedRecord {
    /// Materialize the record with its assigned key and position.
    pub fn into_record(self, key: RecordKey, position: u32, now: DateTime<Utc>) -> ContentRecord {
        ContentRecord {
            key,
            position: Some(position),
            status: self.status,
            fields: self.fields,
            asset: self.asset,
            created_at: now,
            updated_at: now,
            edited_by: self.created_by.clone(),
            created_by: self.created_by,
        }
    }
}

/// What an update does to the asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetChange {
    Replace(RawAsset),
    Clear,
}

/// A partial update. Unset fields are left as they are.
#[derive(Debug, Clone, Default)]
pub struct RecordPatch {
    pub status: Option<bool>,
    pub position: Option<u32>,
    /// Merged over the stored payload per top-level key.
    pub fields: Option<Payload>,
    pub asset: Option<AssetChange>,
    pub edited_by: Option<String>,
}

impl RecordPatch {
    /// A patch that only sets the status.
    pub fn status(status: bool) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// A patch that only sets the position.
    pub fn position(position: u32) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    pub fn with_fields(mut self, fields: Payload) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn with_asset(mut self, change: AssetChange) -> Self {
        self.asset = Some(change);
        self
    }

    pub fn edited_by(mut self, name: impl Into<String>) -> Self {
        self.edited_by = Some(name.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.position.is_none()
            && self.fields.is_none()
            && self.asset.is_none()
            && self.edited_by.is_none()
    }

    /// Encode a replacement asset against `policy`.
    pub fn prepare(self, policy: &AssetPolicy) -> Result<PreparedPatch, Error> {
        let asset = match self.asset {
            None => None,
            Some(AssetChange::Clear) => Some(None),
            Some(AssetChange::Replace(raw)) => Some(Some(raw.encode(policy)?)),
        };
        Ok(PreparedPatch {
            status: self.status,
            position: self.position,
            fields: self.fields,
            asset,
            edited_by: self.edited_by,
        })
    }
}

/// A [`RecordPatch`] whose replacement asset has been encoded.
#[derive(Debug, Clone)]
pub struct PreparedPatch {
    status: Option<bool>,
    position: Option<u32>,
    fields: Option<Payload>,
    asset: Option<Option<EncodedAsset>>,
    edited_by: Option<String>,
}

impl PreparedPatch {
    /// Apply to `record`, refreshing `updatedAt` but never moving it
    /// before `createdAt`.
    pub fn apply(self, record: &mut ContentRecord, now: DateTime<Utc>) {
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(position) = self.position {
            record.position = Some(position);
        }
        if let Some(fields) = self.fields {
            record.fields.merge(fields);
        }
        if let Some(asset) = self.asset {
            record.asset = asset;
        }
        if let Some(name) = self.edited_by {
            record.edited_by = name;
        }
        record.updated_at = now.max(record.created_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn record(now: DateTime<Utc>) -> ContentRecord {
        ContentRecord {
            key: RecordKey::Auto(3),
            position: Some(2),
            status: false,
            fields: Payload::new(json!({"title": "Banner", "url": "https://a"})).unwrap(),
            asset: None,
            created_at: now,
            updated_at: now,
            created_by: "admin".to_string(),
            edited_by: "admin".to_string(),
        }
    }

    #[test]
    fn serializes_camel_case() {
        let now = Utc::now();
        let value = serde_json::to_value(record(now)).unwrap();
        assert_eq!(value["key"], json!(3));
        assert_eq!(value["createdBy"], json!("admin"));
        assert!(value.get("createdAt").is_some());
        assert!(value.get("created_at").is_none());
    }

    #[test]
    fn deserializes_remote_record_without_position() {
        let json = r#"{
            "key": "9b2c",
            "status": true,
            "fields": {"headline": "Hello"},
            "createdAt": "2024-01-02T03:04:05Z",
            "updatedAt": "2024-01-02T03:04:05Z"
        }"#;
        let record: ContentRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.key, RecordKey::external("9b2c").unwrap());
        assert_eq!(record.position, None);
        assert_eq!(record.title(), Some("Hello"));
        assert_eq!(record.created_by, "");
    }

    #[test]
    fn patch_merges_and_stamps() {
        let created = Utc::now();
        let mut record = record(created);
        let later = created + Duration::seconds(30);

        RecordPatch::status(true)
            .with_fields(Payload::new(json!({"title": "Renamed"})).unwrap())
            .edited_by("editor")
            .prepare(&AssetPolicy::images(10))
            .unwrap()
            .apply(&mut record, later);

        assert!(record.status);
        assert_eq!(record.fields.get_str("title"), Some("Renamed"));
        assert_eq!(record.fields.get_str("url"), Some("https://a"));
        assert_eq!(record.edited_by, "editor");
        assert_eq!(record.created_at, created);
        assert_eq!(record.updated_at, later);
    }

    #[test]
    fn updated_at_never_precedes_created_at() {
        let created = Utc::now();
        let mut record = record(created);
        RecordPatch::position(1)
            .prepare(&AssetPolicy::images(10))
            .unwrap()
            .apply(&mut record, created - Duration::hours(1));
        assert_eq!(record.updated_at, created);
        assert_eq!(record.position, Some(1));
    }

    #[test]
    fn patch_can_clear_asset() {
        let now = Utc::now();
        let mut record = record(now);
        record.asset = Some(EncodedAsset::new("data:image/png;base64,AA==").unwrap());
        RecordPatch::default()
            .with_asset(AssetChange::Clear)
            .prepare(&AssetPolicy::images(10))
            .unwrap()
            .apply(&mut record, now);
        assert!(record.asset.is_none());
    }

    #[test]
    fn prepare_rejects_bad_asset() {
        let new = NewRecord::new(Payload::empty())
            .with_asset(RawAsset::new(vec![1, 2, 3], "application/zip"));
        assert!(matches!(
            new.prepare(&AssetPolicy::images(10)),
            Err(Error::Asset(_))
        ));
    }

    #[test]
    fn status_filter() {
        assert!(StatusFilter::All.matches(false));
        assert!(StatusFilter::Active.matches(true));
        assert!(!StatusFilter::Active.matches(false));
        assert!(StatusFilter::Inactive.matches(false));
        assert_eq!(StatusFilter::from_flags(true, false), StatusFilter::Active);
        assert_eq!(StatusFilter::from_flags(false, false), StatusFilter::All);
    }
}
