//! Error types for the curator content store.
//!
//! This module provides a unified error type with explicit variants for
//! storage availability, record lookup, asset validation, reorder
//! persistence and input validation failures. None of them is fatal: every
//! variant is recoverable by retry, refresh or falling back to an empty,
//! read-only view.

use std::fmt;
use thiserror::Error;

/// The unified error type for curator operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The embedded engine could not be opened, upgraded, read or written.
    ///
    /// Collection operations are unavailable for the session; callers
    /// degrade to an empty or read-only view.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),

    /// An operation referenced a key that is not in the collection.
    #[error("record {key} not found in {collection}")]
    NotFound { collection: String, key: String },

    /// A create supplied an external key that is present or retired.
    #[error("record {key} already exists in {collection}")]
    DuplicateKey { collection: String, key: String },

    /// A unique index rejected a write.
    #[error("unique index {index} on {store} already holds {value}")]
    UniqueViolation {
        store: String,
        index: String,
        value: String,
    },

    /// An uploaded asset failed validation. Raised before any write.
    #[error("asset rejected: {0}")]
    Asset(#[from] AssetError),

    /// Persisting a reorder failed partway. The displayed order was kept.
    #[error("reorder persisted {persisted} of {total} position updates: {source}")]
    ReorderPersistFailed {
        persisted: usize,
        total: usize,
        #[source]
        source: Box<Error>,
    },

    /// Input validation errors (collection names, keys, payloads).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

impl Error {
    /// Shorthand for a [`Error::NotFound`].
    pub fn not_found(collection: impl fmt::Display, key: impl fmt::Display) -> Self {
        Error::NotFound {
            collection: collection.to_string(),
            key: key.to_string(),
        }
    }

    /// Shorthand for a [`Error::DuplicateKey`].
    pub fn duplicate_key(collection: impl fmt::Display, key: impl fmt::Display) -> Self {
        Error::DuplicateKey {
            collection: collection.to_string(),
            key: key.to_string(),
        }
    }

    /// Check if this error reports a missing record.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Check if this error means the store cannot be used this session.
    pub fn is_storage_unavailable(&self) -> bool {
        match self {
            Error::StorageUnavailable(_) => true,
            Error::ReorderPersistFailed { source, .. } => source.is_storage_unavailable(),
            _ => false,
        }
    }

    /// Every error in this crate can be recovered from by retrying,
    /// refreshing or degrading to an empty view.
    pub fn is_recoverable(&self) -> bool {
        true
    }
}

/// Engine-level failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// An upgrade needs exclusive access while another connection is open.
    #[error("upgrade blocked by another open connection; close it and retry")]
    Blocked,

    /// The database on disk is newer than the requested schema version.
    #[error("database is at schema version {found}, cannot open at {requested}")]
    Downgrade { found: u32, requested: u32 },

    /// An existing store cannot be reconciled with the registry.
    #[error("schema conflict in store {store}: {reason}")]
    SchemaConflict { store: String, reason: String },

    /// A manifest or store file could not be parsed.
    #[error("corrupt file {path}: {reason}")]
    Corrupt { path: String, reason: String },

    /// The database does not contain the requested store.
    #[error("unknown store {store}")]
    UnknownStore { store: String },

    /// Filesystem error.
    #[error("I/O error: {message}")]
    Io { message: String },
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::StorageUnavailable(StorageError::from(err))
    }
}

/// Asset validation failures.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The input exceeds the collection's size ceiling.
    #[error("asset is {size} bytes, limit is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    /// The declared MIME type is not accepted by the collection.
    #[error("unsupported asset type '{mime}'")]
    UnsupportedType { mime: String },
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid collection name.
    #[error("invalid collection '{value}': {reason}")]
    Collection { value: String, reason: String },

    /// Invalid record key.
    #[error("invalid record key '{value}': {reason}")]
    RecordKey { value: String, reason: String },

    /// Invalid record payload.
    #[error("invalid record payload: {reason}")]
    Payload { reason: String },

    /// Invalid encoded asset.
    #[error("invalid encoded asset: {reason}")]
    EncodedAsset { reason: String },

    /// Invalid reorder request.
    #[error("invalid reorder: {reason}")]
    Reorder { reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_helpers() {
        let err = Error::not_found("banners", 7);
        assert!(err.is_not_found());
        assert!(!err.is_storage_unavailable());
        assert_eq!(err.to_string(), "record 7 not found in banners");
    }

    #[test]
    fn storage_unavailable_through_reorder_failure() {
        let err = Error::ReorderPersistFailed {
            persisted: 1,
            total: 3,
            source: Box::new(StorageError::Blocked.into()),
        };
        assert!(err.is_storage_unavailable());
        assert!(err.is_recoverable());
    }

    #[test]
    fn io_errors_map_to_storage_unavailable() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io.into();
        assert!(err.is_storage_unavailable());
    }
}
