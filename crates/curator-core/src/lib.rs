//! curator-core - Content record types, schema registry and collection logic.
//!
//! Everything here is storage-agnostic. The embedded engine lives in
//! `curator-file`.

pub mod asset;
pub mod error;
pub mod record;
pub mod reorder;
pub mod schema;
pub mod traits;
pub mod types;
pub mod view;

#[cfg(test)]
mod testing;

pub use asset::{AssetPolicy, BinaryHandle, EncodedAsset, RawAsset};
pub use error::{AssetError, Error, InvalidInputError, StorageError};
pub use record::{
    AssetChange, ContentRecord, NewRecord, Payload, PreparedPatch, PreparedRecord, RecordPatch,
    StatusFilter,
};
pub use reorder::{ReorderCoordinator, ReorderOutcome, ReorderState};
pub use schema::{IndexSpec, KeyPolicy, SchemaRegistry, StoreSchema};
pub use traits::{RemoteContent, Repository, get_or_adopt};
pub use types::{CollectionName, RecordKey};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
