//! curator-file - Filesystem-backed embedded database for the curator content store.
//!
//! A database is a directory holding a manifest and one JSON file per
//! store. [`Gateway`] opens and upgrades it against a
//! [`SchemaRegistry`](curator_core::SchemaRegistry) and caches the handle;
//! [`FileRepository`] implements the collection operations on top.

mod config;
mod engine;
mod gateway;
mod repository;
mod store;
mod upgrade;

pub use config::StoreConfig;
pub use engine::Database;
pub use gateway::Gateway;
pub use repository::FileRepository;
pub use store::{Manifest, StoreData, StoreManifest};
