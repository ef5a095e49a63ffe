//! Core identifier types.
//!
//! These types enforce their invariants at construction time,
//! ensuring invalid states are unrepresentable.

mod collection;
mod record_key;

pub use collection::CollectionName;
pub use record_key::RecordKey;
