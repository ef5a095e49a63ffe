//! Core traits for collection storage and the remote content source.

mod remote;
mod repository;

pub use remote::{RemoteContent, get_or_adopt};
pub use repository::Repository;
