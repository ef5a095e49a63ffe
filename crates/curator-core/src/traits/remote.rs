//! Remote content source.

use async_trait::async_trait;
use tracing::debug;

use crate::Result;
use crate::record::ContentRecord;
use crate::types::{CollectionName, RecordKey};

use super::Repository;

/// A server-backed source of records, such as a news API.
///
/// Implementations live outside this workspace. Records they return are
/// stored unchanged.
#[async_trait]
pub trait RemoteContent: Send + Sync {
    async fn fetch_all(&self, collection: &CollectionName) -> Result<Vec<ContentRecord>>;

    async fn fetch_one(
        &self,
        collection: &CollectionName,
        key: &RecordKey,
    ) -> Result<Option<ContentRecord>>;
}

/// Read a record locally, or fetch it from `remote` and adopt it.
///
/// The repository never consults the remote source itself; a caller that
/// wants the fallback calls this.
pub async fn get_or_adopt<R, C>(
    repo: &R,
    remote: &C,
    key: &RecordKey,
) -> Result<Option<ContentRecord>>
where
    R: Repository + ?Sized,
    C: RemoteContent + ?Sized,
{
    if repo.exists(key).await? {
        return repo.get_one(key).await.map(Some);
    }

    debug!(collection = %repo.collection(), key = %key, "record not stored locally, fetching");
    match remote.fetch_one(repo.collection(), key).await? {
        Some(record) => {
            repo.adopt(vec![record.clone()]).await?;
            Ok(Some(record))
        }
        None => Ok(None),
    }
}
