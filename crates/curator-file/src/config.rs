//! Store configuration.

use std::path::{Path, PathBuf};

use curator_core::schema::StoreSchema;
use curator_core::AssetPolicy;

/// Where a database lives and how it is constrained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    root: PathBuf,
    database: String,
    max_asset_bytes: Option<u64>,
}

impl StoreConfig {
    /// A database named `database` under `root`.
    pub fn new(root: impl AsRef<Path>, database: impl Into<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            database: database.into(),
            max_asset_bytes: None,
        }
    }

    /// Set a global asset ceiling. It only ever lowers a collection's own
    /// ceiling.
    pub fn with_max_asset_bytes(mut self, max: Option<u64>) -> Self {
        self.max_asset_bytes = max;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn max_asset_bytes(&self) -> Option<u64> {
        self.max_asset_bytes
    }

    /// The database directory.
    pub fn database_dir(&self) -> PathBuf {
        self.root.join(&self.database)
    }

    /// The effective asset policy for a store.
    pub fn asset_policy(&self, schema: &StoreSchema) -> AssetPolicy {
        schema.assets.clone().capped_at(self.max_asset_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curator_core::{CollectionName, SchemaRegistry};

    #[test]
    fn global_ceiling_tightens_policy() {
        let registry = SchemaRegistry::builtin();
        let banners = registry
            .lookup(&CollectionName::new("banners").unwrap())
            .unwrap();

        let config = StoreConfig::new("/tmp/x", "content").with_max_asset_bytes(Some(1024));
        assert_eq!(config.asset_policy(banners).max_bytes(), 1024);
        assert_eq!(config.database_dir(), PathBuf::from("/tmp/x/content"));

        let config = StoreConfig::new("/tmp/x", "content");
        assert_eq!(config.asset_policy(banners).max_bytes(), 10 * 1024 * 1024);
    }
}
