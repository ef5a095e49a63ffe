//! Resolves command-line flags into store configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;

use curator_core::view::ViewOptions;
use curator_core::{CollectionName, SchemaRegistry, StatusFilter};
use curator_file::{FileRepository, StoreConfig};

use crate::cli::StoreArgs;

const MIB: u64 = 1024 * 1024;

/// Everything a command needs to reach the store.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: StoreConfig,
    pub registry: SchemaRegistry,
    pub utc_offset_minutes: i32,
}

impl Settings {
    pub fn from_args(args: &StoreArgs) -> Result<Self> {
        let root = match &args.data_dir {
            Some(dir) => dir.clone(),
            None => default_data_dir()?,
        };

        let config = StoreConfig::new(root, &args.database)
            .with_max_asset_bytes(args.max_asset_mb.map(|mb| mb.saturating_mul(MIB)));
        let registry = SchemaRegistry::builtin().with_database(&args.database);

        Ok(Self {
            config,
            registry,
            utc_offset_minutes: args.utc_offset,
        })
    }

    /// Open the repository for a collection named on the command line.
    pub async fn repository(&self, collection: &str) -> Result<FileRepository> {
        let collection = CollectionName::new(collection).context("Invalid collection name")?;
        FileRepository::open(&self.config, &self.registry, &collection)
            .await
            .with_context(|| format!("Unknown collection '{}'", collection))
    }

    pub fn view_options(&self, filter: StatusFilter) -> ViewOptions {
        ViewOptions::new(filter).with_offset_minutes(self.utc_offset_minutes)
    }
}

fn default_data_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "curator").context("Could not determine data directory")?;
    Ok(dirs.data_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn megabytes_become_bytes() {
        let args = StoreArgs {
            data_dir: Some(PathBuf::from("/srv/curator")),
            database: "staging".to_string(),
            max_asset_mb: Some(2),
            utc_offset: 60,
        };
        let settings = Settings::from_args(&args).unwrap();
        assert_eq!(settings.config.max_asset_bytes(), Some(2 * MIB));
        assert_eq!(settings.config.database_dir(), PathBuf::from("/srv/curator/staging"));
        assert_eq!(settings.registry.database(), "staging");
        assert_eq!(settings.view_options(StatusFilter::All).offset.local_minus_utc(), 3600);
    }
}
