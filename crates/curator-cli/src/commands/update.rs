//! Update command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use serde_json::Value;

use curator_core::{AssetChange, Payload, RawAsset, RecordPatch, Repository};

use crate::output;
use crate::settings::Settings;

use super::input;

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Collection name
    pub collection: String,

    /// Record key
    pub key: String,

    /// JSON file with fields to merge over the stored ones (use - for stdin)
    #[arg(long)]
    pub json: Option<String>,

    /// Replace the asset with this file
    #[arg(long, conflicts_with = "clear_asset")]
    pub asset: Option<PathBuf>,

    /// Remove the asset
    #[arg(long)]
    pub clear_asset: bool,

    /// Name recorded as the last editor
    #[arg(long)]
    pub by: Option<String>,
}

pub async fn run(args: UpdateArgs, settings: &Settings) -> Result<()> {
    let repo = settings.repository(&args.collection).await?;
    let key = input::parse_key(&repo, &args.key)?;

    let mut patch = RecordPatch::default();
    if let Some(source) = &args.json {
        let value: Value = input::read_json(source)?;
        patch = patch.with_fields(Payload::new(value).context("Invalid record fields")?);
    }
    if let Some(path) = &args.asset {
        let raw = RawAsset::from_path(path).context("Failed to read asset")?;
        patch = patch.with_asset(AssetChange::Replace(raw));
    } else if args.clear_asset {
        patch = patch.with_asset(AssetChange::Clear);
    }
    if let Some(name) = args.by {
        patch = patch.edited_by(name);
    }

    if patch.is_empty() {
        bail!("Nothing to update; pass --json, --asset, --clear-asset or --by");
    }

    repo.update(&key, patch)
        .await
        .context("Failed to update record")?;

    output::success(&format!("Updated record {} in {}", key, args.collection));

    Ok(())
}
