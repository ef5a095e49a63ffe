//! Export-asset command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;

use curator_core::{Repository, asset};

use crate::output;
use crate::settings::Settings;

use super::input;

#[derive(Args, Debug)]
pub struct ExportAssetArgs {
    /// Collection name
    pub collection: String,

    /// Record key
    pub key: String,

    /// Output file
    pub out: PathBuf,
}

pub async fn run(args: ExportAssetArgs, settings: &Settings) -> Result<()> {
    let repo = settings.repository(&args.collection).await?;
    let key = input::parse_key(&repo, &args.key)?;

    let record = repo
        .get_one(&key)
        .await
        .context("Failed to get record")?;
    let Some(encoded) = record.asset.as_ref() else {
        bail!("Record {} has no asset", key);
    };

    let filename = format!("{}.{}", key, asset::extension_for(encoded.mime()));
    let handle = asset::decode(encoded, filename).context("Stored asset is malformed")?;
    std::fs::write(&args.out, &handle.bytes)
        .with_context(|| format!("Failed to write {}", args.out.display()))?;

    output::success(&format!(
        "Wrote {} as {} ({}, {} bytes)",
        args.out.display(),
        handle.filename,
        handle.mime,
        handle.bytes.len()
    ));

    Ok(())
}
