//! Import command implementation.

use anyhow::{Context, Result};
use clap::Args;

use curator_core::{ContentRecord, Repository};

use crate::output;
use crate::settings::Settings;

use super::input;

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Collection name
    pub collection: String,

    /// JSON array of records as returned by the remote API (use - for stdin)
    pub file: String,
}

pub async fn run(args: ImportArgs, settings: &Settings) -> Result<()> {
    let repo = settings.repository(&args.collection).await?;
    let records: Vec<ContentRecord> = input::read_json(&args.file)?;

    let count = repo
        .adopt(records)
        .await
        .context("Failed to import records")?;

    output::success(&format!("Imported {} records into {}", count, args.collection));

    Ok(())
}
