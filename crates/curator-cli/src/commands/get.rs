//! Get command implementation.

use anyhow::{Context, Result};
use clap::Args;

use curator_core::Repository;

use crate::output;
use crate::settings::Settings;

use super::input;

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Collection name
    pub collection: String,

    /// Record key
    pub key: String,
}

pub async fn run(args: GetArgs, settings: &Settings) -> Result<()> {
    let repo = settings.repository(&args.collection).await?;
    let key = input::parse_key(&repo, &args.key)?;

    let record = repo
        .get_one(&key)
        .await
        .context("Failed to get record")?;

    output::json_pretty(&record)?;

    Ok(())
}
