//! Toggle command implementation.

use anyhow::{Context, Result};
use clap::{ArgGroup, Args};

use curator_core::Repository;

use crate::output;
use crate::settings::Settings;

use super::input;

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("state").required(true).args(["on", "off"])))]
pub struct ToggleArgs {
    /// Collection name
    pub collection: String,

    /// Record key
    pub key: String,

    /// Mark the record active
    #[arg(long)]
    pub on: bool,

    /// Mark the record inactive
    #[arg(long)]
    pub off: bool,
}

pub async fn run(args: ToggleArgs, settings: &Settings) -> Result<()> {
    let repo = settings.repository(&args.collection).await?;
    let key = input::parse_key(&repo, &args.key)?;

    let record = repo
        .toggle_status(&key, args.on)
        .await
        .context("Failed to change status")?;

    let state = if record.status { "active" } else { "inactive" };
    output::success(&format!("Record {} is now {}", key, state));

    Ok(())
}
