//! Delete command implementation.

use anyhow::{Context, Result};
use clap::Args;

use curator_core::Repository;

use crate::output;
use crate::settings::Settings;

use super::input;

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Collection name
    pub collection: String,

    /// Record key
    pub key: String,
}

pub async fn run(args: DeleteArgs, settings: &Settings) -> Result<()> {
    let repo = settings.repository(&args.collection).await?;
    let key = input::parse_key(&repo, &args.key)?;

    repo.delete(&key)
        .await
        .context("Failed to delete record")?;

    output::success(&format!("Deleted record {}", key));

    Ok(())
}
