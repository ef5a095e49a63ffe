//! Create command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use curator_core::{NewRecord, Payload, RawAsset, Repository};

use crate::output;
use crate::settings::Settings;

use super::input;

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Collection name (e.g., banners)
    pub collection: String,

    /// Record key, for collections with caller-assigned keys
    #[arg(long)]
    pub key: Option<String>,

    /// JSON file with the record fields (use - for stdin)
    #[arg(long)]
    pub json: Option<String>,

    /// File to attach as the record's asset
    #[arg(long)]
    pub asset: Option<PathBuf>,

    /// Create the record as active
    #[arg(long)]
    pub active: bool,

    /// Name recorded as the author
    #[arg(long, default_value = "")]
    pub by: String,
}

pub async fn run(args: CreateArgs, settings: &Settings) -> Result<()> {
    let repo = settings.repository(&args.collection).await?;

    let fields = match &args.json {
        Some(source) => {
            let value: Value = input::read_json(source)?;
            Payload::new(value).context("Invalid record fields")?
        }
        None => Payload::empty(),
    };

    let mut record = NewRecord::new(fields)
        .with_status(args.active)
        .created_by(&args.by);
    if let Some(key) = args.key {
        record = record.with_key(key);
    }
    if let Some(path) = &args.asset {
        record = record.with_asset(RawAsset::from_path(path).context("Failed to read asset")?);
    }

    let key = repo
        .create(record)
        .await
        .context("Failed to create record")?;

    println!("{}", key);
    output::success(&format!("Created record {} in {}", key, args.collection));

    Ok(())
}
