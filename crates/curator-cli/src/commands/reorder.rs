//! Move command implementation.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Args;

use curator_core::{ReorderCoordinator, ReorderOutcome, StatusFilter};

use crate::output;
use crate::settings::Settings;

#[derive(Args, Debug)]
pub struct MoveArgs {
    /// Collection name
    pub collection: String,

    /// Current display position (1-based)
    pub from: usize,

    /// Target display position (1-based)
    pub to: usize,

    /// Positions refer to the active-only view
    #[arg(long, conflicts_with = "inactive")]
    pub active: bool,

    /// Positions refer to the inactive-only view
    #[arg(long)]
    pub inactive: bool,
}

pub async fn run(args: MoveArgs, settings: &Settings) -> Result<()> {
    if args.from == 0 || args.to == 0 {
        bail!("Display positions start at 1");
    }

    let repo = settings.repository(&args.collection).await?;
    if !repo.is_available() {
        bail!("Store is unavailable; nothing to reorder");
    }

    let coordinator = ReorderCoordinator::new(Arc::new(repo));
    let filter = StatusFilter::from_flags(args.active, args.inactive);
    coordinator
        .refresh(filter)
        .await
        .context("Failed to load collection")?;

    let outcome = coordinator
        .reorder(args.from - 1, args.to - 1)
        .await
        .context("Failed to move record")?;

    match outcome {
        ReorderOutcome::Unchanged => {
            output::warning("Record is already at that position");
        }
        ReorderOutcome::Moved { order, persisted } => {
            for (index, key) in order.iter().enumerate() {
                println!("{:>3}. {}", index + 1, key);
            }
            output::success(&format!(
                "Moved {} to {} ({} positions written)",
                args.from, args.to, persisted
            ));
        }
    }

    Ok(())
}
