//! Subcommand implementations.

mod create;
mod delete;
mod export_asset;
mod get;
mod import;
mod input;
mod list;
mod reorder;
mod schema;
mod toggle;
mod update;

use anyhow::Result;
use clap::Subcommand;

use crate::settings::Settings;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the declared stores and the on-disk versions
    Schema(schema::SchemaArgs),

    /// Create a record at the end of a collection
    Create(create::CreateArgs),

    /// List a collection in display order
    List(list::ListArgs),

    /// Print one record as JSON
    Get(get::GetArgs),

    /// Update fields, asset or attribution of a record
    Update(update::UpdateArgs),

    /// Activate or deactivate a record
    Toggle(toggle::ToggleArgs),

    /// Delete a record
    Delete(delete::DeleteArgs),

    /// Move a record to another display position
    Move(reorder::MoveArgs),

    /// Write a record's asset to a file
    ExportAsset(export_asset::ExportAssetArgs),

    /// Store records fetched from the remote API as they are
    Import(import::ImportArgs),
}

pub async fn handle(command: Commands, settings: Settings) -> Result<()> {
    match command {
        Commands::Schema(args) => schema::run(args, &settings).await,
        Commands::Create(args) => create::run(args, &settings).await,
        Commands::List(args) => list::run(args, &settings).await,
        Commands::Get(args) => get::run(args, &settings).await,
        Commands::Update(args) => update::run(args, &settings).await,
        Commands::Toggle(args) => toggle::run(args, &settings).await,
        Commands::Delete(args) => delete::run(args, &settings).await,
        Commands::Move(args) => reorder::run(args, &settings).await,
        Commands::ExportAsset(args) => export_asset::run(args, &settings).await,
        Commands::Import(args) => import::run(args, &settings).await,
    }
}
