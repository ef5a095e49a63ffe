//! List command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use curator_core::view::{
    self, BannerDetail, GenericDetail, MagazineDetail, MultimediaDetail, NewsDetail, Row, RowDetail,
    ViewOptions,
};
use curator_core::{ContentRecord, Repository, StatusFilter};

use crate::output;
use crate::settings::Settings;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Collection name
    pub collection: String,

    /// Only active records
    #[arg(long, conflicts_with = "inactive")]
    pub active: bool,

    /// Only inactive records
    #[arg(long)]
    pub inactive: bool,

    /// Print rows as JSON lines
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: ListArgs, settings: &Settings) -> Result<()> {
    let repo = settings.repository(&args.collection).await?;
    if !repo.is_available() {
        output::warning("Store is unavailable; showing an empty list");
    }

    let filter = StatusFilter::from_flags(args.active, args.inactive);
    let records = repo
        .get_all(filter)
        .await
        .context("Failed to list records")?;
    let options = settings.view_options(filter);

    match repo.collection().as_str() {
        "banners" => print_rows::<BannerDetail>(&records, &options, args.json),
        "news" => print_rows::<NewsDetail>(&records, &options, args.json),
        "magazines" => print_rows::<MagazineDetail>(&records, &options, args.json),
        "multimedia" => print_rows::<MultimediaDetail>(&records, &options, args.json),
        _ => print_rows::<GenericDetail>(&records, &options, args.json),
    }
}

fn print_rows<D: RowDetail>(
    records: &[ContentRecord],
    options: &ViewOptions,
    json: bool,
) -> Result<()> {
    let rows: Vec<Row<D>> = view::project(records, options);

    if rows.is_empty() {
        eprintln!("{}", "No records found.".dimmed());
        return Ok(());
    }

    for row in &rows {
        if json {
            output::json(row)?;
        } else {
            let marker = if row.status {
                "●".green()
            } else {
                "○".dimmed()
            };
            println!(
                "{:>3}. {} {}  {}  {} {}",
                row.display_position,
                marker,
                row.key.to_string().bold(),
                row.detail.title().unwrap_or("(untitled)"),
                row.updated.date.dimmed(),
                row.updated.time.dimmed(),
            );
        }
    }

    Ok(())
}
