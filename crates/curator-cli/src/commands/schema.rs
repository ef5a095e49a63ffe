//! Schema command implementation.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde_json::json;

use curator_file::Gateway;

use crate::output;
use crate::settings::Settings;

#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Print the registry and manifest as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: SchemaArgs, settings: &Settings) -> Result<()> {
    let registry = &settings.registry;
    let opened = Gateway::open(&settings.config, registry).await;

    if args.json {
        let stores: Vec<_> = registry
            .stores()
            .iter()
            .map(|s| {
                json!({
                    "collection": s.collection.as_str(),
                    "store": s.store_name,
                    "keyPolicy": s.key_policy,
                    "indexes": s.indexes,
                    "assetTypes": s.assets.allowed_types(),
                    "maxAssetBytes": settings.config.asset_policy(s).max_bytes(),
                })
            })
            .collect();
        let manifest = match &opened {
            Ok(db) => serde_json::to_value(db.manifest())?,
            Err(e) => json!({ "unavailable": e.to_string() }),
        };
        return output::json_pretty(&json!({
            "database": registry.database(),
            "registryVersion": registry.version(),
            "stores": stores,
            "manifest": manifest,
        }));
    }

    output::field("Database", registry.database());
    output::field("Registry version", &registry.version().to_string());
    match &opened {
        Ok(db) => {
            output::field("Location", &db.path().display().to_string());
            output::field("Engine version", &db.version().to_string());
            output::field("Schema version", &db.manifest().schema_version.to_string());
        }
        Err(e) => output::warning(&format!("Store unavailable: {}", e)),
    }

    for store in registry.stores() {
        println!();
        println!(
            "{} {}",
            store.collection.as_str().bold(),
            format!("(store {}, {} keys)", store.store_name, store.key_policy).dimmed()
        );
        for index in &store.indexes {
            let unique = if index.unique { " unique" } else { "" };
            println!("  index {} on {}{}", index.name, index.field, unique.yellow());
        }
        let policy = settings.config.asset_policy(store);
        println!(
            "  assets {} up to {} bytes",
            policy.allowed_types().join(", "),
            policy.max_bytes()
        );
    }

    Ok(())
}
