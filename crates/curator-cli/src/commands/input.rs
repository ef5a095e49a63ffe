//! Shared argument parsing helpers.

use std::io::{self, Read};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use curator_core::RecordKey;
use curator_file::FileRepository;

/// Read JSON from a file, or from stdin when `source` is `-`.
pub fn read_json<T: DeserializeOwned>(source: &str) -> Result<T> {
    if source == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read from stdin")?;
        serde_json::from_str(&buf).context("Invalid JSON from stdin")
    } else {
        let content = std::fs::read_to_string(source)
            .with_context(|| format!("Failed to read JSON file {}", source))?;
        serde_json::from_str(&content).context("Invalid JSON in file")
    }
}

/// Parse a key typed on the command line for this repository's store.
pub fn parse_key(repo: &FileRepository, key: &str) -> Result<RecordKey> {
    RecordKey::parse(key, repo.schema().key_policy).context("Invalid record key")
}
