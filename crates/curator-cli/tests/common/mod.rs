use std::path::Path;
use std::process::{Command, Output};

/// Run the CLI binary against an isolated data directory.
pub fn run_cli(args: &[&str], data_dir: &Path) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_curator"));
    cmd.args(args);
    cmd.env("CURATOR_DATA_DIR", data_dir);
    cmd.env("NO_COLOR", "1");
    cmd.env_remove("CURATOR_DATABASE");
    cmd.env_remove("CURATOR_MAX_ASSET_MB");
    cmd.env_remove("CURATOR_UTC_OFFSET");
    cmd.env_remove("RUST_LOG");
    cmd.output().expect("Failed to execute CLI")
}

/// Run the CLI and expect success.
pub fn run_cli_success(args: &[&str], data_dir: &Path) -> String {
    let output = run_cli(args, data_dir);
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Parse `list --json` output into one value per row.
pub fn list_rows(args: &[&str], data_dir: &Path) -> Vec<serde_json::Value> {
    run_cli_success(args, data_dir)
        .lines()
        .map(|line| serde_json::from_str(line).expect("Row is not JSON"))
        .collect()
}
