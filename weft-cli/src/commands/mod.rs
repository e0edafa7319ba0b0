pub mod ingest;
pub mod init;
pub mod query;
pub mod status;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Subcommand;

use weft_core::config::WeftConfig;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a Weft workspace (config and graph database under .weft/)
    Init(init::InitArgs),
    /// Ingest one scrape payload into the graph
    Ingest(ingest::IngestArgs),
    /// Query the graph and analytics for a time window
    Query(query::QueryArgs),
    /// Show current state of the graph store
    Status(status::StatusArgs),
}

pub async fn run(cmd: Command) -> anyhow::Result<()> {
    match cmd {
        Command::Init(args) => init::run(args).await,
        Command::Ingest(args) => ingest::run(args).await,
        Command::Query(args) => query::run(args).await,
        Command::Status(args) => status::run(args).await,
    }
}

/// The Weft state directory for a workspace root.
pub fn weft_dir(root: &Path) -> PathBuf {
    root.join(".weft")
}

/// Database location inside the state directory.
pub fn resolve_db_path(root: &Path) -> PathBuf {
    weft_dir(root).join("weft.db")
}

/// Config location inside the state directory.
pub fn resolve_config_path(root: &Path) -> PathBuf {
    weft_dir(root).join("config.toml")
}

/// Resolve the workspace root and require it to be initialized.
pub fn require_workspace(path: &Path) -> anyhow::Result<PathBuf> {
    let root = std::fs::canonicalize(path)
        .with_context(|| format!("Cannot resolve path: {}", path.display()))?;
    if !resolve_db_path(&root).exists() {
        anyhow::bail!(
            "Weft is not initialized in {}. Run `weft init` first.",
            root.display()
        );
    }
    Ok(root)
}

/// Load the workspace config, falling back to defaults when the file was
/// removed after init.
pub fn load_config(root: &Path) -> anyhow::Result<WeftConfig> {
    let config_path = resolve_config_path(root);
    if !config_path.exists() {
        return Ok(WeftConfig::default());
    }
    let content = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Cannot read config: {}", config_path.display()))?;
    WeftConfig::from_toml_str(&content)
        .with_context(|| format!("Cannot parse config: {}", config_path.display()))
}
