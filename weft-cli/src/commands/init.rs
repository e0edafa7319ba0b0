use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use weft_core::config::WeftConfig;
use weft_core::store::{GraphStore, SqliteStore};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Workspace directory (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite an existing config with the defaults
    #[arg(long)]
    pub force: bool,
}

pub async fn run(args: InitArgs) -> anyhow::Result<()> {
    let root = std::fs::canonicalize(&args.path)
        .with_context(|| format!("Cannot resolve path: {}", args.path.display()))?;

    let weft_dir = super::weft_dir(&root);
    let config_path = super::resolve_config_path(&root);
    if config_path.exists() && !args.force {
        anyhow::bail!(
            "Weft is already initialized in {}. Use --force to reset the config.",
            root.display()
        );
    }

    std::fs::create_dir_all(&weft_dir)
        .with_context(|| format!("Cannot create {}", weft_dir.display()))?;

    let rendered =
        toml::to_string_pretty(&WeftConfig::default()).context("Cannot render default config")?;
    std::fs::write(&config_path, rendered)
        .with_context(|| format!("Cannot write {}", config_path.display()))?;

    // Opening the store creates the database and applies the schema.
    let db_path = super::resolve_db_path(&root);
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("Cannot open database: {}", db_path.display()))?;
    let stats = store.stats().await.context("Failed to read store stats")?;

    println!("Initialized Weft workspace in {}", weft_dir.display());
    println!("  Config:   {}", config_path.display());
    println!("  Database: {} ({} nodes)", db_path.display(), stats.total_nodes);
    Ok(())
}
