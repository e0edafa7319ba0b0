use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use weft_core::store::{GraphStore, SqliteStore};

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Workspace directory (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

pub async fn run(args: StatusArgs) -> anyhow::Result<()> {
    let root = super::require_workspace(&args.path)?;

    let db_path = super::resolve_db_path(&root);
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("Cannot open database: {}", db_path.display()))?;

    let stats = store.stats().await.context("Failed to read store stats")?;

    println!("Weft status for {}", root.display());
    println!();
    println!("  Database: {}", db_path.display());
    if stats.db_size_bytes > 0 {
        println!("  Size:     {}", format_bytes(stats.db_size_bytes));
    }
    println!();

    println!("  Nodes: {} total", stats.total_nodes);
    if !stats.nodes_by_source.is_empty() {
        let mut sources: Vec<_> = stats.nodes_by_source.iter().collect();
        sources.sort_by(|a, b| b.1.cmp(a.1));
        for (source, count) in &sources {
            println!("    {source:<24} {count:>6}");
        }
    }
    println!();

    println!("  Edges:     {}", stats.total_edges);
    println!("  Snapshots: {}", stats.total_snapshots);
    println!("  Diffs:     {}", stats.total_diffs);

    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
