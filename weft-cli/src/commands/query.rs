use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use clap::Args;

use weft_core::query::{QueryResponse, TimeRange, query_graph};
use weft_core::store::SqliteStore;
use weft_core::types::SourceId;

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Time window: 1h, 6h, 24h, 7d, 30d
    #[arg(default_value = "24h")]
    pub range: TimeRange,

    /// Restrict results to one source
    #[arg(long)]
    pub source: Option<String>,

    /// Workspace directory (default: current directory)
    #[arg(long, default_value = ".")]
    pub path: PathBuf,

    /// Output format: summary, json
    #[arg(long, default_value = "summary")]
    pub format: String,

    /// Analytics budget in milliseconds before the response degrades
    #[arg(long, default_value_t = 5000)]
    pub timeout_ms: u64,
}

pub async fn run(args: QueryArgs) -> anyhow::Result<()> {
    let root = super::require_workspace(&args.path)?;

    let db_path = super::resolve_db_path(&root);
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("Cannot open database: {}", db_path.display()))?;

    let source = args.source.map(SourceId::new);
    let response = query_graph(
        &store,
        args.range,
        source.as_ref(),
        Duration::from_millis(args.timeout_ms),
        Utc::now(),
    )
    .await?;

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&response)?),
        _ => print_summary(&response),
    }
    Ok(())
}

fn print_summary(response: &QueryResponse) {
    let analytics = &response.analytics;
    let stats = &analytics.stats;

    println!("Graph for the last {}", response.meta.range);
    if let Some(source) = &response.meta.source {
        println!("  Source: {source}");
    }
    println!();
    println!("  Nodes in window: {} ({} returned)", stats.total_nodes, response.graph.nodes.len());
    println!("  Edges in window: {} ({} returned)", stats.total_edges, response.graph.edges.len());
    println!(
        "  Diffs: {} new, {} changed, {} disappeared",
        stats.diff_count.new, stats.diff_count.changed, stats.diff_count.disappeared
    );
    match stats.last_updated {
        Some(at) => println!("  Last update: {}", at.to_rfc3339()),
        None => println!("  Last update: (never)"),
    }

    if let Some(reason) = &analytics.error {
        println!();
        println!("  Analytics degraded: {reason}");
        return;
    }

    if !analytics.anomalies.is_empty() {
        println!();
        println!("  Anomalies ({} total):", stats.anomaly_count);
        for anomaly in analytics.anomalies.iter().take(5) {
            println!("    [{:>8}] {}", anomaly.severity, anomaly.description);
        }
    }

    if !analytics.hubs.is_empty() {
        println!();
        println!("  Hubs:");
        for hub in analytics.hubs.iter().take(5) {
            println!("    {:<44} degree {:>4}", hub.node.key, hub.degree);
        }
    }

    if !analytics.trends.is_empty() {
        println!();
        println!("  Trends:");
        for trend in analytics.trends.iter().take(5) {
            println!(
                "    {:<44} {:>9}  {:.2}/h",
                trend.node.key, trend.direction, trend.change_rate
            );
        }
    }
}
