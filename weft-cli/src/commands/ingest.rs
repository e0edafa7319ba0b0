use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::Args;
use uuid::Uuid;

use weft_core::ingest::IngestPipeline;
use weft_core::store::SqliteStore;
use weft_core::types::SourceId;

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Source identifier the payload belongs to
    pub source: String,

    /// Scrape payload file (JSON); use `-` for stdin
    pub payload: PathBuf,

    /// Workspace directory (default: current directory)
    #[arg(long, default_value = ".")]
    pub path: PathBuf,

    /// Scrape-run id to tag diff records with (default: random)
    #[arg(long)]
    pub run_id: Option<Uuid>,
}

pub async fn run(args: IngestArgs) -> anyhow::Result<()> {
    let root = super::require_workspace(&args.path)?;
    let config = super::load_config(&root)?;

    let raw = if args.payload.as_os_str() == "-" {
        std::io::read_to_string(std::io::stdin()).context("Cannot read payload from stdin")?
    } else {
        std::fs::read_to_string(&args.payload)
            .with_context(|| format!("Cannot read payload: {}", args.payload.display()))?
    };
    let payload: serde_json::Value =
        serde_json::from_str(&raw).context("Payload is not valid JSON")?;

    let db_path = super::resolve_db_path(&root);
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("Cannot open database: {}", db_path.display()))?;

    let pipeline = IngestPipeline::new(&config);
    let source = SourceId::new(args.source);
    let run_id = args.run_id.unwrap_or_else(Uuid::new_v4);

    let report = pipeline
        .ingest(&store, &source, &payload, Some(run_id), Utc::now())
        .await?;

    println!("Ingested payload for {source}");
    println!("  Run:   {run_id}");
    println!("  Nodes: {}", report.nodes_processed);
    println!("  Edges: {}", report.edges_processed);
    println!(
        "  Diffs: {} new, {} changed, {} disappeared",
        report.diffs.new, report.diffs.changed, report.diffs.disappeared
    );
    Ok(())
}
