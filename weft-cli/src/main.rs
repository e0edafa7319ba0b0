use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "weft",
    version,
    about = "Track scraped entities over time as a weighted co-occurrence graph"
)]
struct Cli {
    /// More output per occurrence (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Errors only
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: commands::Command,
}

/// Map a failure to the documented exit code by inspecting the rendered
/// error chain.
///
/// Exit codes:
///   0: success
///   1: general/unknown error
///   2: configuration or validation error
///   3: workspace not found / not initialized
///   4: database error
fn classify_exit_code(err: &anyhow::Error) -> i32 {
    let chain = format!("{err:#}").to_lowercase();
    let has = |needle: &str| chain.contains(needle);

    if has("not initialized") || has("cannot resolve path") {
        3
    } else if has("config") || has("invalid time range") {
        2
    } else if has("database") || has("sqlite") {
        4
    } else {
        1
    }
}

fn init_tracing(quiet: bool, verbose: u8) {
    let default_level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);

    let outcome = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime.block_on(commands::run(cli.command)),
        Err(e) => Err(anyhow::anyhow!("Failed to create runtime: {e}")),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {e:#}");
        std::process::exit(classify_exit_code(&e));
    }
}
