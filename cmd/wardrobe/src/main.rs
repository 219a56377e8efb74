//! Wardrobe CLI - offline tooling for the garment catalog and tracker.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{BuildCommand, ConfigCommand, ReplayCommand, SearchCommand};

/// Wardrobe CLI - offline tooling for the garment catalog and tracker.
///
/// Embeddings are produced elsewhere; this tool consumes them as JSON:
///   - build: ingest item embeddings into a catalog snapshot
///   - search: query a snapshot, optionally re-ranked by garment attributes
///   - replay: run recorded per-frame observations through a tracking session
///
/// Configuration is read from ~/.wardrobe/config.yaml when present.
#[derive(Parser)]
#[command(name = "wardrobe")]
#[command(about = "Garment catalog and tracking CLI tool")]
#[command(version)]
pub struct Cli {
    /// Config file (default is ~/.wardrobe/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Output file (default: stdout)
    #[arg(short = 'o', long, global = true)]
    pub output: Option<String>,

    /// Output as JSON (for piping)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage CLI configuration
    Config(ConfigCommand),
    /// Build or extend a catalog snapshot
    Build(BuildCommand),
    /// Query a catalog snapshot
    Search(SearchCommand),
    /// Replay recorded observations through a tracking session
    Replay(ReplayCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match &cli.command {
        Commands::Config(cmd) => cmd.run(&cli),
        Commands::Build(cmd) => cmd.run(&cli),
        Commands::Search(cmd) => cmd.run(&cli),
        Commands::Replay(cmd) => cmd.run(&cli),
    }
}

/// `-v` forces debug; otherwise `RUST_LOG` applies, defaulting to info.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
