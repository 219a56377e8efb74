//! Catalog query command.

use std::path::Path;

use clap::Args;
use wardrobe_catalog::{RerankQuery, SnapshotPaths};
use wardrobe_color::Lab;

use super::{get_config, load_request, output_result, parse_color, print_warning};
use crate::Cli;

/// Find catalog items similar to a query embedding.
///
/// The query file holds a single JSON or YAML array of floats. Passing a
/// category or color re-ranks an over-fetched candidate set the same way
/// live garment lookups do.
#[derive(Args)]
pub struct SearchCommand {
    /// Query embedding file (JSON or YAML array)
    #[arg(short = 'q', long)]
    query: String,

    /// Snapshot base path
    #[arg(long, default_value = "catalog")]
    catalog: String,

    /// Number of results (default from config)
    #[arg(short = 'k', long)]
    top_k: Option<usize>,

    /// Garment category used for re-ranking (e.g. top, bottom)
    #[arg(long)]
    category: Option<String>,

    /// Garment color used for re-ranking, as #rrggbb or L,a,b
    #[arg(long, value_parser = parse_color)]
    color: Option<Lab>,
}

impl SearchCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let base = Path::new(&self.catalog);
        if !SnapshotPaths::new(base).exist() {
            anyhow::bail!("no catalog snapshot at {}", base.display());
        }
        let catalog = cfg.open_catalog(base)?;
        if catalog.is_empty() {
            print_warning("catalog is empty");
        }

        let query: Vec<f32> = load_request(&self.query)?;

        let mut search = cfg.search.clone();
        if let Some(k) = self.top_k {
            search.top_k = k;
        }
        let garment = RerankQuery {
            category: self.category.clone(),
            color: self.color,
        };

        let results = catalog.find_similar(&query, Some(&garment), &search)?;
        output_result(&results, cli.output.as_deref(), cli.json)
    }
}
