//! Catalog building command.

use std::path::Path;

use clap::Args;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use wardrobe_catalog::{Catalog, ItemMetadata};

use super::{get_config, output_result, print_success, read_jsonl};
use crate::Cli;

/// Build or extend a catalog snapshot from precomputed embeddings.
///
/// The input is JSON Lines; each record holds an `embedding` array next to
/// the item's metadata fields:
///
///   {"embedding": [0.1, ...], "path": "shop/red_shirt.jpg", "category": "top"}
///
/// An untrained IVF index is trained on the first batch.
#[derive(Args)]
pub struct BuildCommand {
    /// Items file (JSON Lines)
    #[arg(short = 'i', long)]
    input: String,

    /// Snapshot base path; writes <catalog>.index and <catalog>.meta.json
    #[arg(long, default_value = "catalog")]
    catalog: String,

    /// Items per ingestion batch
    #[arg(long, default_value_t = 4096)]
    batch_size: usize,

    /// Ignore an existing snapshot and start empty
    #[arg(long)]
    fresh: bool,
}

#[derive(Deserialize)]
struct ItemRecord {
    embedding: Vec<f32>,
    #[serde(flatten)]
    item: ItemMetadata,
}

#[derive(Debug, Default, Serialize)]
struct BuildSummary {
    read: usize,
    indexed: usize,
    rejected: usize,
    total: usize,
    trained: bool,
}

impl BuildCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let base = Path::new(&self.catalog);

        let catalog = if self.fresh {
            Catalog::new(&cfg.index)
        } else {
            cfg.open_catalog(base)?
        };
        info!(
            catalog = %base.display(),
            existing = catalog.len(),
            dim = catalog.dim(),
            "build: opened catalog"
        );

        let records: Vec<ItemRecord> = read_jsonl(&self.input)?;
        let mut summary = BuildSummary {
            read: records.len(),
            ..Default::default()
        };

        let mut records = records.into_iter().peekable();
        while records.peek().is_some() {
            let (embeddings, items): (Vec<Vec<f32>>, Vec<ItemMetadata>) = records
                .by_ref()
                .take(self.batch_size.max(1))
                .map(|r| {
                    let mut item = r.item;
                    if item.filename.is_empty() {
                        item.filename = ItemMetadata::new(item.path.as_str()).filename;
                    }
                    (r.embedding, item)
                })
                .unzip();
            let refs: Vec<&[f32]> = embeddings.iter().map(Vec::as_slice).collect();
            let paths: Vec<String> = items.iter().map(|i| i.path.clone()).collect();

            let report = catalog.ingest(&refs, items)?;
            for r in &report.rejected {
                warn!(path = %paths[r.position], error = %r.error, "build: item rejected");
            }
            summary.indexed += report.accepted();
            summary.rejected += report.rejected.len();
        }

        summary.total = catalog.len();
        summary.trained = catalog.is_trained();
        catalog.save(base)?;

        print_success(&format!(
            "Indexed {} of {} items into {}",
            summary.indexed,
            summary.read,
            base.display()
        ));
        output_result(&summary, cli.output.as_deref(), cli.json)
    }
}
