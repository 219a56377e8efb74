//! Observation replay command.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use clap::Args;
use serde::Deserialize;
use tracing::info;
use wardrobe_overlay::{Observation, Session};

use super::{get_config, output_writer, read_jsonl};
use crate::Cli;

/// Replay recorded segmenter output through a tracking session.
///
/// The input is JSON Lines with one frame per record:
///
///   {"width": 640, "height": 480, "observations": [{"bbox": [...], "label": "short_sleeve_top", "color": [53, 80, 67], "embedding": [...]}]}
///
/// One frame report is written per input frame, as JSON Lines.
#[derive(Args)]
pub struct ReplayCommand {
    /// Frames file (JSON Lines)
    #[arg(short = 'i', long)]
    input: String,

    /// Snapshot base path; an empty catalog is used if none exists
    #[arg(long, default_value = "catalog")]
    catalog: String,

    /// Only write frames that report at least one garment
    #[arg(long)]
    skip_empty: bool,
}

#[derive(Deserialize)]
struct FrameRecord {
    width: u32,
    height: u32,
    #[serde(default)]
    observations: Vec<Observation>,
}

impl ReplayCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let catalog = Arc::new(cfg.open_catalog(Path::new(&self.catalog))?);
        let mut session = Session::new(cfg, catalog);

        let frames: Vec<FrameRecord> = read_jsonl(&self.input)?;
        let mut out = output_writer(cli.output.as_deref())?;
        for f in &frames {
            let report = session.process_observations(f.width, f.height, &f.observations);
            if self.skip_empty && report.garments.is_empty() {
                continue;
            }
            serde_json::to_writer(&mut out, &report)?;
            writeln!(out)?;
        }
        out.flush()?;

        let stats = session.stats();
        info!(
            frames = stats.frames,
            persons = stats.persons,
            garments = stats.garments,
            stable = stats.stable_garments,
            catalog_items = stats.catalog_items,
            "replay: done"
        );
        Ok(())
    }
}
