//! Utility functions for CLI commands.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::de::DeserializeOwned;
use wardrobe_color::{Lab, Rgb};
use wardrobe_overlay::Config;

use crate::Cli;

/// Gets the global configuration.
pub fn get_config(cli: &Cli) -> anyhow::Result<Config> {
    let path = cli.config.as_deref().map(Path::new);
    Config::load_or_default(path).context("failed to load config")
}

/// Path of the config file in use: `--config`, or the default location.
pub fn config_path(cli: &Cli) -> anyhow::Result<PathBuf> {
    match cli.config.as_deref() {
        Some(p) => Ok(PathBuf::from(p)),
        None => Config::default_path()
            .ok_or_else(|| anyhow::anyhow!("cannot determine home directory, use --config")),
    }
}

/// Loads a request from a YAML or JSON file.
pub fn load_request<T: DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("yaml");

    let result = match ext.to_lowercase().as_str() {
        "json" => serde_json::from_str(&content)?,
        _ => serde_yaml::from_str(&content)?,
    };

    Ok(result)
}

/// Reads a JSON Lines file. Blank lines are skipped; a malformed line
/// fails with its line number.
pub fn read_jsonl<T: DeserializeOwned>(path: &str) -> anyhow::Result<Vec<T>> {
    let file = File::open(path).with_context(|| format!("failed to open {path}"))?;
    let mut out = Vec::new();
    for (n, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let value = serde_json::from_str(&line)
            .with_context(|| format!("{path}:{}: invalid record", n + 1))?;
        out.push(value);
    }
    Ok(out)
}

/// Outputs result as JSON or YAML.
pub fn output_result<T: serde::Serialize>(
    result: &T,
    output_path: Option<&str>,
    as_json: bool,
) -> anyhow::Result<()> {
    let output = if as_json {
        serde_json::to_string_pretty(result)? + "\n"
    } else {
        serde_yaml::to_string(result)?
    };

    match output_path {
        Some(path) => std::fs::write(path, output)?,
        None => print!("{}", output),
    }

    Ok(())
}

/// Opens the output file, or stdout.
pub fn output_writer(output_path: Option<&str>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match output_path {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {path}"))?,
        )),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    })
}

/// Parses a color given as `#rrggbb` or as `L,a,b`.
pub fn parse_color(s: &str) -> Result<Lab, String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(format!("invalid hex color {s:?}, want #rrggbb"));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| format!("invalid hex color {s:?}, want #rrggbb"))
        };
        return Ok(Rgb(channel(0)?, channel(2)?, channel(4)?).to_lab());
    }

    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("invalid color {s:?}, want #rrggbb or L,a,b"));
    }
    let mut v = [0.0f32; 3];
    for (slot, p) in v.iter_mut().zip(parts) {
        *slot = p
            .parse()
            .map_err(|_| format!("invalid color component {p:?}"))?;
    }
    Ok(Lab::from(v))
}

/// Prints success message.
pub fn print_success(msg: &str) {
    eprintln!("\x1b[32m✓\x1b[0m {}", msg);
}

/// Prints warning message.
pub fn print_warning(msg: &str) {
    eprintln!("\x1b[33m⚠\x1b[0m {}", msg);
}
