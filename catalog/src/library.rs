use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use wardrobe_color::{median_lab, Lab, Rgb};

use crate::catalog::Catalog;
use crate::error::CatalogError;
use crate::fusion::fuse;
use crate::types::{ItemMetadata, LibraryConfig};

/// File extensions picked up by [`index_directory`] (case-insensitive).
pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "webp"];

pub type EncodeResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Output of encoding one library image.
#[derive(Debug, Clone, Default)]
pub struct EncodedImage {
    pub embedding: Vec<f32>,
    /// Pixels used for the item color. May be empty.
    pub pixels: Vec<Rgb>,
}

/// Turns library images and descriptions into embeddings.
pub trait ItemEncoder {
    fn encode_image(&self, path: &Path) -> EncodeResult<EncodedImage>;
    fn encode_text(&self, text: &str) -> EncodeResult<Vec<f32>>;
}

#[derive(Debug, Default)]
pub struct LibraryReport {
    /// Images found under the dataset directory.
    pub found: usize,
    /// Items stored in the catalog.
    pub indexed: usize,
    /// Images the encoder could not handle.
    pub failed: Vec<PathBuf>,
    /// Encoded items the index refused (wrong dimension, zero vector).
    pub rejected: usize,
}

/// Indexes every image under `cfg.dataset_directory` into the catalog.
///
/// Descriptions and categories come from the optional metadata JSON,
/// keyed by file name. Items with a description get a fused image/text
/// embedding. An untrained index is trained on the batch. Files that
/// fail to encode are logged and skipped. A missing dataset directory is
/// created and nothing is indexed.
pub fn index_directory(
    catalog: &Catalog,
    cfg: &LibraryConfig,
    encoder: &dyn ItemEncoder,
) -> Result<LibraryReport, CatalogError> {
    if !cfg.dataset_directory.exists() {
        fs::create_dir_all(&cfg.dataset_directory)?;
        warn!(
            dir = %cfg.dataset_directory.display(),
            "library: dataset directory missing, created empty"
        );
        return Ok(LibraryReport::default());
    }

    let metadata = load_metadata(&cfg.metadata_path())?;

    let mut files = Vec::new();
    collect_images(&cfg.dataset_directory, &mut files)?;
    info!(
        dir = %cfg.dataset_directory.display(),
        images = files.len(),
        described = metadata.len(),
        "library: indexing"
    );

    let mut report = LibraryReport {
        found: files.len(),
        ..Default::default()
    };
    let mut embeddings = Vec::with_capacity(files.len());
    let mut items = Vec::with_capacity(files.len());

    for path in files {
        let image = match encoder.encode_image(&path) {
            Ok(image) => image,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "library: encode failed, skipping");
                report.failed.push(path);
                continue;
            }
        };

        let mut item = ItemMetadata::new(path.to_string_lossy());
        if let Some(fields) = metadata.get(&item.filename) {
            apply_fields(&mut item, fields);
        }
        item.color_lab = item_color(&image.pixels);

        let embedding = if item.description.is_empty() {
            image.embedding
        } else {
            describe(encoder, &item, image.embedding, cfg.image_weight)
        };

        embeddings.push(embedding);
        items.push(item);
    }

    if items.is_empty() {
        return Ok(report);
    }

    let refs: Vec<&[f32]> = embeddings.iter().map(Vec::as_slice).collect();
    let added = catalog.ingest(&refs, items)?;
    report.indexed = added.accepted();
    report.rejected = added.rejected.len();

    info!(
        indexed = report.indexed,
        failed = report.failed.len(),
        rejected = report.rejected,
        total = catalog.len(),
        "library: done"
    );
    Ok(report)
}

/// Fuses the image embedding with the description's text embedding.
/// Falls back to the image embedding alone if the text cannot be used.
fn describe(encoder: &dyn ItemEncoder, item: &ItemMetadata, image: Vec<f32>, weight: f32) -> Vec<f32> {
    let text = match encoder.encode_text(&item.description) {
        Ok(text) => text,
        Err(e) => {
            warn!(file = %item.filename, error = %e, "library: text encode failed, using image only");
            return image;
        }
    };
    match fuse(&image, &text, weight) {
        Ok(fused) => fused,
        Err(e) => {
            warn!(file = %item.filename, error = %e, "library: cannot fuse, using image only");
            image
        }
    }
}

fn item_color(pixels: &[Rgb]) -> Option<Lab> {
    let labs: Vec<Lab> = pixels.iter().map(Rgb::to_lab).collect();
    median_lab(&labs)
}

fn apply_fields(item: &mut ItemMetadata, fields: &Map<String, Value>) {
    for (key, value) in fields {
        match (key.as_str(), value) {
            ("description", Value::String(s)) => item.description = s.clone(),
            ("category", Value::String(s)) => item.category = Some(s.to_lowercase()),
            // Identity and color are derived here, not taken from the file.
            ("id" | "path" | "filename" | "color_lab", _) => {}
            _ => {
                item.extra.insert(key.clone(), value.clone());
            }
        }
    }
}

fn load_metadata(path: &Path) -> Result<BTreeMap<String, Map<String, Value>>, CatalogError> {
    if !path.is_file() {
        debug!(path = %path.display(), "library: no metadata file");
        return Ok(BTreeMap::new());
    }
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

fn collect_images(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    let mut entries = fs::read_dir(dir)?
        .map(|e| e.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
    entries.sort();
    for path in entries {
        if path.is_dir() {
            collect_images(&path, out)?;
        } else if is_image(&path) {
            out.push(path);
        }
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|x| x.eq_ignore_ascii_case(ext)))
}
