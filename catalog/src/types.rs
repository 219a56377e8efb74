use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use wardrobe_color::Lab;
use wardrobe_vecstore::{FlatIndex, IvfConfig, IvfIndex, VecIndex};

/// Metadata attached to one catalog entry.
///
/// Keys not covered by the named fields are kept in `extra` and written
/// back unchanged on save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemMetadata {
    /// Index-assigned id. Overwritten on insertion.
    #[serde(default)]
    pub id: u64,

    #[serde(default)]
    pub path: String,

    #[serde(default)]
    pub filename: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Coarse garment category ("top", "bottom", ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Representative CIE L*a*b* color of the item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_lab: Option<Lab>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ItemMetadata {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let filename = path.rsplit(['/', '\\']).next().unwrap_or_default().to_string();
        Self {
            path,
            filename,
            ..Default::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_color(mut self, color: Lab) -> Self {
        self.color_lab = Some(color);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A catalog match. `similarity` equals `base_score` until re-ranked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    #[serde(flatten)]
    pub item: ItemMetadata,

    /// Cosine similarity between query and item embedding.
    pub base_score: f32,

    /// Final score after category and color adjustments.
    pub similarity: f32,

    /// Delta E between the query garment and the item, when both have a
    /// color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_distance: Option<f32>,
}

impl QueryResult {
    pub fn new(item: ItemMetadata, base_score: f32) -> Self {
        Self {
            item,
            base_score,
            similarity: base_score,
            color_distance: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    Flat,
    #[default]
    Ivf,
}

/// Shape of the vector index created for an empty catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub kind: IndexKind,
    pub dim: usize,
    pub nlist: usize,
    pub nprobe: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            kind: IndexKind::Ivf,
            dim: 512,
            nlist: 100,
            nprobe: 10,
        }
    }
}

impl IndexConfig {
    /// Creates an empty index. Panics if `dim` is 0.
    pub fn build(&self) -> Box<dyn VecIndex> {
        match self.kind {
            IndexKind::Flat => Box::new(FlatIndex::new(self.dim)),
            IndexKind::Ivf => Box::new(IvfIndex::new(IvfConfig {
                dim: self.dim,
                nlist: self.nlist,
                nprobe: self.nprobe,
            })),
        }
    }
}

/// Score adjustments applied by [`crate::ReRanker`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankConfig {
    /// Multiplier for a case-insensitive category match.
    pub category_boost: f32,

    /// Color distances at or above this get no boost.
    pub color_threshold: f32,

    /// Largest relative color boost (0.3 = +30%).
    pub color_weight: f32,

    /// Distance at which the color boost would fall to zero.
    pub color_scale: f32,
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            category_boost: 1.2,
            color_threshold: 30.0,
            color_weight: 0.3,
            color_scale: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Results reported per garment.
    pub top_k: usize,

    /// Candidates fetched per reported result before re-ranking.
    pub candidate_multiplier: usize,

    pub rerank: RerankConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            candidate_multiplier: 3,
            rerank: RerankConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    pub dataset_directory: PathBuf,

    /// Metadata JSON, relative to `dataset_directory` unless absolute.
    pub metadata_file: PathBuf,

    /// Weight of the image embedding when fused with a description.
    pub image_weight: f32,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            dataset_directory: PathBuf::from("image_library"),
            metadata_file: PathBuf::from("metadata.json"),
            image_weight: 0.7,
        }
    }
}

impl LibraryConfig {
    pub fn metadata_path(&self) -> PathBuf {
        self.dataset_directory.join(&self.metadata_file)
    }
}
