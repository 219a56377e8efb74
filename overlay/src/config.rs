//! YAML configuration for the overlay pipeline.
//!
//! Every field has a default, so a partial file (or none at all) is valid.
//! The default location is `~/.wardrobe/config.yaml`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use wardrobe_catalog::{Catalog, IndexConfig, LibraryConfig, SearchConfig};
use wardrobe_tracker::{GarmentConfig, PersonConfig};

use crate::error::OverlayError;

/// Default base configuration directory name.
pub const DEFAULT_BASE_DIR: &str = ".wardrobe";
/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tracking: TrackingConfig,
    pub search: SearchConfig,
    pub index: IndexConfig,
    pub library: LibraryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Detections below this confidence are ignored.
    pub confidence_threshold: f32,

    /// Detections with fewer foreground mask pixels are dropped.
    pub min_foreground_pixels: usize,

    pub person: PersonConfig,
    pub garment: GarmentConfig,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            min_foreground_pixels: 100,
            person: PersonConfig::default(),
            garment: GarmentConfig::default(),
        }
    }
}

impl Config {
    /// Gets the default config file path.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(DEFAULT_BASE_DIR).join(DEFAULT_CONFIG_FILE))
    }

    pub fn from_yaml(s: &str) -> Result<Self, OverlayError> {
        let cfg: Config = serde_yaml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_yaml(&self) -> Result<String, OverlayError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Reads and parses a config file.
    pub fn load(path: &Path) -> Result<Self, OverlayError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Loads `path` if given (it must exist), otherwise the default
    /// location if present, otherwise the built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, OverlayError> {
        if let Some(p) = path {
            return Self::load(p);
        }
        match Self::default_path() {
            Some(p) if p.is_file() => Self::load(&p),
            _ => Ok(Self::default()),
        }
    }

    /// Writes the config as YAML, creating the parent directory.
    pub fn save(&self, path: &Path) -> Result<(), OverlayError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    /// Opens the catalog snapshot at `base`, or an empty catalog shaped by
    /// the `index` section.
    pub fn open_catalog(&self, base: &Path) -> Result<Catalog, OverlayError> {
        Ok(Catalog::open(&self.index, base)?)
    }

    fn validate(&self) -> Result<(), OverlayError> {
        if self.index.dim == 0 {
            return Err(OverlayError::Config("index.dim must be positive".into()));
        }
        if self.search.top_k == 0 {
            return Err(OverlayError::Config("search.top_k must be positive".into()));
        }
        let w = self.library.image_weight;
        if !(0.0..=1.0).contains(&w) {
            return Err(OverlayError::Config(format!(
                "library.image_weight must be within [0, 1], got {w}"
            )));
        }
        Ok(())
    }
}
