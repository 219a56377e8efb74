use thiserror::Error;
use wardrobe_catalog::CatalogError;

/// Failure of the garment embedding collaborator.
#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("embed: model error: {0}")]
    Model(String),

    #[error("embed: empty crop")]
    EmptyCrop,
}

#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("overlay: {0}")]
    Catalog(#[from] CatalogError),

    #[error("overlay: config error: {0}")]
    Config(String),

    #[error("overlay: {0}")]
    Embed(#[from] EmbedError),

    #[error("overlay: invalid frame: {0}")]
    InvalidFrame(String),

    #[error("overlay: io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_yaml::Error> for OverlayError {
    fn from(e: serde_yaml::Error) -> Self {
        OverlayError::Config(e.to_string())
    }
}
