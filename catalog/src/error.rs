use thiserror::Error;
use wardrobe_vecstore::VecError;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("catalog: {0}")]
    Vector(#[from] VecError),

    #[error("catalog: batch has {embeddings} embeddings but {items} metadata records")]
    BatchLengthMismatch { embeddings: usize, items: usize },

    #[error("catalog: corrupt snapshot: index holds {index} vectors, metadata holds {metadata} records")]
    Corrupt { index: usize, metadata: usize },

    #[error("catalog: io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog: serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::Serialization(e.to_string())
    }
}
