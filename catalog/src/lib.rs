//! Garment catalog: a shared similarity index with a parallel metadata
//! list, plus the re-ranking applied to nearest-neighbor candidates.
//!
//! [`Catalog`] keeps the vector index and the metadata records under one
//! reader/writer lock so they never disagree in count or order. Searches
//! take the shared lock; training, insertion and loading are exclusive.
//!
//! [`ReRanker`] rescales base cosine scores by category agreement and
//! perceptual (CIE76) color proximity.

mod catalog;
mod error;
mod fusion;
mod library;
mod rerank;
mod types;

pub use catalog::{Catalog, SnapshotPaths};
pub use error::CatalogError;
pub use fusion::fuse;
pub use library::{index_directory, EncodeResult, EncodedImage, ItemEncoder, LibraryReport, IMAGE_EXTENSIONS};
pub use rerank::{RerankQuery, ReRanker};
pub use types::{
    IndexConfig, IndexKind, ItemMetadata, LibraryConfig, QueryResult, RerankConfig, SearchConfig,
};

pub use wardrobe_vecstore::{AddReport, RejectedItem, VecError};
