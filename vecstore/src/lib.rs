//! Append-only vector indexes over unit-normalized embeddings.
//!
//! Every vector is L2-normalized on the way in, so the inner product used
//! for ranking is cosine similarity in `[-1, 1]` (higher is closer). Ids
//! are dense and assigned in insertion order starting at 0.
//!
//! Two implementations share the [`VecIndex`] interface:
//!
//! - [`FlatIndex`]: exhaustive scan, always trained.
//! - [`IvfIndex`]: inverted lists over spherical k-means centroids. Must be
//!   trained on a representative sample before the first insertion and
//!   probes the `nprobe` closest lists at query time.
//!
//! Snapshots are written with [`VecIndex::save`] and read back with
//! [`load`], which dispatches on the stored index kind.

pub mod error;
pub mod flat;
pub mod io;
pub mod ivf;
mod kmeans;
pub mod vecstore;
pub mod vector;

pub use error::VecError;
pub use flat::FlatIndex;
pub use io::load;
pub use ivf::{IvfConfig, IvfIndex};
pub use vecstore::{AddReport, Match, RejectedItem, VecIndex};
pub use vector::{inner_product, l2_normalize, normalized};
