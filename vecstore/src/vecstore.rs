use std::io::Write;

use crate::error::VecError;

/// Match is a single result from a vector similarity search.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    /// Index-assigned id of the matched vector.
    pub id: u64,

    /// Inner product between the normalized query and the stored vector.
    /// Higher values indicate higher similarity.
    pub score: f32,
}

/// An item of an insertion batch that was not stored.
#[derive(Debug)]
pub struct RejectedItem {
    /// Position of the item within the submitted batch.
    pub position: usize,
    pub error: VecError,
}

/// Outcome of a batch insertion. Problems with single items do not abort
/// the batch; they are collected in `rejected`.
#[derive(Debug, Default)]
pub struct AddReport {
    /// Ids assigned to the accepted items, in batch order.
    pub ids: Vec<u64>,
    pub rejected: Vec<RejectedItem>,
}

impl AddReport {
    pub fn accepted(&self) -> usize {
        self.ids.len()
    }
}

/// VecIndex is the interface for append-only nearest-neighbor search over
/// dense float32 vectors ranked by inner product.
///
/// Mutation takes `&mut self`; callers that share an index across threads
/// wrap it in a reader/writer lock so that searches run concurrently and
/// insertions are exclusive.
pub trait VecIndex: Send + Sync {
    /// Vector dimension accepted by this index.
    fn dim(&self) -> usize;

    /// Whether the index can accept insertions.
    fn is_trained(&self) -> bool;

    /// Learn the index structure from a sample. No-op once trained.
    fn train(&mut self, samples: &[&[f32]]) -> Result<(), VecError>;

    /// Append vectors. Ids continue from the current count.
    /// Fails as a whole only with [`VecError::NotTrained`].
    fn add(&mut self, vectors: &[&[f32]]) -> Result<AddReport, VecError>;

    /// Return up to `top_k` vectors ordered by descending score; ties go to
    /// the lower id. Untrained or empty indexes yield an empty list.
    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<Match>, VecError>;

    /// Return the number of vectors in the index.
    fn len(&self) -> usize;

    /// Return true if the index contains no vectors.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serialize the index in the binary snapshot format read by
    /// [`crate::load`].
    fn save(&self, w: &mut dyn Write) -> Result<(), VecError>;
}

/// Sorts scored ids by descending score (ties by ascending id) and keeps
/// the best `top_k`.
pub(crate) fn rank(mut scored: Vec<(u64, f32)>, top_k: usize) -> Vec<Match> {
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    scored.truncate(top_k);
    scored
        .into_iter()
        .map(|(id, score)| Match { id, score })
        .collect()
}
