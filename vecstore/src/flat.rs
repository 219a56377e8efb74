use std::io::Write;

use crate::error::VecError;
use crate::io::{float_count, Decoder, Encoder, KIND_FLAT};
use crate::vecstore::{rank, AddReport, Match, RejectedItem, VecIndex};
use crate::vector::{inner_product, prepare, VectorTable};

/// FlatIndex scores every stored vector on each query.
/// Exact; needs no training. Suited to small catalogs and tests.
pub struct FlatIndex {
    table: VectorTable,
}

impl FlatIndex {
    /// Create an empty index. Panics if `dim` is 0.
    pub fn new(dim: usize) -> Self {
        assert!(dim > 0, "vecstore: FlatIndex dim must be positive");
        Self {
            table: VectorTable::new(dim),
        }
    }

    pub(crate) fn decode(dec: &mut Decoder<'_>, dim: usize, count: usize) -> Result<Self, VecError> {
        let data = dec.f32s(float_count(count, dim)?)?;
        Ok(Self {
            table: VectorTable { dim, data },
        })
    }
}

impl VecIndex for FlatIndex {
    fn dim(&self) -> usize {
        self.table.dim
    }

    fn is_trained(&self) -> bool {
        true
    }

    fn train(&mut self, _samples: &[&[f32]]) -> Result<(), VecError> {
        Ok(())
    }

    fn add(&mut self, vectors: &[&[f32]]) -> Result<AddReport, VecError> {
        let mut report = AddReport::default();
        for (position, v) in vectors.iter().enumerate() {
            match prepare(v, self.table.dim) {
                Ok(unit) => report.ids.push(self.table.push(&unit)),
                Err(error) => report.rejected.push(RejectedItem { position, error }),
            }
        }
        Ok(report)
    }

    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<Match>, VecError> {
        let q = prepare(query, self.table.dim)?;
        if self.table.len() == 0 || top_k == 0 {
            return Ok(vec![]);
        }

        let scored: Vec<(u64, f32)> = self
            .table
            .rows()
            .enumerate()
            .map(|(id, v)| (id as u64, inner_product(&q, v)))
            .collect();
        Ok(rank(scored, top_k))
    }

    fn len(&self) -> usize {
        self.table.len()
    }

    fn save(&self, w: &mut dyn Write) -> Result<(), VecError> {
        let mut enc = Encoder::new(w);
        enc.header(KIND_FLAT, self.table.dim, self.table.len())?;
        enc.f32s(&self.table.data)?;
        enc.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_search() {
        let mut idx = FlatIndex::new(4);
        let report = idx
            .add(&[&[1.0, 0.0, 0.0, 0.0], &[0.0, 1.0, 0.0, 0.0], &[0.9, 0.1, 0.0, 0.0]])
            .unwrap();
        assert_eq!(report.ids, vec![0, 1, 2]);
        assert!(report.rejected.is_empty());

        let matches = idx.search(&[1.0, 0.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, 0);
        assert_eq!(matches[1].id, 2);
        assert!((matches[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_ids_continue_across_batches() {
        let mut idx = FlatIndex::new(2);
        idx.add(&[&[1.0, 0.0]]).unwrap();
        let report = idx.add(&[&[0.0, 1.0], &[1.0, 1.0]]).unwrap();
        assert_eq!(report.ids, vec![1, 2]);
        assert_eq!(idx.len(), 3);
    }

    #[test]
    fn test_vectors_are_normalized() {
        let mut idx = FlatIndex::new(2);
        idx.add(&[&[10.0, 0.0]]).unwrap();
        let matches = idx.search(&[3.0, 0.0], 1).unwrap();
        assert!((matches[0].score - 1.0).abs() < 1e-6, "got {}", matches[0].score);
    }

    #[test]
    fn test_wrong_dimension_is_rejected_per_item() {
        let mut idx = FlatIndex::new(3);
        let report = idx
            .add(&[&[1.0, 0.0, 0.0], &[1.0, 0.0], &[0.0, 0.0, 1.0]])
            .unwrap();
        assert_eq!(report.ids, vec![0, 1]);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].position, 1);
        assert!(matches!(
            report.rejected[0].error,
            VecError::DimensionMismatch { got: 2, want: 3 }
        ));
        assert_eq!(idx.len(), 2);
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let mut idx = FlatIndex::new(4);
        idx.add(&[&[1.0, 0.0, 0.0, 0.0]]).unwrap();
        assert!(idx.search(&[1.0, 0.0], 1).is_err());
    }

    #[test]
    fn test_search_empty() {
        let idx = FlatIndex::new(3);
        assert!(idx.search(&[1.0, 0.0, 0.0], 5).unwrap().is_empty());
    }

    #[test]
    fn test_search_top_k_zero() {
        let mut idx = FlatIndex::new(3);
        idx.add(&[&[1.0, 0.0, 0.0]]).unwrap();
        assert!(idx.search(&[1.0, 0.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    #[should_panic]
    fn test_panics_on_zero_dim() {
        FlatIndex::new(0);
    }
}
