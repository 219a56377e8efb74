use crate::error::VecError;

/// Normalizes a vector to unit length in-place and returns its original
/// norm. Zero vectors are left untouched.
///
/// Uses f64 intermediate precision.
pub fn l2_normalize(v: &mut [f32]) -> f64 {
    let mut sum: f64 = 0.0;
    for &x in v.iter() {
        sum += (x as f64) * (x as f64);
    }
    let norm = sum.sqrt();
    if norm > 0.0 {
        let scale = (1.0 / norm) as f32;
        for x in v.iter_mut() {
            *x *= scale;
        }
    }
    norm
}

/// Returns a unit-length copy of `v`, or `None` if `v` has zero norm.
pub fn normalized(v: &[f32]) -> Option<Vec<f32>> {
    let mut out = v.to_vec();
    if l2_normalize(&mut out) > 0.0 {
        Some(out)
    } else {
        None
    }
}

/// Inner product of two equal-length vectors. On unit vectors this is
/// cosine similarity.
pub fn inner_product(a: &[f32], b: &[f32]) -> f32 {
    let mut dot: f64 = 0.0;
    for (&x, &y) in a.iter().zip(b.iter()) {
        dot += (x as f64) * (y as f64);
    }
    dot as f32
}

/// Checks the dimension and returns the normalized vector.
pub(crate) fn prepare(v: &[f32], dim: usize) -> Result<Vec<f32>, VecError> {
    if v.len() != dim {
        return Err(VecError::DimensionMismatch {
            got: v.len(),
            want: dim,
        });
    }
    normalized(v).ok_or(VecError::ZeroVector)
}

/// Dense row-major storage; row `i` holds the vector with id `i`.
#[derive(Clone)]
pub(crate) struct VectorTable {
    pub(crate) dim: usize,
    pub(crate) data: Vec<f32>,
}

impl VectorTable {
    pub(crate) fn new(dim: usize) -> Self {
        Self {
            dim,
            data: Vec::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.data.len() / self.dim
    }

    /// Appends a vector of the table's dimension and returns its id.
    pub(crate) fn push(&mut self, v: &[f32]) -> u64 {
        debug_assert_eq!(v.len(), self.dim);
        let id = self.len() as u64;
        self.data.extend_from_slice(v);
        id
    }

    pub(crate) fn row(&self, id: u64) -> &[f32] {
        let start = id as usize * self.dim;
        &self.data[start..start + self.dim]
    }

    pub(crate) fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.dim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l2_normalize_unit() {
        let mut v = [3.0, 4.0];
        let norm = l2_normalize(&mut v);
        assert!((norm - 5.0).abs() < 1e-9);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn l2_normalize_zero() {
        let mut v = [0.0, 0.0, 0.0];
        assert_eq!(l2_normalize(&mut v), 0.0);
        assert_eq!(v, [0.0, 0.0, 0.0]);
        assert!(normalized(&v).is_none());
    }

    #[test]
    fn inner_product_of_unit_vectors_is_cosine() {
        let a = normalized(&[1.0, 1.0, 0.0]).unwrap();
        let b = normalized(&[1.0, 0.0, 0.0]).unwrap();
        let sim = inner_product(&a, &b);
        assert!((sim - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6, "got {sim}");
        assert!((inner_product(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn prepare_checks_dimension() {
        match prepare(&[1.0, 0.0], 3) {
            Err(VecError::DimensionMismatch { got: 2, want: 3 }) => {}
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(prepare(&[0.0; 3], 3), Err(VecError::ZeroVector)));
        assert_eq!(prepare(&[2.0, 0.0, 0.0], 3).unwrap(), vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn table_rows_follow_ids() {
        let mut t = VectorTable::new(2);
        assert_eq!(t.push(&[1.0, 2.0]), 0);
        assert_eq!(t.push(&[3.0, 4.0]), 1);
        assert_eq!(t.len(), 2);
        assert_eq!(t.row(1), &[3.0, 4.0]);
        assert_eq!(t.rows().count(), 2);
    }
}
