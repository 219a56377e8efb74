use wardrobe_vecstore::VecError;

const EPSILON: f64 = 1e-8;

/// Blends an image and a text embedding as
/// `image_weight * image + (1 - image_weight) * text` and rescales the
/// result to unit length.
///
/// Both inputs must have the same dimension. A blend that cancels out to
/// zero stays zero.
pub fn fuse(image: &[f32], text: &[f32], image_weight: f32) -> Result<Vec<f32>, VecError> {
    if image.len() != text.len() {
        return Err(VecError::DimensionMismatch {
            got: text.len(),
            want: image.len(),
        });
    }
    let w = image_weight.clamp(0.0, 1.0);
    let mut out: Vec<f32> = image
        .iter()
        .zip(text.iter())
        .map(|(&i, &t)| w * i + (1.0 - w) * t)
        .collect();

    let norm: f64 = out.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>().sqrt();
    let scale = (1.0 / (norm + EPSILON)) as f32;
    for x in out.iter_mut() {
        *x *= scale;
    }
    Ok(out)
}
