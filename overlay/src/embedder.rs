use wardrobe_color::Rgb;
use wardrobe_tracker::{BBox, Category, Mask};

use crate::error::EmbedError;
use crate::frame::Frame;

/// The masked region of one garment in a frame.
pub struct GarmentCrop<'a> {
    pub frame: &'a Frame<'a>,
    /// Mask at frame resolution.
    pub mask: &'a Mask,
    pub bbox: BBox,
    pub category: Category,
}

impl GarmentCrop<'_> {
    /// Foreground pixels inside the garment box.
    pub fn pixels(&self) -> Vec<Rgb> {
        self.frame.masked_pixels(self.mask, self.bbox)
    }
}

/// Turns a garment crop into a unit-length embedding in the catalog's
/// vector space.
pub trait GarmentEmbedder {
    fn embed(&self, crop: &GarmentCrop<'_>) -> Result<Vec<f32>, EmbedError>;
}
