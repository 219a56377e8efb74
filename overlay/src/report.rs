use serde::Serialize;
use wardrobe_catalog::QueryResult;
use wardrobe_color::{Lab, Rgb};
use wardrobe_tracker::{BBox, Category, TrackedGarment};

/// A confirmed garment in one frame with its catalog matches.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GarmentReport {
    pub garment_id: u64,
    pub person_id: u64,
    pub category: Category,
    /// Detector label; the coarse category when the label is empty.
    pub fine_category: String,
    pub bbox: BBox,
    /// Display color derived from `color_lab`.
    pub color: Rgb,
    /// Smoothed CIE L*a*b* color.
    pub color_lab: Lab,
    pub color_hex: String,
    pub confidence: f32,
    pub similar_items: Vec<QueryResult>,
}

impl GarmentReport {
    pub(crate) fn new(
        garment: &TrackedGarment,
        fine_category: &str,
        confidence: f32,
        similar_items: Vec<QueryResult>,
    ) -> Self {
        let rgb = garment.color.to_rgb();
        let fine_category = if fine_category.is_empty() {
            garment.key.category.to_string()
        } else {
            fine_category.to_string()
        };
        Self {
            garment_id: garment.id,
            person_id: garment.key.person_id,
            category: garment.key.category,
            fine_category,
            bbox: garment.bbox,
            color: rgb,
            color_lab: garment.color,
            color_hex: rgb.hex(),
            confidence,
            similar_items,
        }
    }
}

/// Output of one processed frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrameReport {
    /// 1-based frame number within the session.
    pub frame: u64,
    pub garments: Vec<GarmentReport>,
    /// Garments tracked this frame but not yet confirmed.
    #[serde(skip_serializing_if = "is_zero")]
    pub tentative: usize,
    /// Detections dropped before tracking (low confidence, too small,
    /// duplicate slot).
    #[serde(skip_serializing_if = "is_zero")]
    pub dropped: usize,
    /// Confirmed garments whose embedding or search failed.
    #[serde(skip_serializing_if = "is_zero")]
    pub failed: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}
