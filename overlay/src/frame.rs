use serde::{Deserialize, Serialize};
use wardrobe_color::{Lab, Rgb};
use wardrobe_tracker::{BBox, Mask};

use crate::error::OverlayError;

/// A decoded camera frame: row-major sRGB pixels.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    width: u32,
    height: u32,
    pixels: &'a [Rgb],
}

impl<'a> Frame<'a> {
    pub fn new(width: u32, height: u32, pixels: &'a [Rgb]) -> Result<Self, OverlayError> {
        let want = width as usize * height as usize;
        if pixels.len() != want {
            return Err(OverlayError::InvalidFrame(format!(
                "{width}x{height} frame needs {want} pixels, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: usize, y: usize) -> Rgb {
        self.pixels[y * self.width as usize + x]
    }

    /// Pixels under the mask's foreground. The mask must have the frame's
    /// resolution.
    pub fn masked_pixels(&self, mask: &Mask, within: BBox) -> Vec<Rgb> {
        let x0 = within.x.max(0.0) as usize;
        let y0 = within.y.max(0.0) as usize;
        let x1 = ((within.x + within.w) as usize).min(mask.width()).min(self.width as usize);
        let y1 = ((within.y + within.h) as usize).min(mask.height()).min(self.height as usize);

        let mut out = Vec::new();
        for y in y0..y1 {
            for x in x0..x1 {
                if mask.is_foreground(x, y) {
                    out.push(self.pixel(x, y));
                }
            }
        }
        out
    }
}

/// One output of the external segmenter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BBox,

    /// Soft or binary mask. Resampled to the frame resolution when it
    /// differs; the box is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<Mask>,

    /// Detector class label, e.g. `short_sleeve_top`.
    pub label: String,

    pub confidence: f32,
}

/// A detection whose color and embedding were already extracted
/// upstream, as recorded in replay logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub bbox: BBox,
    pub label: String,

    #[serde(default = "full_confidence")]
    pub confidence: f32,

    /// Dominant color of the garment crop.
    pub color: Lab,

    /// Foreground mask size; unknown counts as large enough.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground_pixels: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

fn full_confidence() -> f32 {
    1.0
}
