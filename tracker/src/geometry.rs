use serde::{Deserialize, Serialize};

/// Mask values above this count as foreground.
pub const FOREGROUND_THRESHOLD: f32 = 0.5;

/// Axis-aligned box in pixel coordinates. Serialized as `[x, y, w, h]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl BBox {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Builds a box from its top-left and bottom-right corners.
    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x: x1.min(x2),
            y: y1.min(y2),
            w: (x2 - x1).abs(),
            h: (y2 - y1).abs(),
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn area(&self) -> f32 {
        self.w.max(0.0) * self.h.max(0.0)
    }

    /// Euclidean distance between the centers of two boxes.
    pub fn center_distance(&self, other: &BBox) -> f32 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        (ax - bx).hypot(ay - by)
    }
}

impl From<[f32; 4]> for BBox {
    fn from(v: [f32; 4]) -> Self {
        BBox::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BBox> for [f32; 4] {
    fn from(b: BBox) -> Self {
        [b.x, b.y, b.w, b.h]
    }
}

/// Row-major soft segmentation mask with values in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MaskRepr")]
pub struct Mask {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

#[derive(Deserialize)]
struct MaskRepr {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl TryFrom<MaskRepr> for Mask {
    type Error = String;

    fn try_from(r: MaskRepr) -> Result<Self, Self::Error> {
        let (width, height, len) = (r.width, r.height, r.data.len());
        Mask::new(width, height, r.data)
            .ok_or_else(|| format!("mask {width}x{height} has {len} values"))
    }
}

impl Mask {
    /// Returns `None` unless `data` holds exactly `width * height` values.
    pub fn new(width: usize, height: usize, data: Vec<f32>) -> Option<Self> {
        (width.checked_mul(height) == Some(data.len())).then_some(Self {
            width,
            height,
            data,
        })
    }

    /// A binary mask that is foreground inside `rect` (clipped to the
    /// mask bounds).
    pub fn from_rect(width: usize, height: usize, rect: BBox) -> Self {
        let x0 = rect.x.max(0.0) as usize;
        let y0 = rect.y.max(0.0) as usize;
        let x1 = ((rect.x + rect.w).max(0.0) as usize).min(width);
        let y1 = ((rect.y + rect.h).max(0.0) as usize).min(height);
        let mut data = vec![0.0; width * height];
        for y in y0..y1 {
            for x in x0..x1 {
                data[y * width + x] = 1.0;
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_foreground(&self, x: usize, y: usize) -> bool {
        self.data[y * self.width + x] > FOREGROUND_THRESHOLD
    }

    /// Nearest-neighbor resample to another resolution.
    pub fn resample(&self, width: usize, height: usize) -> Mask {
        if width == self.width && height == self.height {
            return self.clone();
        }
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            let sy = (y * self.height / height.max(1)).min(self.height.saturating_sub(1));
            for x in 0..width {
                let sx = (x * self.width / width.max(1)).min(self.width.saturating_sub(1));
                data.push(self.data.get(sy * self.width + sx).copied().unwrap_or(0.0));
            }
        }
        Mask {
            width,
            height,
            data,
        }
    }

    pub fn foreground_count(&self) -> usize {
        self.data.iter().filter(|&&v| v > FOREGROUND_THRESHOLD).count()
    }

    /// Tight box around the foreground, or `None` for an empty mask.
    pub fn foreground_bounds(&self) -> Option<BBox> {
        let (mut x0, mut y0) = (usize::MAX, usize::MAX);
        let (mut x1, mut y1) = (0, 0);
        for (y, row) in self.data.chunks_exact(self.width.max(1)).enumerate() {
            for (x, &v) in row.iter().enumerate() {
                if v > FOREGROUND_THRESHOLD {
                    x0 = x0.min(x);
                    y0 = y0.min(y);
                    x1 = x1.max(x);
                    y1 = y1.max(y);
                }
            }
        }
        if x0 == usize::MAX {
            return None;
        }
        Some(BBox::new(
            x0 as f32,
            y0 as f32,
            (x1 - x0 + 1) as f32,
            (y1 - y0 + 1) as f32,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_center_and_distance() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(a.center(), (5.0, 5.0));
        assert_eq!(a.area(), 100.0);
        let b = BBox::new(3.0, 4.0, 10.0, 10.0);
        assert!((a.center_distance(&b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn bbox_from_corners() {
        let b = BBox::from_corners(10.0, 20.0, 30.0, 60.0);
        assert_eq!(b, BBox::new(10.0, 20.0, 20.0, 40.0));
    }

    #[test]
    fn bbox_serde_as_array() {
        let b = BBox::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(serde_json::to_string(&b).unwrap(), "[1.0,2.0,3.0,4.0]");
        let back: BBox = serde_json::from_str("[1,2,3,4]").unwrap();
        assert_eq!(back, b);
    }

    #[test]
    fn mask_rejects_bad_length() {
        assert!(Mask::new(2, 2, vec![0.0; 3]).is_none());
        assert!(Mask::new(2, 2, vec![0.0; 4]).is_some());
    }

    #[test]
    fn soft_mask_threshold() {
        let m = Mask::new(3, 1, vec![0.2, 0.5, 0.51]).unwrap();
        assert!(!m.is_foreground(0, 0));
        assert!(!m.is_foreground(1, 0));
        assert!(m.is_foreground(2, 0));
        assert_eq!(m.foreground_count(), 1);
    }

    #[test]
    fn resample_nearest() {
        // 2x2 checker upscaled to 4x4 keeps quadrants.
        let m = Mask::new(2, 2, vec![1.0, 0.0, 0.0, 1.0]).unwrap();
        let up = m.resample(4, 4);
        assert_eq!(up.width(), 4);
        assert!(up.is_foreground(0, 0) && up.is_foreground(1, 1));
        assert!(!up.is_foreground(2, 0) && !up.is_foreground(3, 1));
        assert!(up.is_foreground(3, 3));
        assert_eq!(up.foreground_count(), 8);

        let down = up.resample(2, 2);
        assert_eq!(down, m);
    }

    #[test]
    fn rect_mask_and_bounds() {
        let m = Mask::from_rect(20, 20, BBox::new(2.0, 3.0, 5.0, 4.0));
        assert_eq!(m.foreground_count(), 20);
        assert_eq!(m.foreground_bounds(), Some(BBox::new(2.0, 3.0, 5.0, 4.0)));
        assert!(Mask::new(2, 2, vec![0.0; 4]).unwrap().foreground_bounds().is_none());
    }

    #[test]
    fn mask_serde_checks_length() {
        let m: Mask = serde_json::from_str(r#"{"width":2,"height":1,"data":[0,1]}"#).unwrap();
        assert_eq!(m.foreground_count(), 1);
        assert!(serde_json::from_str::<Mask>(r#"{"width":2,"height":2,"data":[0,1]}"#).is_err());
        assert!(serde_json::from_str::<Mask>(
            r#"{"width":18446744073709551615,"height":2,"data":[]}"#
        )
        .is_err());
        assert!(Mask::new(usize::MAX, usize::MAX, vec![0.0]).is_none());
    }

    #[test]
    fn rect_mask_is_clipped() {
        let m = Mask::from_rect(10, 10, BBox::new(-5.0, 8.0, 20.0, 20.0));
        assert_eq!(m.foreground_count(), 20);
    }
}
