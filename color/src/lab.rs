use std::fmt;

use serde::{Deserialize, Serialize};

/// D65 reference white.
const XN: f64 = 0.950_47;
const YN: f64 = 1.0;
const ZN: f64 = 1.088_83;

const DELTA: f64 = 6.0 / 29.0;

/// An 8-bit sRGB color. Serialized as `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Returns the lowercase `#rrggbb` form.
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    /// Converts to CIE L*a*b* under the D65 illuminant.
    pub fn to_lab(&self) -> Lab {
        let r = srgb_to_linear(self.0);
        let g = srgb_to_linear(self.1);
        let b = srgb_to_linear(self.2);

        let x = 0.412_456_4 * r + 0.357_576_1 * g + 0.180_437_5 * b;
        let y = 0.212_672_9 * r + 0.715_152_2 * g + 0.072_175_0 * b;
        let z = 0.019_333_9 * r + 0.119_192_0 * g + 0.950_304_1 * b;

        let fx = lab_f(x / XN);
        let fy = lab_f(y / YN);
        let fz = lab_f(z / ZN);

        Lab {
            l: (116.0 * fy - 16.0) as f32,
            a: (500.0 * (fx - fy)) as f32,
            b: (200.0 * (fy - fz)) as f32,
        }
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(c: [u8; 3]) -> Self {
        Rgb(c[0], c[1], c[2])
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(c: Rgb) -> Self {
        [c.0, c.1, c.2]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

/// A CIE L*a*b* color. Serialized as `[l, a, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
pub struct Lab {
    pub l: f32,
    pub a: f32,
    pub b: f32,
}

impl Lab {
    pub const fn new(l: f32, a: f32, b: f32) -> Self {
        Self { l, a, b }
    }

    /// CIE76 delta E: Euclidean distance in Lab space.
    pub fn distance(&self, other: &Lab) -> f32 {
        let dl = (self.l - other.l) as f64;
        let da = (self.a - other.a) as f64;
        let db = (self.b - other.b) as f64;
        (dl * dl + da * da + db * db).sqrt() as f32
    }

    /// Exponential moving average step: `alpha * raw + (1 - alpha) * self`,
    /// per channel.
    pub fn blend(&self, raw: &Lab, alpha: f32) -> Lab {
        Lab {
            l: alpha * raw.l + (1.0 - alpha) * self.l,
            a: alpha * raw.a + (1.0 - alpha) * self.a,
            b: alpha * raw.b + (1.0 - alpha) * self.b,
        }
    }

    /// Converts back to 8-bit sRGB. Out-of-gamut values are clipped.
    pub fn to_rgb(&self) -> Rgb {
        let fy = (self.l as f64 + 16.0) / 116.0;
        let fx = fy + self.a as f64 / 500.0;
        let fz = fy - self.b as f64 / 200.0;

        let x = XN * lab_f_inv(fx);
        let y = YN * lab_f_inv(fy);
        let z = ZN * lab_f_inv(fz);

        let r = 3.240_454_2 * x - 1.537_138_5 * y - 0.498_531_4 * z;
        let g = -0.969_266_0 * x + 1.876_010_8 * y + 0.041_556_0 * z;
        let b = 0.055_643_4 * x - 0.204_025_9 * y + 1.057_225_2 * z;

        Rgb(linear_to_srgb(r), linear_to_srgb(g), linear_to_srgb(b))
    }

    pub fn to_array(&self) -> [f32; 3] {
        [self.l, self.a, self.b]
    }
}

impl From<[f32; 3]> for Lab {
    fn from(c: [f32; 3]) -> Self {
        Lab::new(c[0], c[1], c[2])
    }
}

impl From<Lab> for [f32; 3] {
    fn from(c: Lab) -> Self {
        c.to_array()
    }
}

fn srgb_to_linear(c: u8) -> f64 {
    let c = c as f64 / 255.0;
    if c <= 0.040_45 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f64) -> u8 {
    let c = if c <= 0.003_130_8 {
        12.92 * c
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    };
    (c.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn lab_f(t: f64) -> f64 {
    if t > DELTA * DELTA * DELTA {
        t.cbrt()
    } else {
        t / (3.0 * DELTA * DELTA) + 4.0 / 29.0
    }
}

fn lab_f_inv(t: f64) -> f64 {
    if t > DELTA {
        t * t * t
    } else {
        3.0 * DELTA * DELTA * (t - 4.0 / 29.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn white_and_black() {
        let w = Rgb(255, 255, 255).to_lab();
        assert!((w.l - 100.0).abs() < 0.01, "white L: got {}", w.l);
        assert!(w.a.abs() < 0.01 && w.b.abs() < 0.01, "white should be neutral: {w:?}");

        let k = Rgb(0, 0, 0).to_lab();
        assert!(k.l.abs() < 0.01, "black L: got {}", k.l);
    }

    #[test]
    fn pure_red_reference() {
        // Reference values for sRGB red under D65.
        let red = Rgb(255, 0, 0).to_lab();
        assert!((red.l - 53.24).abs() < 0.1, "L: got {}", red.l);
        assert!((red.a - 80.09).abs() < 0.2, "a: got {}", red.a);
        assert!((red.b - 67.20).abs() < 0.2, "b: got {}", red.b);
    }

    #[test]
    fn rgb_lab_rgb_is_lossless() {
        for c in [
            Rgb(0, 0, 0),
            Rgb(255, 255, 255),
            Rgb(200, 30, 30),
            Rgb(12, 140, 77),
            Rgb(90, 90, 250),
            Rgb(128, 128, 128),
        ] {
            assert_eq!(c.to_lab().to_rgb(), c, "round trip for {c}");
        }
    }

    #[test]
    fn out_of_gamut_is_clipped() {
        let c = Lab::new(50.0, 120.0, -120.0).to_rgb();
        // Must not wrap around; just stay within 0..=255.
        assert!(c.0 > 0 && c.2 > 0, "got {c:?}");
    }

    #[test]
    fn distance_is_cie76() {
        let a = Lab::new(50.0, 0.0, 0.0);
        let b = Lab::new(53.0, 4.0, 0.0);
        assert!((a.distance(&b) - 5.0).abs() < 1e-5);
        assert_eq!(a.distance(&a), 0.0);
    }

    #[test]
    fn blend_weights_raw_by_alpha() {
        let prev = Lab::new(0.0, 0.0, 0.0);
        let raw = Lab::new(10.0, -10.0, 20.0);
        let out = prev.blend(&raw, 0.3);
        assert!((out.l - 3.0).abs() < 1e-5);
        assert!((out.a + 3.0).abs() < 1e-5);
        assert!((out.b - 6.0).abs() < 1e-5);
    }

    #[test]
    fn hex_format() {
        assert_eq!(Rgb(255, 0, 16).hex(), "#ff0010");
        assert_eq!(Rgb(0, 0, 0).to_string(), "#000000");
    }

    #[test]
    fn serde_as_triples() {
        let json = serde_json::to_string(&Lab::new(50.0, 1.5, -2.0)).unwrap();
        assert_eq!(json, "[50.0,1.5,-2.0]");
        let lab: Lab = serde_json::from_str("[10, 20, 30]").unwrap();
        assert_eq!(lab, Lab::new(10.0, 20.0, 30.0));

        let rgb: Rgb = serde_json::from_str("[1,2,3]").unwrap();
        assert_eq!(rgb, Rgb(1, 2, 3));
    }
}
