//! Perceptual color utilities shared by garment tracking and re-ranking.
//!
//! Both sides of the system must agree on one color space: the tracker
//! smooths dominant colors in CIE L*a*b* and the re-ranker compares catalog
//! colors against them with CIE76 delta E. Everything here works in that
//! space.
//!
//! # Usage
//!
//! ```
//! use wardrobe_color::{dominant_lab, Rgb, DEFAULT_CLUSTERS};
//!
//! let pixels = vec![Rgb(200, 30, 30); 256];
//! let lab = dominant_lab(&pixels, DEFAULT_CLUSTERS).unwrap();
//! assert_eq!(lab.to_rgb().hex(), "#c81e1e");
//! ```

mod dominant;
mod lab;

pub use dominant::{dominant_lab, median_lab, DEFAULT_CLUSTERS};
pub use lab::{Lab, Rgb};
