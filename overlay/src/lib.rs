//! Live garment overlay pipeline.
//!
//! A [`Session`] turns the per-frame output of an external garment
//! segmenter into a stable stream of garment reports:
//!
//! 1. detections are filtered by confidence and mask size,
//! 2. grouped into people ([`wardrobe_tracker::PersonAssociator`]),
//! 3. given durable ids and smoothed colors
//!    ([`wardrobe_tracker::GarmentTracker`]),
//! 4. and, once confirmed, embedded and matched against the shared
//!    [`wardrobe_catalog::Catalog`].
//!
//! Only confirmed garments are reported, which keeps the overlay from
//! flickering on one-off detections.

mod config;
mod embedder;
mod error;
mod frame;
mod report;
mod session;

pub use config::{Config, TrackingConfig, DEFAULT_BASE_DIR, DEFAULT_CONFIG_FILE};
pub use embedder::{GarmentCrop, GarmentEmbedder};
pub use error::{EmbedError, OverlayError};
pub use frame::{Detection, Frame, Observation};
pub use report::{FrameReport, GarmentReport};
pub use session::{Session, SessionStats};
