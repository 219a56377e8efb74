//! Temporal identity tracking for per-frame garment detections.
//!
//! Detections arrive independently every frame. [`PersonAssociator`]
//! groups them into people by proximity to where each person was last
//! seen, and [`GarmentTracker`] keeps one record per (person, category)
//! that carries a durable garment id, an exponentially smoothed color and
//! a stability counter used to suppress flicker.
//!
//! Both are plain state machines owned by a single session; advance them
//! once per frame.

mod category;
mod garment;
mod geometry;
mod person;

pub use category::Category;
pub use garment::{
    GarmentConfig, GarmentKey, GarmentObservation, GarmentRecord, GarmentState, GarmentTracker,
    TrackedGarment,
};
pub use geometry::{BBox, Mask, FOREGROUND_THRESHOLD};
pub use person::{PersonAssociator, PersonConfig, PersonTrack};
