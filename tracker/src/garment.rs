use std::collections::hash_map::Entry;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;
use wardrobe_color::Lab;

use crate::category::Category;
use crate::geometry::BBox;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GarmentConfig {
    /// Weight of the new observation in the color moving average.
    pub alpha: f32,

    /// Observations needed before a garment is reported.
    pub stability_threshold: u32,

    /// Frames a garment may go unseen before its record is dropped.
    pub absence_timeout: u32,
}

impl Default for GarmentConfig {
    fn default() -> Self {
        Self {
            alpha: 0.3,
            stability_threshold: 3,
            absence_timeout: 30,
        }
    }
}

/// One tracked garment slot: at most one record exists per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GarmentKey {
    pub person_id: u64,
    pub category: Category,
}

impl GarmentKey {
    pub fn new(person_id: u64, category: Category) -> Self {
        Self {
            person_id,
            category,
        }
    }
}

/// Raw attributes of one detection in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GarmentObservation {
    pub color: Lab,
    pub bbox: BBox,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GarmentRecord {
    /// Assigned on creation, never reused.
    pub id: u64,
    pub stable_frames: u32,
    /// Exponentially smoothed color.
    pub color: Lab,
    pub bbox: BBox,
    /// Consecutive frames without an observation.
    pub missed: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GarmentState {
    /// Seen fewer than `stability_threshold` times.
    Tentative,
    /// Confirmed; eligible for reporting.
    Stable,
}

/// A garment as of the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedGarment {
    pub key: GarmentKey,
    pub id: u64,
    pub color: Lab,
    pub bbox: BBox,
    pub stable_frames: u32,
    pub state: GarmentState,
}

impl TrackedGarment {
    pub fn is_stable(&self) -> bool {
        self.state == GarmentState::Stable
    }
}

/// Keeps durable garment identities per (person, category).
///
/// Call [`GarmentTracker::observe`] for every garment of a frame, then
/// [`GarmentTracker::end_frame`] once.
pub struct GarmentTracker {
    cfg: GarmentConfig,
    records: HashMap<GarmentKey, GarmentRecord>,
    /// Keys observed in the current frame.
    /// Keys observed this frame, with the smoothed color they had before
    /// it (`None` for records created this frame).
    seen: HashMap<GarmentKey, Option<Lab>>,
    next_id: u64,
}

impl GarmentTracker {
    pub fn new(mut cfg: GarmentConfig) -> Self {
        if !(cfg.alpha > 0.0 && cfg.alpha <= 1.0) {
            cfg.alpha = 0.3;
        }
        cfg.stability_threshold = cfg.stability_threshold.max(1);
        Self {
            cfg,
            records: HashMap::new(),
            seen: HashMap::new(),
            next_id: 0,
        }
    }

    /// Records an observation of `key` and returns its tracked state.
    ///
    /// A new key gets the next garment id and the raw color. A known key
    /// counts one more stable frame and blends the raw color into its
    /// smoothed color. Observing a key again in the same frame replaces
    /// that frame's observation: the color is blended once, from the
    /// value held before the frame, and no extra frame is counted.
    pub fn observe(&mut self, key: GarmentKey, obs: GarmentObservation) -> TrackedGarment {
        let threshold = self.cfg.stability_threshold;
        let alpha = self.cfg.alpha;

        let record = match self.records.entry(key) {
            Entry::Occupied(e) => {
                let r = e.into_mut();
                match self.seen.get(&key) {
                    // Repeat within the frame; `None` means created this frame.
                    Some(&before) => {
                        r.color = before.map_or(obs.color, |c| c.blend(&obs.color, alpha));
                    }
                    None => {
                        self.seen.insert(key, Some(r.color));
                        r.stable_frames = r.stable_frames.saturating_add(1);
                        if r.stable_frames == threshold {
                            debug!(
                                garment = r.id,
                                person = key.person_id,
                                category = %key.category,
                                "garment: confirmed"
                            );
                        }
                        r.color = r.color.blend(&obs.color, alpha);
                    }
                }
                r.bbox = obs.bbox;
                r.missed = 0;
                r
            }
            Entry::Vacant(e) => {
                let id = self.next_id;
                self.next_id += 1;
                debug!(
                    garment = id,
                    person = key.person_id,
                    category = %key.category,
                    "garment: new record"
                );
                self.seen.insert(key, None);
                e.insert(GarmentRecord {
                    id,
                    stable_frames: 1,
                    color: obs.color,
                    bbox: obs.bbox,
                    missed: 0,
                })
            }
        };

        TrackedGarment {
            key,
            id: record.id,
            color: record.color,
            bbox: record.bbox,
            stable_frames: record.stable_frames,
            state: state_for(record.stable_frames, threshold),
        }
    }

    /// Closes the current frame: ages every key that was not observed and
    /// evicts records unseen for longer than the absence timeout.
    /// Returns the evicted keys with their garment ids.
    pub fn end_frame(&mut self) -> Vec<(GarmentKey, u64)> {
        let timeout = self.cfg.absence_timeout;
        let mut evicted = Vec::new();
        let seen = std::mem::take(&mut self.seen);

        self.records.retain(|key, r| {
            if seen.contains_key(key) {
                return true;
            }
            r.missed += 1;
            if r.missed > timeout {
                debug!(garment = r.id, person = key.person_id, "garment: evicted");
                evicted.push((*key, r.id));
                return false;
            }
            true
        });

        evicted.sort();
        evicted
    }

    pub fn get(&self, key: &GarmentKey) -> Option<&GarmentRecord> {
        self.records.get(key)
    }

    /// Current state of a key; `None` if it has no record.
    pub fn state(&self, key: &GarmentKey) -> Option<GarmentState> {
        self.records
            .get(key)
            .map(|r| state_for(r.stable_frames, self.cfg.stability_threshold))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records currently in the stable state.
    pub fn stable_count(&self) -> usize {
        self.records
            .values()
            .filter(|r| r.stable_frames >= self.cfg.stability_threshold)
            .count()
    }
}

impl Default for GarmentTracker {
    fn default() -> Self {
        Self::new(GarmentConfig::default())
    }
}

fn state_for(stable_frames: u32, threshold: u32) -> GarmentState {
    if stable_frames >= threshold {
        GarmentState::Stable
    } else {
        GarmentState::Tentative
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(color: Lab) -> GarmentObservation {
        GarmentObservation {
            color,
            bbox: BBox::new(0.0, 0.0, 10.0, 10.0),
        }
    }

    fn top(person: u64) -> GarmentKey {
        GarmentKey::new(person, Category::Top)
    }

    #[test]
    fn becomes_stable_on_third_frame() {
        let mut t = GarmentTracker::default();
        let red = Lab::new(53.0, 80.0, 67.0);

        let f1 = t.observe(top(0), obs(red));
        t.end_frame();
        let f2 = t.observe(top(0), obs(red));
        t.end_frame();
        let f3 = t.observe(top(0), obs(red));
        t.end_frame();

        assert_eq!(f1.state, GarmentState::Tentative);
        assert_eq!(f2.state, GarmentState::Tentative);
        assert!(f3.is_stable());
        assert_eq!(f1.id, f3.id);
        assert_eq!(f3.stable_frames, 3);
    }

    #[test]
    fn counter_counts_consecutive_frames() {
        let mut t = GarmentTracker::default();
        for n in 1..=10u32 {
            let g = t.observe(top(0), obs(Lab::default()));
            t.end_frame();
            assert_eq!(g.stable_frames, n);
            assert_eq!(g.is_stable(), n >= 3);
        }
    }

    #[test]
    fn first_observation_is_unsmoothed() {
        let mut t = GarmentTracker::default();
        let c = Lab::new(40.0, 10.0, -20.0);
        assert_eq!(t.observe(top(0), obs(c)).color, c);
    }

    #[test]
    fn smoothing_converges_geometrically() {
        let mut t = GarmentTracker::default();
        t.observe(top(0), obs(Lab::new(0.0, 0.0, 0.0)));
        t.end_frame();

        let target = Lab::new(100.0, 0.0, 0.0);
        let mut err = 100.0f32;
        for _ in 0..10 {
            let g = t.observe(top(0), obs(target));
            t.end_frame();
            let new_err = g.color.distance(&target);
            assert!((new_err - err * 0.7).abs() < 1e-3, "{new_err} vs {}", err * 0.7);
            err = new_err;
        }
    }

    #[test]
    fn keys_are_independent() {
        let mut t = GarmentTracker::default();
        let a = t.observe(top(0), obs(Lab::default()));
        let b = t.observe(GarmentKey::new(0, Category::Bottom), obs(Lab::default()));
        let c = t.observe(top(1), obs(Lab::default()));
        assert_eq!((a.id, b.id, c.id), (0, 1, 2));
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn duplicate_in_frame_does_not_double_count() {
        let mut t = GarmentTracker::default();
        t.observe(top(0), obs(Lab::default()));
        let g = t.observe(top(0), obs(Lab::default()));
        assert_eq!(g.stable_frames, 1);
        t.end_frame();
        assert_eq!(t.observe(top(0), obs(Lab::default())).stable_frames, 2);
    }

    #[test]
    fn repeat_in_frame_blends_once() {
        let mut t = GarmentTracker::default();
        t.observe(top(0), obs(Lab::new(0.0, 0.0, 0.0)));
        t.end_frame();

        let target = Lab::new(100.0, 0.0, 0.0);
        let once = t.observe(top(0), obs(target));
        let twice = t.observe(top(0), obs(target));
        assert_eq!(once.color, twice.color);
        assert!((twice.color.l - 30.0).abs() < 1e-3, "got {:?}", twice.color);
        assert_eq!(twice.stable_frames, 2);

        // The last observation of the frame wins.
        let other = t.observe(top(0), obs(Lab::new(50.0, 0.0, 0.0)));
        assert!((other.color.l - 15.0).abs() < 1e-3, "got {:?}", other.color);
    }

    #[test]
    fn repeat_in_creation_frame_keeps_raw_color() {
        let mut t = GarmentTracker::default();
        t.observe(top(0), obs(Lab::new(10.0, 0.0, 0.0)));
        let g = t.observe(top(0), obs(Lab::new(60.0, 0.0, 0.0)));
        assert_eq!(g.color, Lab::new(60.0, 0.0, 0.0));
        assert_eq!(g.stable_frames, 1);
    }

    #[test]
    fn eviction_after_absence_timeout() {
        let mut t = GarmentTracker::new(GarmentConfig {
            absence_timeout: 2,
            ..Default::default()
        });
        let first = t.observe(top(0), obs(Lab::default()));
        t.end_frame();

        assert!(t.end_frame().is_empty());
        assert!(t.end_frame().is_empty());
        assert_eq!(t.get(&top(0)).unwrap().missed, 2);
        assert_eq!(t.end_frame(), vec![(top(0), first.id)]);
        assert!(t.state(&top(0)).is_none());

        let again = t.observe(top(0), obs(Lab::default()));
        assert_ne!(again.id, first.id);
        assert_eq!(again.stable_frames, 1);
        assert_eq!(again.state, GarmentState::Tentative);
    }

    #[test]
    fn short_gap_keeps_identity_and_count() {
        let mut t = GarmentTracker::default();
        let first = t.observe(top(0), obs(Lab::default()));
        t.end_frame();
        t.end_frame();
        let g = t.observe(top(0), obs(Lab::default()));
        assert_eq!(g.id, first.id);
        assert_eq!(g.stable_frames, 2);
        assert_eq!(t.get(&top(0)).unwrap().missed, 0);
    }

    #[test]
    fn stable_count() {
        let mut t = GarmentTracker::new(GarmentConfig {
            stability_threshold: 1,
            ..Default::default()
        });
        t.observe(top(0), obs(Lab::default()));
        assert_eq!(t.stable_count(), 1);
        assert_eq!(t.state(&top(0)), Some(GarmentState::Stable));
    }
}
