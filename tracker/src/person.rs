use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::BBox;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonConfig {
    /// Match radius as a fraction of the frame's shorter side.
    pub distance_ratio: f32,

    /// Frames a person may go unseen before the track is dropped.
    pub eviction_timeout: u32,
}

impl Default for PersonConfig {
    fn default() -> Self {
        Self {
            distance_ratio: 0.3,
            eviction_timeout: 30,
        }
    }
}

/// Last known position of one person.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonTrack {
    pub id: u64,
    pub center: (f32, f32),
    /// Consecutive frames without a matching detection.
    pub missed: u32,
}

/// Groups garment detections into people by spatial proximity.
pub struct PersonAssociator {
    cfg: PersonConfig,
    tracks: BTreeMap<u64, PersonTrack>,
    next_id: u64,
}

impl PersonAssociator {
    pub fn new(cfg: PersonConfig) -> Self {
        Self {
            cfg,
            tracks: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Match radius in pixels for a frame of the given size.
    pub fn threshold(&self, frame_width: u32, frame_height: u32) -> f32 {
        self.cfg.distance_ratio * frame_width.min(frame_height) as f32
    }

    /// Assigns a person id to every box of the current frame, in order.
    ///
    /// Each box joins the nearest track whose last center is closer than
    /// [`Self::threshold`] (ties go to the lower id) and moves that track
    /// to the box center; otherwise it starts a new track. Tracks created
    /// earlier in the same frame are candidates too. Afterwards every
    /// unmatched track ages by one frame and tracks unseen for longer than
    /// the eviction timeout are dropped.
    pub fn associate(&mut self, frame_width: u32, frame_height: u32, boxes: &[BBox]) -> Vec<u64> {
        let threshold = self.threshold(frame_width, frame_height);
        let mut matched = HashSet::with_capacity(boxes.len());
        let mut ids = Vec::with_capacity(boxes.len());

        for bbox in boxes {
            let (cx, cy) = bbox.center();

            let mut best: Option<(u64, f32)> = None;
            for t in self.tracks.values() {
                let d = (cx - t.center.0).hypot(cy - t.center.1);
                if d < threshold && best.is_none_or(|(_, bd)| d < bd) {
                    best = Some((t.id, d));
                }
            }

            let id = match best {
                Some((id, _)) => {
                    if let Some(t) = self.tracks.get_mut(&id) {
                        t.center = (cx, cy);
                        t.missed = 0;
                    }
                    id
                }
                None => {
                    let id = self.next_id;
                    self.next_id += 1;
                    self.tracks.insert(
                        id,
                        PersonTrack {
                            id,
                            center: (cx, cy),
                            missed: 0,
                        },
                    );
                    debug!(person = id, x = cx, y = cy, "person: new track");
                    id
                }
            };
            matched.insert(id);
            ids.push(id);
        }

        let timeout = self.cfg.eviction_timeout;
        self.tracks.retain(|&id, t| {
            if matched.contains(&id) {
                return true;
            }
            t.missed += 1;
            if t.missed > timeout {
                debug!(person = id, missed = t.missed, "person: track evicted");
                return false;
            }
            true
        });

        ids
    }

    pub fn get(&self, id: u64) -> Option<&PersonTrack> {
        self.tracks.get(&id)
    }

    /// Live tracks in id order.
    pub fn tracks(&self) -> impl Iterator<Item = &PersonTrack> {
        self.tracks.values()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

impl Default for PersonAssociator {
    fn default() -> Self {
        Self::new(PersonConfig::default())
    }
}
