use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};
use wardrobe_catalog::{Catalog, QueryResult, RerankQuery};
use wardrobe_color::{dominant_lab, Lab, DEFAULT_CLUSTERS};
use wardrobe_tracker::{
    BBox, Category, GarmentKey, GarmentObservation, GarmentTracker, Mask, PersonAssociator,
    TrackedGarment,
};

use crate::config::Config;
use crate::embedder::{GarmentCrop, GarmentEmbedder};
use crate::error::{EmbedError, OverlayError};
use crate::frame::{Detection, Frame, Observation};
use crate::report::{FrameReport, GarmentReport};

/// Point-in-time counters of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub frames: u64,
    pub persons: usize,
    pub garments: usize,
    pub stable_garments: usize,
    pub catalog_items: usize,
}

/// A detection that survived filtering, ready for tracking.
struct Candidate {
    bbox: BBox,
    category: Category,
    label: String,
    confidence: f32,
    color: Lab,
}

/// Tracking state of one camera stream.
///
/// Frames must be fed in arrival order. The catalog is shared with other
/// sessions; everything else is owned by this session and dropped with it.
pub struct Session {
    cfg: Config,
    catalog: Arc<Catalog>,
    persons: PersonAssociator,
    garments: GarmentTracker,
    frames: u64,
}

impl Session {
    pub fn new(cfg: Config, catalog: Arc<Catalog>) -> Self {
        let persons = PersonAssociator::new(cfg.tracking.person.clone());
        let garments = GarmentTracker::new(cfg.tracking.garment.clone());
        Self {
            cfg,
            catalog,
            persons,
            garments,
            frames: 0,
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Processes one frame of segmenter output.
    ///
    /// Low-confidence detections and masks with too few foreground pixels
    /// are dropped. The dominant color is taken from the masked frame
    /// pixels; confirmed garments are embedded and looked up in the
    /// catalog. A garment whose embedding or search fails is reported
    /// without matches.
    pub fn process_frame(
        &mut self,
        frame: &Frame<'_>,
        detections: &[Detection],
        embedder: &dyn GarmentEmbedder,
    ) -> FrameReport {
        let (w, h) = (frame.width() as usize, frame.height() as usize);
        let mut dropped = 0;
        let mut candidates = Vec::with_capacity(detections.len());
        let mut masks = Vec::with_capacity(detections.len());

        for det in detections {
            if det.confidence < self.cfg.tracking.confidence_threshold {
                dropped += 1;
                continue;
            }
            let mask = match &det.mask {
                Some(m) => m.resample(w, h),
                None => Mask::from_rect(w, h, det.bbox),
            };
            if mask.foreground_count() < self.cfg.tracking.min_foreground_pixels {
                debug!(label = %det.label, "overlay: mask too small, dropped");
                dropped += 1;
                continue;
            }
            let Some(bbox) = mask.foreground_bounds() else {
                dropped += 1;
                continue;
            };
            let Some(color) = dominant_lab(&frame.masked_pixels(&mask, bbox), DEFAULT_CLUSTERS)
            else {
                dropped += 1;
                continue;
            };

            candidates.push(Candidate {
                bbox,
                category: Category::from_label(&det.label),
                label: det.label.clone(),
                confidence: det.confidence,
                color,
            });
            masks.push(mask);
        }

        let mut report = self.track(frame.width(), frame.height(), &candidates, |i, garment| {
            let crop = GarmentCrop {
                frame,
                mask: &masks[i],
                bbox: garment.bbox,
                category: garment.key.category,
            };
            embedder.embed(&crop).map(Some)
        });
        report.dropped += dropped;
        report
    }

    /// Processes one frame of pre-extracted observations. Confirmed
    /// garments without an embedding are reported without matches.
    pub fn process_observations(
        &mut self,
        frame_width: u32,
        frame_height: u32,
        observations: &[Observation],
    ) -> FrameReport {
        let mut dropped = 0;
        let mut candidates = Vec::with_capacity(observations.len());
        let mut embeddings = Vec::with_capacity(observations.len());

        for obs in observations {
            let too_small = obs
                .foreground_pixels
                .is_some_and(|n| n < self.cfg.tracking.min_foreground_pixels);
            if obs.confidence < self.cfg.tracking.confidence_threshold || too_small {
                dropped += 1;
                continue;
            }
            candidates.push(Candidate {
                bbox: obs.bbox,
                category: Category::from_label(&obs.label),
                label: obs.label.clone(),
                confidence: obs.confidence,
                color: obs.color,
            });
            embeddings.push(obs.embedding.as_deref());
        }

        let mut report = self.track(frame_width, frame_height, &candidates, |i, _| {
            Ok(embeddings[i].map(<[f32]>::to_vec))
        });
        report.dropped += dropped;
        report
    }

    /// Catalog matches for a garment embedding, re-ranked by the garment's
    /// category and smoothed color.
    pub fn similar_items(
        &self,
        embedding: &[f32],
        garment: &TrackedGarment,
    ) -> Result<Vec<QueryResult>, OverlayError> {
        let query = RerankQuery {
            category: Some(garment.key.category.to_string()),
            color: Some(garment.color),
        };
        Ok(self
            .catalog
            .find_similar(embedding, Some(&query), &self.cfg.search)?)
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            frames: self.frames,
            persons: self.persons.len(),
            garments: self.garments.len(),
            stable_garments: self.garments.stable_count(),
            catalog_items: self.catalog.len(),
        }
    }

    fn track<F>(&mut self, width: u32, height: u32, candidates: &[Candidate], mut embed: F) -> FrameReport
    where
        F: FnMut(usize, &TrackedGarment) -> Result<Option<Vec<f32>>, EmbedError>,
    {
        self.frames += 1;
        let mut report = FrameReport {
            frame: self.frames,
            ..Default::default()
        };

        let boxes: Vec<BBox> = candidates.iter().map(|c| c.bbox).collect();
        let person_ids = self.persons.associate(width, height, &boxes);

        // Keep the most confident detection per garment slot.
        let mut best: HashMap<GarmentKey, usize> = HashMap::new();
        for (i, (c, &pid)) in candidates.iter().zip(person_ids.iter()).enumerate() {
            let key = GarmentKey::new(pid, c.category);
            match best.get(&key) {
                Some(&j) if candidates[j].confidence >= c.confidence => {}
                _ => {
                    best.insert(key, i);
                }
            }
        }
        report.dropped = candidates.len() - best.len();

        let mut selected: Vec<(usize, GarmentKey)> = best.into_iter().map(|(k, i)| (i, k)).collect();
        selected.sort_by_key(|&(i, _)| i);

        for (i, key) in selected {
            let c = &candidates[i];
            let garment = self.garments.observe(
                key,
                GarmentObservation {
                    color: c.color,
                    bbox: c.bbox,
                },
            );
            if !garment.is_stable() {
                report.tentative += 1;
                continue;
            }

            let similar = match embed(i, &garment) {
                Ok(Some(embedding)) => self.similar_items(&embedding, &garment),
                Ok(None) => Ok(Vec::new()),
                Err(e) => Err(e.into()),
            };
            let similar = similar.unwrap_or_else(|e| {
                warn!(garment = garment.id, error = %e, "overlay: lookup failed");
                report.failed += 1;
                Vec::new()
            });

            report
                .garments
                .push(GarmentReport::new(&garment, &c.label, c.confidence, similar));
        }

        self.garments.end_frame();
        report
    }
}
