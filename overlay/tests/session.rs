use std::sync::Arc;

use wardrobe_catalog::{Catalog, IndexConfig, IndexKind, ItemMetadata};
use wardrobe_color::Rgb;
use wardrobe_overlay::{
    Config, Detection, EmbedError, Frame, GarmentCrop, GarmentEmbedder, Session,
};
use wardrobe_tracker::{BBox, Category, Mask};

const W: u32 = 640;
const H: u32 = 480;

/// Embeds a crop by its mean color, so red garments match red items.
struct MeanColorEmbedder;

impl GarmentEmbedder for MeanColorEmbedder {
    fn embed(&self, crop: &GarmentCrop<'_>) -> Result<Vec<f32>, EmbedError> {
        let px = crop.pixels();
        if px.is_empty() {
            return Err(EmbedError::EmptyCrop);
        }
        let n = px.len() as f32;
        let (r, g, b) = px.iter().fold((0.0, 0.0, 0.0), |(r, g, b), p| {
            (r + p.0 as f32, g + p.1 as f32, b + p.2 as f32)
        });
        Ok(vec![r / n + 1.0, g / n + 1.0, b / n + 1.0])
    }
}

struct FailingEmbedder;

impl GarmentEmbedder for FailingEmbedder {
    fn embed(&self, _crop: &GarmentCrop<'_>) -> Result<Vec<f32>, EmbedError> {
        Err(EmbedError::Model("offline".into()))
    }
}

fn catalog() -> Arc<Catalog> {
    let cat = Catalog::new(&IndexConfig {
        kind: IndexKind::Flat,
        dim: 3,
        ..Default::default()
    });
    cat.add(
        &[&[255.0, 1.0, 1.0], &[1.0, 1.0, 255.0], &[200.0, 10.0, 10.0]],
        vec![
            ItemMetadata::new("red_shirt.jpg")
                .with_category("top")
                .with_color(Rgb(220, 20, 20).to_lab()),
            ItemMetadata::new("blue_jeans.jpg")
                .with_category("bottom")
                .with_color(Rgb(20, 20, 220).to_lab()),
            ItemMetadata::new("red_skirt.jpg")
                .with_category("bottom")
                .with_color(Rgb(200, 10, 10).to_lab()),
        ],
    )
    .unwrap();
    Arc::new(cat)
}

/// A grey frame with the given boxes painted.
fn paint(boxes: &[(BBox, Rgb)]) -> Vec<Rgb> {
    let mut px = vec![Rgb(128, 128, 128); (W * H) as usize];
    for (b, c) in boxes {
        for y in b.y as usize..(b.y + b.h) as usize {
            for x in b.x as usize..(b.x + b.w) as usize {
                px[y * W as usize + x] = *c;
            }
        }
    }
    px
}

fn det(bbox: BBox, label: &str) -> Detection {
    Detection {
        bbox,
        mask: None,
        label: label.into(),
        confidence: 0.9,
    }
}

#[test]
fn garment_confirmed_on_third_frame_with_same_id() {
    let mut s = Session::new(Config::default(), catalog());
    let bbox = BBox::new(0.0, 0.0, 10.0, 10.0);
    let px = paint(&[(bbox, Rgb(220, 20, 20))]);
    let frame = Frame::new(W, H, &px).unwrap();
    let dets = [det(bbox, "short_sleeve_top")];

    let r1 = s.process_frame(&frame, &dets, &MeanColorEmbedder);
    let r2 = s.process_frame(&frame, &dets, &MeanColorEmbedder);
    let r3 = s.process_frame(&frame, &dets, &MeanColorEmbedder);

    assert!(r1.garments.is_empty());
    assert_eq!(r1.tentative, 1);
    assert!(r2.garments.is_empty());
    assert_eq!(r3.garments.len(), 1);

    let g = &r3.garments[0];
    assert_eq!(g.garment_id, 0);
    assert_eq!(g.person_id, 0);
    assert_eq!(g.category, Category::Top);
    assert_eq!(g.fine_category, "short_sleeve_top");
    assert_eq!(g.bbox, bbox);
    assert_eq!(g.color, Rgb(220, 20, 20));
    assert_eq!(g.color_hex, "#dc1414");

    // Red top: the red shirt wins on category and color.
    assert_eq!(g.similar_items[0].item.filename, "red_shirt.jpg");
    assert!(g.similar_items[0].similarity > g.similar_items[0].base_score);
    assert_eq!(g.similar_items.len(), 3);
}

#[test]
fn two_people_far_apart() {
    let mut cfg = Config::default();
    cfg.tracking.garment.stability_threshold = 1;
    let mut s = Session::new(cfg, catalog());

    let a = BBox::new(50.0, 200.0, 20.0, 20.0);
    let b = BBox::new(300.0, 200.0, 20.0, 20.0);
    let px = paint(&[(a, Rgb(220, 20, 20)), (b, Rgb(20, 20, 220))]);
    let frame = Frame::new(W, H, &px).unwrap();

    let r = s.process_frame(&frame, &[det(a, "trousers"), det(b, "trousers")], &MeanColorEmbedder);
    assert_eq!(r.garments.len(), 2);
    assert_ne!(r.garments[0].person_id, r.garments[1].person_id);
    assert_ne!(r.garments[0].garment_id, r.garments[1].garment_id);
    assert_eq!(r.garments[1].similar_items[0].item.filename, "blue_jeans.jpg");
}

#[test]
fn soft_mask_is_resampled_and_thresholded() {
    let mut cfg = Config::default();
    cfg.tracking.garment.stability_threshold = 1;
    let mut s = Session::new(cfg, catalog());

    let region = BBox::new(0.0, 0.0, 320.0, 240.0);
    let px = paint(&[(region, Rgb(20, 20, 220))]);
    let frame = Frame::new(W, H, &px).unwrap();

    // 2x2 mask: only the top-left quadrant is confidently foreground.
    let mask = Mask::new(2, 2, vec![0.9, 0.5, 0.2, 0.0]).unwrap();
    let d = Detection {
        bbox: BBox::new(0.0, 0.0, 640.0, 480.0),
        mask: Some(mask),
        label: "skirt".into(),
        confidence: 0.8,
    };
    let r = s.process_frame(&frame, &[d], &MeanColorEmbedder);
    assert_eq!(r.garments.len(), 1);
    assert_eq!(r.garments[0].bbox, region);
    assert_eq!(r.garments[0].color, Rgb(20, 20, 220));
    assert_eq!(r.garments[0].category, Category::Bottom);
}

#[test]
fn degenerate_detection_is_suppressed() {
    let mut s = Session::new(Config::default(), catalog());
    let tiny = BBox::new(0.0, 0.0, 9.0, 9.0);
    let px = paint(&[(tiny, Rgb(220, 20, 20))]);
    let frame = Frame::new(W, H, &px).unwrap();

    let r = s.process_frame(&frame, &[det(tiny, "top")], &MeanColorEmbedder);
    assert_eq!(r.dropped, 1);
    assert_eq!(s.stats().garments, 0);
    assert_eq!(s.stats().persons, 0);
}

#[test]
fn embedder_failure_does_not_abort_frame() {
    let mut cfg = Config::default();
    cfg.tracking.garment.stability_threshold = 1;
    let mut s = Session::new(cfg, catalog());
    let bbox = BBox::new(0.0, 0.0, 20.0, 20.0);
    let px = paint(&[(bbox, Rgb(220, 20, 20))]);
    let frame = Frame::new(W, H, &px).unwrap();

    let r = s.process_frame(&frame, &[det(bbox, "top")], &FailingEmbedder);
    assert_eq!(r.garments.len(), 1);
    assert_eq!(r.failed, 1);
    assert!(r.garments[0].similar_items.is_empty());
}

#[test]
fn empty_catalog_yields_no_matches() {
    let mut cfg = Config::default();
    cfg.tracking.garment.stability_threshold = 1;
    let cat = Arc::new(Catalog::new(&cfg.index));
    let mut s = Session::new(cfg, cat);

    let bbox = BBox::new(0.0, 0.0, 20.0, 20.0);
    let px = paint(&[(bbox, Rgb(220, 20, 20))]);
    let frame = Frame::new(W, H, &px).unwrap();

    // A 3-d query against the 512-d index is a dimension error.
    let r = s.process_frame(&frame, &[det(bbox, "top")], &MeanColorEmbedder);
    assert_eq!(r.garments.len(), 1);
    assert_eq!(r.failed, 1);

    let obs = wardrobe_overlay::Observation {
        bbox,
        label: "top".into(),
        confidence: 1.0,
        color: Rgb(220, 20, 20).to_lab(),
        foreground_pixels: Some(400),
        embedding: Some(vec![0.5; 512]),
    };
    // A well-formed query against the untrained index finds nothing.
    let r = s.process_observations(W, H, &[obs]);
    assert_eq!(r.failed, 0);
    assert!(r.garments[0].similar_items.is_empty());
}

#[test]
fn sessions_are_isolated() {
    let cat = catalog();
    let mut a = Session::new(Config::default(), Arc::clone(&cat));
    let mut b = Session::new(Config::default(), cat);

    let bbox = BBox::new(0.0, 0.0, 20.0, 20.0);
    let px = paint(&[(bbox, Rgb(220, 20, 20))]);
    let frame = Frame::new(W, H, &px).unwrap();
    for _ in 0..3 {
        a.process_frame(&frame, &[det(bbox, "top")], &MeanColorEmbedder);
    }
    let r = b.process_frame(&frame, &[det(bbox, "top")], &MeanColorEmbedder);

    assert!(r.garments.is_empty());
    assert_eq!(a.stats().stable_garments, 1);
    assert_eq!(b.stats().stable_garments, 0);
    assert_eq!(b.stats().frames, 1);
}

#[test]
fn garment_reappears_with_new_id_after_eviction() {
    let mut cfg = Config::default();
    cfg.tracking.garment.stability_threshold = 1;
    cfg.tracking.garment.absence_timeout = 1;
    cfg.tracking.person.eviction_timeout = 1;
    let mut s = Session::new(cfg, catalog());

    let bbox = BBox::new(0.0, 0.0, 20.0, 20.0);
    let px = paint(&[(bbox, Rgb(220, 20, 20))]);
    let frame = Frame::new(W, H, &px).unwrap();
    let first = s.process_frame(&frame, &[det(bbox, "top")], &MeanColorEmbedder);

    s.process_frame(&frame, &[], &MeanColorEmbedder);
    s.process_frame(&frame, &[], &MeanColorEmbedder);
    assert_eq!(s.stats().garments, 0);

    let again = s.process_frame(&frame, &[det(bbox, "top")], &MeanColorEmbedder);
    assert_ne!(first.garments[0].garment_id, again.garments[0].garment_id);
}
