use crate::lab::{Lab, Rgb};

/// Number of k-means clusters used for dominant color extraction.
pub const DEFAULT_CLUSTERS: usize = 3;

/// Pixels beyond this are subsampled with a fixed stride.
const MAX_SAMPLES: usize = 4096;

const MAX_ITERATIONS: usize = 10;

/// Returns the dominant color of a set of foreground pixels.
///
/// Runs k-means in Lab space and returns the center of the most populated
/// cluster. With `k` or fewer pixels it falls back to the per-channel
/// median. Returns `None` for an empty input.
///
/// The result is deterministic: the same pixels always produce the same
/// color, and a uniform input produces exactly that color.
pub fn dominant_lab(pixels: &[Rgb], k: usize) -> Option<Lab> {
    if pixels.is_empty() {
        return None;
    }

    let stride = pixels.len().div_ceil(MAX_SAMPLES).max(1);
    let samples: Vec<Lab> = pixels.iter().step_by(stride).map(Rgb::to_lab).collect();

    let k = k.max(1);
    if samples.len() <= k {
        return median_lab(&samples);
    }

    let (centers, counts) = kmeans(&samples, k);
    let mut best = 0;
    for (i, &c) in counts.iter().enumerate() {
        if c > counts[best] {
            best = i;
        }
    }
    Some(centers[best])
}

/// Per-channel median. Even-sized inputs average the two middle values.
pub fn median_lab(colors: &[Lab]) -> Option<Lab> {
    if colors.is_empty() {
        return None;
    }
    let channel = |f: fn(&Lab) -> f32| -> f32 {
        let mut v: Vec<f32> = colors.iter().map(f).collect();
        v.sort_by(|a, b| a.total_cmp(b));
        let mid = v.len() / 2;
        if v.len() % 2 == 0 {
            (v[mid - 1] + v[mid]) / 2.0
        } else {
            v[mid]
        }
    };
    Some(Lab::new(
        channel(|c: &Lab| c.l),
        channel(|c: &Lab| c.a),
        channel(|c: &Lab| c.b),
    ))
}

/// Lloyd's k-means with evenly spaced deterministic seeds.
/// Returns cluster centers and member counts.
fn kmeans(samples: &[Lab], k: usize) -> (Vec<Lab>, Vec<usize>) {
    let n = samples.len();
    let mut centers: Vec<Lab> = (0..k).map(|i| samples[i * n / k]).collect();
    let mut labels = vec![usize::MAX; n];
    let mut counts = vec![0usize; k];

    for _ in 0..MAX_ITERATIONS {
        let mut changed = false;
        for (i, s) in samples.iter().enumerate() {
            let nearest = nearest_center(s, &centers);
            if labels[i] != nearest {
                labels[i] = nearest;
                changed = true;
            }
        }

        let mut sums = vec![[0.0f64; 3]; k];
        counts.iter_mut().for_each(|c| *c = 0);
        for (s, &label) in samples.iter().zip(labels.iter()) {
            sums[label][0] += s.l as f64;
            sums[label][1] += s.a as f64;
            sums[label][2] += s.b as f64;
            counts[label] += 1;
        }
        for (c, (sum, &count)) in centers.iter_mut().zip(sums.iter().zip(counts.iter())) {
            // Empty clusters keep their previous center.
            if count > 0 {
                let n = count as f64;
                *c = Lab::new(
                    (sum[0] / n) as f32,
                    (sum[1] / n) as f32,
                    (sum[2] / n) as f32,
                );
            }
        }

        if !changed {
            break;
        }
    }

    (centers, counts)
}

fn nearest_center(s: &Lab, centers: &[Lab]) -> usize {
    let mut best = 0;
    let mut best_dist = f32::INFINITY;
    for (i, c) in centers.iter().enumerate() {
        let d = s.distance(c);
        if d < best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_none() {
        assert!(dominant_lab(&[], DEFAULT_CLUSTERS).is_none());
        assert!(median_lab(&[]).is_none());
    }

    #[test]
    fn uniform_input_is_stable() {
        let px = vec![Rgb(10, 120, 200); 500];
        let lab = dominant_lab(&px, DEFAULT_CLUSTERS).unwrap();
        let want = Rgb(10, 120, 200).to_lab();
        assert!(lab.distance(&want) < 1e-3, "got {lab:?}, want {want:?}");
        assert_eq!(lab.to_rgb(), Rgb(10, 120, 200));
    }

    #[test]
    fn majority_color_wins() {
        let mut px = vec![Rgb(220, 20, 20); 700];
        px.extend(vec![Rgb(20, 20, 220); 200]);
        px.extend(vec![Rgb(240, 240, 240); 100]);

        let lab = dominant_lab(&px, DEFAULT_CLUSTERS).unwrap();
        let red = Rgb(220, 20, 20).to_lab();
        assert!(lab.distance(&red) < 1.0, "dominant should be red, got {lab:?}");
    }

    #[test]
    fn few_pixels_use_median() {
        let px = [Rgb(0, 0, 0), Rgb(100, 100, 100)];
        let lab = dominant_lab(&px, DEFAULT_CLUSTERS).unwrap();
        let want = median_lab(&[px[0].to_lab(), px[1].to_lab()]).unwrap();
        assert_eq!(lab, want);
    }

    #[test]
    fn median_odd_and_even() {
        let odd = [Lab::new(1.0, 5.0, 9.0), Lab::new(3.0, 4.0, 7.0), Lab::new(2.0, 6.0, 8.0)];
        assert_eq!(median_lab(&odd).unwrap(), Lab::new(2.0, 5.0, 8.0));

        let even = [Lab::new(1.0, 0.0, 0.0), Lab::new(3.0, 2.0, -2.0)];
        assert_eq!(median_lab(&even).unwrap(), Lab::new(2.0, 1.0, -1.0));
    }

    #[test]
    fn large_inputs_are_subsampled_deterministically() {
        let px: Vec<Rgb> = (0..20_000)
            .map(|i| if i % 4 == 0 { Rgb(0, 0, 0) } else { Rgb(250, 250, 0) })
            .collect();
        let a = dominant_lab(&px, DEFAULT_CLUSTERS).unwrap();
        let b = dominant_lab(&px, DEFAULT_CLUSTERS).unwrap();
        assert_eq!(a, b);
        assert!(a.distance(&Rgb(250, 250, 0).to_lab()) < 1.0, "got {a:?}");
    }
}
