use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::vector::{inner_product, l2_normalize};

/// Spherical k-means over unit vectors.
///
/// Seeds with k-means++ (cosine distance) from a fixed-seed RNG so the same
/// sample always yields the same centroids. Centroids are re-normalized
/// after every update; a cluster that loses all members keeps its previous
/// centroid. Returns at most `k` centroids (fewer if `samples` is smaller).
pub(crate) fn spherical_kmeans(
    samples: &[Vec<f32>],
    k: usize,
    max_iter: usize,
    seed: u64,
) -> Vec<Vec<f32>> {
    let n = samples.len();
    let k = k.min(n);
    if k == 0 {
        return Vec::new();
    }
    let dim = samples[0].len();

    let mut rng = StdRng::seed_from_u64(seed);
    let mut centroids = seed_plus_plus(samples, k, &mut rng);

    let mut labels = vec![usize::MAX; n];
    for _ in 0..max_iter {
        let mut changed = false;
        for (i, s) in samples.iter().enumerate() {
            let c = nearest(&centroids, s);
            if labels[i] != c {
                labels[i] = c;
                changed = true;
            }
        }
        if !changed {
            break;
        }

        let mut sums = vec![vec![0.0f32; dim]; k];
        let mut counts = vec![0usize; k];
        for (s, &label) in samples.iter().zip(labels.iter()) {
            for (acc, &x) in sums[label].iter_mut().zip(s.iter()) {
                *acc += x;
            }
            counts[label] += 1;
        }
        for ((centroid, mut sum), count) in centroids.iter_mut().zip(sums).zip(counts) {
            if count == 0 {
                continue;
            }
            if l2_normalize(&mut sum) > 0.0 {
                *centroid = sum;
            }
        }
    }

    centroids
}

/// Returns the index of the centroid with the highest inner product.
/// Ties go to the lower index.
pub(crate) fn nearest(centroids: &[Vec<f32>], v: &[f32]) -> usize {
    let mut best = 0;
    let mut best_sim = f32::NEG_INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let sim = inner_product(c, v);
        if sim > best_sim {
            best_sim = sim;
            best = i;
        }
    }
    best
}

fn seed_plus_plus(samples: &[Vec<f32>], k: usize, rng: &mut StdRng) -> Vec<Vec<f32>> {
    let n = samples.len();
    let mut centroids = Vec::with_capacity(k);
    centroids.push(samples[rng.gen_range(0..n)].clone());

    // Distance of every sample to its closest chosen centroid.
    let mut dist: Vec<f64> = samples
        .iter()
        .map(|s| cosine_gap(s, &centroids[0]))
        .collect();

    while centroids.len() < k {
        let total: f64 = dist.iter().sum();
        let pick = if total > 0.0 {
            let mut target = rng.r#gen::<f64>() * total;
            let mut chosen = n - 1;
            for (i, &d) in dist.iter().enumerate() {
                if target < d {
                    chosen = i;
                    break;
                }
                target -= d;
            }
            chosen
        } else {
            // All remaining samples coincide with a centroid.
            rng.gen_range(0..n)
        };

        let c = samples[pick].clone();
        for (d, s) in dist.iter_mut().zip(samples.iter()) {
            *d = d.min(cosine_gap(s, &c));
        }
        centroids.push(c);
    }
    centroids
}

fn cosine_gap(a: &[f32], b: &[f32]) -> f64 {
    (1.0 - inner_product(a, b) as f64).max(0.0)
}
