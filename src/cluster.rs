//! Streaming k-means over embedding vectors.
//!
//! Fits centroids from consecutive batches so no more than one batch of
//! per-point bookkeeping is alive at a time, then assigns every vector to
//! its nearest final centroid in one full pass. Matches the mini-batch
//! k-means update: each touched centroid moves to the running mean of all
//! points ever assigned to it, weighted by cumulative assignment counts.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Errors raised when constructing a clusterer.
#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    #[error("num_clusters must be greater than 0")]
    ZeroClusters,

    #[error("batch_size must be greater than 0")]
    ZeroBatchSize,
}

/// One record's final cluster membership.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Assignment {
    pub record_id: u64,
    pub cluster: usize,
}

/// Bounded-memory k-means on fixed-dimension embeddings.
///
/// The effective cluster count is `min(num_clusters, N)`; fitting zero
/// vectors is a no-op. Initialization is seeded so that identical inputs
/// and configuration reproduce identical centroids.
pub struct IncrementalClusterer {
    num_clusters: usize,
    batch_size: usize,
    seed: u64,
}

impl IncrementalClusterer {
    pub fn new(num_clusters: usize, batch_size: usize, seed: u64) -> Result<Self, ClusterError> {
        if num_clusters == 0 {
            return Err(ClusterError::ZeroClusters);
        }
        if batch_size == 0 {
            return Err(ClusterError::ZeroBatchSize);
        }
        Ok(Self {
            num_clusters,
            batch_size,
            seed,
        })
    }

    /// Fit centroids from the embedding sequence, batch by batch.
    ///
    /// Returns `min(num_clusters, N)` centroids; an empty input returns
    /// an empty centroid set.
    pub fn fit(&self, embeddings: &[Vec<f32>]) -> Vec<Vec<f32>> {
        let n = embeddings.len();
        if n == 0 {
            return vec![];
        }
        let k = self.num_clusters.min(n);
        let dim = embeddings[0].len();

        // Seeded init: k distinct vectors sampled from the input.
        let mut rng = StdRng::seed_from_u64(self.seed);
        let chosen = rand::seq::index::sample(&mut rng, n, k);
        let mut centroids: Vec<Vec<f32>> = chosen.iter().map(|i| embeddings[i].clone()).collect();
        let mut counts = vec![0u64; k];

        for batch in embeddings.chunks(self.batch_size) {
            // Nearest-centroid per point is order-independent; the
            // weighted-mean update below stays serial.
            let nearest: Vec<usize> = batch
                .par_iter()
                .map(|point| nearest_centroid(point, &centroids))
                .collect();

            let mut sums = vec![vec![0f32; dim]; k];
            let mut batch_counts = vec![0u64; k];
            for (point, &c) in batch.iter().zip(&nearest) {
                for (s, v) in sums[c].iter_mut().zip(point) {
                    *s += v;
                }
                batch_counts[c] += 1;
            }

            for c in 0..k {
                if batch_counts[c] == 0 {
                    continue;
                }
                let prior = counts[c] as f32;
                let fresh = batch_counts[c] as f32;
                let total = prior + fresh;
                for d in 0..dim {
                    let batch_mean = sums[c][d] / fresh;
                    centroids[c][d] = (centroids[c][d] * prior + batch_mean * fresh) / total;
                }
                counts[c] += batch_counts[c];
            }
        }

        centroids
    }

    /// Assign every embedding to its nearest centroid.
    ///
    /// Output is aligned with the input sequence. Ties resolve to the
    /// lowest centroid index.
    pub fn assign(embeddings: &[Vec<f32>], centroids: &[Vec<f32>]) -> Vec<usize> {
        if centroids.is_empty() {
            return vec![];
        }
        embeddings
            .par_iter()
            .map(|point| nearest_centroid(point, centroids))
            .collect()
    }
}

/// Index of the centroid closest to `point` (squared Euclidean distance).
/// Strict improvement keeps ties on the lowest index.
fn nearest_centroid(point: &[f32], centroids: &[Vec<f32>]) -> usize {
    let mut best = 0usize;
    let mut best_dist = f32::INFINITY;
    for (idx, centroid) in centroids.iter().enumerate() {
        let dist: f32 = point
            .iter()
            .zip(centroid.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        if dist < best_dist {
            best = idx;
            best_dist = dist;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clusterer(k: usize) -> IncrementalClusterer {
        IncrementalClusterer::new(k, 2, 42).unwrap()
    }

    #[test]
    fn test_zero_clusters_rejected() {
        assert!(matches!(
            IncrementalClusterer::new(0, 10, 42),
            Err(ClusterError::ZeroClusters)
        ));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        assert!(matches!(
            IncrementalClusterer::new(5, 0, 42),
            Err(ClusterError::ZeroBatchSize)
        ));
    }

    #[test]
    fn test_fit_empty_input() {
        let centroids = clusterer(3).fit(&[]);
        assert!(centroids.is_empty());
        assert!(IncrementalClusterer::assign(&[], &centroids).is_empty());
    }

    #[test]
    fn test_k_clamped_to_n() {
        let embeddings = vec![vec![0.0, 0.0], vec![10.0, 10.0]];
        let centroids = clusterer(20).fit(&embeddings);

        assert_eq!(centroids.len(), 2);

        let assignment = IncrementalClusterer::assign(&embeddings, &centroids);
        assert!(assignment.iter().all(|&c| c < 2));
    }

    #[test]
    fn test_single_point_single_cluster() {
        let embeddings = vec![vec![1.0, 2.0, 3.0]];
        let centroids = clusterer(20).fit(&embeddings);

        assert_eq!(centroids.len(), 1);
        assert_eq!(centroids[0], vec![1.0, 2.0, 3.0]);
        assert_eq!(
            IncrementalClusterer::assign(&embeddings, &centroids),
            vec![0]
        );
    }

    #[test]
    fn test_separated_groups_get_separate_clusters() {
        let mut embeddings = vec![];
        for i in 0..5 {
            embeddings.push(vec![0.0 + i as f32 * 0.01, 0.0]);
        }
        for i in 0..5 {
            embeddings.push(vec![100.0 + i as f32 * 0.01, 100.0]);
        }

        let centroids = clusterer(2).fit(&embeddings);
        let assignment = IncrementalClusterer::assign(&embeddings, &centroids);

        // All of the first group together, all of the second group together,
        // and the two groups apart.
        assert!(assignment[..5].iter().all(|&c| c == assignment[0]));
        assert!(assignment[5..].iter().all(|&c| c == assignment[5]));
        assert_ne!(assignment[0], assignment[5]);
    }

    #[test]
    fn test_fit_is_deterministic_for_fixed_seed() {
        let embeddings: Vec<Vec<f32>> = (0..30)
            .map(|i| vec![(i % 7) as f32, (i % 3) as f32, i as f32 * 0.1])
            .collect();

        let a = clusterer(4).fit(&embeddings);
        let b = clusterer(4).fit(&embeddings);
        assert_eq!(a, b);
    }

    #[test]
    fn test_tie_breaks_to_lowest_index() {
        // Two identical centroids: every point is equidistant.
        let centroids = vec![vec![1.0, 1.0], vec![1.0, 1.0]];
        let embeddings = vec![vec![0.0, 0.0], vec![5.0, 5.0]];

        let assignment = IncrementalClusterer::assign(&embeddings, &centroids);
        assert_eq!(assignment, vec![0, 0]);
    }

    #[test]
    fn test_centroid_tracks_running_mean_single_cluster() {
        // One cluster: after all batches the centroid is the global mean.
        let embeddings = vec![
            vec![0.0, 0.0],
            vec![2.0, 0.0],
            vec![0.0, 2.0],
            vec![2.0, 2.0],
        ];
        let centroids = IncrementalClusterer::new(1, 2, 7).unwrap().fit(&embeddings);

        assert_eq!(centroids.len(), 1);
        assert!((centroids[0][0] - 1.0).abs() < 1e-6);
        assert!((centroids[0][1] - 1.0).abs() < 1e-6);
    }
}
