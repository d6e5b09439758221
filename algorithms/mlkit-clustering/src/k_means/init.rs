use super::algorithm::update_min_dists;
use log::trace;
use mlkit::Float;
use ndarray::{s, Array1, Array2, ArrayView2, Axis};
use ndarray_rand::rand::distributions::{Distribution, WeightedIndex};
use ndarray_rand::rand::{self, Rng};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
/// Specifies centroid initialization algorithm for KMeans.
pub enum KMeansInit {
    /// Pick `k` distinct observations uniformly at random.
    Random,
    /// K-means++ algorithm. The first centroid is picked uniformly at random, every following
    /// one with a probability proportional to its squared distance to the closest centroid
    /// picked so far. Gives an initial error within `O(log k)` of the optimum.
    KMeansPlusPlus,
}

impl KMeansInit {
    /// Runs the chosen initialization routine. Every selected centroid is a distinct
    /// observation of the dataset.
    pub(crate) fn run<F: Float>(
        &self,
        n_clusters: usize,
        observations: ArrayView2<F>,
        rng: &mut impl Rng,
    ) -> Array2<F> {
        let indices = match self {
            Self::Random => random_init(n_clusters, observations, rng),
            Self::KMeansPlusPlus => k_means_plusplus(n_clusters, observations, rng),
        };
        trace!("initial centroids drawn from observations {:?}", indices);

        observations.select(Axis(0), &indices)
    }
}

/// Pick random observations as initial centroids
fn random_init<F: Float>(
    n_clusters: usize,
    observations: ArrayView2<F>,
    rng: &mut impl Rng,
) -> Vec<usize> {
    let n_samples = observations.nrows();
    rand::seq::index::sample(rng, n_samples, n_clusters).into_vec()
}

/// Selects centroids using the KMeans++ initialization algorithm
fn k_means_plusplus<F: Float>(
    n_clusters: usize,
    observations: ArrayView2<F>,
    rng: &mut impl Rng,
) -> Vec<usize> {
    let (n_samples, n_features) = observations.dim();
    let mut centroids = Array2::zeros((n_clusters, n_features));
    let mut chosen = Vec::with_capacity(n_clusters);

    let first = rng.gen_range(0..n_samples);
    centroids.row_mut(0).assign(&observations.row(first));
    chosen.push(first);

    let mut dists = Array1::zeros(n_samples);
    for c_cnt in 1..n_clusters {
        update_min_dists(
            &centroids.slice(s![0..c_cnt, ..]),
            &observations,
            &mut dists,
        );

        // Already chosen observations have weight zero. If every weight is zero the remaining
        // observations coincide with a centroid, so we fall back to the first unused one.
        let centroid_idx = match WeightedIndex::new(dists.iter()) {
            Ok(weights) => weights.sample(rng),
            Err(_) => (0..n_samples)
                .find(|idx| !chosen.contains(idx))
                .unwrap_or(0),
        };
        centroids
            .row_mut(c_cnt)
            .assign(&observations.row(centroid_idx));
        chosen.push(centroid_idx);
    }

    chosen
}
