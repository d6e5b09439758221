use crate::bisecting_k_means::errors::BisectingKMeansError;
use crate::bisecting_k_means::{BisectingKMeansParams, BisectingKMeansValidParams};
use crate::{KMeans, KMeansError};
use log::{debug, trace, warn};
use mlkit::prelude::*;
use ndarray::{Array1, Array2, ArrayBase, Data, Ix2};
use ndarray_rand::rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug)]
/// Bisecting K-means is a divisive variant of [K-means](crate::KMeans).
///
/// ## The algorithm
///
/// Starting from a single cluster holding every observation, the cluster with the largest sum
/// of squared errors is split in two by running K-means with two clusters on its observations.
/// The split is repeated until the requested number of clusters exists.
///
/// Every split tries `restarts` independent two-way K-means runs, each with its own seed drawn
/// from the generator of the hyperparameters, and keeps the one with the lowest error. The first
/// part of a split takes the place of the split cluster, the second part is appended.
///
/// Clusters with a single observation cannot be split. If no cluster can be split before the
/// requested count is reached, the result holds fewer clusters and a warning is logged; callers
/// observe this through [`n_clusters`](Clustering::n_clusters).
///
/// ## Tutorial
///
/// ```
/// use mlkit::prelude::*;
/// use mlkit_clustering::BisectingKMeans;
/// use ndarray::array;
///
/// let dataset = DataSet::new(array![[0., 0.], [0., 1.], [9., 9.], [9., 10.], [20., 0.]]);
///
/// let model = BisectingKMeans::params()
///     .random_seed(7)
///     .build(&dataset, 3)
///     .expect("bisecting k-means fitted");
///
/// assert_eq!(model.n_clusters(), 3);
/// assert_eq!(model.n_splits(), 2);
/// assert!(is_partition(model.clusters(), dataset.nsamples()));
/// ```
pub struct BisectingKMeans<F: Float> {
    centroids: Array2<F>,
    clusters: Vec<Cluster<F>>,
    sse: F,
    n_splits: usize,
    sse_history: Vec<F>,
}

impl<F: Float> BisectingKMeans<F> {
    pub fn params() -> BisectingKMeansParams<F, Xoshiro256Plus> {
        BisectingKMeansParams::new(Xoshiro256Plus::seed_from_u64(42))
    }

    pub fn params_with_rng<R: Rng>(rng: R) -> BisectingKMeansParams<F, R> {
        BisectingKMeansParams::new(rng)
    }

    /// Centroids with shape `(n_clusters, n_features)`, the i-th row is the mean of the
    /// i-th cluster
    pub fn centroids(&self) -> &Array2<F> {
        &self.centroids
    }

    /// Number of splits performed
    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Total sum of squared errors before the first split and after every split
    pub fn sse_history(&self) -> &[F] {
        &self.sse_history
    }

    /// Index of the closest centroid for every row of `observations`, ties going to the
    /// lowest index
    pub fn predict(&self, observations: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<usize> {
        observations
            .rows()
            .into_iter()
            .map(|observation| {
                self.centroids
                    .rows()
                    .into_iter()
                    .map(|centroid| L2Dist.rdistance(observation, centroid))
                    .enumerate()
                    .fold((0, F::infinity()), |best, (idx, dist)| {
                        if dist < best.1 {
                            (idx, dist)
                        } else {
                            best
                        }
                    })
                    .0
            })
            .collect()
    }
}

impl<F: Float> Clustering<F> for BisectingKMeans<F> {
    fn clusters(&self) -> &[Cluster<F>] {
        &self.clusters
    }

    fn sse(&self) -> F {
        self.sse
    }
}

impl<F: Float, R: Rng + SeedableRng + Clone> Build<F, BisectingKMeansError>
    for BisectingKMeansValidParams<F, R>
{
    type Object = BisectingKMeans<F>;

    /// Split the dataset into `n_clusters` clusters
    ///
    /// Fails if the dataset is empty or if `n_clusters` is zero or larger than the number of
    /// observations.
    fn build(
        &self,
        dataset: &DataSet<F>,
        n_clusters: usize,
    ) -> Result<BisectingKMeans<F>, BisectingKMeansError> {
        dataset.check_n_clusters(n_clusters)?;

        let mut rng = self.rng().clone();
        let all = Cluster::new("cluster-0", (0..dataset.nsamples()).collect());
        let mut sses = vec![all.sse(dataset)];
        let mut parts = vec![all.indices().to_vec()];
        let mut sse_history = vec![sses[0]];
        let mut n_splits = 0;

        while parts.len() < n_clusters {
            let Some(pos) = largest_splittable(&parts, &sses) else {
                warn!(
                    "no cluster left to split, stopping with {} of {} clusters",
                    parts.len(),
                    n_clusters
                );
                break;
            };

            let (left, right) = self.split(dataset, &parts[pos], &mut rng)?;
            let left = Cluster::new("left", left);
            let right = Cluster::new("right", right);
            trace!(
                "split cluster {} with sse {} into parts of {} and {} observations",
                pos,
                sses[pos],
                left.len(),
                right.len()
            );

            sses[pos] = left.sse(dataset);
            sses.push(right.sse(dataset));
            parts[pos] = left.indices().to_vec();
            parts.push(right.indices().to_vec());
            n_splits += 1;
            sse_history.push(sses.iter().copied().sum());
        }

        let clusters = parts
            .into_iter()
            .enumerate()
            .map(|(id, indices)| Cluster::new(format!("cluster-{}", id), indices))
            .collect::<Vec<_>>();
        let centroids = Array2::from_shape_fn((clusters.len(), dataset.nfeatures()), |(c, f)| {
            clusters[c].centroid(dataset)[f]
        });
        let sse = total_sse(dataset, &clusters);
        debug!(
            "bisecting k-means finished with {} clusters after {} splits, sse {}",
            clusters.len(),
            n_splits,
            sse
        );

        Ok(BisectingKMeans {
            centroids,
            clusters,
            sse,
            n_splits,
            sse_history,
        })
    }
}

impl<F: Float, R: Rng + SeedableRng + Clone> BisectingKMeansValidParams<F, R> {
    /// Best two-way K-means partition of the observations at `indices` over all restarts
    ///
    /// The records at `indices` are gathered once into a contiguous subset shared by every
    /// restart, so each K-means iteration scans plain rows. The subset lives only for this call,
    /// returned parts hold indices into `dataset`.
    fn split(
        &self,
        dataset: &DataSet<F>,
        indices: &[usize],
        rng: &mut R,
    ) -> Result<(Vec<usize>, Vec<usize>), BisectingKMeansError> {
        let subset = dataset.select(indices);
        let mut best: Option<KMeans<F>> = None;

        for restart in 0..self.restarts() {
            let params = KMeans::params_with_rng(R::seed_from_u64(rng.gen::<u64>()))
                .max_n_iterations(self.max_n_iterations())
                .init_method(self.init_method())
                .check()
                .map_err(KMeansError::from)?;
            let model = Build::<F, KMeansError>::build(&params, &subset, 2)?;
            trace!("restart {} reached sse {}", restart, model.sse());

            if best.as_ref().map_or(true, |best| model.sse() < best.sse()) {
                best = Some(model);
            }
        }

        let best = best.ok_or_else(|| Error::Parameters("restarts cannot be 0".to_string()))?;
        let to_parent = |cluster: &Cluster<F>| -> Vec<usize> {
            cluster.indices().iter().map(|&idx| indices[idx]).collect()
        };

        Ok((to_parent(&best.clusters()[0]), to_parent(&best.clusters()[1])))
    }
}

/// Position of the cluster with the largest error among clusters of at least two observations
///
/// Ties go to the lowest position.
fn largest_splittable<F: Float>(parts: &[Vec<usize>], sses: &[F]) -> Option<usize> {
    parts
        .iter()
        .zip(sses)
        .enumerate()
        .filter(|(_, (part, _))| part.len() > 1)
        .fold(None, |best: Option<(usize, F)>, (pos, (_, &sse))| match best {
            Some((_, best_sse)) if best_sse >= sse => best,
            _ => Some((pos, sse)),
        })
        .map(|(pos, _)| pos)
}
