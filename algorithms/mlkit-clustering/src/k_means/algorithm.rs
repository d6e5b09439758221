use crate::k_means::errors::KMeansError;
use crate::k_means::{KMeansParams, KMeansValidParams};
use log::{debug, trace};
use mlkit::prelude::*;
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, DataMut, Ix1, Ix2, Zip};
use ndarray_rand::rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
/// The state of a K-means run at an iteration boundary
///
/// `centroids` are the means of the clusters described by `memberships`.
pub struct KMeansSnapshot<F: Float> {
    centroids: Array2<F>,
    memberships: Array1<usize>,
}

impl<F: Float> KMeansSnapshot<F> {
    /// Centroids with shape `(n_clusters, n_features)`
    pub fn centroids(&self) -> &Array2<F> {
        &self.centroids
    }

    /// Cluster index of every observation
    pub fn memberships(&self) -> &Array1<usize> {
        &self.memberships
    }

    /// Sum of squared distances of every observation of `dataset` to its assigned centroid
    pub fn sse(&self, dataset: &DataSet<F>) -> F {
        compute_sse(&self.centroids, &dataset.records(), &self.memberships)
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug)]
/// K-means clustering aims to partition a set of observations into clusters,
/// where each observation belongs to the cluster with the nearest mean.
///
/// The mean of the points within a cluster is called *centroid*.
///
/// Given the set of centroids, you can assign an observation to a cluster
/// choosing the nearest centroid.
///
/// ## The algorithm
///
/// K-means is an iterative algorithm: it progressively refines the choice of centroids.
///
/// It's guaranteed to converge, even though it might not find the optimal set of centroids
/// (unfortunately it can get stuck in a local minimum, finding the optimal minimum if NP-hard!).
///
/// There are three steps in the standard algorithm (also known as Lloyd's Algorithm):
/// - initialisation step: select `k` distinct observations as initial centroids, using the
///   seeded random generator of the hyperparameters;
/// - assignment step: assign each observation to the nearest centroid in squared euclidean
///   distance, ties going to the centroid with the lowest index;
/// - update step: recompute the centroid of each cluster as the mean of its observations.
///
/// The initialisation step is a one-off, done at the very beginning.
/// Assignment and update are repeated in a loop until no observation changes cluster or
/// we exceed `max_n_iterations`.
///
/// ## Empty clusters
///
/// If an assignment step leaves a cluster without observations, the observation farthest from
/// its centroid (ties going to the lowest observation index) among clusters holding at least two
/// observations is moved into the empty cluster. This never increases the sum of squared errors,
/// so every cluster of the result is non-empty.
///
/// ## Tutorial
///
/// ```
/// use mlkit::prelude::*;
/// use mlkit_clustering::KMeans;
/// use ndarray::array;
///
/// let dataset = DataSet::new(array![[0.], [1.], [10.], [11.]]);
///
/// let model = KMeans::params()
///     .random_seed(42)
///     .track_history(true)
///     .build(&dataset, 2)
///     .expect("KMeans fitted");
///
/// assert_eq!(model.n_clusters(), 2);
/// assert!(is_partition(model.clusters(), dataset.nsamples()));
///
/// // Once we found our set of centroids, we can also assign new points to the nearest cluster
/// let memberships = model.predict(&array![[9.]]);
/// let closest_centroid = model.centroids().row(memberships[0]);
/// assert_eq!(closest_centroid.to_vec(), vec![10.5]);
/// ```
pub struct KMeans<F: Float> {
    centroids: Array2<F>,
    clusters: Vec<Cluster<F>>,
    sse: F,
    n_iterations: u64,
    converged: bool,
    history: Option<Vec<KMeansSnapshot<F>>>,
}

impl<F: Float> KMeans<F> {
    pub fn params() -> KMeansParams<F, Xoshiro256Plus> {
        KMeansParams::new(Xoshiro256Plus::seed_from_u64(42))
    }

    pub fn params_with_rng<R: Rng>(rng: R) -> KMeansParams<F, R> {
        KMeansParams::new(rng)
    }

    /// Return the set of centroids as a 2-dimensional matrix with shape
    /// `(n_centroids, n_features)`. The i-th row is the mean of the i-th cluster.
    pub fn centroids(&self) -> &Array2<F> {
        &self.centroids
    }

    /// Number of assignment/update rounds performed
    pub fn n_iterations(&self) -> u64 {
        self.n_iterations
    }

    /// Whether the assignments became stable before `max_n_iterations` was reached
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Snapshots recorded at every iteration boundary, if history tracking was enabled
    pub fn history(&self) -> Option<&[KMeansSnapshot<F>]> {
        self.history.as_deref()
    }

    /// Given an input matrix `observations`, with shape `(n_observations, n_features)`,
    /// `predict` returns, for each observation, the index of the closest cluster/centroid.
    ///
    /// You can retrieve the centroid associated to an index using the
    /// [`centroids` method](#method.centroids).
    pub fn predict(&self, observations: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<usize> {
        let mut memberships = Array1::zeros(observations.nrows());
        update_cluster_memberships(&self.centroids, observations, &mut memberships);
        memberships
    }
}

impl<F: Float> Clustering<F> for KMeans<F> {
    fn clusters(&self) -> &[Cluster<F>] {
        &self.clusters
    }

    /// Sum of squared distances between each observation and its centroid, evaluated at the
    /// final assignment
    fn sse(&self) -> F {
        self.sse
    }
}

impl<F: Float, R: Rng + Clone> Build<F, KMeansError> for KMeansValidParams<F, R> {
    type Object = KMeans<F>;

    /// Given a dataset with `n_observations` items, `build` identifies `n_clusters` centroids
    /// based on the data distribution.
    ///
    /// Fails if the dataset is empty or if `n_clusters` is zero or larger than the number of
    /// observations.
    fn build(&self, dataset: &DataSet<F>, n_clusters: usize) -> Result<KMeans<F>, KMeansError> {
        dataset.check_n_clusters(n_clusters)?;

        let mut rng = self.rng().clone();
        let observations = dataset.records();
        let n_samples = dataset.nsamples();

        let mut centroids = self
            .init_method()
            .run(n_clusters, observations, &mut rng);
        let mut memberships = Array1::zeros(n_samples);
        let mut dists = Array1::zeros(n_samples);
        update_memberships_and_dists(&centroids, &observations, &mut memberships, &mut dists);
        reseed_empty_clusters(n_clusters, &mut memberships, &mut dists);

        let mut history = if self.track_history() {
            Some(Vec::new())
        } else {
            None
        };
        let mut converged = false;
        let mut n_iterations = 0;

        while n_iterations < self.max_n_iterations() {
            n_iterations += 1;
            centroids = compute_centroids(n_clusters, &observations, &memberships);
            if let Some(history) = history.as_mut() {
                history.push(KMeansSnapshot {
                    centroids: centroids.clone(),
                    memberships: memberships.clone(),
                });
            }

            let mut new_memberships = memberships.clone();
            update_memberships_and_dists(
                &centroids,
                &observations,
                &mut new_memberships,
                &mut dists,
            );
            let n_reseeded = reseed_empty_clusters(n_clusters, &mut new_memberships, &mut dists);

            let n_changed = Zip::from(&memberships)
                .and(&new_memberships)
                .fold(0, |acc, old, new| acc + usize::from(old != new));
            trace!(
                "k-means iteration {}: {} observations changed cluster, {} empty clusters reseeded",
                n_iterations,
                n_changed,
                n_reseeded
            );

            if n_changed == 0 {
                converged = true;
                break;
            }
            memberships = new_memberships;
        }

        // the last assignment has not been followed by an update step yet
        if !converged {
            centroids = compute_centroids(n_clusters, &observations, &memberships);
        }

        let sse = compute_sse(&centroids, &observations, &memberships);
        debug!(
            "k-means with {} clusters finished after {} iterations (converged: {}), sse {}",
            n_clusters, n_iterations, converged, sse
        );

        Ok(KMeans {
            clusters: dataset.partition(&memberships, n_clusters)?,
            centroids,
            sse,
            n_iterations,
            converged,
            history,
        })
    }
}

/// K-means is an iterative algorithm.
/// We will perform the assignment and update steps until we are satisfied
/// (according to our convergence criteria).
///
/// `compute_centroids` returns a 2-dimensional array,
/// where the i-th row corresponds to the mean of the i-th cluster. Empty clusters get a zero
/// centroid.
pub(crate) fn compute_centroids<F: Float>(
    n_clusters: usize,
    // (n_observations, n_features)
    observations: &ArrayBase<impl Data<Elem = F>, Ix2>,
    // (n_observations,)
    cluster_memberships: &ArrayBase<impl Data<Elem = usize>, Ix1>,
) -> Array2<F> {
    let mut counts: Array1<usize> = Array1::zeros(n_clusters);
    let mut centroids = Array2::zeros((n_clusters, observations.ncols()));

    Zip::from(observations.rows())
        .and(cluster_memberships)
        .for_each(|observation, &cluster_membership| {
            let mut centroid = centroids.row_mut(cluster_membership);
            centroid += &observation;
            counts[cluster_membership] += 1;
        });

    Zip::from(centroids.rows_mut())
        .and(&counts)
        .for_each(|mut centroid, &cnt| {
            if cnt > 0 {
                centroid /= F::cast(cnt)
            }
        });
    centroids
}

/// Sum of squared distances between every observation and the centroid of its cluster
pub(crate) fn compute_sse<F: Float>(
    centroids: &ArrayBase<impl Data<Elem = F>, Ix2>,
    observations: &ArrayBase<impl Data<Elem = F>, Ix2>,
    cluster_memberships: &ArrayBase<impl Data<Elem = usize>, Ix1>,
) -> F {
    Zip::from(observations.rows())
        .and(cluster_memberships)
        .fold(F::zero(), |acc, observation, &c| {
            acc + L2Dist.rdistance(observation, centroids.row(c))
        })
}

/// Moves observations into empty clusters
///
/// For every empty cluster, in index order, the observation with the largest distance to its
/// centroid among clusters holding more than one observation is moved into it. Its distance is
/// reset to zero as it becomes the centroid of the reseeded cluster.
///
/// Returns the number of reseeded clusters.
pub(crate) fn reseed_empty_clusters<F: Float>(
    n_clusters: usize,
    cluster_memberships: &mut ArrayBase<impl DataMut<Elem = usize>, Ix1>,
    dists: &mut ArrayBase<impl DataMut<Elem = F>, Ix1>,
) -> usize {
    let mut counts = vec![0usize; n_clusters];
    cluster_memberships.iter().for_each(|&c| counts[c] += 1);

    let mut n_reseeded = 0;
    for cluster in 0..n_clusters {
        if counts[cluster] > 0 {
            continue;
        }

        let farthest = cluster_memberships
            .iter()
            .zip(dists.iter())
            .enumerate()
            .filter(|&(_, (&c, _))| counts[c] > 1)
            .fold(None, |best: Option<(usize, F)>, (idx, (_, &dist))| match best {
                Some((_, best_dist)) if best_dist >= dist => best,
                _ => Some((idx, dist)),
            });

        if let Some((idx, _)) = farthest {
            counts[cluster_memberships[idx]] -= 1;
            counts[cluster] += 1;
            cluster_memberships[idx] = cluster;
            dists[idx] = F::zero();
            n_reseeded += 1;
        }
    }

    n_reseeded
}

// Update `cluster_memberships` with the index of the cluster each observation belongs to.
pub(crate) fn update_cluster_memberships<F: Float>(
    centroids: &ArrayBase<impl Data<Elem = F>, Ix2>,
    observations: &ArrayBase<impl Data<Elem = F>, Ix2>,
    cluster_memberships: &mut ArrayBase<impl DataMut<Elem = usize>, Ix1>,
) {
    Zip::from(observations.axis_iter(Axis(0)))
        .and(cluster_memberships)
        .for_each(|observation, cluster_membership| {
            *cluster_membership = closest_centroid(centroids, &observation).0
        });
}

// Updates `dists` with the distance of each observation from its closest centroid.
pub(crate) fn update_min_dists<F: Float>(
    centroids: &ArrayBase<impl Data<Elem = F>, Ix2>,
    observations: &ArrayBase<impl Data<Elem = F>, Ix2>,
    dists: &mut ArrayBase<impl DataMut<Elem = F>, Ix1>,
) {
    Zip::from(observations.axis_iter(Axis(0)))
        .and(dists)
        .for_each(|observation, dist| *dist = closest_centroid(centroids, &observation).1);
}

// Efficient combination of `update_cluster_memberships` and `update_min_dists`.
pub(crate) fn update_memberships_and_dists<F: Float>(
    centroids: &ArrayBase<impl Data<Elem = F>, Ix2>,
    observations: &ArrayBase<impl Data<Elem = F>, Ix2>,
    cluster_memberships: &mut ArrayBase<impl DataMut<Elem = usize>, Ix1>,
    dists: &mut ArrayBase<impl DataMut<Elem = F>, Ix1>,
) {
    Zip::from(observations.axis_iter(Axis(0)))
        .and(cluster_memberships)
        .and(dists)
        .for_each(|observation, cluster_membership, dist| {
            let (m, d) = closest_centroid(centroids, &observation);
            *cluster_membership = m;
            *dist = d;
        });
}

/// Given a matrix of centroids with shape (n_centroids, n_features) and an observation,
/// return the index of the closest centroid (the index of the corresponding row in `centroids`)
/// together with the squared euclidean distance to it. Ties go to the lowest index.
pub(crate) fn closest_centroid<F: Float>(
    // (n_centroids, n_features)
    centroids: &ArrayBase<impl Data<Elem = F>, Ix2>,
    // (n_features)
    observation: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> (usize, F) {
    let mut iterator = centroids.rows().into_iter().enumerate();

    let (mut closest_index, mut minimum_distance) = match iterator.next() {
        Some((idx, centroid)) => (idx, L2Dist.rdistance(centroid, observation.view())),
        None => return (0, F::infinity()),
    };

    for (centroid_index, centroid) in iterator {
        let distance = L2Dist.rdistance(centroid, observation.view());
        if distance < minimum_distance {
            closest_index = centroid_index;
            minimum_distance = distance;
        }
    }
    (closest_index, minimum_distance)
}
