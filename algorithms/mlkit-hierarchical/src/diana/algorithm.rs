use log::{debug, trace, warn};
use mlkit::prelude::*;
use mlkit::proximity::pairwise_distances;
use ndarray::Array2;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use super::hyperparams::{DianaParams, DianaValidParams};
use crate::HierarchicalError;

/// One step of the divisive hierarchy
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct Split<F> {
    /// Position of the split cluster in the partition before the split
    pub position: usize,
    /// Largest dissimilarity between two members of the split cluster
    pub diameter: F,
    /// Items which left the cluster, appended to the partition
    pub splinter: Vec<usize>,
    /// Items which stayed, taking the place of the split cluster
    pub remainder: Vec<usize>,
}

/// Divisive Analysis (DIANA)
///
/// DIANA builds a hierarchy top-down. It starts with a single cluster holding every item and
/// repeatedly splits the cluster with the largest diameter, the largest dissimilarity between
/// two of its members, until the requested number of clusters is reached or no cluster has more
/// than one member.
///
/// A split seeds a splinter group with the member farthest on average from the others. Members
/// closer on average to the splinter group than to the rest of the cluster then move over one
/// at a time, the one with the largest difference first, until no member prefers the splinter
/// group. At least one member always stays behind.
///
/// Unlike K-Means no number of clusters is needed upfront, `n_clusters` only decides how many
/// levels of the hierarchy are materialized.
///
/// ```
/// use mlkit::prelude::*;
/// use mlkit_hierarchical::Diana;
/// use ndarray::array;
///
/// let dataset = DataSet::new(array![[0., 0.], [0., 1.], [5., 0.], [5., 1.]]);
/// let model = Diana::params().build(&dataset, 2).unwrap();
///
/// assert_eq!(model.initial_cluster().indices(), &[0, 1, 2, 3]);
/// assert_eq!(model.n_splits(), 1);
/// assert_eq!(model.splits()[0].diameter, 26f64.sqrt());
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug)]
pub struct Diana<F: Float> {
    initial_cluster: Cluster<F>,
    clusters: Vec<Cluster<F>>,
    splits: Vec<Split<F>>,
    sse: F,
    sse_history: Vec<F>,
}

impl<F: Float> Diana<F> {
    /// Divisive analysis with euclidean dissimilarities
    pub fn params() -> DianaParams<F, L2Dist> {
        DianaParams::new(L2Dist)
    }

    pub fn params_with_dist<D: Distance<F>>(dist_fn: D) -> DianaParams<F, D> {
        DianaParams::new(dist_fn)
    }

    /// The cluster holding every item, the root of the hierarchy
    pub fn initial_cluster(&self) -> &Cluster<F> {
        &self.initial_cluster
    }

    /// The splits performed, in order
    pub fn splits(&self) -> &[Split<F>] {
        &self.splits
    }

    pub fn n_splits(&self) -> usize {
        self.splits.len()
    }

    /// Total sum of squared errors before the first split and after every split
    pub fn sse_history(&self) -> &[F] {
        &self.sse_history
    }
}

impl<F: Float> Clustering<F> for Diana<F> {
    fn clusters(&self) -> &[Cluster<F>] {
        &self.clusters
    }

    fn sse(&self) -> F {
        self.sse
    }
}

impl<F: Float, D: Distance<F>> Build<F, HierarchicalError<F>> for DianaValidParams<F, D> {
    type Object = Diana<F>;

    /// Split the dataset until `n_clusters` clusters exist
    ///
    /// Fails if the dataset is empty or if `n_clusters` is zero. Fewer clusters are returned if
    /// no cluster with more than one member is left, or if every remaining diameter is below
    /// `min_diameter`.
    fn build(
        &self,
        dataset: &DataSet<F>,
        n_clusters: usize,
    ) -> Result<Diana<F>, HierarchicalError<F>> {
        if dataset.is_empty() {
            return Err(Error::NotEnoughSamples.into());
        }
        if n_clusters == 0 {
            return Err(Error::InvalidClusterCount {
                n_clusters,
                n_samples: dataset.nsamples(),
            }
            .into());
        }

        let dissimilarities = pairwise_distances(self.dist_fn(), &dataset.records());
        let initial_cluster = Cluster::new("cluster-0", (0..dataset.nsamples()).collect());
        let mut parts = vec![initial_cluster.indices().to_vec()];
        let mut sses = vec![initial_cluster.sse(dataset)];
        let mut sse_history = sses.clone();
        let mut splits = Vec::new();

        while parts.len() < n_clusters {
            let Some((position, diameter)) = widest(&parts, &dissimilarities) else {
                warn!(
                    "every cluster is a singleton, stopping with {} of {} clusters",
                    parts.len(),
                    n_clusters
                );
                break;
            };
            if diameter < self.min_diameter() {
                debug!(
                    "largest diameter {} is below {}, stopping with {} clusters",
                    diameter,
                    self.min_diameter(),
                    parts.len()
                );
                break;
            }

            let (splinter, remainder) = split(&parts[position], &dissimilarities);
            trace!(
                "split cluster {} with diameter {}: {} items left, {} stayed",
                position,
                diameter,
                splinter.len(),
                remainder.len()
            );

            sses[position] = Cluster::new("remainder", remainder.clone()).sse(dataset);
            sses.push(Cluster::new("splinter", splinter.clone()).sse(dataset));
            sse_history.push(sses.iter().copied().sum());

            parts[position] = remainder.clone();
            parts.push(splinter.clone());
            splits.push(Split {
                position,
                diameter,
                splinter,
                remainder,
            });
        }

        let clusters = parts
            .into_iter()
            .enumerate()
            .map(|(pos, indices)| Cluster::new(format!("cluster-{}", pos), indices))
            .collect::<Vec<_>>();
        let sse = total_sse(dataset, &clusters);
        debug!(
            "diana finished with {} clusters after {} splits, sse {}",
            clusters.len(),
            splits.len(),
            sse
        );

        Ok(Diana {
            initial_cluster,
            clusters,
            splits,
            sse,
            sse_history,
        })
    }
}

/// Largest dissimilarity between two members
fn diameter<F: Float>(members: &[usize], dissimilarities: &Array2<F>) -> F {
    members
        .iter()
        .enumerate()
        .flat_map(|(pos, &a)| members[pos + 1..].iter().map(move |&b| (a, b)))
        .map(|(a, b)| dissimilarities[[a, b]])
        .fold(F::zero(), F::max)
}

/// Position and diameter of the widest cluster with more than one member
///
/// Ties go to the lowest position.
fn widest<F: Float>(parts: &[Vec<usize>], dissimilarities: &Array2<F>) -> Option<(usize, F)> {
    parts
        .iter()
        .enumerate()
        .filter(|(_, members)| members.len() > 1)
        .map(|(pos, members)| (pos, diameter(members, dissimilarities)))
        .fold(None, |best, (pos, diameter)| match best {
            Some((_, best_diameter)) if best_diameter >= diameter => best,
            _ => Some((pos, diameter)),
        })
}

/// Mean dissimilarity between `item` and the members of `group` other than itself
fn mean_dissimilarity<F: Float>(item: usize, group: &[usize], dissimilarities: &Array2<F>) -> F {
    let (sum, count) = group
        .iter()
        .filter(|&&other| other != item)
        .fold((F::zero(), 0usize), |(sum, count), &other| {
            (sum + dissimilarities[[item, other]], count + 1)
        });

    if count == 0 {
        F::zero()
    } else {
        sum / F::cast(count)
    }
}

/// Divide `members` into a splinter group and a remainder
///
/// Both groups keep the relative order of `members` and neither is empty if `members` holds at
/// least two items.
fn split<F: Float>(members: &[usize], dissimilarities: &Array2<F>) -> (Vec<usize>, Vec<usize>) {
    // the seed is the member with the largest mean dissimilarity, ties going to the first one
    let seed = members
        .iter()
        .map(|&item| (item, mean_dissimilarity(item, members, dissimilarities)))
        .fold(None, |best: Option<(usize, F)>, (item, dist)| match best {
            Some((_, best_dist)) if best_dist >= dist => best,
            _ => Some((item, dist)),
        })
        .map(|(item, _)| item);

    let mut splinter = seed.into_iter().collect::<Vec<_>>();
    let mut remainder = members
        .iter()
        .copied()
        .filter(|item| !splinter.contains(item))
        .collect::<Vec<_>>();

    while remainder.len() > 1 {
        let candidate = remainder
            .iter()
            .enumerate()
            .map(|(pos, &item)| {
                let to_remainder = mean_dissimilarity(item, &remainder, dissimilarities);
                let to_splinter = mean_dissimilarity(item, &splinter, dissimilarities);
                (pos, to_remainder - to_splinter)
            })
            .fold(None, |best: Option<(usize, F)>, (pos, gain)| match best {
                Some((_, best_gain)) if best_gain >= gain => best,
                _ => Some((pos, gain)),
            });

        match candidate {
            Some((pos, gain)) if gain > F::zero() => {
                let item = remainder.remove(pos);
                splinter.push(item);
            }
            _ => break,
        }
    }
    splinter.sort_unstable();

    (splinter, remainder)
}
