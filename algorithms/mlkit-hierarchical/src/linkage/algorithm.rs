use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeSet, BinaryHeap, HashMap};

use log::{debug, trace};
use mlkit::prelude::*;
use ndarray::Array1;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use super::hyperparams::{LinkageParams, LinkageValidParams};
use super::policy::{LinkageUpdate, Method};
use crate::HierarchicalError;

/// One step of the dendrogram
///
/// Clusters are identified by stable ids: the `n` input items are the clusters `0..n`, the
/// cluster formed by the `i`-th merge receives the id `n + i`.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct Merge<F> {
    /// Id of the merged cluster with the lower id
    pub left: usize,
    /// Id of the merged cluster with the higher id
    pub right: usize,
    /// Linkage distance between both clusters
    pub distance: F,
    /// Number of items in the merged cluster
    pub size: usize,
    /// Total within-cluster sum of squared errors after the merge
    pub total_sse: F,
}

/// Agglomerative hierarchical clustering
///
/// In this clustering algorithm, each point is first considered as a separate cluster. During
/// each step, the two closest clusters are merged into a new one, until the requested number of
/// clusters is left or the optional maximal distance is reached.
///
/// Distances between a merged cluster and the remaining clusters are derived with a
/// [Lance-Williams update rule](crate::LinkageUpdate), so every linkage method shares the same
/// merge loop. Initial distances are euclidean, or squared euclidean for the centroid, median and
/// Ward methods; reported merge distances are always on the euclidean scale.
///
/// The closest pair is unique: ties are broken towards the pair with the lowest ids. Resulting
/// clusters are ordered by their smallest item.
///
/// ```
/// use mlkit::prelude::*;
/// use mlkit_hierarchical::{AgglomerativeClustering, SingleLinkage};
/// use ndarray::array;
///
/// let dataset = DataSet::new(array![[0., 0.], [0., 1.], [5., 0.], [5., 1.]]);
/// let model = AgglomerativeClustering::params_with_policy(SingleLinkage)
///     .build(&dataset, 3)
///     .unwrap();
///
/// assert_eq!(model.n_merges(), 1);
/// assert_eq!(model.clusters()[0].indices(), &[0, 1]);
/// assert_eq!(model.clusters()[1].indices(), &[2]);
/// assert_eq!(model.clusters()[2].indices(), &[3]);
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug)]
pub struct AgglomerativeClustering<F: Float> {
    clusters: Vec<Cluster<F>>,
    merges: Vec<Merge<F>>,
    sse: F,
}

impl<F: Float> AgglomerativeClustering<F> {
    /// Average linkage without distance limit
    pub fn params() -> LinkageParams<F, Method> {
        LinkageParams::new(Method::default())
    }

    pub fn params_with_policy<U: LinkageUpdate<F>>(policy: U) -> LinkageParams<F, U> {
        LinkageParams::new(policy)
    }

    /// The merges performed, in order
    pub fn merges(&self) -> &[Merge<F>] {
        &self.merges
    }

    pub fn n_merges(&self) -> usize {
        self.merges.len()
    }

    /// Total within-cluster sum of squared errors after every merge
    pub fn sse_history(&self) -> Vec<F> {
        self.merges.iter().map(|merge| merge.total_sse).collect()
    }
}

impl<F: Float> Clustering<F> for AgglomerativeClustering<F> {
    fn clusters(&self) -> &[Cluster<F>] {
        &self.clusters
    }

    fn sse(&self) -> F {
        self.sse
    }
}

/// A cluster of the arena
struct Node<F: Float> {
    members: Vec<usize>,
    centroid: Array1<F>,
}

/// Pair of clusters waiting in the merge queue
///
/// Ordered by distance, then by ids.
#[derive(Clone, Copy, Debug)]
struct Candidate<F> {
    dist: F,
    pair: (usize, usize),
}

impl<F: Float> PartialEq for Candidate<F> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<F: Float> Eq for Candidate<F> {}

impl<F: Float> PartialOrd for Candidate<F> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<F: Float> Ord for Candidate<F> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist
            .partial_cmp(&other.dist)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.pair.cmp(&other.pair))
    }
}

/// Working state of a single `build` call
///
/// Closed clusters stay in the arena so that ids remain stable, only `open` and `distances`
/// shrink as clusters merge. The distance between two open clusters never changes, so a queued
/// pair is either current or refers to a closed cluster and is dropped when it surfaces.
struct Linkage<'a, F: Float, U: LinkageUpdate<F>> {
    policy: &'a U,
    nodes: Vec<Node<F>>,
    open: BTreeSet<usize>,
    distances: HashMap<(usize, usize), F>,
    queue: BinaryHeap<Reverse<Candidate<F>>>,
    total_sse: F,
}

fn key(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

impl<'a, F: Float, U: LinkageUpdate<F>> Linkage<'a, F, U> {
    fn new(policy: &'a U, dataset: &DataSet<F>) -> Self {
        let n_samples = dataset.nsamples();
        let nodes = (0..n_samples)
            .map(|idx| Node {
                members: vec![idx],
                centroid: dataset.item(idx).to_owned(),
            })
            .collect();

        let mut distances = HashMap::with_capacity(n_samples * n_samples.saturating_sub(1) / 2);
        for a in 0..n_samples {
            for b in (a + 1)..n_samples {
                let dist = L2Dist.rdistance(dataset.item(a), dataset.item(b));
                let dist = if policy.squared() { dist } else { dist.sqrt() };
                distances.insert((a, b), dist);
            }
        }

        let queue = distances
            .iter()
            .map(|(&pair, &dist)| Reverse(Candidate { dist, pair }))
            .collect();

        Linkage {
            policy,
            nodes,
            open: (0..n_samples).collect(),
            distances,
            queue,
            total_sse: F::zero(),
        }
    }

    /// Closest pair of open clusters, ties going to the lowest ids
    fn closest(&mut self) -> Option<((usize, usize), F)> {
        while let Some(&Reverse(Candidate { dist, pair })) = self.queue.peek() {
            if self.open.contains(&pair.0) && self.open.contains(&pair.1) {
                return Some((pair, dist));
            }
            self.queue.pop();
        }

        None
    }

    /// Distance on the euclidean scale
    fn reported(&self, dist: F) -> F {
        if self.policy.squared() {
            dist.max(F::zero()).sqrt()
        } else {
            dist
        }
    }

    /// Merge the open clusters `a < b` into a new cluster and return its merge record
    fn merge(&mut self, a: usize, b: usize, dist: F) -> Merge<F> {
        let id = self.nodes.len();
        let d_ab = self.distances.remove(&(a, b)).unwrap_or(dist);
        self.open.remove(&a);
        self.open.remove(&b);

        let (n_a, n_b) = (self.nodes[a].members.len(), self.nodes[b].members.len());
        for &k in &self.open {
            let d_ak = self.distances.remove(&key(a, k)).unwrap_or_else(F::zero);
            let d_bk = self.distances.remove(&key(b, k)).unwrap_or_else(F::zero);
            let n_k = self.nodes[k].members.len();

            let d = self.policy.update(d_ab, d_ak, d_bk, n_a, n_b, n_k);
            self.distances.insert((k, id), d);
            self.queue.push(Reverse(Candidate { dist: d, pair: (k, id) }));
        }

        // the error increase of a merge only depends on the sizes and centroids of both halves
        let (w_a, w_b) = (F::cast(n_a), F::cast(n_b));
        let (left, right) = (&self.nodes[a], &self.nodes[b]);
        let increase = w_a * w_b / (w_a + w_b)
            * L2Dist.rdistance(left.centroid.view(), right.centroid.view());
        let centroid = (&left.centroid * w_a + &right.centroid * w_b) / (w_a + w_b);
        let mut members = [left.members.as_slice(), right.members.as_slice()].concat();
        members.sort_unstable();

        self.total_sse += increase;
        self.nodes.push(Node { members, centroid });
        self.open.insert(id);

        Merge {
            left: a,
            right: b,
            distance: self.reported(d_ab),
            size: n_a + n_b,
            total_sse: self.total_sse,
        }
    }

    fn into_clusters(self) -> Vec<Cluster<F>> {
        let mut members = self
            .open
            .into_iter()
            .map(|id| self.nodes[id].members.clone())
            .collect::<Vec<_>>();
        members.sort_unstable_by_key(|members| members[0]);

        members
            .into_iter()
            .enumerate()
            .map(|(pos, indices)| Cluster::new(format!("cluster-{}", pos), indices))
            .collect()
    }
}

impl<F: Float, U: LinkageUpdate<F>> Build<F, HierarchicalError<F>> for LinkageValidParams<F, U> {
    type Object = AgglomerativeClustering<F>;

    /// Merge clusters until `n_clusters` are left
    ///
    /// Asking for as many clusters as items, or more, returns the singletons without merging.
    /// Fails if the dataset is empty or if `n_clusters` is zero.
    fn build(
        &self,
        dataset: &DataSet<F>,
        n_clusters: usize,
    ) -> Result<AgglomerativeClustering<F>, HierarchicalError<F>> {
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

        let mut state = Linkage::new(self.policy(), dataset);
        let mut merges = Vec::with_capacity(dataset.nsamples().saturating_sub(n_clusters));

        while state.open.len() > n_clusters {
            let Some(((a, b), dist)) = state.closest() else {
                break;
            };
            if let Some(max_distance) = self.max_distance() {
                if state.reported(dist) >= max_distance {
                    debug!(
                        "closest clusters are {} apart, stopping with {} clusters",
                        state.reported(dist),
                        state.open.len()
                    );
                    break;
                }
            }

            let merge = state.merge(a, b, dist);
            trace!(
                "merged {} and {} at distance {}, {} items, total sse {}",
                merge.left,
                merge.right,
                merge.distance,
                merge.size,
                merge.total_sse
            );
            merges.push(merge);
        }

        let sse = state.total_sse;
        let clusters = state.into_clusters();
        debug!(
            "agglomerative clustering finished with {} clusters after {} merges",
            clusters.len(),
            merges.len()
        );

        Ok(AgglomerativeClustering {
            clusters,
            merges,
            sse,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        AverageLinkage, CentroidLinkage, CompleteLinkage, MedianLinkage, SingleLinkage,
        WardLinkage, WeightedLinkage,
    };
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};
    use ndarray_rand::rand::SeedableRng;
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;
    use rand_xoshiro::Xoshiro256Plus;

    fn data4() -> DataSet<f64> {
        DataSet::new(array![[0., 0.], [0., 1.], [5., 0.], [5., 1.]])
    }

    fn random_dataset(seed: u64, n_samples: usize) -> DataSet<f64> {
        let mut rng = Xoshiro256Plus::seed_from_u64(seed);
        let records: Array2<f64> =
            Array2::random_using((n_samples, 3), Uniform::new(-10., 10.), &mut rng);
        DataSet::new(records)
    }

    #[test]
    fn queue_yields_the_closest_open_pair() {
        let dataset = random_dataset(7, 40);
        for method in Method::ALL {
            let mut state = Linkage::new(&method, &dataset);

            while state.open.len() > 1 {
                let expected = state
                    .distances
                    .iter()
                    .map(|(&pair, &dist)| (dist, pair))
                    .fold(None, |best: Option<(f64, (usize, usize))>, cand| match best {
                        Some(best) if best <= cand => Some(best),
                        _ => Some(cand),
                    })
                    .unwrap();

                let ((a, b), dist) = state.closest().unwrap();
                assert_eq!((dist, (a, b)), expected);
                state.merge(a, b, dist);
            }
            assert!(state.closest().is_none());
        }
    }

    fn members(model: &AgglomerativeClustering<f64>) -> Vec<Vec<usize>> {
        model
            .clusters()
            .iter()
            .map(|cluster| cluster.indices().to_vec())
            .collect()
    }

    #[test]
    fn autotraits() {
        fn has_autotraits<T: Send + Sync + Sized + Unpin>() {}
        has_autotraits::<AgglomerativeClustering<f64>>();
        has_autotraits::<Merge<f64>>();
    }

    #[test]
    fn first_merge_joins_closest_pair() {
        let dataset = data4();
        for method in Method::ALL {
            let model = AgglomerativeClustering::params()
                .policy(method)
                .build(&dataset, 1)
                .unwrap();

            let first = &model.merges()[0];
            assert!(
                (first.left, first.right) == (0, 1) || (first.left, first.right) == (2, 3),
                "{:?} merged {} and {} first",
                method,
                first.left,
                first.right
            );
            assert_abs_diff_eq!(first.distance, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn full_dendrogram_has_n_minus_one_merges() {
        let dataset = random_dataset(42, 25);
        for method in Method::ALL {
            let model = AgglomerativeClustering::params()
                .policy(method)
                .build(&dataset, 1)
                .unwrap();

            assert_eq!(model.n_merges(), 24);
            assert_eq!(model.n_clusters(), 1);
            assert_eq!(model.merges().last().unwrap().size, 25);
            assert!(is_partition(model.clusters(), 25));
        }
    }

    #[test]
    fn single_linkage_on_two_pairs() {
        let model = AgglomerativeClustering::params_with_policy(SingleLinkage)
            .build(&data4(), 3)
            .unwrap();

        assert_eq!(members(&model), vec![vec![0, 1], vec![2], vec![3]]);
        assert_abs_diff_eq!(model.sse(), 0.5);

        let model = AgglomerativeClustering::params_with_policy(SingleLinkage)
            .build(&data4(), 2)
            .unwrap();
        assert_eq!(members(&model), vec![vec![0, 1], vec![2, 3]]);
        assert_eq!(model.merges()[1].left, 2);
        assert_eq!(model.merges()[1].right, 3);
        assert_abs_diff_eq!(model.sse(), 1.0);
    }

    #[test]
    fn merged_clusters_get_fresh_ids() {
        let model = AgglomerativeClustering::params_with_policy(CompleteLinkage)
            .build(&data4(), 1)
            .unwrap();

        let merges = model.merges();
        assert_eq!((merges[0].left, merges[0].right), (0, 1));
        assert_eq!((merges[1].left, merges[1].right), (2, 3));
        assert_eq!((merges[2].left, merges[2].right), (4, 5));
        // the farthest points of both pairs are (0, 0) and (5, 1)
        assert_abs_diff_eq!(merges[2].distance, 26f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn final_merge_distances() {
        let dataset = data4();
        let last = |policy: Method| {
            AgglomerativeClustering::params()
                .policy(policy)
                .build(&dataset, 1)
                .unwrap()
                .merges()[2]
                .distance
        };

        let average = (5. + 26f64.sqrt() * 2. + 5.) / 4.;
        assert_abs_diff_eq!(last(Method::Single), 5., epsilon = 1e-12);
        assert_abs_diff_eq!(last(Method::Average), average, epsilon = 1e-12);
        assert_abs_diff_eq!(last(Method::Weighted), average, epsilon = 1e-12);
        assert_abs_diff_eq!(last(Method::Centroid), 5., epsilon = 1e-12);
        assert_abs_diff_eq!(last(Method::Median), 5., epsilon = 1e-12);
        // 2 * (2 * 2 / 4) * 25
        assert_abs_diff_eq!(last(Method::Ward), 50f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn ward_sse_is_non_decreasing() {
        for seed in 0..5 {
            let dataset = random_dataset(seed, 30);
            let model = AgglomerativeClustering::params_with_policy(WardLinkage)
                .build(&dataset, 1)
                .unwrap();

            let history = model.sse_history();
            assert_eq!(history.len(), 29);
            assert!(history[0] >= 0.);
            for pair in history.windows(2) {
                assert!(pair[1] >= pair[0]);
            }
            // merging everything gives the error of the whole dataset
            let all = Cluster::new("all", (0..30).collect());
            assert_abs_diff_eq!(model.sse(), all.sse(&dataset), epsilon = 1e-8);
        }
    }

    #[test]
    fn sse_matches_resulting_clusters() {
        let dataset = random_dataset(9, 20);
        let model = AgglomerativeClustering::params_with_policy(AverageLinkage)
            .build(&dataset, 4)
            .unwrap();

        assert_eq!(model.n_clusters(), 4);
        assert_abs_diff_eq!(
            model.sse(),
            total_sse(&dataset, model.clusters()),
            epsilon = 1e-9
        );
    }

    #[test]
    fn generic_policies_match_method_dispatch() {
        let dataset = random_dataset(3, 15);
        let by_method = |method: Method| {
            AgglomerativeClustering::params()
                .policy(method)
                .build(&dataset, 3)
                .unwrap()
                .merges()
                .to_vec()
        };

        assert_eq!(by_method(Method::Single), build_merges(SingleLinkage, &dataset));
        assert_eq!(by_method(Method::Weighted), build_merges(WeightedLinkage, &dataset));
        assert_eq!(by_method(Method::Centroid), build_merges(CentroidLinkage, &dataset));
        assert_eq!(by_method(Method::Median), build_merges(MedianLinkage, &dataset));
    }

    fn build_merges<U: LinkageUpdate<f64>>(policy: U, dataset: &DataSet<f64>) -> Vec<Merge<f64>> {
        AgglomerativeClustering::params_with_policy(policy)
            .build(dataset, 3)
            .unwrap()
            .merges()
            .to_vec()
    }

    #[test]
    fn max_distance_stops_early() {
        let model = AgglomerativeClustering::params_with_policy(SingleLinkage)
            .max_distance(2.)
            .build(&data4(), 1)
            .unwrap();

        assert_eq!(model.n_merges(), 2);
        assert_eq!(members(&model), vec![vec![0, 1], vec![2, 3]]);
    }

    #[test]
    fn too_many_clusters_keeps_singletons() {
        for n_clusters in [4, 10] {
            let model = AgglomerativeClustering::params()
                .build(&data4(), n_clusters)
                .unwrap();
            assert_eq!(model.n_merges(), 0);
            assert_eq!(members(&model), vec![vec![0], vec![1], vec![2], vec![3]]);
            assert_abs_diff_eq!(model.sse(), 0.);
        }
    }

    #[test]
    fn invalid_arguments() {
        let res = AgglomerativeClustering::params().build(&data4(), 0);
        assert!(matches!(
            res,
            Err(HierarchicalError::BaseCrate(Error::InvalidClusterCount { .. }))
        ));

        let empty = DataSet::<f64>::new(Array2::zeros((0, 2)));
        let res = AgglomerativeClustering::params().build(&empty, 1);
        assert!(matches!(
            res,
            Err(HierarchicalError::BaseCrate(Error::NotEnoughSamples))
        ));

        let res = AgglomerativeClustering::params()
            .max_distance(-1.)
            .build(&data4(), 1);
        assert!(matches!(res, Err(HierarchicalError::LinkageParams(_))));
    }
}
