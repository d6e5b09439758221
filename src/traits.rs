//! Provide traits for the clustering algorithms
//!
//! Every algorithm follows the same lifecycle: a set of hyperparameters is configured, then
//! `build` partitions a dataset into a requested number of clusters and returns a fitted object.
//! The fitted object exposes the resulting partition through [`Clustering`].
use ndarray::Array1;

use crate::cluster::Cluster;
use crate::dataset::{DataSet, Float};

/// Build a clustering of a dataset
///
/// The dataset is only read, the returned object refers to its items by index.
pub trait Build<F: Float, E: std::error::Error + From<crate::error::Error>> {
    type Object;

    fn build(&self, dataset: &DataSet<F>, n_clusters: usize) -> Result<Self::Object, E>;
}

/// A partition of the items of a dataset
pub trait Clustering<F: Float> {
    /// The clusters, each holding the indices of its member items
    fn clusters(&self) -> &[Cluster<F>];

    /// Sum of squared euclidean distances of every item to the mean of its cluster
    fn sse(&self) -> F;

    fn n_clusters(&self) -> usize {
        self.clusters().len()
    }

    /// Position of the cluster containing each item
    fn memberships(&self) -> Array1<usize> {
        let n_samples: usize = self.clusters().iter().map(Cluster::len).sum();
        let mut memberships = Array1::zeros(n_samples);
        for (pos, cluster) in self.clusters().iter().enumerate() {
            for &idx in cluster.indices() {
                memberships[idx] = pos;
            }
        }

        memberships
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    struct Fixed(Vec<Cluster<f64>>);

    impl Clustering<f64> for Fixed {
        fn clusters(&self) -> &[Cluster<f64>] {
            &self.0
        }

        fn sse(&self) -> f64 {
            0.
        }
    }

    #[test]
    fn memberships_follow_cluster_positions() {
        let clustering = Fixed(vec![
            Cluster::new("a", vec![1, 3]),
            Cluster::new("b", vec![0]),
            Cluster::new("c", vec![2, 4]),
        ]);

        assert_eq!(clustering.n_clusters(), 3);
        assert_eq!(clustering.memberships(), array![1, 0, 2, 0, 2]);
    }
}
