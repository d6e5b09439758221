//! Cluster views
//!
//! A [`Cluster`] names a subset of the items of a [`DataSet`] by index. Clusters never copy the
//! records they refer to; aggregate statistics are computed from the owning dataset on demand.
use std::sync::OnceLock;

use ndarray::{Array1, Array2, Axis};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::dataset::{DataSet, Float, Records};
use crate::proximity::squared_euclidean;

/// A named subset of the items of a dataset
///
/// The centroid is cached after its first computation. A cluster is bound to the dataset it was
/// produced from, passing another dataset to its accessors gives meaningless results.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug)]
pub struct Cluster<F: Float> {
    name: String,
    indices: Vec<usize>,
    #[cfg_attr(feature = "serde", serde(skip))]
    centroid: OnceLock<Array1<F>>,
}

impl<F: Float> Cluster<F> {
    pub fn new<S: Into<String>>(name: S, indices: Vec<usize>) -> Self {
        Cluster {
            name: name.into(),
            indices,
            centroid: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Indices of the member items in the owning dataset
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Copy the member records out of the dataset, in membership order
    pub fn records(&self, dataset: &DataSet<F>) -> Array2<F> {
        dataset.records().select(Axis(0), &self.indices)
    }

    /// Componentwise mean of the member items
    ///
    /// The centroid of an empty cluster is the zero vector.
    pub fn centroid(&self, dataset: &DataSet<F>) -> &Array1<F> {
        self.centroid.get_or_init(|| {
            let mut sum = Array1::zeros(dataset.nfeatures());
            for &idx in &self.indices {
                sum += &dataset.item(idx);
            }
            if !self.indices.is_empty() {
                sum /= F::cast(self.indices.len());
            }
            sum
        })
    }

    /// Componentwise most frequent value of the member items
    ///
    /// Ties are resolved towards the smallest value. Useful for discretised or categorical
    /// features encoded as numbers.
    pub fn mode(&self, dataset: &DataSet<F>) -> Array1<F> {
        let records = dataset.records();
        Array1::from_shape_fn(dataset.nfeatures(), |feature| {
            let mut counts: Vec<(F, usize)> = Vec::new();
            for &idx in &self.indices {
                let value = records[[idx, feature]];
                match counts.iter_mut().find(|(v, _)| *v == value) {
                    Some((_, count)) => *count += 1,
                    None => counts.push((value, 1)),
                }
            }

            counts
                .into_iter()
                .fold(None, |best: Option<(F, usize)>, (value, count)| match best {
                    Some((bv, bc)) if bc > count || (bc == count && bv <= value) => {
                        Some((bv, bc))
                    }
                    _ => Some((value, count)),
                })
                .map(|(value, _)| value)
                .unwrap_or_else(F::zero)
        })
    }

    /// Sum of squared euclidean distances between the members and the centroid
    pub fn sse(&self, dataset: &DataSet<F>) -> F {
        let centroid = self.centroid(dataset);
        self.indices
            .iter()
            .map(|&idx| squared_euclidean(dataset.item(idx), centroid.view()))
            .sum()
    }
}

impl<F: Float> PartialEq for Cluster<F> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.indices == other.indices
    }
}

/// Total sum of squared errors of a set of clusters
pub fn total_sse<F: Float>(dataset: &DataSet<F>, clusters: &[Cluster<F>]) -> F {
    clusters.iter().map(|cluster| cluster.sse(dataset)).sum()
}

/// Check that `clusters` partition the index range `0..n_samples`
///
/// Every index must appear in exactly one cluster and no cluster may refer to an index outside
/// of the range.
pub fn is_partition<F: Float>(clusters: &[Cluster<F>], n_samples: usize) -> bool {
    let mut seen = vec![false; n_samples];
    for idx in clusters.iter().flat_map(|cluster| cluster.indices()) {
        match seen.get_mut(*idx) {
            Some(flag) if !*flag => *flag = true,
            _ => return false,
        }
    }

    seen.into_iter().all(|flag| flag)
}
