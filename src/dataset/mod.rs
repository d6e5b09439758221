//! Datasets
//!
//! This module implements the dataset container shared by every algorithm of the crate family,
//! together with the floating point trait bound used for its records.
use ndarray::{Array1, Array2, ArrayBase, ArrayView1, ArrayView2, Axis, Data, Ix2, ScalarOperand};

use num_traits::{AsPrimitive, FromPrimitive, NumAssignOps, NumCast, Signed};
use rand::distributions::uniform::SampleUniform;

use std::fmt;
use std::iter::Sum;
use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::cluster::Cluster;
use crate::error::{Error, Result};

mod impl_records;

/// Floating point numbers
///
/// This trait bound multiplexes to the most common assumption of floating point number and
/// implement them for 32bit and 64bit floating points. They are used in the records of a dataset
/// and in every distance and centroid computation.
pub trait Float:
    FromPrimitive
    + num_traits::Float
    + PartialOrd
    + Sync
    + Send
    + Default
    + fmt::Display
    + fmt::Debug
    + Signed
    + Sum
    + NumAssignOps
    + AsPrimitive<usize>
    + for<'a> AddAssign<&'a Self>
    + for<'a> MulAssign<&'a Self>
    + for<'a> SubAssign<&'a Self>
    + for<'a> DivAssign<&'a Self>
    + SampleUniform
    + ScalarOperand
    + approx::AbsDiffEq
    + 'static
{
    fn cast<T: NumCast>(x: T) -> Self {
        NumCast::from(x).unwrap()
    }
}

impl Float for f32 {}

impl Float for f64 {}

/// Record trait
pub trait Records: Sized {
    type Elem;

    fn nsamples(&self) -> usize;
    fn nfeatures(&self) -> usize;
}

/// DataSet
///
/// An ordered sequence of items, each a fixed-arity numeric vector, stored row-wise in an
/// `Array2` with dimensionality `(nsamples, nfeatures)`. A dataset may carry one label per item
/// and a name per feature.
///
/// Clustering algorithms never mutate the dataset they are given: they only read its records and
/// describe their results as [`Cluster`] views holding item indices.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct DataSet<F: Float> {
    records: Array2<F>,
    labels: Option<Vec<String>>,
    feature_names: Vec<String>,
}

impl<F: Float> DataSet<F> {
    /// Create a new dataset from a record matrix
    pub fn new(records: Array2<F>) -> Self {
        DataSet {
            records,
            labels: None,
            feature_names: Vec::new(),
        }
    }

    /// Create a dataset from in-memory rows
    ///
    /// Every row must have the same number of values, otherwise an [`Error::Arity`] is returned.
    /// An empty iterator results in an empty dataset with zero features.
    pub fn from_rows<I, V>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: AsRef<[F]>,
    {
        let mut nfeatures = None;
        let mut values = Vec::new();
        let mut nsamples = 0;

        for (row, item) in rows.into_iter().enumerate() {
            let item = item.as_ref();
            let expected = *nfeatures.get_or_insert(item.len());
            if item.len() != expected {
                return Err(Error::Arity {
                    row,
                    expected,
                    found: item.len(),
                });
            }
            values.extend_from_slice(item);
            nsamples += 1;
        }

        let records = Array2::from_shape_vec((nsamples, nfeatures.unwrap_or(0)), values)?;

        Ok(DataSet::new(records))
    }

    /// Attach one label per item
    pub fn with_labels(mut self, labels: Vec<String>) -> Result<Self> {
        if labels.len() != self.nsamples() {
            return Err(Error::Labels {
                expected: self.nsamples(),
                found: labels.len(),
            });
        }
        self.labels = Some(labels);

        Ok(self)
    }

    /// Attach names to the features
    ///
    /// Names are ignored if their count does not match the number of features.
    pub fn with_feature_names<I: Into<String>>(mut self, names: Vec<I>) -> Self {
        let names = names.into_iter().map(Into::into).collect::<Vec<String>>();
        if names.len() == self.nfeatures() {
            self.feature_names = names;
        }

        self
    }

    /// Return a read-only view of the records
    pub fn records(&self) -> ArrayView2<'_, F> {
        self.records.view()
    }

    /// Return the labels, if any were attached
    pub fn labels(&self) -> Option<&[String]> {
        self.labels.as_deref()
    }

    /// Return the feature names
    ///
    /// Generates `feature-{i}` names if none were set.
    pub fn feature_names(&self) -> Vec<String> {
        if !self.feature_names.is_empty() {
            self.feature_names.clone()
        } else {
            (0..self.nfeatures())
                .map(|idx| format!("feature-{}", idx))
                .collect()
        }
    }

    /// Return the `idx`-th item
    ///
    /// Panics if `idx` is out of bounds.
    pub fn item(&self, idx: usize) -> ArrayView1<'_, F> {
        self.records.row(idx)
    }

    pub fn is_empty(&self) -> bool {
        self.nsamples() == 0
    }

    /// Copy the items at `indices` into a new dataset, in the given order
    ///
    /// Labels follow their items, feature names are kept.
    pub fn select(&self, indices: &[usize]) -> DataSet<F> {
        DataSet {
            records: self.records.select(Axis(0), indices),
            labels: self
                .labels
                .as_ref()
                .map(|labels| indices.iter().map(|&idx| labels[idx].clone()).collect()),
            feature_names: self.feature_names.clone(),
        }
    }

    /// Partition the items into clusters given one cluster index per item
    ///
    /// The result always holds `n_clusters` clusters, some may be empty if no item points to
    /// them. Items pointing to a cluster index larger than `n_clusters` raise an error.
    pub fn partition(
        &self,
        memberships: &ArrayBase<impl Data<Elem = usize>, ndarray::Ix1>,
        n_clusters: usize,
    ) -> Result<Vec<Cluster<F>>> {
        if memberships.len() != self.nsamples() {
            return Err(Error::Parameters(format!(
                "expected {} memberships, got {}",
                self.nsamples(),
                memberships.len()
            )));
        }

        let mut indices = vec![Vec::new(); n_clusters];
        for (idx, &membership) in memberships.iter().enumerate() {
            match indices.get_mut(membership) {
                Some(members) => members.push(idx),
                None => {
                    return Err(Error::Parameters(format!(
                        "item {} assigned to cluster {}, but only {} clusters exist",
                        idx, membership, n_clusters
                    )))
                }
            }
        }

        Ok(indices
            .into_iter()
            .enumerate()
            .map(|(id, members)| Cluster::new(format!("cluster-{}", id), members))
            .collect())
    }

    /// Verify that `n_clusters` clusters can be formed from this dataset
    ///
    /// Fails if the dataset is empty, if `n_clusters` is zero or if it exceeds the number of
    /// items.
    pub fn check_n_clusters(&self, n_clusters: usize) -> Result<()> {
        if self.is_empty() {
            Err(Error::NotEnoughSamples)
        } else if n_clusters == 0 || n_clusters > self.nsamples() {
            Err(Error::InvalidClusterCount {
                n_clusters,
                n_samples: self.nsamples(),
            })
        } else {
            Ok(())
        }
    }

    /// Componentwise mean of all items
    pub fn mean(&self) -> Option<Array1<F>> {
        self.records.mean_axis(Axis(0))
    }
}

impl<F: Float> From<Array2<F>> for DataSet<F> {
    fn from(records: Array2<F>) -> Self {
        DataSet::new(records)
    }
}

impl<F: Float, S: Data<Elem = F>> From<&ArrayBase<S, Ix2>> for DataSet<F> {
    fn from(records: &ArrayBase<S, Ix2>) -> Self {
        DataSet::new(records.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn from_rows_builds_records() {
        let dataset = DataSet::from_rows(vec![vec![0., 0.], vec![0., 1.], vec![5., 0.]]).unwrap();
        assert_eq!(dataset.nsamples(), 3);
        assert_eq!(dataset.nfeatures(), 2);
        assert_abs_diff_eq!(dataset.records(), array![[0., 0.], [0., 1.], [5., 0.]]);
    }

    #[test]
    fn from_rows_rejects_ragged_rows() {
        let res = DataSet::from_rows(vec![vec![0., 0.], vec![1.], vec![2., 2.]]);
        assert!(matches!(
            res,
            Err(Error::Arity {
                row: 1,
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn empty_rows_give_empty_dataset() {
        let dataset = DataSet::<f64>::from_rows(Vec::<Vec<f64>>::new()).unwrap();
        assert!(dataset.is_empty());
        assert!(matches!(
            dataset.check_n_clusters(1),
            Err(Error::NotEnoughSamples)
        ));
    }

    #[test]
    fn labels_must_match_items() {
        let dataset = DataSet::new(array![[1., 2.], [3., 4.]]);
        assert!(dataset.clone().with_labels(vec!["a".into()]).is_err());

        let dataset = dataset.with_labels(vec!["a".into(), "b".into()]).unwrap();
        let selected = dataset.select(&[1]);
        assert_eq!(selected.labels(), Some(&["b".to_string()][..]));
        assert_abs_diff_eq!(selected.records(), array![[3., 4.]]);
    }

    #[test]
    fn feature_names_default() {
        let dataset = DataSet::new(array![[1., 2.]]);
        assert_eq!(dataset.feature_names(), vec!["feature-0", "feature-1"]);

        let dataset = dataset.with_feature_names(vec!["x", "y"]);
        assert_eq!(dataset.feature_names(), vec!["x", "y"]);
    }

    #[test]
    fn check_n_clusters_bounds() {
        let dataset = DataSet::new(array![[1., 2.], [3., 4.]]);
        assert!(dataset.check_n_clusters(1).is_ok());
        assert!(dataset.check_n_clusters(2).is_ok());
        assert!(matches!(
            dataset.check_n_clusters(0),
            Err(Error::InvalidClusterCount { .. })
        ));
        assert!(matches!(
            dataset.check_n_clusters(3),
            Err(Error::InvalidClusterCount {
                n_clusters: 3,
                n_samples: 2
            })
        ));
    }

    #[test]
    fn partition_groups_indices() {
        let dataset = DataSet::new(array![[0., 0.], [0., 1.], [5., 0.], [5., 1.]]);
        let clusters = dataset.partition(&array![1, 1, 0, 2], 4).unwrap();

        assert_eq!(clusters.len(), 4);
        assert_eq!(clusters[0].indices(), &[2]);
        assert_eq!(clusters[1].indices(), &[0, 1]);
        assert_eq!(clusters[2].indices(), &[3]);
        assert!(clusters[3].is_empty());

        assert!(dataset.partition(&array![0, 0, 0, 5], 2).is_err());
        assert!(dataset.partition(&array![0, 0], 2).is_err());
    }
}
