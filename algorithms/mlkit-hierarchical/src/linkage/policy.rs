//! Lance-Williams distance updates
//!
//! When clusters `i` and `j` merge, the distance of the merged cluster to every other open
//! cluster `k` is derived from the pre-merge distances `d(i, j)`, `d(i, k)` and `d(j, k)` and the
//! cluster sizes. The update rule is the only place where linkage methods differ.
use mlkit::Float;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// A Lance-Williams update rule
pub trait LinkageUpdate<F: Float>: Clone {
    /// Whether the rule operates on squared euclidean distances
    ///
    /// Such rules are only valid when the initial distances are squared; the reported merge
    /// distance is the square root of the stored one.
    fn squared(&self) -> bool {
        false
    }

    /// Distance between the union of `i` and `j` and another cluster `k`
    fn update(&self, d_ij: F, d_ik: F, d_jk: F, n_i: usize, n_j: usize, n_k: usize) -> F;
}

macro_rules! policy {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[cfg_attr(
            feature = "serde",
            derive(Serialize, Deserialize),
            serde(crate = "serde_crate")
        )]
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
        pub struct $name;
    };
}

policy!(
    /// Nearest neighbour linkage, `min(d(i, k), d(j, k))`
    SingleLinkage
);
policy!(
    /// Farthest neighbour linkage, `max(d(i, k), d(j, k))`
    CompleteLinkage
);
policy!(
    /// Group average linkage (UPGMA), the mean over all pairs of members
    AverageLinkage
);
policy!(
    /// Weighted average linkage (WPGMA), both halves of a merge count the same
    WeightedLinkage
);
policy!(
    /// Centroid linkage (UPGMC), the squared distance between cluster means
    CentroidLinkage
);
policy!(
    /// Median linkage (WPGMC), centroid linkage where both halves of a merge count the same
    MedianLinkage
);
policy!(
    /// Ward linkage, every merge minimizes the increase of the total within-cluster sum of
    /// squared errors
    WardLinkage
);

impl<F: Float> LinkageUpdate<F> for SingleLinkage {
    fn update(&self, _: F, d_ik: F, d_jk: F, _: usize, _: usize, _: usize) -> F {
        d_ik.min(d_jk)
    }
}

impl<F: Float> LinkageUpdate<F> for CompleteLinkage {
    fn update(&self, _: F, d_ik: F, d_jk: F, _: usize, _: usize, _: usize) -> F {
        d_ik.max(d_jk)
    }
}

impl<F: Float> LinkageUpdate<F> for AverageLinkage {
    fn update(&self, _: F, d_ik: F, d_jk: F, n_i: usize, n_j: usize, _: usize) -> F {
        let (n_i, n_j) = (F::cast(n_i), F::cast(n_j));
        (n_i * d_ik + n_j * d_jk) / (n_i + n_j)
    }
}

impl<F: Float> LinkageUpdate<F> for WeightedLinkage {
    fn update(&self, _: F, d_ik: F, d_jk: F, _: usize, _: usize, _: usize) -> F {
        (d_ik + d_jk) / F::cast(2)
    }
}

impl<F: Float> LinkageUpdate<F> for CentroidLinkage {
    fn squared(&self) -> bool {
        true
    }

    fn update(&self, d_ij: F, d_ik: F, d_jk: F, n_i: usize, n_j: usize, _: usize) -> F {
        let (n_i, n_j) = (F::cast(n_i), F::cast(n_j));
        let n = n_i + n_j;
        (n_i * d_ik + n_j * d_jk) / n - n_i * n_j * d_ij / (n * n)
    }
}

impl<F: Float> LinkageUpdate<F> for MedianLinkage {
    fn squared(&self) -> bool {
        true
    }

    fn update(&self, d_ij: F, d_ik: F, d_jk: F, _: usize, _: usize, _: usize) -> F {
        let half = F::cast(0.5);
        half * (d_ik + d_jk) - half * half * d_ij
    }
}

impl<F: Float> LinkageUpdate<F> for WardLinkage {
    fn squared(&self) -> bool {
        true
    }

    fn update(&self, d_ij: F, d_ik: F, d_jk: F, n_i: usize, n_j: usize, n_k: usize) -> F {
        let (n_i, n_j, n_k) = (F::cast(n_i), F::cast(n_j), F::cast(n_k));
        ((n_i + n_k) * d_ik + (n_j + n_k) * d_jk - n_k * d_ij) / (n_i + n_j + n_k)
    }
}

/// Linkage method selected at runtime
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Method {
    Single,
    Complete,
    #[default]
    Average,
    Weighted,
    Centroid,
    Median,
    Ward,
}

impl Method {
    /// Every linkage method, in declaration order
    pub const ALL: [Method; 7] = [
        Method::Single,
        Method::Complete,
        Method::Average,
        Method::Weighted,
        Method::Centroid,
        Method::Median,
        Method::Ward,
    ];
}

impl<F: Float> LinkageUpdate<F> for Method {
    fn squared(&self) -> bool {
        match self {
            Method::Single => LinkageUpdate::<F>::squared(&SingleLinkage),
            Method::Complete => LinkageUpdate::<F>::squared(&CompleteLinkage),
            Method::Average => LinkageUpdate::<F>::squared(&AverageLinkage),
            Method::Weighted => LinkageUpdate::<F>::squared(&WeightedLinkage),
            Method::Centroid => LinkageUpdate::<F>::squared(&CentroidLinkage),
            Method::Median => LinkageUpdate::<F>::squared(&MedianLinkage),
            Method::Ward => LinkageUpdate::<F>::squared(&WardLinkage),
        }
    }

    fn update(&self, d_ij: F, d_ik: F, d_jk: F, n_i: usize, n_j: usize, n_k: usize) -> F {
        let args = (d_ij, d_ik, d_jk, n_i, n_j, n_k);
        match self {
            Method::Single => apply(&SingleLinkage, args),
            Method::Complete => apply(&CompleteLinkage, args),
            Method::Average => apply(&AverageLinkage, args),
            Method::Weighted => apply(&WeightedLinkage, args),
            Method::Centroid => apply(&CentroidLinkage, args),
            Method::Median => apply(&MedianLinkage, args),
            Method::Ward => apply(&WardLinkage, args),
        }
    }
}

fn apply<F: Float, U: LinkageUpdate<F>>(
    policy: &U,
    (d_ij, d_ik, d_jk, n_i, n_j, n_k): (F, F, F, usize, usize, usize),
) -> F {
    policy.update(d_ij, d_ik, d_jk, n_i, n_j, n_k)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use mlkit::proximity::squared_euclidean;
    use ndarray::{array, Array1};

    fn mean(points: &[Array1<f64>]) -> Array1<f64> {
        points.iter().fold(Array1::zeros(points[0].len()), |acc, p| acc + p) / points.len() as f64
    }

    #[test]
    fn graph_methods() {
        assert_abs_diff_eq!(SingleLinkage.update(1., 2., 3., 1, 1, 1), 2.);
        assert_abs_diff_eq!(CompleteLinkage.update(1., 2., 3., 1, 1, 1), 3.);
        assert_abs_diff_eq!(AverageLinkage.update(1., 2., 5., 3, 1, 7), 2.75);
        assert_abs_diff_eq!(WeightedLinkage.update(1., 2., 5., 3, 1, 7), 3.5);
    }

    #[test]
    fn centroid_update_is_distance_of_means() {
        let i = vec![array![0., 0.], array![1., 0.]];
        let j = vec![array![4., 3.]];
        let k = vec![array![-2., 5.], array![0., 7.], array![1., 1.]];
        let d = |a: &[Array1<f64>], b: &[Array1<f64>]| {
            squared_euclidean(mean(a).view(), mean(b).view())
        };

        let merged = [i.clone(), j.clone()].concat();
        let update = CentroidLinkage.update(d(&i, &j), d(&i, &k), d(&j, &k), 2, 1, 3);
        assert_abs_diff_eq!(update, d(&merged, &k), epsilon = 1e-12);
    }

    #[test]
    fn median_update_uses_midpoint() {
        let (i, j, k) = (array![0., 0.], array![4., 2.], array![1., 5.]);
        let midpoint = (&i + &j) / 2.;

        let update = MedianLinkage.update(
            squared_euclidean(i.view(), j.view()),
            squared_euclidean(i.view(), k.view()),
            squared_euclidean(j.view(), k.view()),
            10,
            1,
            1,
        );
        assert_abs_diff_eq!(
            update,
            squared_euclidean(midpoint.view(), k.view()),
            epsilon = 1e-12
        );
    }

    #[test]
    fn ward_update_is_twice_the_error_increase() {
        // with squared euclidean inputs, the ward distance between two clusters equals
        // `2 * n_a * n_b / (n_a + n_b) * |c_a - c_b|^2`
        let ward = |a: &[Array1<f64>], b: &[Array1<f64>]| {
            let (n_a, n_b) = (a.len() as f64, b.len() as f64);
            2. * n_a * n_b / (n_a + n_b) * squared_euclidean(mean(a).view(), mean(b).view())
        };
        let i = vec![array![0., 0.], array![1., 0.]];
        let j = vec![array![4., 3.], array![3., 3.], array![5., 2.]];
        let k = vec![array![-2., 5.]];

        let merged = [i.clone(), j.clone()].concat();
        let update = WardLinkage.update(ward(&i, &j), ward(&i, &k), ward(&j, &k), 2, 3, 1);
        assert_abs_diff_eq!(update, ward(&merged, &k), epsilon = 1e-12);
    }

    #[test]
    fn method_dispatch() {
        for method in Method::ALL {
            let expected = match method {
                Method::Single => SingleLinkage.update(4., 2., 3., 2, 1, 1),
                Method::Complete => CompleteLinkage.update(4., 2., 3., 2, 1, 1),
                Method::Average => AverageLinkage.update(4., 2., 3., 2, 1, 1),
                Method::Weighted => WeightedLinkage.update(4., 2., 3., 2, 1, 1),
                Method::Centroid => CentroidLinkage.update(4., 2., 3., 2, 1, 1),
                Method::Median => MedianLinkage.update(4., 2., 3., 2, 1, 1),
                Method::Ward => WardLinkage.update(4., 2., 3., 2, 1, 1),
            };
            assert_abs_diff_eq!(method.update(4., 2., 3., 2, 1, 1), expected);
        }

        let squared = Method::ALL
            .into_iter()
            .filter(|method| LinkageUpdate::<f64>::squared(method))
            .collect::<Vec<_>>();
        assert_eq!(squared, vec![Method::Centroid, Method::Median, Method::Ward]);
    }
}
