//! Proximity
//!
//! Stateless distance functions between numeric feature vectors.
use ndarray::{Array2, ArrayBase, ArrayView1, Data, Ix2, Zip};
use ndarray_stats::errors::MultiInputError;
use ndarray_stats::DeviationExt;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::dataset::Float;

pub type Point<'a, F> = ArrayView1<'a, F>;

/// A distance metric between two points
///
/// # Panics
///
/// Panics if both points do not have the same dimension.
pub trait Distance<F: Float>: Clone {
    fn distance(&self, a: Point<F>, b: Point<F>) -> F;

    // Fast distance metric that keeps the order of the distance function
    fn rdistance(&self, a: Point<F>, b: Point<F>) -> F {
        self.distance(a, b)
    }

    fn rdist_to_dist(&self, rdist: F) -> F {
        rdist
    }

    fn dist_to_rdist(&self, dist: F) -> F {
        dist
    }
}

// Points without features are at distance zero of each other
fn deviation<F: Float>(result: Result<F, MultiInputError>) -> F {
    match result {
        Ok(dist) => dist,
        Err(MultiInputError::EmptyInput) => F::zero(),
        Err(err) => panic!("cannot compare points: {}", err),
    }
}

/// Squared euclidean distance between two points
pub fn squared_euclidean<F: Float>(a: Point<F>, b: Point<F>) -> F {
    deviation(a.sq_l2_dist(&b))
}

/// Manhattan distance
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct L1Dist;
impl<F: Float> Distance<F> for L1Dist {
    fn distance(&self, a: Point<F>, b: Point<F>) -> F {
        deviation(a.l1_dist(&b))
    }
}

/// Euclidean distance, with the squared euclidean distance as its reduced form
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct L2Dist;
impl<F: Float> Distance<F> for L2Dist {
    fn distance(&self, a: Point<F>, b: Point<F>) -> F {
        squared_euclidean(a, b).sqrt()
    }

    fn rdistance(&self, a: Point<F>, b: Point<F>) -> F {
        squared_euclidean(a, b)
    }

    fn rdist_to_dist(&self, rdist: F) -> F {
        rdist.sqrt()
    }

    fn dist_to_rdist(&self, dist: F) -> F {
        dist.powi(2)
    }
}

/// Squared euclidean distance
///
/// Does not satisfy the triangle inequality.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct SqL2Dist;
impl<F: Float> Distance<F> for SqL2Dist {
    fn distance(&self, a: Point<F>, b: Point<F>) -> F {
        squared_euclidean(a, b)
    }
}

/// Chebyshev distance
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct LInfDist;
impl<F: Float> Distance<F> for LInfDist {
    fn distance(&self, a: Point<F>, b: Point<F>) -> F {
        deviation(a.linf_dist(&b))
    }
}

/// Minkowski distance of order `p`
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LpDist<F: Float>(pub F);
impl<F: Float> Distance<F> for LpDist<F> {
    fn distance(&self, a: Point<F>, b: Point<F>) -> F {
        Zip::from(&a)
            .and(&b)
            .fold(F::zero(), |acc, &a, &b| acc + (a - b).abs().powf(self.0))
            .powf(F::one() / self.0)
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
#[non_exhaustive]
pub enum CommonDistance<F> {
    /// Manhattan distance
    L1Dist,
    /// Euclidean distance
    L2Dist,
    /// Squared euclidean distance
    SqL2Dist,
    /// Chebyshev distance
    LInfDist,
    /// Minkowski distance
    LpDist(F),
}

impl<F: Float> Distance<F> for CommonDistance<F> {
    fn distance(&self, a: Point<F>, b: Point<F>) -> F {
        match self {
            Self::L1Dist => L1Dist.distance(a, b),
            Self::L2Dist => L2Dist.distance(a, b),
            Self::SqL2Dist => SqL2Dist.distance(a, b),
            Self::LInfDist => LInfDist.distance(a, b),
            Self::LpDist(p) => LpDist(*p).distance(a, b),
        }
    }

    fn rdistance(&self, a: Point<F>, b: Point<F>) -> F {
        match self {
            Self::L1Dist => L1Dist.rdistance(a, b),
            Self::L2Dist => L2Dist.rdistance(a, b),
            Self::SqL2Dist => SqL2Dist.rdistance(a, b),
            Self::LInfDist => LInfDist.rdistance(a, b),
            Self::LpDist(p) => LpDist(*p).rdistance(a, b),
        }
    }

    fn rdist_to_dist(&self, rdist: F) -> F {
        match self {
            Self::L2Dist => Distance::<F>::rdist_to_dist(&L2Dist, rdist),
            _ => rdist,
        }
    }

    fn dist_to_rdist(&self, dist: F) -> F {
        match self {
            Self::L2Dist => Distance::<F>::dist_to_rdist(&L2Dist, dist),
            _ => dist,
        }
    }
}

/// Symmetric matrix of distances between every pair of rows of `observations`
pub fn pairwise_distances<F: Float, D: Distance<F>>(
    dist_fn: &D,
    observations: &ArrayBase<impl Data<Elem = F>, Ix2>,
) -> Array2<F> {
    let n = observations.nrows();
    let mut distances = Array2::zeros((n, n));
    for i in 0..n {
        for j in (i + 1)..n {
            let d = dist_fn.distance(observations.row(i), observations.row(j));
            distances[[i, j]] = d;
            distances[[j, i]] = d;
        }
    }

    distances
}

#[cfg(test)]
mod test {
    use approx::assert_abs_diff_eq;
    use ndarray::{arr1, array, Array1};

    use super::*;

    fn dist_test(dist: CommonDistance<f64>, result: f64) {
        let a = arr1(&[0.5, 6.6]);
        let b = arr1(&[4.4, 3.0]);
        let ab = dist.distance(a.view(), b.view());
        assert_abs_diff_eq!(ab, result, epsilon = 1e-3);
        assert_abs_diff_eq!(dist.rdist_to_dist(dist.dist_to_rdist(ab)), ab, epsilon = 1e-9);

        let a = arr1(&[f64::INFINITY, 6.6]);
        let b = arr1(&[4.4, f64::NEG_INFINITY]);
        assert!(dist.distance(a.view(), b.view()).is_infinite());
    }

    fn triangle_test(dist: CommonDistance<f64>) {
        let a = arr1(&[0.5, 6.6]);
        let b = arr1(&[4.4, 3.0]);
        let c = arr1(&[-4.5, 3.3]);
        let ab = dist.distance(a.view(), b.view());
        let bc = dist.distance(b.view(), c.view());
        let ac = dist.distance(a.view(), c.view());
        assert!(ab + bc > ac)
    }

    #[test]
    fn l1_dist() {
        dist_test(CommonDistance::L1Dist, 7.5);
        triangle_test(CommonDistance::L1Dist);
    }

    #[test]
    fn l2_dist() {
        dist_test(CommonDistance::L2Dist, 5.3075);
        triangle_test(CommonDistance::L2Dist);

        let a = arr1(&[0.5, 6.6]);
        let b = arr1(&[4.4, 3.0]);
        assert_abs_diff_eq!(L2Dist.rdistance(a.view(), b.view()), 28.17, epsilon = 1e-9);
    }

    #[test]
    fn sq_l2_dist() {
        dist_test(CommonDistance::SqL2Dist, 28.17);
    }

    #[test]
    fn linf_dist() {
        dist_test(CommonDistance::LInfDist, 3.9);
        triangle_test(CommonDistance::LInfDist);
    }

    #[test]
    fn lp_dist() {
        dist_test(CommonDistance::LpDist(3.3), 4.635);
        triangle_test(CommonDistance::LpDist(3.3));
    }

    #[test]
    fn points_without_features() {
        let a = Array1::<f64>::zeros(0);
        for dist in [
            CommonDistance::L1Dist,
            CommonDistance::L2Dist,
            CommonDistance::SqL2Dist,
            CommonDistance::LInfDist,
        ] {
            assert_abs_diff_eq!(dist.distance(a.view(), a.view()), 0.);
        }
    }

    #[test]
    #[should_panic]
    fn dimension_mismatch() {
        let a = arr1(&[0.5, 6.6]);
        let b = arr1(&[4.4, 3.0, 1.0]);
        squared_euclidean(a.view(), b.view());
    }

    #[test]
    fn pairwise_is_symmetric_with_zero_diagonal() {
        let points = array![[0., 0.], [3., 4.], [6., 8.]];
        let distances = pairwise_distances(&L2Dist, &points);

        assert_abs_diff_eq!(
            distances,
            array![[0., 5., 10.], [5., 0., 5.], [10., 5., 0.]],
            epsilon = 1e-12
        );
    }
}
