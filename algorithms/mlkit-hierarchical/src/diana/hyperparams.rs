use mlkit::prelude::*;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::DianaParamsError;

/// The set of hyperparameters of [divisive analysis](crate::Diana)
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct DianaValidParams<F: Float, D: Distance<F>> {
    /// Dissimilarity between two items
    dist_fn: D,
    /// Clusters with a smaller diameter are never split
    min_diameter: F,
}

/// Helper struct to build the hyperparameters of [divisive analysis](crate::Diana)
#[derive(Clone, Debug, PartialEq)]
pub struct DianaParams<F: Float, D: Distance<F>>(DianaValidParams<F, D>);

impl<F: Float, D: Distance<F>> DianaParams<F, D> {
    /// Defaults are provided if optional parameters are not specified:
    /// * `min_diameter = 0`, every cluster with distinct members can be split
    pub fn new(dist_fn: D) -> Self {
        Self(DianaValidParams {
            dist_fn,
            min_diameter: F::zero(),
        })
    }

    /// Select the dissimilarity between items
    pub fn dist_fn<D2: Distance<F>>(self, dist_fn: D2) -> DianaParams<F, D2> {
        DianaParams(DianaValidParams {
            dist_fn,
            min_diameter: self.0.min_diameter,
        })
    }

    /// Stop splitting when the largest diameter drops below `min_diameter`
    pub fn min_diameter(mut self, min_diameter: F) -> Self {
        self.0.min_diameter = min_diameter;
        self
    }
}

impl<F: Float, D: Distance<F>> ParamGuard for DianaParams<F, D> {
    type Checked = DianaValidParams<F, D>;
    type Error = DianaParamsError<F>;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        let min_diameter = self.0.min_diameter;
        if min_diameter.is_finite() && min_diameter >= F::zero() {
            Ok(&self.0)
        } else {
            Err(DianaParamsError::MinDiameter(min_diameter))
        }
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}

impl<F: Float, D: Distance<F>> DianaValidParams<F, D> {
    pub fn dist_fn(&self) -> &D {
        &self.dist_fn
    }

    pub fn min_diameter(&self) -> F {
        self.min_diameter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Diana;
    use mlkit::proximity::L1Dist;

    #[test]
    fn autotraits() {
        fn has_autotraits<T: Send + Sync + Sized + Unpin>() {}
        has_autotraits::<DianaParams<f64, L2Dist>>();
        has_autotraits::<DianaValidParams<f32, L1Dist>>();
    }

    #[test]
    fn min_diameter_must_be_finite_and_non_negative() {
        for min_diameter in [-0.5, f64::NAN, f64::INFINITY] {
            let res = Diana::params().min_diameter(min_diameter).check();
            assert!(matches!(res, Err(DianaParamsError::MinDiameter(_))));
        }

        let params = Diana::<f64>::params().min_diameter(2.).check_unwrap();
        assert_eq!(params.min_diameter(), 2.);
        assert_eq!(params.dist_fn(), &L2Dist);
    }
}
