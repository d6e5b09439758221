use mlkit::prelude::*;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use super::policy::LinkageUpdate;
use crate::LinkageParamsError;

/// The set of hyperparameters of [agglomerative clustering](crate::AgglomerativeClustering)
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct LinkageValidParams<F: Float, U: LinkageUpdate<F>> {
    policy: U,
    max_distance: Option<F>,
}

/// Helper struct to build the hyperparameters of
/// [agglomerative clustering](crate::AgglomerativeClustering) (using the builder pattern)
#[derive(Clone, Debug, PartialEq)]
pub struct LinkageParams<F: Float, U: LinkageUpdate<F>>(LinkageValidParams<F, U>);

impl<F: Float, U: LinkageUpdate<F>> LinkageParams<F, U> {
    /// Merge with the given distance update rule until the requested number of clusters is
    /// reached
    pub fn new(policy: U) -> Self {
        Self(LinkageValidParams {
            policy,
            max_distance: None,
        })
    }

    /// Select a merging policy
    pub fn policy<U2: LinkageUpdate<F>>(self, policy: U2) -> LinkageParams<F, U2> {
        LinkageParams(LinkageValidParams {
            policy,
            max_distance: self.0.max_distance,
        })
    }

    /// Stop merging when a certain distance is reached
    ///
    /// In the fitting process clusters are merged until the requested number of clusters is
    /// reached. With this option the merging process stops earlier, as soon as the closest pair
    /// of clusters is at least `max_distance` apart.
    pub fn max_distance(mut self, max_distance: F) -> Self {
        self.0.max_distance = Some(max_distance);
        self
    }
}

impl<F: Float, U: LinkageUpdate<F>> ParamGuard for LinkageParams<F, U> {
    type Checked = LinkageValidParams<F, U>;
    type Error = LinkageParamsError<F>;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        match self.0.max_distance {
            Some(dist) if dist.is_nan() || dist <= F::zero() => {
                Err(LinkageParamsError::MaxDistance(dist))
            }
            _ => Ok(&self.0),
        }
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}

impl<F: Float, U: LinkageUpdate<F>> LinkageValidParams<F, U> {
    pub fn policy(&self) -> &U {
        &self.policy
    }

    pub fn max_distance(&self) -> Option<F> {
        self.max_distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AgglomerativeClustering, Method, WardLinkage};

    #[test]
    fn autotraits() {
        fn has_autotraits<T: Send + Sync + Sized + Unpin>() {}
        has_autotraits::<LinkageParams<f64, Method>>();
        has_autotraits::<LinkageValidParams<f64, WardLinkage>>();
    }

    #[test]
    fn max_distance_must_be_positive() {
        for dist in [0., -1., f64::NAN] {
            let res = AgglomerativeClustering::params().max_distance(dist).check();
            assert!(matches!(res, Err(LinkageParamsError::MaxDistance(_))));
        }

        let params = AgglomerativeClustering::<f64>::params()
            .max_distance(f64::INFINITY)
            .check_unwrap();
        assert_eq!(params.max_distance(), Some(f64::INFINITY));
    }

    #[test]
    fn default_method_is_average() {
        let params = AgglomerativeClustering::<f64>::params().check_unwrap();
        assert_eq!(params.policy(), &Method::Average);
        assert_eq!(params.max_distance(), None);

        let params = AgglomerativeClustering::<f64>::params()
            .policy(WardLinkage)
            .check_unwrap();
        assert_eq!(params.policy(), &WardLinkage);
    }
}
