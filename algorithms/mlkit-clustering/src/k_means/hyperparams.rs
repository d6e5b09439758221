use std::marker::PhantomData;

use crate::KMeansParamsError;

use super::init::KMeansInit;
use mlkit::prelude::*;
use ndarray_rand::rand::{Rng, SeedableRng};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
/// The set of hyperparameters that can be specified for the execution of
/// the [K-means algorithm](crate::KMeans).
pub struct KMeansValidParams<F: Float, R: Rng> {
    /// We exit the training loop when the number of training iterations
    /// exceeds `max_n_iterations` even if no assignment has become stable.
    max_n_iterations: u64,
    /// Record the centroids and assignments at every iteration boundary.
    track_history: bool,
    /// The initialization strategy used to initialize the centroids.
    init: KMeansInit,
    /// The random number generator
    rng: R,
    #[cfg_attr(feature = "serde", serde(skip))]
    phantom: PhantomData<F>,
}

#[derive(Clone, Debug, PartialEq)]
/// An helper struct used to construct a set of [valid hyperparameters](KMeansValidParams) for
/// the [K-means algorithm](crate::KMeans) (using the builder pattern).
pub struct KMeansParams<F: Float, R: Rng>(KMeansValidParams<F, R>);

impl<F: Float, R: Rng> KMeansParams<F, R> {
    /// `new` lets us configure our training algorithm parameters:
    /// * the random generator `rng` drives the centroid initialization, cloning the same
    ///   parameters gives identical runs;
    /// * we exit the training loop when the number of training iterations
    ///   exceeds `max_n_iterations` even if assignments have not become stable.
    ///
    /// Defaults are provided if optional parameters are not specified:
    /// * `max_n_iterations = 300`
    /// * `track_history = false`
    /// * `init = Random`
    pub fn new(rng: R) -> Self {
        Self(KMeansValidParams {
            max_n_iterations: 300,
            track_history: false,
            init: KMeansInit::Random,
            rng,
            phantom: PhantomData,
        })
    }

    /// Change the value of `max_n_iterations`
    pub fn max_n_iterations(mut self, max_n_iterations: u64) -> Self {
        self.0.max_n_iterations = max_n_iterations;
        self
    }

    /// Record a snapshot of centroids and assignments after every iteration
    pub fn track_history(mut self, track_history: bool) -> Self {
        self.0.track_history = track_history;
        self
    }

    /// Change the value of `init`
    pub fn init_method(mut self, init: KMeansInit) -> Self {
        self.0.init = init;
        self
    }

    /// Replace the random generator
    pub fn rng<R2: Rng>(self, rng: R2) -> KMeansParams<F, R2> {
        let KMeansValidParams {
            max_n_iterations,
            track_history,
            init,
            ..
        } = self.0;

        KMeansParams(KMeansValidParams {
            max_n_iterations,
            track_history,
            init,
            rng,
            phantom: PhantomData,
        })
    }
}

impl<F: Float, R: Rng + SeedableRng> KMeansParams<F, R> {
    /// Reseed the random generator, making every run of these parameters reproducible
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.0.rng = R::seed_from_u64(seed);
        self
    }
}

impl<F: Float, R: Rng> ParamGuard for KMeansParams<F, R> {
    type Checked = KMeansValidParams<F, R>;
    type Error = KMeansParamsError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        if self.0.max_n_iterations == 0 {
            Err(KMeansParamsError::MaxIterations)
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}

impl<F: Float, R: Rng> KMeansValidParams<F, R> {
    /// We exit the training loop when the number of training iterations
    /// exceeds `max_n_iterations` even if assignments have not become stable.
    pub fn max_n_iterations(&self) -> u64 {
        self.max_n_iterations
    }

    /// Whether a snapshot is recorded at every iteration boundary
    pub fn track_history(&self) -> bool {
        self.track_history
    }

    /// Cluster initialization strategy
    pub fn init_method(&self) -> KMeansInit {
        self.init
    }

    /// Returns the random generator
    pub fn rng(&self) -> &R {
        &self.rng
    }
}
