use std::marker::PhantomData;

use crate::{BisectingKMeansParamsError, KMeansInit};
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
/// the [Bisecting K-means algorithm](crate::BisectingKMeans).
pub struct BisectingKMeansValidParams<F: Float, R: Rng> {
    /// Number of two-way K-means runs tried for every split, the one with the lowest
    /// sum of squared errors is kept.
    restarts: usize,
    /// Iteration bound of every two-way K-means run
    max_n_iterations: u64,
    /// Centroid initialization of every two-way K-means run
    init: KMeansInit,
    /// The random number generator, the seed of every restart is drawn from it
    rng: R,
    #[cfg_attr(feature = "serde", serde(skip))]
    phantom: PhantomData<F>,
}

#[derive(Clone, Debug, PartialEq)]
/// An helper struct used to construct a set of [valid hyperparameters](BisectingKMeansValidParams)
/// for the [Bisecting K-means algorithm](crate::BisectingKMeans) (using the builder pattern).
pub struct BisectingKMeansParams<F: Float, R: Rng>(BisectingKMeansValidParams<F, R>);

impl<F: Float, R: Rng> BisectingKMeansParams<F, R> {
    /// Defaults are provided if optional parameters are not specified:
    /// * `restarts = 3`
    /// * `max_n_iterations = 300`
    /// * `init = Random`
    pub fn new(rng: R) -> Self {
        Self(BisectingKMeansValidParams {
            restarts: 3,
            max_n_iterations: 300,
            init: KMeansInit::Random,
            rng,
            phantom: PhantomData,
        })
    }

    /// Change the number of two-way K-means runs tried for every split
    pub fn restarts(mut self, restarts: usize) -> Self {
        self.0.restarts = restarts;
        self
    }

    /// Change the iteration bound of the two-way K-means runs
    pub fn max_n_iterations(mut self, max_n_iterations: u64) -> Self {
        self.0.max_n_iterations = max_n_iterations;
        self
    }

    /// Change the centroid initialization of the two-way K-means runs
    pub fn init_method(mut self, init: KMeansInit) -> Self {
        self.0.init = init;
        self
    }

    /// Replace the random generator
    pub fn rng<R2: Rng>(self, rng: R2) -> BisectingKMeansParams<F, R2> {
        let BisectingKMeansValidParams {
            restarts,
            max_n_iterations,
            init,
            ..
        } = self.0;

        BisectingKMeansParams(BisectingKMeansValidParams {
            restarts,
            max_n_iterations,
            init,
            rng,
            phantom: PhantomData,
        })
    }
}

impl<F: Float, R: Rng + SeedableRng> BisectingKMeansParams<F, R> {
    /// Reseed the random generator, making every run of these parameters reproducible
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.0.rng = R::seed_from_u64(seed);
        self
    }
}

impl<F: Float, R: Rng> ParamGuard for BisectingKMeansParams<F, R> {
    type Checked = BisectingKMeansValidParams<F, R>;
    type Error = BisectingKMeansParamsError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        if self.0.restarts == 0 {
            Err(BisectingKMeansParamsError::Restarts)
        } else if self.0.max_n_iterations == 0 {
            Err(BisectingKMeansParamsError::MaxIterations)
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}

impl<F: Float, R: Rng> BisectingKMeansValidParams<F, R> {
    pub fn restarts(&self) -> usize {
        self.restarts
    }

    pub fn max_n_iterations(&self) -> u64 {
        self.max_n_iterations
    }

    pub fn init_method(&self) -> KMeansInit {
        self.init
    }

    pub fn rng(&self) -> &R {
        &self.rng
    }
}
