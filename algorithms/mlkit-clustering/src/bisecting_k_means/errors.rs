use thiserror::Error;

use crate::KMeansError;

/// An error when building with an invalid hyperparameter
#[derive(Error, Debug)]
pub enum BisectingKMeansParamsError {
    #[error("restarts cannot be 0")]
    Restarts,
    #[error("max_n_iterations cannot be 0")]
    MaxIterations,
}

/// An error when modeling a Bisecting K-Means algorithm
#[derive(Error, Debug)]
pub enum BisectingKMeansError {
    /// When any of the hyperparameters are set the wrong value
    #[error("Invalid hyperparameter: {0}")]
    InvalidParams(#[from] BisectingKMeansParamsError),
    /// When a two-way split of a cluster fails
    #[error("Split failed: {0}")]
    Split(#[from] KMeansError),
    #[error(transparent)]
    MlkitError(#[from] mlkit::error::Error),
}
