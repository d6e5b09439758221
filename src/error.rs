//! Error types in mlkit
//!

use thiserror::Error;

use ndarray::ShapeError;
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("invalid parameter {0}")]
    Parameters(String),
    #[error("the dataset does not contain any item")]
    NotEnoughSamples,
    #[error("cannot form {n_clusters} clusters from {n_samples} items")]
    InvalidClusterCount { n_clusters: usize, n_samples: usize },
    #[error("row {row} has {found} values, expected {expected}")]
    Arity {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("expected {expected} labels, got {found}")]
    Labels { expected: usize, found: usize },
    #[error("invalid ndarray shape {0}")]
    NdShape(#[from] ShapeError),
}
