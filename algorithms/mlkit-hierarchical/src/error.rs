//! Error definitions
//!

use mlkit::Float;
use thiserror::Error;

/// Simplified `Result` using [`HierarchicalError`](crate::HierarchicalError) as error type
pub type Result<T, F> = std::result::Result<T, HierarchicalError<F>>;

/// Error variants from linkage parameter construction
#[derive(Error, Debug, Clone)]
pub enum LinkageParamsError<F: Float> {
    /// Invalid stopping distance
    #[error("The maximal merge distance {0} is not valid")]
    MaxDistance(F),
}

/// Error variants from DIANA parameter construction
#[derive(Error, Debug, Clone)]
pub enum DianaParamsError<F: Float> {
    /// Invalid stopping diameter
    #[error("The minimal split diameter {0} is not valid")]
    MinDiameter(F),
}

/// Error variants of hierarchical clustering
#[derive(Error, Debug, Clone)]
pub enum HierarchicalError<F: Float> {
    #[error(transparent)]
    LinkageParams(#[from] LinkageParamsError<F>),
    #[error(transparent)]
    DianaParams(#[from] DianaParamsError<F>),
    #[error(transparent)]
    BaseCrate(#[from] mlkit::Error),
}
