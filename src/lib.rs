//! `mlkit` provides the building blocks shared by a small family of classical machine learning
//! crates written in pure Rust.
//!
//! ## The big picture
//!
//! The core crate defines the [`DataSet`] every algorithm consumes, the [`Cluster`] views
//! algorithms hand back, a library of [distance functions](proximity) and the common traits
//! ([`Build`](traits::Build), [`Clustering`](traits::Clustering)) and hyperparameter checking
//! ([`ParamGuard`]) used across the family.
//!
//! The algorithms themselves live in their own crates:
//! * `mlkit-clustering`: K-Means and Bisecting K-Means
//! * `mlkit-hierarchical`: agglomerative linkage clustering and DIANA
//!
//! Datasets for tests and benchmarks can be generated or loaded from CSV with `mlkit-datasets`.
//!

pub mod cluster;
pub mod dataset;
pub mod error;
pub mod param_guard;
pub mod prelude;
pub mod proximity;
pub mod traits;

pub use cluster::Cluster;
pub use dataset::{DataSet, Float, Records};
pub use error::{Error, Result};
pub use param_guard::ParamGuard;
