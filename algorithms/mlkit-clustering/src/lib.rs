//! `mlkit-clustering` provides pure Rust implementations of partitional clustering algorithms.
//!
//! ## The big picture
//!
//! `mlkit-clustering` is a crate in the `mlkit` family. Algorithms consume a shared
//! [`DataSet`](mlkit::DataSet), are configured through checked parameter builders and return
//! a fitted object implementing [`Clustering`](mlkit::traits::Clustering), which exposes the
//! resulting partition as a list of [`Cluster`](mlkit::Cluster) views.
//!
//! ## Current state
//!
//! Right now `mlkit-clustering` provides the following clustering algorithms:
//! * [K-Means](KMeans)
//! * [Bisecting K-Means](BisectingKMeans)
//!
//! Hierarchical algorithms live in `mlkit-hierarchical`.
//!
//! Implementation choices, algorithmic details and tutorials can be found in the page dedicated
//! to the specific algorithms.
mod bisecting_k_means;
#[allow(clippy::new_ret_no_self)]
mod k_means;

pub use bisecting_k_means::*;
pub use k_means::*;
