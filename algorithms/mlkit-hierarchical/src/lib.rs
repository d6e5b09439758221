//! # Hierarchical Clustering
//!
//! `mlkit-hierarchical` provides agglomerative and divisive hierarchical clustering.
//!
//! ## The big picture
//!
//! `mlkit-hierarchical` is a crate in the `mlkit` family. Both algorithms consume a
//! [`DataSet`](mlkit::DataSet) and return the resulting partition as
//! [`Cluster`](mlkit::Cluster) views, together with the merge or split sequence that produced
//! it, so that external tooling can rebuild the dendrogram.
//!
//! ## Current state
//!
//! * [Agglomerative clustering](AgglomerativeClustering): each point starts as its own cluster
//!   and the two closest clusters are merged until the requested number is left. The distance
//!   between a merged cluster and the others follows a [Lance-Williams](LinkageUpdate) update
//!   rule: single, complete, average, weighted, centroid, median and Ward linkage are provided.
//! * [DIANA](Diana): all points start in one cluster and the cluster with the largest diameter
//!   is split until the requested number of clusters exists.
//!
//! ```
//! use mlkit::prelude::*;
//! use mlkit_hierarchical::{AgglomerativeClustering, Method};
//! use ndarray::array;
//!
//! let dataset = DataSet::new(array![[0., 0.], [0., 1.], [5., 0.], [5., 1.]]);
//! let model = AgglomerativeClustering::params()
//!     .policy(Method::Ward)
//!     .build(&dataset, 1)
//!     .unwrap();
//!
//! assert_eq!(model.n_merges(), 3);
//! assert_eq!(model.sse_history(), vec![0.5, 1.0, 26.0]);
//! ```
mod diana;
mod error;
mod linkage;

pub use diana::*;
pub use error::*;
pub use linkage::*;
