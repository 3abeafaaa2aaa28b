//! Clustering engine.
//!
//! Two strategies share the [`Clustering`] interface:
//!
//! - [`WardClustering`]: agglomerative clustering with Ward's
//!   minimum-variance linkage, cut to a fixed number of clusters
//! - [`KMeans`]: Lloyd's algorithm with k-means++ seeding and restarts
//!
//! Both take a dense `n x d` matrix of finite values and return a
//! [`ClusterAssignment`] whose labels are canonical (`0..k`, numbered by first
//! appearance), so the same partition always has the same labels whatever
//! the strategy.
//!
//! # Modules
//!
//! - [`assignment`]: the [`Clustering`] trait and [`ClusterAssignment`]
//! - [`ward`]: Ward linkage producing a [`MergeTree`]
//! - [`merge_tree`]: dendrogram structure, fixed-k cuts, cophenetic distances
//! - [`kmeans`]: k-means and elbow sweeps
//! - [`distance`]: Euclidean and condensed pairwise distances
//! - [`error`]: [`ClusterError`]
//!
//! # Example
//!
//! ```
//! use ndarray::array;
//! use posclust_cluster::{Clustering, KMeans, WardClustering};
//!
//! let data = array![[0.0, 0.0], [0.1, 0.0], [5.0, 5.0], [5.0, 5.1]];
//!
//! let ward = WardClustering::new(2).fit(data.view()).unwrap();
//! let kmeans = KMeans::new(2).with_seed(7).fit(data.view()).unwrap();
//! assert_eq!(ward.labels(), [0, 0, 1, 1]);
//! assert_eq!(ward, kmeans);
//! ```

pub use self::{
    assignment::{ClusterAssignment, Clustering},
    error::ClusterError,
    kmeans::{InertiaPoint, KMeans, KMeansFit},
    merge_tree::{Merge, MergeTree},
    ward::WardClustering,
};

pub mod assignment;
pub mod distance;
pub mod error;
pub mod kmeans;
pub mod merge_tree;
pub mod ward;
