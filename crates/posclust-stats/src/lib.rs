//! Statistical helpers for the posclust project.
//!
//! This crate provides the small set of statistical tools the clustering
//! pipeline needs:
//!
//! - **Descriptive statistics**: mean, variance, standard deviation, min/max and
//!   median of a column of values
//! - **Entropy**: Shannon entropy of a discrete distribution, used to summarize
//!   how concentrated a cluster is on a single position
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing datasets
//! - [`entropy`]: Shannon entropy of count or proportion vectors
//!
//! # Examples
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use posclust_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! assert_eq!(stats.variance, 2.0);
//! ```
//!
//! ## Computing entropy
//!
//! ```
//! use posclust_stats::entropy::shannon_entropy;
//!
//! // A cluster made of a single position has zero entropy
//! assert_eq!(shannon_entropy(&[0.0, 1.0, 0.0]), Some(0.0));
//! ```

pub mod descriptive;
pub mod entropy;
