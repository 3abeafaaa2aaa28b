//! Cluster labels and the common clustering interface.

use ndarray::ArrayView2;

use crate::error::ClusterError;

/// A clustering strategy with a fixed number of clusters.
pub trait Clustering {
    /// Partitions the rows of `data`.
    fn fit(&self, data: ArrayView2<'_, f64>) -> Result<ClusterAssignment, ClusterError>;

    /// Number of clusters this strategy produces.
    fn n_clusters(&self) -> usize;
}

/// Cluster label of every row, in row order.
///
/// Labels are canonical: the first row is in cluster `0`, and every other
/// cluster id is the number of distinct clusters seen before its first
/// member. Every id in `0..n_clusters` has at least one member.
///
/// ```
/// use posclust_cluster::ClusterAssignment;
///
/// let assignment = ClusterAssignment::from_raw(&[7, 7, 2, 9, 2]);
/// assert_eq!(assignment.labels(), [0, 0, 1, 2, 1]);
/// assert_eq!(assignment.n_clusters(), 3);
/// assert_eq!(assignment.sizes(), [2, 2, 1]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterAssignment {
    labels: Vec<usize>,
    n_clusters: usize,
}

impl ClusterAssignment {
    /// Relabels arbitrary cluster ids into canonical order.
    #[must_use]
    pub fn from_raw(raw: &[usize]) -> Self {
        let (labels, order) = canonicalize(raw);
        Self {
            labels,
            n_clusters: order.len(),
        }
    }

    #[must_use]
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    #[must_use]
    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of rows in each cluster.
    #[must_use]
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_clusters];
        for &label in &self.labels {
            sizes[label] += 1;
        }
        sizes
    }

    /// Row indices belonging to `cluster`.
    pub fn members(&self, cluster: usize) -> impl Iterator<Item = usize> + '_ {
        self.labels
            .iter()
            .enumerate()
            .filter(move |(_, l)| **l == cluster)
            .map(|(i, _)| i)
    }
}

/// Returns canonical labels and, for each canonical id, the raw id it
/// replaced.
pub(crate) fn canonicalize(raw: &[usize]) -> (Vec<usize>, Vec<usize>) {
    let mut order: Vec<usize> = Vec::new();
    let labels = raw
        .iter()
        .map(|r| {
            order.iter().position(|o| o == r).unwrap_or_else(|| {
                order.push(*r);
                order.len() - 1
            })
        })
        .collect();
    (labels, order)
}
