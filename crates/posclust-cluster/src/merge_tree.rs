//! Agglomerative merge tree (dendrogram).
//!
//! Node ids follow the usual linkage-matrix convention: leaves are
//! `0..n`, and the `i`-th merge creates node `n + i`. Merges are stored in
//! the order they happened, so heights are non-decreasing for Ward linkage.

use crate::{assignment::ClusterAssignment, distance::condensed_index, error::ClusterError};

/// One merge step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    /// Smaller node id of the merged pair.
    pub left: usize,
    /// Larger node id of the merged pair.
    pub right: usize,
    /// Linkage distance at which the pair was merged.
    pub height: f64,
    /// Number of leaves under the new node.
    pub size: usize,
}

#[derive(Debug, Clone)]
pub struct MergeTree {
    n_leaves: usize,
    merges: Vec<Merge>,
}

impl MergeTree {
    pub(crate) fn new(n_leaves: usize, merges: Vec<Merge>) -> Self {
        debug_assert_eq!(merges.len(), n_leaves.saturating_sub(1));
        Self { n_leaves, merges }
    }

    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.n_leaves
    }

    #[must_use]
    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    /// Id of the node covering every leaf.
    #[must_use]
    pub fn root(&self) -> usize {
        self.n_leaves + self.merges.len() - 1
    }

    #[must_use]
    pub fn is_leaf(&self, node: usize) -> bool {
        node < self.n_leaves
    }

    fn merge_of(&self, node: usize) -> Option<&Merge> {
        node.checked_sub(self.n_leaves)
            .and_then(|i| self.merges.get(i))
    }

    /// Children of an internal node, `None` for leaves.
    #[must_use]
    pub fn children(&self, node: usize) -> Option<(usize, usize)> {
        self.merge_of(node).map(|m| (m.left, m.right))
    }

    /// Merge height of a node; leaves sit at height `0`.
    #[must_use]
    pub fn height(&self, node: usize) -> f64 {
        self.merge_of(node).map_or(0.0, |m| m.height)
    }

    /// Number of leaves under a node.
    #[must_use]
    pub fn size(&self, node: usize) -> usize {
        self.merge_of(node).map_or(1, |m| m.size)
    }

    /// A height that separates the tree into exactly `k` groups.
    ///
    /// This is the midpoint between the last merge applied by
    /// [`Self::cut_to_k`] and the first one left out. For `k == 1` it is the
    /// root height. Returns `None` when `k` is out of range.
    #[must_use]
    pub fn cut_height(&self, k: usize) -> Option<f64> {
        if k == 0 || k > self.n_leaves {
            return None;
        }
        let applied = self.n_leaves - k;
        let below = applied
            .checked_sub(1)
            .map_or(0.0, |i| self.merges[i].height);
        let above = self.merges.get(applied).map_or(below, |m| m.height);
        Some(f64::midpoint(below, above))
    }

    /// Applies the first `n - k` merges and labels the resulting groups.
    ///
    /// Always yields exactly `k` clusters, whatever the merge heights.
    ///
    /// ```
    /// use ndarray::array;
    /// use posclust_cluster::WardClustering;
    ///
    /// let data = array![[0.0], [0.1], [5.0], [5.2], [9.0]];
    /// let tree = WardClustering::new(3).fit_tree(data.view()).unwrap();
    /// let assignment = tree.cut_to_k(3).unwrap();
    /// assert_eq!(assignment.labels(), [0, 0, 1, 1, 2]);
    /// ```
    pub fn cut_to_k(&self, k: usize) -> Result<ClusterAssignment, ClusterError> {
        let n = self.n_leaves;
        if k == 0 || k > n {
            return Err(ClusterError::InvalidClusterCount {
                requested: k,
                n_items: n,
            });
        }
        let mut parent = (0..(2 * n).saturating_sub(1)).collect::<Vec<_>>();
        for (i, merge) in self.merges.iter().take(n - k).enumerate() {
            parent[merge.left] = n + i;
            parent[merge.right] = n + i;
        }
        let raw = (0..n)
            .map(|leaf| {
                let mut node = leaf;
                while parent[node] != node {
                    node = parent[node];
                }
                node
            })
            .collect::<Vec<_>>();
        Ok(ClusterAssignment::from_raw(&raw))
    }

    /// Condensed matrix of cophenetic distances: for each leaf pair, the
    /// height of the merge that first joined them.
    #[must_use]
    pub fn cophenetic_distances(&self) -> Vec<f64> {
        let n = self.n_leaves;
        let mut members = (0..n).map(|i| vec![i]).collect::<Vec<_>>();
        members.resize_with(2 * n - 1, Vec::new);
        let mut cophenetic = vec![0.0; n * (n - 1) / 2];
        for (i, merge) in self.merges.iter().enumerate() {
            let left = std::mem::take(&mut members[merge.left]);
            let right = std::mem::take(&mut members[merge.right]);
            for &a in &left {
                for &b in &right {
                    cophenetic[condensed_index(n, a, b)] = merge.height;
                }
            }
            let mut joined = left;
            joined.extend(right);
            members[n + i] = joined;
        }
        cophenetic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Leaves 0..4; (0, 1) at 1.0, (2, 3) at 2.0, then both at 5.0.
    fn sample_tree() -> MergeTree {
        MergeTree::new(
            4,
            vec![
                Merge {
                    left: 0,
                    right: 1,
                    height: 1.0,
                    size: 2,
                },
                Merge {
                    left: 2,
                    right: 3,
                    height: 2.0,
                    size: 2,
                },
                Merge {
                    left: 4,
                    right: 5,
                    height: 5.0,
                    size: 4,
                },
            ],
        )
    }

    #[test]
    fn test_node_accessors() {
        let tree = sample_tree();
        assert_eq!(tree.root(), 6);
        assert_eq!(tree.children(6), Some((4, 5)));
        assert_eq!(tree.children(2), None);
        assert_eq!(tree.size(6), 4);
        assert_eq!(tree.size(3), 1);
        assert_eq!(tree.height(5), 2.0);
        assert_eq!(tree.height(0), 0.0);
    }

    #[test]
    fn test_cut_to_k_counts() {
        let tree = sample_tree();
        for k in 1..=4 {
            assert_eq!(tree.cut_to_k(k).unwrap().n_clusters(), k);
        }
        assert_eq!(tree.cut_to_k(2).unwrap().labels(), [0, 0, 1, 1]);
        assert_eq!(tree.cut_to_k(3).unwrap().labels(), [0, 0, 1, 2]);
        assert!(tree.cut_to_k(0).is_err());
        assert!(tree.cut_to_k(5).is_err());
    }

    #[test]
    fn test_cut_height() {
        let tree = sample_tree();
        assert_eq!(tree.cut_height(4), Some(0.5));
        assert_eq!(tree.cut_height(2), Some(3.5));
        assert_eq!(tree.cut_height(1), Some(5.0));
        assert_eq!(tree.cut_height(5), None);
    }

    #[test]
    fn test_cophenetic_distances() {
        let tree = sample_tree();
        assert_eq!(
            tree.cophenetic_distances(),
            vec![1.0, 5.0, 5.0, 5.0, 5.0, 2.0]
        );
    }
}
