//! Ward agglomerative clustering.
//!
//! Bottom-up clustering that repeatedly merges the pair of clusters whose
//! union increases the total within-cluster variance the least.
//!
//! # Ward's criterion
//!
//! ```text
//! d(A, B) = sqrt(2 |A| |B| / (|A| + |B|)) * ||μA - μB||
//! ```
//!
//! For two single points this is their Euclidean distance, so the merge
//! heights are directly comparable to the input geometry.
//!
//! # Lance-Williams update
//!
//! After merging `i` and `j`, the squared distance from any other cluster
//! `k` to the union follows from the old squared distances alone:
//!
//! ```text
//! d²(k, i∪j) = ((nᵢ + nₖ) d²(k, i) + (nⱼ + nₖ) d²(k, j) - nₖ d²(i, j))
//!              / (nᵢ + nⱼ + nₖ)
//! ```
//!
//! so the original points are only touched once, to build the condensed
//! distance matrix.
//!
//! # Ties
//!
//! Each active cluster lives in the slot of its smallest member row. When
//! several pairs share the minimum distance, the pair with the
//! lexicographically smallest slots is merged first.

use ndarray::ArrayView2;

use crate::{
    assignment::{ClusterAssignment, Clustering},
    distance::{condensed_index, squared_euclidean, validate_input},
    error::ClusterError,
    merge_tree::{Merge, MergeTree},
};

/// Ward hierarchical clustering cut to a fixed number of clusters.
#[derive(Debug, Clone)]
pub struct WardClustering {
    n_clusters: usize,
}

impl WardClustering {
    #[must_use]
    pub fn new(n_clusters: usize) -> Self {
        Self { n_clusters }
    }

    /// Builds the full merge tree without cutting it.
    pub fn fit_tree(&self, data: ArrayView2<'_, f64>) -> Result<MergeTree, ClusterError> {
        validate_input(data, self.n_clusters)?;
        let n = data.nrows();
        log::debug!("building Ward merge tree over {n} rows");

        let mut dist = Vec::with_capacity(n * (n - 1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                dist.push(squared_euclidean(data.row(i), data.row(j)));
            }
        }

        let mut state = WardState::new(n, dist);
        let merges = (0..n - 1).map(|step| state.merge_closest(step)).collect();
        Ok(MergeTree::new(n, merges))
    }
}

impl Clustering for WardClustering {
    fn fit(&self, data: ArrayView2<'_, f64>) -> Result<ClusterAssignment, ClusterError> {
        self.fit_tree(data)?.cut_to_k(self.n_clusters)
    }

    fn n_clusters(&self) -> usize {
        self.n_clusters
    }
}

/// Working state of the agglomeration, indexed by slot.
struct WardState {
    n: usize,
    /// Condensed squared Ward distances between slots.
    dist: Vec<f64>,
    active: Vec<bool>,
    size: Vec<usize>,
    /// Merge-tree node currently held by each slot.
    node: Vec<usize>,
    /// Nearest active slot with a larger index, and its distance.
    nearest: Vec<Option<(usize, f64)>>,
}

impl WardState {
    fn new(n: usize, dist: Vec<f64>) -> Self {
        let mut state = Self {
            n,
            dist,
            active: vec![true; n],
            size: vec![1; n],
            node: (0..n).collect(),
            nearest: vec![None; n],
        };
        for slot in 0..n {
            state.refresh_nearest(slot);
        }
        state
    }

    fn d(&self, a: usize, b: usize) -> f64 {
        self.dist[condensed_index(self.n, a, b)]
    }

    fn refresh_nearest(&mut self, slot: usize) {
        let mut best: Option<(usize, f64)> = None;
        for other in (slot + 1)..self.n {
            if !self.active[other] {
                continue;
            }
            let d = self.d(slot, other);
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((other, d));
            }
        }
        self.nearest[slot] = best;
    }

    fn closest_pair(&self) -> (usize, usize, f64) {
        let mut best: Option<(usize, usize, f64)> = None;
        for (slot, nearest) in self.nearest.iter().enumerate() {
            if !self.active[slot] {
                continue;
            }
            if let Some((other, d)) = *nearest {
                if best.is_none_or(|(_, _, bd)| d < bd) {
                    best = Some((slot, other, d));
                }
            }
        }
        // At least two slots are active while merges remain.
        best.unwrap_or((0, 1, 0.0))
    }

    #[expect(clippy::cast_precision_loss)]
    fn merge_closest(&mut self, step: usize) -> Merge {
        let (lo, hi, d_lohi) = self.closest_pair();
        let (n_lo, n_hi) = (self.size[lo], self.size[hi]);

        for k in 0..self.n {
            if !self.active[k] || k == lo || k == hi {
                continue;
            }
            let n_k = self.size[k];
            let updated = ((n_lo + n_k) as f64 * self.d(k, lo)
                + (n_hi + n_k) as f64 * self.d(k, hi)
                - n_k as f64 * d_lohi)
                / (n_lo + n_hi + n_k) as f64;
            let index = condensed_index(self.n, k, lo);
            self.dist[index] = updated.max(0.0);
        }

        let (a, b) = (self.node[lo], self.node[hi]);
        let merge = Merge {
            left: a.min(b),
            right: a.max(b),
            height: d_lohi.max(0.0).sqrt(),
            size: n_lo + n_hi,
        };

        self.active[hi] = false;
        self.nearest[hi] = None;
        self.size[lo] = n_lo + n_hi;
        self.node[lo] = self.n + step;

        for k in 0..lo {
            if !self.active[k] {
                continue;
            }
            match self.nearest[k] {
                Some((nn, _)) if nn == lo || nn == hi => self.refresh_nearest(k),
                Some((nn, nd)) => {
                    let d = self.d(k, lo);
                    if d < nd || (d == nd && lo < nn) {
                        self.nearest[k] = Some((lo, d));
                    }
                }
                None => self.refresh_nearest(k),
            }
        }
        for k in (lo + 1)..hi {
            if self.active[k] && matches!(self.nearest[k], Some((nn, _)) if nn == hi) {
                self.refresh_nearest(k);
            }
        }
        self.refresh_nearest(lo);

        merge
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{Array2, array};

    use super::*;

    fn two_blobs() -> Array2<f64> {
        array![
            [0.0, 0.0],
            [10.0, 10.0],
            [0.2, 0.1],
            [10.1, 9.8],
            [0.1, 0.3],
            [9.9, 10.2],
            [0.3, 0.2],
            [10.2, 10.1],
            [0.0, 0.4],
            [9.8, 9.9],
        ]
    }

    #[test]
    fn test_two_blobs_split_cleanly() {
        let data = two_blobs();
        let assignment = WardClustering::new(2).fit(data.view()).unwrap();
        assert_eq!(assignment.labels(), [0, 1, 0, 1, 0, 1, 0, 1, 0, 1]);
        assert_eq!(assignment.sizes(), [5, 5]);
    }

    #[test]
    fn test_singleton_heights_are_euclidean() {
        let data = array![[0.0, 0.0], [3.0, 4.0], [100.0, 100.0]];
        let tree = WardClustering::new(1).fit_tree(data.view()).unwrap();
        let first = tree.merges()[0];
        assert_eq!((first.left, first.right, first.size), (0, 1, 2));
        assert!((first.height - 5.0).abs() < 1e-12);
        assert_eq!(tree.root(), 4);
    }

    #[test]
    fn test_ward_heights_match_closed_form() {
        // Merge of {0, 1} (centroid 0.5) with {2} at 3.5:
        // sqrt(2 * 2 * 1 / 3) * 3.0
        let data = array![[0.0], [1.0], [3.5]];
        let tree = WardClustering::new(1).fit_tree(data.view()).unwrap();
        let expected = (4.0_f64 / 3.0).sqrt() * 3.0;
        assert!((tree.merges()[1].height - expected).abs() < 1e-12);
    }

    #[test]
    fn test_heights_non_decreasing() {
        let data = two_blobs();
        let tree = WardClustering::new(2).fit_tree(data.view()).unwrap();
        for pair in tree.merges().windows(2) {
            assert!(pair[0].height <= pair[1].height + 1e-12);
        }
    }

    #[test]
    fn test_tie_breaks_toward_lowest_pair() {
        // Equidistant points: (0, 1) and (1, 2) tie; (0, 1) goes first.
        let data = array![[0.0], [1.0], [2.0]];
        let tree = WardClustering::new(1).fit_tree(data.view()).unwrap();
        let first = tree.merges()[0];
        assert_eq!((first.left, first.right), (0, 1));
    }

    #[test]
    fn test_k_equals_n_gives_singletons() {
        let data = two_blobs();
        let assignment = WardClustering::new(10).fit(data.view()).unwrap();
        assert_eq!(assignment.labels(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_duplicate_rows_rejected() {
        let data = array![[1.0, 1.0], [1.0, 1.0], [2.0, 2.0]];
        let err = WardClustering::new(3).fit(data.view()).unwrap_err();
        assert_eq!(
            err,
            ClusterError::TooFewDistinctPoints {
                distinct: 2,
                requested: 3
            }
        );
    }
}
