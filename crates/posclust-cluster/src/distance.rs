//! Euclidean distances and input validation shared by the clustering methods.
//!
//! Pairwise distances are kept in *condensed* form: the upper triangle of the
//! `n x n` distance matrix stored row by row, `n * (n - 1) / 2` entries.

use std::cmp::Ordering;

use ndarray::{ArrayView1, ArrayView2};

use crate::error::ClusterError;

#[must_use]
pub fn squared_euclidean(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[must_use]
pub fn euclidean(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    squared_euclidean(a, b).sqrt()
}

/// Position of the pair `(i, j)` in a condensed matrix over `n` items.
///
/// ```
/// use posclust_cluster::distance::condensed_index;
///
/// assert_eq!(condensed_index(4, 0, 1), 0);
/// assert_eq!(condensed_index(4, 2, 1), 3);
/// assert_eq!(condensed_index(4, 2, 3), 5);
/// ```
#[must_use]
pub fn condensed_index(n: usize, i: usize, j: usize) -> usize {
    debug_assert!(i != j && i < n && j < n);
    let (i, j) = if i < j { (i, j) } else { (j, i) };
    n * i - i * (i + 1) / 2 + (j - i - 1)
}

/// Condensed Euclidean distances between all rows of `data`.
#[must_use]
pub fn pairwise_distances(data: ArrayView2<'_, f64>) -> Vec<f64> {
    let n = data.nrows();
    let mut condensed = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            condensed.push(euclidean(data.row(i), data.row(j)));
        }
    }
    condensed
}

/// Number of distinct rows in `data`.
///
/// Values are compared numerically, so `0.0` and `-0.0` are the same point.
///
/// ```
/// use ndarray::array;
/// use posclust_cluster::distance::count_distinct_rows;
///
/// let data = array![[0.0, 1.0], [-0.0, 1.0], [1.0, 0.0]];
/// assert_eq!(count_distinct_rows(data.view()), 2);
/// ```
#[must_use]
pub fn count_distinct_rows(data: ArrayView2<'_, f64>) -> usize {
    // adding 0.0 turns -0.0 into 0.0 and leaves every other value unchanged
    let compare = |a: &usize, b: &usize| {
        data.row(*a)
            .iter()
            .zip(data.row(*b))
            .map(|(x, y)| (x + 0.0).total_cmp(&(y + 0.0)))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    };
    let mut order = (0..data.nrows()).collect::<Vec<_>>();
    order.sort_by(compare);
    let duplicates = order
        .windows(2)
        .filter(|w| compare(&w[0], &w[1]).is_eq())
        .count();
    order.len() - duplicates
}

/// Checks that `data` can be split into `k` clusters.
pub(crate) fn validate_input(data: ArrayView2<'_, f64>, k: usize) -> Result<(), ClusterError> {
    let n = data.nrows();
    if n == 0 {
        return Err(ClusterError::EmptyInput);
    }
    if let Some(((row, column), _)) = data.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(ClusterError::NonFiniteValue { row, column });
    }
    if k == 0 || k > n {
        return Err(ClusterError::InvalidClusterCount {
            requested: k,
            n_items: n,
        });
    }
    let distinct = count_distinct_rows(data);
    if distinct < k {
        return Err(ClusterError::TooFewDistinctPoints {
            distinct,
            requested: k,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn test_condensed_layout_matches_pairwise_order() {
        let data = array![[0.0, 0.0], [3.0, 4.0], [6.0, 8.0]];
        let condensed = pairwise_distances(data.view());
        assert_eq!(condensed, vec![5.0, 10.0, 5.0]);
        assert_eq!(condensed[condensed_index(3, 2, 0)], 10.0);
        assert_eq!(condensed[condensed_index(3, 1, 2)], 5.0);
    }

    #[test]
    fn test_count_distinct_rows() {
        let data = array![[1.0, 2.0], [1.0, 2.0], [2.0, 1.0], [1.0, 2.0]];
        assert_eq!(count_distinct_rows(data.view()), 2);
    }

    #[test]
    fn test_signed_zeros_are_one_point() {
        let data = array![[0.0], [-0.0], [1.0]];
        assert_eq!(count_distinct_rows(data.view()), 2);
        assert_eq!(
            validate_input(data.view(), 3),
            Err(ClusterError::TooFewDistinctPoints {
                distinct: 2,
                requested: 3
            })
        );
    }

    #[test]
    fn test_validate_input() {
        let data = array![[1.0, 2.0], [1.0, 2.0], [2.0, 1.0]];
        assert!(validate_input(data.view(), 2).is_ok());
        assert_eq!(
            validate_input(data.view(), 3),
            Err(ClusterError::TooFewDistinctPoints {
                distinct: 2,
                requested: 3
            })
        );
        assert_eq!(
            validate_input(data.view(), 4),
            Err(ClusterError::InvalidClusterCount {
                requested: 4,
                n_items: 3
            })
        );

        let bad = array![[1.0, f64::NAN]];
        assert_eq!(
            validate_input(bad.view(), 1),
            Err(ClusterError::NonFiniteValue { row: 0, column: 1 })
        );
    }
}
