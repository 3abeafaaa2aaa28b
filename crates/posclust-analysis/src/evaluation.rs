//! Internal cluster validity scores.
//!
//! | Score | Better | Meaning |
//! |-------|--------|---------|
//! | Calinski-Harabasz | higher | between-cluster / within-cluster dispersion, each per degree of freedom |
//! | Silhouette | higher, in `[-1, 1]` | how much closer a row is to its own cluster than to the nearest other |
//! | Davies-Bouldin | lower, `>= 0` | average worst-case ratio of cluster spread to centroid separation |
//!
//! The scores are computed on the matrix that was actually clustered, after
//! normalization and any dimensionality reduction. They are only defined for
//! at least two clusters of at least two rows each.

use ndarray::{Array2, ArrayView2, Axis};
use posclust_cluster::{ClusterAssignment, MergeTree, distance};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum EvaluationError {
    #[display("assignment has {labels} labels but the data has {rows} rows")]
    LengthMismatch { labels: usize, rows: usize },
    #[display("validity scores need at least 2 clusters, got {n_clusters}")]
    TooFewClusters { n_clusters: usize },
    #[display("cluster {cluster} has {size} row(s); validity scores need at least 2 per cluster")]
    UndersizedCluster { cluster: usize, size: usize },
    #[display("within-cluster dispersion is zero")]
    ZeroDispersion,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidityScores {
    pub calinski_harabasz: f64,
    pub silhouette: f64,
    pub davies_bouldin: f64,
}

/// Computes all three validity scores for `assignment` over `data`.
///
/// ```
/// use ndarray::array;
/// use posclust_analysis::evaluation::evaluate;
/// use posclust_cluster::ClusterAssignment;
///
/// let data = array![[0.0], [1.0], [10.0], [11.0]];
/// let assignment = ClusterAssignment::from_raw(&[0, 0, 1, 1]);
/// let scores = evaluate(data.view(), &assignment).unwrap();
/// assert!((scores.calinski_harabasz - 200.0).abs() < 1e-9);
/// assert!((scores.davies_bouldin - 0.1).abs() < 1e-12);
/// ```
pub fn evaluate(
    data: ArrayView2<'_, f64>,
    assignment: &ClusterAssignment,
) -> Result<ValidityScores, EvaluationError> {
    check_assignment(data, assignment)?;
    let calinski_harabasz = calinski_harabasz(data, assignment)?;
    let silhouette = silhouette(data, assignment);
    let davies_bouldin = davies_bouldin(data, assignment);
    Ok(ValidityScores {
        calinski_harabasz,
        silhouette,
        davies_bouldin,
    })
}

fn check_assignment(
    data: ArrayView2<'_, f64>,
    assignment: &ClusterAssignment,
) -> Result<(), EvaluationError> {
    if assignment.len() != data.nrows() {
        return Err(EvaluationError::LengthMismatch {
            labels: assignment.len(),
            rows: data.nrows(),
        });
    }
    if assignment.n_clusters() < 2 {
        return Err(EvaluationError::TooFewClusters {
            n_clusters: assignment.n_clusters(),
        });
    }
    if let Some((cluster, &size)) = assignment
        .sizes()
        .iter()
        .enumerate()
        .find(|(_, s)| **s < 2)
    {
        return Err(EvaluationError::UndersizedCluster { cluster, size });
    }
    Ok(())
}

#[expect(clippy::cast_precision_loss)]
fn centroids(data: ArrayView2<'_, f64>, assignment: &ClusterAssignment) -> Array2<f64> {
    let mut centroids = Array2::<f64>::zeros((assignment.n_clusters(), data.ncols()));
    for (row, &label) in data.rows().into_iter().zip(assignment.labels()) {
        let mut centroid = centroids.row_mut(label);
        centroid += &row;
    }
    for (mut centroid, size) in centroids.rows_mut().into_iter().zip(assignment.sizes()) {
        centroid /= size as f64;
    }
    centroids
}

/// Variance ratio criterion: `(B / (k - 1)) / (W / (n - k))`.
#[expect(clippy::cast_precision_loss)]
pub fn calinski_harabasz(
    data: ArrayView2<'_, f64>,
    assignment: &ClusterAssignment,
) -> Result<f64, EvaluationError> {
    check_assignment(data, assignment)?;
    let (n, k) = (data.nrows(), assignment.n_clusters());
    let Some(mean) = data.mean_axis(Axis(0)) else {
        return Err(EvaluationError::LengthMismatch { labels: 0, rows: 0 });
    };
    let centroids = centroids(data, assignment);

    let between = centroids
        .rows()
        .into_iter()
        .zip(assignment.sizes())
        .map(|(c, size)| size as f64 * distance::squared_euclidean(c, mean.view()))
        .sum::<f64>();
    let within = data
        .rows()
        .into_iter()
        .zip(assignment.labels())
        .map(|(row, &label)| distance::squared_euclidean(row, centroids.row(label)))
        .sum::<f64>();
    if within <= 0.0 {
        return Err(EvaluationError::ZeroDispersion);
    }
    Ok((between / (k - 1) as f64) / (within / (n - k) as f64))
}

/// Mean silhouette coefficient over all rows.
///
/// Callers must have checked the assignment (see [`evaluate`]).
#[expect(clippy::cast_precision_loss)]
fn silhouette(data: ArrayView2<'_, f64>, assignment: &ClusterAssignment) -> f64 {
    let n = data.nrows();
    let labels = assignment.labels();
    let sizes = assignment.sizes();
    let mut sums = vec![0.0; assignment.n_clusters()];

    let total = (0..n)
        .map(|i| {
            sums.fill(0.0);
            for j in 0..n {
                if i != j {
                    sums[labels[j]] += distance::euclidean(data.row(i), data.row(j));
                }
            }
            let own = labels[i];
            let a = sums[own] / (sizes[own] - 1) as f64;
            let b = sums
                .iter()
                .zip(&sizes)
                .enumerate()
                .filter(|(c, _)| *c != own)
                .map(|(_, (sum, &size))| sum / size as f64)
                .fold(f64::INFINITY, f64::min);
            let denominator = a.max(b);
            if denominator > 0.0 {
                (b - a) / denominator
            } else {
                0.0
            }
        })
        .sum::<f64>();
    total / n as f64
}

/// Davies-Bouldin index.
///
/// Callers must have checked the assignment (see [`evaluate`]).
#[expect(clippy::cast_precision_loss)]
fn davies_bouldin(data: ArrayView2<'_, f64>, assignment: &ClusterAssignment) -> f64 {
    let k = assignment.n_clusters();
    let centroids = centroids(data, assignment);

    let mut spread = vec![0.0; k];
    for (row, &label) in data.rows().into_iter().zip(assignment.labels()) {
        spread[label] += distance::euclidean(row, centroids.row(label));
    }
    for (s, size) in spread.iter_mut().zip(assignment.sizes()) {
        *s /= size as f64;
    }

    let worst = (0..k).map(|i| {
        (0..k)
            .filter(|&j| j != i)
            .map(|j| {
                let separation = distance::euclidean(centroids.row(i), centroids.row(j));
                if separation > 0.0 {
                    (spread[i] + spread[j]) / separation
                } else {
                    0.0
                }
            })
            .fold(0.0, f64::max)
    });
    worst.sum::<f64>() / k as f64
}

/// Pearson correlation between the pairwise distances of `data` and the
/// cophenetic distances of `tree`.
///
/// Returns `None` when either distance set has zero variance.
#[must_use]
pub fn cophenetic_correlation(tree: &MergeTree, data: ArrayView2<'_, f64>) -> Option<f64> {
    let original = distance::pairwise_distances(data);
    let cophenetic = tree.cophenetic_distances();
    pearson(&original, &cophenetic)
}

#[expect(clippy::cast_precision_loss)]
fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.is_empty() {
        return None;
    }
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let (dx, dy) = (a - mean_x, b - mean_y);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    let denominator = (sxx * syy).sqrt();
    (denominator > 0.0).then(|| sxy / denominator)
}
