//! K-means clustering.
//!
//! Partitions the rows into `k` clusters by minimizing the **within-cluster
//! sum of squares** (inertia):
//!
//! ```text
//! inertia = Σₖ Σᵢ∈Cₖ ||xᵢ - μₖ||²
//! ```
//!
//! # Algorithm
//!
//! 1. Seed `k` centroids with k-means++: the first uniformly at random, each
//!    next one with probability proportional to the squared distance to the
//!    nearest centroid chosen so far
//! 2. **Assign** every row to its nearest centroid (lowest index on ties)
//! 3. **Update** every centroid to the mean of its rows
//! 4. Repeat 2-3 until the assignment stops changing or `max_iter` is reached
//!
//! A cluster that loses all its rows is reseeded with the row farthest from
//! its own centroid.
//!
//! # Restarts
//!
//! Lloyd's algorithm only finds a local optimum, so the whole procedure is
//! repeated `n_init` times with seeds drawn from one master seed, and the run
//! with the lowest inertia wins (the earliest on ties). Restarts run on
//! scoped threads; the result does not depend on scheduling.

use std::thread;

use ndarray::{Array2, ArrayView2};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::{
    assignment::{ClusterAssignment, Clustering, canonicalize},
    distance::{squared_euclidean, validate_input},
    error::ClusterError,
};

/// K-means with k-means++ seeding and multiple restarts.
#[derive(Debug, Clone)]
pub struct KMeans {
    n_clusters: usize,
    max_iter: usize,
    n_init: usize,
    seed: u64,
}

/// Outcome of the best k-means restart.
#[derive(Debug, Clone)]
pub struct KMeansFit {
    pub assignment: ClusterAssignment,
    /// Row `c` is the centroid of cluster `c`.
    pub centroids: Array2<f64>,
    pub inertia: f64,
    /// Lloyd iterations performed by the winning restart.
    pub n_iter: usize,
}

/// One point of an elbow curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InertiaPoint {
    pub n_clusters: usize,
    pub inertia: f64,
}

impl KMeans {
    pub const DEFAULT_MAX_ITER: usize = 300;
    pub const DEFAULT_N_INIT: usize = 10;
    pub const DEFAULT_SEED: u64 = 0;

    #[must_use]
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            max_iter: Self::DEFAULT_MAX_ITER,
            n_init: Self::DEFAULT_N_INIT,
            seed: Self::DEFAULT_SEED,
        }
    }

    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter.max(1);
        self
    }

    #[must_use]
    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init.max(1);
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Same settings with a different number of clusters.
    #[must_use]
    pub fn with_n_clusters(mut self, n_clusters: usize) -> Self {
        self.n_clusters = n_clusters;
        self
    }

    /// Runs every restart and returns the best one with its centroids.
    ///
    /// Fails with [`ClusterError::TooFewDistinctPoints`] when the best run
    /// could not give every cluster a row.
    pub fn fit_full(&self, data: ArrayView2<'_, f64>) -> Result<KMeansFit, ClusterError> {
        validate_input(data, self.n_clusters)?;

        let mut master = Pcg32::seed_from_u64(self.seed);
        let seeds = (0..self.n_init)
            .map(|_| master.random::<u64>())
            .collect::<Vec<_>>();

        let runs = thread::scope(|s| {
            let handles = seeds
                .iter()
                .map(|&seed| s.spawn(move || self.run_once(data, seed)))
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .collect::<Vec<_>>()
        });

        let mut best: Option<LloydRun> = None;
        for (i, run) in runs.into_iter().enumerate() {
            log::debug!(
                "k-means restart {i}: inertia {:.6} after {} iterations",
                run.inertia,
                run.n_iter
            );
            if best.as_ref().is_none_or(|b| run.inertia < b.inertia) {
                best = Some(run);
            }
        }
        let Some(best) = best else {
            unreachable!("n_init is at least 1");
        };

        let (labels, order) = canonicalize(&best.labels);
        // rows closer than the squared distance can resolve never split
        if order.len() < self.n_clusters {
            return Err(ClusterError::TooFewDistinctPoints {
                distinct: order.len(),
                requested: self.n_clusters,
            });
        }
        let mut centroids = Array2::zeros(best.centroids.dim());
        for (new, &old) in order.iter().enumerate() {
            centroids.row_mut(new).assign(&best.centroids.row(old));
        }
        log::info!(
            "k-means with k={} converged to inertia {:.6}",
            self.n_clusters,
            best.inertia
        );
        Ok(KMeansFit {
            assignment: ClusterAssignment::from_raw(&labels),
            centroids,
            inertia: best.inertia,
            n_iter: best.n_iter,
        })
    }

    /// Best inertia for each cluster count in `ks`, for elbow analysis.
    ///
    /// ```
    /// use ndarray::array;
    /// use posclust_cluster::KMeans;
    ///
    /// let data = array![[0.0], [0.5], [10.0], [10.5], [20.0]];
    /// let curve = KMeans::new(1).inertia_sweep(data.view(), 1..=3).unwrap();
    /// assert_eq!(curve.len(), 3);
    /// assert!(curve[0].inertia > curve[1].inertia);
    /// assert!(curve[1].inertia > curve[2].inertia);
    /// ```
    pub fn inertia_sweep<I>(
        &self,
        data: ArrayView2<'_, f64>,
        ks: I,
    ) -> Result<Vec<InertiaPoint>, ClusterError>
    where
        I: IntoIterator<Item = usize>,
    {
        ks.into_iter()
            .map(|k| {
                let fit = self.clone().with_n_clusters(k).fit_full(data)?;
                Ok(InertiaPoint {
                    n_clusters: k,
                    inertia: fit.inertia,
                })
            })
            .collect()
    }

    fn run_once(&self, data: ArrayView2<'_, f64>, seed: u64) -> LloydRun {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut centroids = kmeans_plus_plus(data, self.n_clusters, &mut rng);
        let mut labels = assign(data, &centroids);
        let mut n_iter = 0;

        while n_iter < self.max_iter {
            n_iter += 1;
            centroids = update(data, &mut labels, self.n_clusters);
            let next = assign(data, &centroids);
            if next == labels {
                break;
            }
            labels = next;
        }
        centroids = update(data, &mut labels, self.n_clusters);

        let inertia = labels
            .iter()
            .enumerate()
            .map(|(i, &c)| squared_euclidean(data.row(i), centroids.row(c)))
            .sum();
        LloydRun {
            labels,
            centroids,
            inertia,
            n_iter,
        }
    }
}

impl Clustering for KMeans {
    fn fit(&self, data: ArrayView2<'_, f64>) -> Result<ClusterAssignment, ClusterError> {
        self.fit_full(data).map(|fit| fit.assignment)
    }

    fn n_clusters(&self) -> usize {
        self.n_clusters
    }
}

struct LloydRun {
    labels: Vec<usize>,
    centroids: Array2<f64>,
    inertia: f64,
    n_iter: usize,
}

fn kmeans_plus_plus(data: ArrayView2<'_, f64>, k: usize, rng: &mut impl Rng) -> Array2<f64> {
    let n = data.nrows();
    let mut centroids = Array2::zeros((k, data.ncols()));
    centroids.row_mut(0).assign(&data.row(rng.random_range(0..n)));

    let mut nearest = (0..n)
        .map(|i| squared_euclidean(data.row(i), centroids.row(0)))
        .collect::<Vec<_>>();

    for c in 1..k {
        let total = nearest.iter().sum::<f64>();
        let threshold = rng.random::<f64>() * total;
        let mut cumulative = 0.0;
        let mut chosen = None;
        for (i, &d) in nearest.iter().enumerate() {
            if d <= 0.0 {
                continue;
            }
            cumulative += d;
            chosen = Some(i);
            if cumulative >= threshold {
                break;
            }
        }
        // Input validation guarantees a row not yet used as a centroid.
        let chosen = chosen.unwrap_or(0);
        centroids.row_mut(c).assign(&data.row(chosen));

        for (i, d) in nearest.iter_mut().enumerate() {
            *d = d.min(squared_euclidean(data.row(i), centroids.row(c)));
        }
    }
    centroids
}

fn assign(data: ArrayView2<'_, f64>, centroids: &Array2<f64>) -> Vec<usize> {
    data.rows()
        .into_iter()
        .map(|row| {
            let mut best = (0, f64::INFINITY);
            for (c, centroid) in centroids.rows().into_iter().enumerate() {
                let d = squared_euclidean(row, centroid);
                if d < best.1 {
                    best = (c, d);
                }
            }
            best.0
        })
        .collect()
}

#[expect(clippy::cast_precision_loss)]
fn means(data: ArrayView2<'_, f64>, labels: &[usize], k: usize) -> (Array2<f64>, Vec<usize>) {
    let mut sums = Array2::<f64>::zeros((k, data.ncols()));
    let mut counts = vec![0; k];
    for (row, &c) in data.rows().into_iter().zip(labels) {
        let mut sum = sums.row_mut(c);
        sum += &row;
        counts[c] += 1;
    }
    for (mut sum, &count) in sums.rows_mut().into_iter().zip(&counts) {
        if count > 0 {
            sum /= count as f64;
        }
    }
    (sums, counts)
}

/// Recomputes centroids, moving far-away rows into empty clusters.
fn update(data: ArrayView2<'_, f64>, labels: &mut [usize], k: usize) -> Array2<f64> {
    loop {
        let (centroids, counts) = means(data, labels, k);
        let Some(empty) = counts.iter().position(|&c| c == 0) else {
            return centroids;
        };
        // A row at positive distance from its centroid belongs to a cluster
        // with at least two rows, so moving it cannot empty another cluster.
        let farthest = labels
            .iter()
            .enumerate()
            .map(|(i, &c)| (i, squared_euclidean(data.row(i), centroids.row(c))))
            .filter(|(_, d)| *d > 0.0)
            .fold(None, |best: Option<(usize, f64)>, (i, d)| match best {
                Some((_, bd)) if bd >= d => best,
                _ => Some((i, d)),
            });
        let Some((row, _)) = farthest else {
            return centroids;
        };
        log::warn!("k-means cluster {empty} became empty; reseeding with row {row}");
        labels[row] = empty;
    }
}
