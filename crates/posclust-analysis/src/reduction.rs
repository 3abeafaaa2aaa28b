//! Principal component analysis.
//!
//! Projects the normalized features onto the fewest leading principal
//! components that explain a requested fraction of the total variance.
//!
//! # Algorithm
//!
//! 1. Center every column on its mean
//! 2. Covariance matrix `Σ = XᵀX / (n - 1)`
//! 3. Symmetric eigendecomposition of `Σ`; components are the eigenvectors
//!    sorted by descending eigenvalue
//! 4. Each component's sign is fixed so that its largest-magnitude loading
//!    is positive, which keeps projections reproducible
//!
//! The explained-variance ratio of component `i` is `λᵢ / Σλ`.

use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{Array1, Array2, ArrayView2, Axis, s};

use crate::config::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ReductionError {
    #[display("PCA needs at least 2 rows, got {rows}")]
    TooFewRows { rows: usize },
    #[display("features have zero total variance")]
    ZeroVariance,
}

/// A fitted PCA basis covering every feature dimension.
#[derive(Debug, Clone)]
pub struct Pca {
    mean: Array1<f64>,
    /// Row `i` is the `i`-th principal axis.
    components: Array2<f64>,
    explained_variance: Vec<f64>,
    explained_variance_ratio: Vec<f64>,
}

impl Pca {
    /// Fits the full set of principal components of `data`.
    ///
    /// ```
    /// use ndarray::array;
    /// use posclust_analysis::reduction::Pca;
    ///
    /// // All variance lies along the first axis
    /// let data = array![[-2.0, 0.0], [-1.0, 0.0], [1.0, 0.0], [2.0, 0.0]];
    /// let pca = Pca::fit(data.view()).unwrap();
    /// assert_eq!(pca.components_for(0.99).unwrap(), 1);
    ///
    /// let projected = pca.transform(data.view(), 1);
    /// assert_eq!(projected.dim(), (4, 1));
    /// ```
    #[expect(clippy::cast_precision_loss)]
    pub fn fit(data: ArrayView2<'_, f64>) -> Result<Self, ReductionError> {
        let (n, d) = data.dim();
        if n < 2 {
            return Err(ReductionError::TooFewRows { rows: n });
        }
        let Some(mean) = data.mean_axis(Axis(0)) else {
            return Err(ReductionError::TooFewRows { rows: n });
        };
        let centered = &data - &mean;
        let covariance = centered.t().dot(&centered) / (n - 1) as f64;

        let eigen = SymmetricEigen::new(DMatrix::from_fn(d, d, |i, j| covariance[[i, j]]));
        let mut order = (0..d).collect::<Vec<_>>();
        order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));

        let explained_variance = order
            .iter()
            .map(|&i| eigen.eigenvalues[i].max(0.0))
            .collect::<Vec<_>>();
        let total = explained_variance.iter().sum::<f64>();
        if total <= 0.0 {
            return Err(ReductionError::ZeroVariance);
        }
        let explained_variance_ratio = explained_variance.iter().map(|v| v / total).collect();

        let mut components = Array2::zeros((d, d));
        for (row, &i) in order.iter().enumerate() {
            let axis = eigen.eigenvectors.column(i);
            let pivot = axis
                .iter()
                .copied()
                .max_by(|a, b| a.abs().total_cmp(&b.abs()))
                .unwrap_or(0.0);
            let sign = if pivot < 0.0 { -1.0 } else { 1.0 };
            for (j, value) in axis.iter().enumerate() {
                components[[row, j]] = sign * value;
            }
        }

        Ok(Self {
            mean,
            components,
            explained_variance,
            explained_variance_ratio,
        })
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Principal axes, one per row, strongest first.
    #[must_use]
    pub fn components(&self) -> ArrayView2<'_, f64> {
        self.components.view()
    }

    #[must_use]
    pub fn explained_variance(&self) -> &[f64] {
        &self.explained_variance
    }

    #[must_use]
    pub fn explained_variance_ratio(&self) -> &[f64] {
        &self.explained_variance_ratio
    }

    /// Running total of [`Self::explained_variance_ratio`].
    #[must_use]
    pub fn cumulative_explained_variance(&self) -> Vec<f64> {
        self.explained_variance_ratio
            .iter()
            .scan(0.0, |acc, r| {
                *acc += r;
                Some(*acc)
            })
            .collect()
    }

    /// Smallest number of leading components explaining at least `target`
    /// of the variance.
    ///
    /// `target` must lie in `(0, 1]`.
    pub fn components_for(&self, target: f64) -> Result<usize, ConfigError> {
        if !(target > 0.0 && target <= 1.0) {
            return Err(ConfigError::ExplainedVariance { target });
        }
        let cumulative = self.cumulative_explained_variance();
        Ok(cumulative
            .iter()
            .position(|&c| c >= target)
            .map_or(cumulative.len(), |i| i + 1))
    }

    /// Projects `data` onto the first `n_components` axes.
    #[must_use]
    pub fn transform(&self, data: ArrayView2<'_, f64>, n_components: usize) -> Array2<f64> {
        let n_components = n_components.min(self.components.nrows());
        let basis = self.components.slice(s![..n_components, ..]);
        (&data - &self.mean).dot(&basis.t())
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    fn correlated() -> Array2<f64> {
        array![
            [2.5, 2.4, 0.5],
            [0.5, 0.7, 0.4],
            [2.2, 2.9, 0.6],
            [1.9, 2.2, 0.5],
            [3.1, 3.0, 0.4],
            [2.3, 2.7, 0.6],
            [2.0, 1.6, 0.5],
            [1.0, 1.1, 0.4],
        ]
    }

    #[test]
    fn test_ratios_sorted_and_sum_to_one() {
        let pca = Pca::fit(correlated().view()).unwrap();
        let ratios = pca.explained_variance_ratio();
        assert!(ratios.windows(2).all(|w| w[0] >= w[1]));
        let cumulative = pca.cumulative_explained_variance();
        assert!((cumulative[2] - 1.0).abs() < 1e-12);
        assert!(ratios[0] > 0.9);
    }

    #[test]
    fn test_components_for_target() {
        let pca = Pca::fit(correlated().view()).unwrap();
        assert_eq!(pca.components_for(0.5).unwrap(), 1);
        assert_eq!(pca.components_for(1.0).unwrap(), 3);
        assert!(pca.components_for(0.0).is_err());
        assert!(pca.components_for(1.5).is_err());
        assert!(pca.components_for(f64::NAN).is_err());
    }

    #[test]
    fn test_sign_convention() {
        let pca = Pca::fit(correlated().view()).unwrap();
        for axis in pca.components().rows() {
            let pivot = axis
                .iter()
                .copied()
                .max_by(|a, b| a.abs().total_cmp(&b.abs()))
                .unwrap();
            assert!(pivot > 0.0);
            assert!((axis.dot(&axis) - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_full_projection_preserves_variance() {
        let data = correlated();
        let pca = Pca::fit(data.view()).unwrap();
        let projected = pca.transform(data.view(), 3);
        let variance = projected.var_axis(Axis(0), 1.0);
        for (v, e) in variance.iter().zip(pca.explained_variance()) {
            assert!((v - e).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rejects_degenerate_input() {
        let single = array![[1.0, 2.0]];
        assert_eq!(
            Pca::fit(single.view()).unwrap_err(),
            ReductionError::TooFewRows { rows: 1 }
        );
        let flat = array![[1.0, 2.0], [1.0, 2.0]];
        assert_eq!(
            Pca::fit(flat.view()).unwrap_err(),
            ReductionError::ZeroVariance
        );
    }
}
