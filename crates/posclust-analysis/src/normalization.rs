//! Column scaling followed by row-wise unit normalization.
//!
//! # Overview
//!
//! Raw box-score columns live on very different scales (minutes played vs.
//! blocks per game), so every column is rescaled first:
//!
//! - [`Scaling::Standard`]: z-score with the population standard deviation
//! - [`Scaling::MinMax`]: linear map of `[min, max]` onto `[0, 1]`
//!
//! Every row is then divided by its Euclidean norm, so clustering compares
//! the *shape* of a player's statistical profile rather than its volume.
//!
//! A column that holds a single repeated value cannot be rescaled. It is
//! set to zero, reported with a warning and listed in
//! [`Normalized::skipped_columns`].
//!
//! # Example
//!
//! ```
//! use ndarray::array;
//! use posclust_analysis::normalization::{Scaling, normalize};
//!
//! let values = array![[1.0, 10.0], [2.0, 10.0], [3.0, 10.0]];
//! let names = ["PTS".to_owned(), "G".to_owned()];
//! let normalized = normalize(values.view(), &names, Scaling::Standard);
//!
//! assert_eq!(normalized.skipped_columns, ["G"]);
//! for row in normalized.values.rows() {
//!     let norm = row.dot(&row).sqrt();
//!     assert!(norm == 0.0 || (norm - 1.0).abs() < 1e-12);
//! }
//! ```

use ndarray::{Array2, ArrayView2, Axis};
use posclust_stats::descriptive::DescriptiveStats;
use serde::{Deserialize, Serialize};

/// Per-column rescaling applied before row normalization.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::FromStr,
)]
#[serde(rename_all = "snake_case")]
pub enum Scaling {
    /// Zero mean, unit (population) variance
    #[default]
    Standard,
    /// Map each column onto `[0, 1]`
    MinMax,
}

/// Rescaled, row-normalized feature matrix.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub values: Array2<f64>,
    /// Names of constant columns that were zeroed instead of rescaled.
    pub skipped_columns: Vec<String>,
}

/// Column-scaled matrix and the indices of constant columns.
#[derive(Debug, Clone)]
pub struct ScaledColumns {
    pub values: Array2<f64>,
    pub constant_columns: Vec<usize>,
}

/// Applies `scaling` to every column, then unit-normalizes every row.
///
/// `names` labels the columns of `values` for reporting.
#[must_use]
pub fn normalize(values: ArrayView2<'_, f64>, names: &[String], scaling: Scaling) -> Normalized {
    let ScaledColumns {
        mut values,
        constant_columns,
    } = match scaling {
        Scaling::Standard => standardize(values),
        Scaling::MinMax => min_max_scale(values),
    };
    let skipped_columns = constant_columns
        .iter()
        .map(|&i| names.get(i).cloned().unwrap_or_else(|| format!("#{i}")))
        .collect::<Vec<_>>();
    if !skipped_columns.is_empty() {
        log::warn!(
            "constant feature columns left unscaled: {}",
            skipped_columns.join(", ")
        );
    }
    normalize_rows(&mut values);
    Normalized {
        values,
        skipped_columns,
    }
}

/// Z-score standardization with the population (`n`) denominator.
///
/// Constant columns become zero.
#[must_use]
pub fn standardize(values: ArrayView2<'_, f64>) -> ScaledColumns {
    scale_columns(values, |stats, x| (x - stats.mean) / stats.std_dev)
}

/// Min-max scaling onto `[0, 1]`.
///
/// Constant columns become zero.
#[must_use]
pub fn min_max_scale(values: ArrayView2<'_, f64>) -> ScaledColumns {
    scale_columns(values, |stats, x| (x - stats.min) / stats.range())
}

fn scale_columns<F>(values: ArrayView2<'_, f64>, scale: F) -> ScaledColumns
where
    F: Fn(&DescriptiveStats, f64) -> f64,
{
    let mut scaled = values.to_owned();
    let mut constant_columns = Vec::new();
    for (i, mut column) in scaled.axis_iter_mut(Axis(1)).enumerate() {
        let Some(stats) = DescriptiveStats::new(column.iter().copied()) else {
            continue;
        };
        if stats.is_constant() {
            column.fill(0.0);
            constant_columns.push(i);
        } else {
            column.mapv_inplace(|x| scale(&stats, x));
        }
    }
    ScaledColumns {
        values: scaled,
        constant_columns,
    }
}

/// Divides every row by its Euclidean norm; all-zero rows stay as they are.
pub fn normalize_rows(values: &mut Array2<f64>) {
    for mut row in values.rows_mut() {
        let norm = row.dot(&row).sqrt();
        if norm > 0.0 {
            row /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    fn sample() -> Array2<f64> {
        array![
            [30.0, 2.0, 7.0],
            [12.0, 9.0, 7.0],
            [21.0, 4.5, 7.0],
            [8.0, 11.0, 7.0],
            [25.0, 1.5, 7.0],
        ]
    }

    #[test]
    fn test_standardized_columns_have_zero_mean_unit_variance() {
        let ScaledColumns {
            values,
            constant_columns,
        } = standardize(sample().view());
        assert_eq!(constant_columns, [2]);
        for column in values.columns().into_iter().take(2) {
            let stats = DescriptiveStats::new(column.iter().copied()).unwrap();
            assert!(stats.mean.abs() < 1e-12);
            assert!((stats.variance - 1.0).abs() < 1e-12);
        }
        assert!(values.column(2).iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_min_max_bounds() {
        let ScaledColumns { values, .. } = min_max_scale(sample().view());
        let first = values.column(0);
        assert_eq!(first.iter().copied().fold(f64::INFINITY, f64::min), 0.0);
        assert_eq!(first.iter().copied().fold(f64::NEG_INFINITY, f64::max), 1.0);
        assert!((values[[2, 0]] - 13.0 / 22.0).abs() < 1e-12);
    }

    #[test]
    fn test_rows_have_unit_norm() {
        let names = ["PTS", "TRB", "G"].map(str::to_owned);
        let normalized = normalize(sample().view(), &names, Scaling::MinMax);
        assert_eq!(normalized.skipped_columns, ["G"]);
        for row in normalized.values.rows() {
            let norm = row.dot(&row).sqrt();
            assert!(norm == 0.0 || (norm - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_zero_row_left_unchanged() {
        let mut values = array![[0.0, 0.0], [3.0, 4.0]];
        normalize_rows(&mut values);
        assert_eq!(values, array![[0.0, 0.0], [0.6, 0.8]]);
    }

    #[test]
    fn test_parse_scaling() {
        assert_eq!("standard".parse::<Scaling>().unwrap(), Scaling::Standard);
        assert_eq!("MinMax".parse::<Scaling>().unwrap(), Scaling::MinMax);
    }
}
