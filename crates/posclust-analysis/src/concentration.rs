//! Position concentration of clusters.
//!
//! For every cluster, the concentration table records how many rows it holds
//! and which fraction of them carries each ground-truth position. A cluster
//! made of a single position has entropy `0`; an even mix of `c` positions
//! has entropy `ln(c)`.
//!
//! # Example
//!
//! ```
//! use posclust_analysis::concentration::ConcentrationTable;
//! use posclust_cluster::ClusterAssignment;
//!
//! let positions = ["PG", "SG", "C", "C"];
//! let assignment = ClusterAssignment::from_raw(&[0, 0, 1, 1]);
//! let table =
//!     ConcentrationTable::from_labels(positions, &assignment, &["PG", "SG", "SF", "PF", "C"])
//!         .unwrap();
//!
//! assert_eq!(table.rows()[0].total, 2);
//! assert_eq!(table.rows()[0].fractions, [0.5, 0.5, 0.0, 0.0, 0.0]);
//! assert_eq!(table.entropy()[1], 0.0);
//! ```

use posclust_cluster::ClusterAssignment;
use posclust_stats::entropy::shannon_entropy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ConcentrationError {
    #[display("{positions} position labels for {labels} cluster labels")]
    LengthMismatch { positions: usize, labels: usize },
    #[display("position {value:?} on row {row} is not one of {expected}")]
    UnknownPosition {
        row: usize,
        value: String,
        expected: String,
    },
    #[display("cluster {cluster} has no members")]
    EmptyCluster { cluster: usize },
    #[display("cluster {cluster} has {found} fractions, expected {expected}")]
    FractionCount {
        cluster: usize,
        found: usize,
        expected: usize,
    },
    #[display("cluster {cluster} has a negative or non-finite fraction")]
    InvalidFraction { cluster: usize },
}

/// Composition of one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterConcentration {
    pub cluster: usize,
    pub total: usize,
    /// Fraction of members per category, in category order.
    pub fractions: Vec<f64>,
}

/// One row per cluster, in ascending cluster id order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationTable {
    categories: Vec<String>,
    rows: Vec<ClusterConcentration>,
}

impl ConcentrationTable {
    /// Counts the positions of every cluster of `assignment`.
    ///
    /// `positions` must hold one label per row, each one of `categories`.
    #[expect(clippy::cast_precision_loss)]
    pub fn from_labels<'a, I>(
        positions: I,
        assignment: &ClusterAssignment,
        categories: &[&str],
    ) -> Result<Self, ConcentrationError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let k = assignment.n_clusters();
        let mut counts = vec![vec![0_usize; categories.len()]; k];
        let mut n_positions = 0;
        for (row, position) in positions.into_iter().enumerate() {
            n_positions += 1;
            let Some(&cluster) = assignment.labels().get(row) else {
                continue;
            };
            let category = categories.iter().position(|c| *c == position).ok_or_else(|| {
                ConcentrationError::UnknownPosition {
                    row,
                    value: position.to_owned(),
                    expected: categories.join("/"),
                }
            })?;
            counts[cluster][category] += 1;
        }
        if n_positions != assignment.len() {
            return Err(ConcentrationError::LengthMismatch {
                positions: n_positions,
                labels: assignment.len(),
            });
        }

        let rows = counts
            .into_iter()
            .enumerate()
            .map(|(cluster, counts)| {
                let total = counts.iter().sum::<usize>();
                if total == 0 {
                    return Err(ConcentrationError::EmptyCluster { cluster });
                }
                let fractions = counts.iter().map(|&c| c as f64 / total as f64).collect();
                Ok(ClusterConcentration {
                    cluster,
                    total,
                    fractions,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            categories: categories.iter().map(|c| (*c).to_owned()).collect(),
            rows,
        })
    }

    /// Rebuilds a table from stored totals and fractions.
    pub fn from_rows(
        categories: Vec<String>,
        rows: Vec<ClusterConcentration>,
    ) -> Result<Self, ConcentrationError> {
        for row in &rows {
            if row.fractions.len() != categories.len() {
                return Err(ConcentrationError::FractionCount {
                    cluster: row.cluster,
                    found: row.fractions.len(),
                    expected: categories.len(),
                });
            }
            if row.total == 0 {
                return Err(ConcentrationError::EmptyCluster {
                    cluster: row.cluster,
                });
            }
            if row.fractions.iter().any(|f| !f.is_finite() || *f < 0.0) {
                return Err(ConcentrationError::InvalidFraction {
                    cluster: row.cluster,
                });
            }
        }
        Ok(Self { categories, rows })
    }

    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    #[must_use]
    pub fn rows(&self) -> &[ClusterConcentration] {
        &self.rows
    }

    /// Fractions rounded to `decimals` places with largest-remainder
    /// rounding, so each row still sums to one.
    ///
    /// ```
    /// use posclust_analysis::concentration::{ClusterConcentration, ConcentrationTable};
    ///
    /// let table = ConcentrationTable::from_rows(
    ///     vec!["G".into(), "F".into(), "C".into()],
    ///     vec![ClusterConcentration {
    ///         cluster: 0,
    ///         total: 3,
    ///         fractions: vec![1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0],
    ///     }],
    /// )
    /// .unwrap();
    /// assert_eq!(table.rounded(3), [[0.334, 0.333, 0.333]]);
    /// ```
    #[must_use]
    pub fn rounded(&self, decimals: u32) -> Vec<Vec<f64>> {
        self.rows
            .iter()
            .map(|row| largest_remainder(&row.fractions, decimals))
            .collect()
    }

    /// Shannon entropy (natural log) of each cluster's position mix.
    #[must_use]
    pub fn entropy(&self) -> Vec<f64> {
        self.rows
            .iter()
            .map(|row| shannon_entropy(&row.fractions).unwrap_or(0.0))
            .collect()
    }

    /// Mean of [`Self::entropy`] over the clusters.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn mean_entropy(&self) -> f64 {
        let entropy = self.entropy();
        if entropy.is_empty() {
            return 0.0;
        }
        entropy.iter().sum::<f64>() / entropy.len() as f64
    }

    /// Spread between the most and least mixed cluster.
    #[must_use]
    pub fn entropy_range(&self) -> f64 {
        let entropy = self.entropy();
        let max = entropy.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = entropy.iter().copied().fold(f64::INFINITY, f64::min);
        if entropy.is_empty() { 0.0 } else { max - min }
    }
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn largest_remainder(fractions: &[f64], decimals: u32) -> Vec<f64> {
    let scale = 10_u64.pow(decimals);
    let total = fractions.iter().sum::<f64>();
    if total <= 0.0 {
        return vec![0.0; fractions.len()];
    }
    let scaled = fractions
        .iter()
        .map(|f| f / total * scale as f64)
        .collect::<Vec<_>>();
    let mut units = scaled.iter().map(|s| s.floor() as u64).collect::<Vec<_>>();
    let assigned = units.iter().sum::<u64>();

    let mut order = (0..scaled.len()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| {
        let ra = scaled[a] - scaled[a].floor();
        let rb = scaled[b] - scaled[b].floor();
        rb.total_cmp(&ra).then(a.cmp(&b))
    });
    for &i in order.iter().take(scale.saturating_sub(assigned) as usize) {
        units[i] += 1;
    }
    units.iter().map(|&u| u as f64 / scale as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIVE: [&str; 5] = ["PG", "SG", "SF", "PF", "C"];

    #[test]
    fn test_totals_sum_to_rows_and_fractions_to_one() {
        let positions = ["PG", "C", "SG", "PF", "C", "SF", "PG", "C"];
        let assignment = ClusterAssignment::from_raw(&[0, 1, 0, 1, 1, 2, 0, 2]);
        let table = ConcentrationTable::from_labels(positions, &assignment, &FIVE).unwrap();

        let totals = table.rows().iter().map(|r| r.total).collect::<Vec<_>>();
        assert_eq!(totals, [3, 3, 2]);
        assert_eq!(totals.iter().sum::<usize>(), positions.len());
        for row in table.rows() {
            assert!((row.fractions.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        }
        assert_eq!(table.rows()[2].fractions, [0.0, 0.0, 0.5, 0.0, 0.5]);
    }

    #[test]
    fn test_rounded_rows_sum_to_one() {
        let positions = ["PG", "SG", "SF", "PF", "C", "PG", "SG"];
        let assignment = ClusterAssignment::from_raw(&[0; 7]);
        let table = ConcentrationTable::from_labels(positions, &assignment, &FIVE).unwrap();
        let rounded = table.rounded(3);
        let thousandths = rounded[0]
            .iter()
            .map(|v| (v * 1000.0).round())
            .sum::<f64>();
        assert_eq!(thousandths, 1000.0);
        // 2/7, 2/7, 1/7, 1/7, 1/7: the 1/7 entries have the larger remainders
        assert_eq!(rounded[0], [0.286, 0.285, 0.143, 0.143, 0.143]);
    }

    #[test]
    fn test_unknown_position() {
        let assignment = ClusterAssignment::from_raw(&[0, 0]);
        let err = ConcentrationTable::from_labels(["G", "X"], &assignment, &["G", "F", "C"])
            .unwrap_err();
        assert!(matches!(
            err,
            ConcentrationError::UnknownPosition { row: 1, .. }
        ));
    }

    #[test]
    fn test_length_mismatch() {
        let assignment = ClusterAssignment::from_raw(&[0, 1, 1]);
        let err = ConcentrationTable::from_labels(["G", "C"], &assignment, &["G", "F", "C"])
            .unwrap_err();
        assert_eq!(
            err,
            ConcentrationError::LengthMismatch {
                positions: 2,
                labels: 3
            }
        );
    }

    #[test]
    fn test_entropy_summary() {
        let positions = ["G", "G", "F", "C"];
        let assignment = ClusterAssignment::from_raw(&[0, 0, 1, 1]);
        let table = ConcentrationTable::from_labels(positions, &assignment, &["G", "F", "C"])
            .unwrap();
        let entropy = table.entropy();
        assert_eq!(entropy[0], 0.0);
        assert!((entropy[1] - 2.0_f64.ln()).abs() < 1e-12);
        assert!((table.mean_entropy() - 2.0_f64.ln() / 2.0).abs() < 1e-12);
        assert!((table.entropy_range() - 2.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_from_rows_validates() {
        let categories = vec!["G".to_owned(), "F".to_owned(), "C".to_owned()];
        let row = ClusterConcentration {
            cluster: 4,
            total: 10,
            fractions: vec![0.5, 0.5],
        };
        assert_eq!(
            ConcentrationTable::from_rows(categories, vec![row]).unwrap_err(),
            ConcentrationError::FractionCount {
                cluster: 4,
                found: 2,
                expected: 3
            }
        );
    }
}
