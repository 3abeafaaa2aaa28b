//! Shannon entropy of discrete distributions.
//!
//! Cluster purity is summarized by the entropy of the position distribution
//! inside each cluster: `0` means every member shares one position, and
//! `ln(c)` means the `c` categories are equally mixed.

/// Computes the Shannon entropy (natural logarithm) of a distribution.
///
/// The weights are normalized to sum to 1 before the entropy is computed, so
/// raw counts and proportions give the same result. Zero weights contribute
/// nothing.
///
/// # Returns
///
/// * `Some(entropy)` - if the weights are non-negative, finite and not all zero
/// * `None` - otherwise
///
/// # Examples
///
/// ```
/// use posclust_stats::entropy::shannon_entropy;
///
/// let uniform = shannon_entropy(&[1.0, 1.0]).unwrap();
/// assert!((uniform - 2.0_f64.ln()).abs() < 1e-12);
///
/// // Counts and proportions are equivalent
/// assert_eq!(shannon_entropy(&[3.0, 1.0]), shannon_entropy(&[0.75, 0.25]));
///
/// assert_eq!(shannon_entropy(&[0.0, 0.0]), None);
/// ```
#[must_use]
pub fn shannon_entropy(weights: &[f64]) -> Option<f64> {
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return None;
    }
    let total = weights.iter().sum::<f64>();
    if total <= 0.0 {
        return None;
    }
    let entropy = weights
        .iter()
        .filter(|w| **w > 0.0)
        .map(|w| {
            let p = w / total;
            -p * p.ln()
        })
        .sum::<f64>();
    Some(entropy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pure_distribution() {
        assert_eq!(shannon_entropy(&[5.0]), Some(0.0));
        assert_eq!(shannon_entropy(&[0.0, 0.0, 12.0, 0.0]), Some(0.0));
    }

    #[test]
    fn test_uniform_five_positions() {
        let entropy = shannon_entropy(&[0.2; 5]).unwrap();
        assert!((entropy - 5.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_negative_and_nan() {
        assert_eq!(shannon_entropy(&[0.5, -0.5, 1.0]), None);
        assert_eq!(shannon_entropy(&[f64::NAN, 1.0]), None);
        assert_eq!(shannon_entropy(&[]), None);
    }
}
