//! Run configuration.

use posclust_data::{PositionScheme, YearRange};
use serde::{Deserialize, Serialize};

use crate::normalization::Scaling;

/// Clustering strategy of a run.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::FromStr,
)]
#[serde(rename_all = "lowercase")]
pub enum ClusterMethod {
    #[default]
    Hierarchical,
    KMeans,
}

impl ClusterMethod {
    /// Model name used in artifact file names.
    #[must_use]
    pub fn model_name(self) -> &'static str {
        match self {
            Self::Hierarchical => "Hierarchy",
            Self::KMeans => "kMeans",
        }
    }

    /// Column scaling each method has traditionally been paired with.
    #[must_use]
    pub fn default_scaling(self) -> Scaling {
        match self {
            Self::Hierarchical => Scaling::Standard,
            Self::KMeans => Scaling::MinMax,
        }
    }
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("cluster count must be at least 2, got {cluster_count}")]
    ClusterCount { cluster_count: usize },
    #[display("target explained variance must be in (0, 1], got {target}")]
    ExplainedVariance { target: f64 },
    #[display("year range {range} starts after it ends")]
    YearRange { range: YearRange },
    #[display("number of k-means restarts must be at least 1")]
    ZeroRestarts,
    #[display("maximum number of k-means iterations must be at least 1")]
    ZeroIterations,
}

/// Everything that determines the outcome of a pipeline run.
///
/// ```
/// use posclust_analysis::config::{ClusterMethod, PipelineConfig};
///
/// let config: PipelineConfig = serde_json::from_str(
///     r#"{ "method": "kmeans", "year_range": { "start": 2011, "end": 2020 } }"#,
/// )
/// .unwrap();
/// assert_eq!(config.method, ClusterMethod::KMeans);
/// assert_eq!(config.cluster_count, 5);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Keep the one-hot position indicators as clustering features.
    pub include_position: bool,
    pub scheme: PositionScheme,
    pub cluster_count: usize,
    pub method: ClusterMethod,
    pub scaling: Scaling,
    pub apply_dimensionality_reduction: bool,
    /// Fraction of variance the kept principal components must explain.
    pub target_explained_variance: f64,
    /// Seasons covered by the run; also the key of its artifacts.
    pub year_range: YearRange,
    pub seed: u64,
    pub n_init: usize,
    pub max_iter: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            include_position: false,
            scheme: PositionScheme::Five,
            cluster_count: 5,
            method: ClusterMethod::Hierarchical,
            scaling: Scaling::Standard,
            apply_dimensionality_reduction: false,
            target_explained_variance: 0.9,
            year_range: YearRange::new(1971, 1980),
            seed: 0,
            n_init: 10,
            max_iter: 300,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cluster_count < 2 {
            return Err(ConfigError::ClusterCount {
                cluster_count: self.cluster_count,
            });
        }
        let target = self.target_explained_variance;
        if !(target > 0.0 && target <= 1.0) {
            return Err(ConfigError::ExplainedVariance { target });
        }
        if !self.year_range.is_ordered() {
            return Err(ConfigError::YearRange {
                range: self.year_range,
            });
        }
        if self.n_init == 0 {
            return Err(ConfigError::ZeroRestarts);
        }
        if self.max_iter == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let base = PipelineConfig::default();

        let config = PipelineConfig {
            cluster_count: 1,
            ..base.clone()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ClusterCount { cluster_count: 1 })
        );

        let config = PipelineConfig {
            target_explained_variance: 0.0,
            ..base.clone()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ExplainedVariance { .. })
        ));

        let config = PipelineConfig {
            year_range: YearRange::new(2000, 1990),
            ..base.clone()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::YearRange { .. })
        ));

        let config = PipelineConfig { n_init: 0, ..base };
        assert_eq!(config.validate(), Err(ConfigError::ZeroRestarts));
    }

    #[test]
    fn test_serde_roundtrip_names() {
        let config = PipelineConfig {
            method: ClusterMethod::KMeans,
            scheme: PositionScheme::Three,
            ..PipelineConfig::default()
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["method"], "kmeans");
        assert_eq!(json["scheme"], "three");
        assert_eq!(json["scaling"], "standard");
        assert_eq!(json["year_range"]["start"], 1971);
    }

    #[test]
    fn test_method_names() {
        assert_eq!("kmeans".parse::<ClusterMethod>().unwrap(), ClusterMethod::KMeans);
        assert_eq!(ClusterMethod::Hierarchical.model_name(), "Hierarchy");
        assert_eq!(ClusterMethod::KMeans.default_scaling(), Scaling::MinMax);
    }
}
