//! End-to-end clustering run.
//!
//! ```text
//! ObservationTable
//!   -> prepare_features      (drop identifiers, optionally position indicators)
//!   -> normalize             (column scaling + row unit norm)
//!   -> Pca                   (optional, keeps enough components for the target)
//!   -> Ward / k-means        (fixed cluster count)
//!   -> evaluate + concentration
//! ```
//!
//! A run never touches the file system; writing artifacts is left to the
//! caller. Identical input, configuration and seed produce identical labels.

use ndarray::Array2;
use posclust_cluster::{
    ClusterAssignment, ClusterError, Clustering, KMeans, MergeTree, WardClustering,
};
use posclust_data::{FeatureOptions, ObservationTable, SchemaError, prepare_features};

use crate::{
    concentration::{ConcentrationError, ConcentrationTable},
    config::{ClusterMethod, ConfigError, PipelineConfig},
    evaluation::{self, EvaluationError, ValidityScores},
    normalization::{self, Scaling},
    reduction::{Pca, ReductionError},
};

/// Input that passed schema validation but cannot be clustered as asked.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum DegenerateInputError {
    #[display("clustering failed")]
    Clustering(ClusterError),
    #[display("dimensionality reduction failed")]
    Reduction(ReductionError),
    #[display("position concentration failed")]
    Concentration(ConcentrationError),
}

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum PipelineError {
    #[display("invalid input data")]
    Schema(SchemaError),
    #[display("degenerate input")]
    DegenerateInput(DegenerateInputError),
    #[display("invalid configuration")]
    Configuration(ConfigError),
}

impl From<ClusterError> for PipelineError {
    fn from(error: ClusterError) -> Self {
        Self::DegenerateInput(error.into())
    }
}

impl From<ReductionError> for PipelineError {
    fn from(error: ReductionError) -> Self {
        Self::DegenerateInput(error.into())
    }
}

impl From<ConcentrationError> for PipelineError {
    fn from(error: ConcentrationError) -> Self {
        Self::DegenerateInput(error.into())
    }
}

/// Outcome of the optional PCA step.
#[derive(Debug, Clone)]
pub struct ReductionSummary {
    /// Cumulative explained-variance ratio for `1..=d` components.
    pub cumulative_explained_variance: Vec<f64>,
    pub n_components: usize,
}

#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub config: PipelineConfig,
    pub feature_names: Vec<String>,
    /// Constant feature columns that could not be rescaled.
    pub skipped_columns: Vec<String>,
    pub reduction: Option<ReductionSummary>,
    /// The matrix handed to the clustering strategy.
    pub clustered: Array2<f64>,
    pub assignment: ClusterAssignment,
    /// Full merge tree of hierarchical runs.
    pub merge_tree: Option<MergeTree>,
    /// Merge height at which the tree splits into `cluster_count` clusters.
    pub cut_height: Option<f64>,
    pub cophenetic_correlation: Option<f64>,
    /// Within-cluster sum of squares of k-means runs.
    pub inertia: Option<f64>,
    pub concentration: ConcentrationTable,
    pub scores: Result<ValidityScores, EvaluationError>,
}

/// Feature matrix after normalization and optional reduction.
#[derive(Debug, Clone)]
pub struct PreparedMatrix {
    pub feature_names: Vec<String>,
    /// Constant feature columns that could not be rescaled.
    pub skipped_columns: Vec<String>,
    pub reduction: Option<ReductionSummary>,
    pub values: Array2<f64>,
}

/// Runs the stages up to, but not including, clustering.
pub fn prepare_matrix(
    table: &ObservationTable,
    config: &PipelineConfig,
) -> Result<PreparedMatrix, PipelineError> {
    config.validate()?;
    if table.is_empty() {
        return Err(SchemaError::EmptyTable.into());
    }

    let features = prepare_features(
        table,
        FeatureOptions {
            include_position: config.include_position,
            scheme: config.scheme,
        },
    )?;
    log::info!(
        "preparing {} rows x {} features ({} scaling)",
        features.n_rows(),
        features.n_features(),
        if config.scaling == Scaling::Standard {
            "standard"
        } else {
            "min-max"
        }
    );

    let normalized =
        normalization::normalize(features.values.view(), &features.names, config.scaling);
    if !config.apply_dimensionality_reduction {
        return Ok(PreparedMatrix {
            feature_names: features.names,
            skipped_columns: normalized.skipped_columns,
            reduction: None,
            values: normalized.values,
        });
    }

    let pca = Pca::fit(normalized.values.view())?;
    let n_components = pca.components_for(config.target_explained_variance)?;
    let cumulative = pca.cumulative_explained_variance();
    log::info!(
        "PCA keeps {n_components} of {} components ({:.3} of the variance)",
        pca.n_features(),
        cumulative[n_components - 1]
    );
    Ok(PreparedMatrix {
        feature_names: features.names,
        skipped_columns: normalized.skipped_columns,
        values: pca.transform(normalized.values.view(), n_components),
        reduction: Some(ReductionSummary {
            cumulative_explained_variance: cumulative,
            n_components,
        }),
    })
}

/// Runs every stage on `table` with `config`.
///
/// Evaluation failures do not abort the run: they are logged and kept in
/// [`PipelineRun::scores`].
pub fn run_pipeline(
    table: &ObservationTable,
    config: &PipelineConfig,
) -> Result<PipelineRun, PipelineError> {
    let PreparedMatrix {
        feature_names,
        skipped_columns,
        reduction,
        values: clustered,
    } = prepare_matrix(table, config)?;
    log::info!(
        "clustering {} rows with {} into {} clusters ({})",
        clustered.nrows(),
        config.method.model_name(),
        config.cluster_count,
        config.year_range
    );

    let mut merge_tree = None;
    let mut cut_height = None;
    let mut cophenetic_correlation = None;
    let mut inertia = None;
    let assignment = match config.method {
        ClusterMethod::Hierarchical => {
            let ward = WardClustering::new(config.cluster_count);
            let tree = ward.fit_tree(clustered.view())?;
            let assignment = tree.cut_to_k(ward.n_clusters())?;
            cut_height = tree.cut_height(ward.n_clusters());
            if let Some(h) = cut_height {
                log::info!(
                    "tree splits into {} clusters when cut at {h:.3}",
                    ward.n_clusters()
                );
            }
            cophenetic_correlation = evaluation::cophenetic_correlation(&tree, clustered.view());
            if let Some(c) = cophenetic_correlation {
                log::info!("cophenetic correlation coefficient: {c:.5}");
            }
            merge_tree = Some(tree);
            assignment
        }
        ClusterMethod::KMeans => {
            let fit = KMeans::new(config.cluster_count)
                .with_seed(config.seed)
                .with_n_init(config.n_init)
                .with_max_iter(config.max_iter)
                .fit_full(clustered.view())?;
            inertia = Some(fit.inertia);
            fit.assignment
        }
    };
    log::info!("cluster sizes: {:?}", assignment.sizes());

    let concentration = ConcentrationTable::from_labels(
        table.positions(),
        &assignment,
        config.scheme.categories(),
    )?;

    let scores = evaluation::evaluate(clustered.view(), &assignment);
    if let Err(e) = &scores {
        log::warn!("skipping validity scores: {e}");
    }

    Ok(PipelineRun {
        config: config.clone(),
        feature_names,
        skipped_columns,
        reduction,
        clustered,
        assignment,
        merge_tree,
        cut_height,
        cophenetic_correlation,
        inertia,
        concentration,
        scores,
    })
}

#[cfg(test)]
mod tests {
    use posclust_data::PositionScheme;

    use super::*;

    // Two well-separated groups of player profiles: guards (high AST, low TRB)
    // and centers (low AST, high TRB), interleaved by row.
    const SEASONS: &str = "\
ID,Year,Player,Tm,Pos,Pos_G,Pos_F,Pos_C,AST,TRB,BLK
1,1985,G1,BOS,G,1,0,0,9.0,3.0,0.1
2,1985,C1,BOS,C,0,0,1,1.0,12.0,2.5
3,1985,G2,LAL,G,1,0,0,8.5,3.4,0.2
4,1985,C2,LAL,C,0,0,1,1.3,11.1,2.9
5,1985,G3,CHI,G,1,0,0,10.1,2.8,0.1
6,1985,C3,CHI,C,0,0,1,0.9,12.8,3.1
7,1985,G4,NYK,G,1,0,0,7.9,3.9,0.3
8,1985,C4,NYK,C,0,0,1,1.6,10.4,2.2
9,1985,G5,DET,G,1,0,0,9.4,2.5,0.2
10,1985,C5,DET,C,0,0,1,1.1,11.7,2.7
";

    fn table() -> ObservationTable {
        ObservationTable::from_reader(SEASONS.as_bytes()).unwrap()
    }

    fn config(method: ClusterMethod) -> PipelineConfig {
        PipelineConfig {
            scheme: PositionScheme::Three,
            cluster_count: 2,
            method,
            scaling: method.default_scaling(),
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_both_methods_recover_positions() {
        for method in [ClusterMethod::Hierarchical, ClusterMethod::KMeans] {
            let run = run_pipeline(&table(), &config(method)).unwrap();
            assert_eq!(run.assignment.labels(), [0, 1, 0, 1, 0, 1, 0, 1, 0, 1]);
            assert_eq!(run.feature_names, ["AST", "TRB", "BLK"]);

            let rows = run.concentration.rows();
            assert_eq!(rows[0].total, 5);
            assert_eq!(rows[0].fractions, [1.0, 0.0, 0.0]);
            assert_eq!(rows[1].fractions, [0.0, 0.0, 1.0]);
            assert!(run.scores.is_ok());
        }
    }

    #[test]
    fn test_method_specific_outputs() {
        let ward = run_pipeline(&table(), &config(ClusterMethod::Hierarchical)).unwrap();
        assert!(ward.cophenetic_correlation.is_some());
        assert!(ward.inertia.is_none());
        let tree = ward.merge_tree.as_ref().unwrap();
        let cut = ward.cut_height.unwrap();
        assert!(cut > 0.0 && cut < tree.height(tree.root()));

        let kmeans = run_pipeline(&table(), &config(ClusterMethod::KMeans)).unwrap();
        assert!(kmeans.merge_tree.is_none());
        assert!(kmeans.cut_height.is_none());
        assert!(kmeans.inertia.is_some());
    }

    #[test]
    fn test_rerun_is_identical() {
        let config = PipelineConfig {
            cluster_count: 3,
            seed: 11,
            ..config(ClusterMethod::KMeans)
        };
        let first = run_pipeline(&table(), &config).unwrap();
        let second = run_pipeline(&table(), &config).unwrap();
        assert_eq!(first.assignment, second.assignment);
        assert_eq!(first.concentration, second.concentration);
        assert_eq!(first.clustered, second.clustered);
    }

    #[test]
    fn test_reduction_keeps_requested_variance() {
        let config = PipelineConfig {
            apply_dimensionality_reduction: true,
            target_explained_variance: 0.8,
            ..config(ClusterMethod::Hierarchical)
        };
        let run = run_pipeline(&table(), &config).unwrap();
        let reduction = run.reduction.unwrap();
        assert!(reduction.cumulative_explained_variance[reduction.n_components - 1] >= 0.8);
        assert_eq!(run.clustered.ncols(), reduction.n_components);
        assert_eq!(run.assignment.n_clusters(), 2);
    }

    #[test]
    fn test_k_equals_n_keeps_running_without_scores() {
        let config = PipelineConfig {
            cluster_count: 10,
            ..config(ClusterMethod::Hierarchical)
        };
        let run = run_pipeline(&table(), &config).unwrap();
        assert_eq!(run.assignment.n_clusters(), 10);
        assert!(matches!(
            run.scores,
            Err(EvaluationError::UndersizedCluster { .. })
        ));
    }

    #[test]
    fn test_error_taxonomy() {
        let bad_config = PipelineConfig {
            cluster_count: 1,
            ..config(ClusterMethod::KMeans)
        };
        assert!(matches!(
            run_pipeline(&table(), &bad_config),
            Err(PipelineError::Configuration(_))
        ));

        let too_many = PipelineConfig {
            cluster_count: 11,
            ..config(ClusterMethod::KMeans)
        };
        assert!(matches!(
            run_pipeline(&table(), &too_many),
            Err(PipelineError::DegenerateInput(
                DegenerateInputError::Clustering(_)
            ))
        ));

        let wrong_scheme = PipelineConfig {
            scheme: PositionScheme::Five,
            ..config(ClusterMethod::KMeans)
        };
        assert!(matches!(
            run_pipeline(&table(), &wrong_scheme),
            Err(PipelineError::Schema(_))
        ));
    }
}
