use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use posclust_analysis::{PipelineConfig, config::ClusterMethod, normalization::Scaling};
use posclust_cluster::KMeans;
use posclust_data::{ObservationTable, PositionScheme, YearRange};

use self::{cluster::ClusterArg, elbow::ElbowArg, entropy::EntropyArg};

mod cluster;
mod elbow;
mod entropy;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Log debug messages, including every k-means restart
    #[arg(long, global = true)]
    debug: bool,
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Cluster player-seasons and write models, concentration tables and plots
    Cluster(#[clap(flatten)] ClusterArg),
    /// Sweep the k-means cluster count and plot the inertia curve
    Elbow(#[clap(flatten)] ElbowArg),
    /// Summarize the position entropy of concentration tables
    Entropy(#[clap(flatten)] EntropyArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    let level = if args.debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    pretty_env_logger::formatted_timed_builder()
        .filter_level(level)
        .init();

    match args.mode {
        Mode::Cluster(arg) => cluster::run(&arg)?,
        Mode::Elbow(arg) => elbow::run(&arg)?,
        Mode::Entropy(arg) => entropy::run(&arg)?,
    }
    Ok(())
}

#[derive(Debug, Clone, Args)]
pub(crate) struct DatasetArg {
    /// Season statistics CSV file
    pub input: PathBuf,

    /// Seasons covered by the input, e.g. 1971-1980
    #[arg(long)]
    pub years: Option<YearRange>,

    /// Drop rows whose Year falls outside --years
    #[arg(long)]
    pub restrict_years: bool,
}

impl DatasetArg {
    fn load(&self, years: YearRange) -> anyhow::Result<ObservationTable> {
        let table = ObservationTable::from_path(&self.input).with_context(|| {
            format!(
                "Failed to load season statistics: {}",
                self.input.display()
            )
        })?;
        if !self.restrict_years {
            return Ok(table);
        }

        let restricted = table.restrict_to_years(years);
        log::info!(
            "kept {} of {} rows within {years}",
            restricted.len(),
            table.len()
        );
        anyhow::ensure!(
            !restricted.is_empty(),
            "No rows of {} fall within {years}",
            self.input.display()
        );
        Ok(restricted)
    }
}

#[derive(Debug, Clone, Args)]
pub(crate) struct FeatureArg {
    /// Keep the one-hot position indicators as clustering features
    #[arg(long)]
    pub include_position: bool,

    /// Use the G/F/C position scheme instead of PG/SG/SF/PF/C
    #[arg(long)]
    pub three_positions: bool,

    /// Column scaling: standard or minmax (default depends on the method)
    #[arg(long)]
    pub scaling: Option<Scaling>,

    /// Project onto principal components before clustering
    #[arg(long)]
    pub reduce: bool,

    /// Explained variance the kept principal components must reach
    #[arg(long, default_value_t = 0.9)]
    pub variance: f64,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct KMeansArg {
    /// Seed of the k-means restarts
    #[arg(long, default_value_t = KMeans::DEFAULT_SEED)]
    pub seed: u64,

    /// Number of k-means restarts
    #[arg(long, default_value_t = KMeans::DEFAULT_N_INIT)]
    pub n_init: usize,

    /// Maximum number of Lloyd iterations per restart
    #[arg(long, default_value_t = KMeans::DEFAULT_MAX_ITER)]
    pub max_iter: usize,
}

fn pipeline_config(
    method: ClusterMethod,
    cluster_count: usize,
    year_range: YearRange,
    features: &FeatureArg,
    kmeans: &KMeansArg,
) -> PipelineConfig {
    PipelineConfig {
        include_position: features.include_position,
        scheme: PositionScheme::from_three_category_flag(features.three_positions),
        cluster_count,
        method,
        scaling: features
            .scaling
            .unwrap_or_else(|| method.default_scaling()),
        apply_dimensionality_reduction: features.reduce,
        target_explained_variance: features.variance,
        year_range,
        seed: kmeans.seed,
        n_init: kmeans.n_init,
        max_iter: kmeans.max_iter,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_flags_build_config() {
        let args = CommandArgs::try_parse_from([
            "posclust",
            "cluster",
            "stats.csv",
            "--years",
            "1981-1990",
            "--method",
            "kmeans",
            "--clusters",
            "7",
            "--three-positions",
            "--reduce",
            "--variance",
            "0.8",
        ])
        .unwrap();
        let Mode::Cluster(arg) = args.mode else {
            panic!("expected the cluster mode");
        };
        let config = arg.pipeline_config(YearRange::new(1981, 1990));

        assert_eq!(config.method, ClusterMethod::KMeans);
        assert_eq!(config.cluster_count, 7);
        assert_eq!(config.scheme, PositionScheme::Three);
        assert_eq!(config.scaling, Scaling::MinMax);
        assert!(config.apply_dimensionality_reduction);
        assert!((config.target_explained_variance - 0.8).abs() < f64::EPSILON);
        assert_eq!(config.n_init, KMeans::DEFAULT_N_INIT);
    }

    #[test]
    fn test_hierarchical_defaults() {
        let args = CommandArgs::try_parse_from([
            "posclust", "cluster", "stats.csv", "--years", "1971-1980",
        ])
        .unwrap();
        let Mode::Cluster(arg) = args.mode else {
            panic!("expected the cluster mode");
        };
        let config = arg.pipeline_config(YearRange::new(1971, 1980));

        assert_eq!(config.method, ClusterMethod::Hierarchical);
        assert_eq!(config.cluster_count, 5);
        assert_eq!(config.scaling, Scaling::Standard);
        assert_eq!(config.scheme, PositionScheme::Five);
        assert!(!config.include_position);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_malformed_years() {
        assert!(
            CommandArgs::try_parse_from(["posclust", "cluster", "stats.csv", "--years", "1971"])
                .is_err()
        );
    }

    #[test]
    fn test_entropy_needs_files() {
        assert!(CommandArgs::try_parse_from(["posclust", "entropy"]).is_err());
    }
}
