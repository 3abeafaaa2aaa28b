use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use posclust_analysis::{PipelineConfig, PipelineRun, config::ClusterMethod, run_pipeline};
use posclust_data::{ObservationTable, YearRange};

use crate::{
    artifact::{self, ArtifactNames, RunRecord, ScoreRow},
    command::{DatasetArg, FeatureArg, KMeansArg},
    plot::{self, Threshold},
    util,
};

#[derive(Debug, Clone, Args)]
pub(crate) struct ClusterArg {
    #[clap(flatten)]
    pub dataset: DatasetArg,

    /// Clustering method: hierarchical (Ward) or kmeans
    #[arg(long, default_value = "hierarchical")]
    pub method: ClusterMethod,

    /// Number of clusters
    #[arg(long, default_value_t = 5)]
    pub clusters: usize,

    #[clap(flatten)]
    pub features: FeatureArg,

    #[clap(flatten)]
    pub kmeans: KMeansArg,

    /// Re-run with the configuration recorded in a RUN_*.json file
    #[arg(
        long,
        conflicts_with_all = [
            "years",
            "method",
            "clusters",
            "include_position",
            "three_positions",
            "scaling",
            "reduce",
        ]
    )]
    pub from_run: Option<PathBuf>,

    /// Directory receiving the artifacts
    #[arg(long, default_value = "model")]
    pub output_dir: PathBuf,
}

impl ClusterArg {
    pub(crate) fn pipeline_config(&self, year_range: YearRange) -> PipelineConfig {
        super::pipeline_config(
            self.method,
            self.clusters,
            year_range,
            &self.features,
            &self.kmeans,
        )
    }
}

pub(crate) fn run(arg: &ClusterArg) -> anyhow::Result<()> {
    let config = match &arg.from_run {
        Some(path) => {
            let record = util::read_run_file(path)?;
            log::info!("reusing the configuration of {}", path.display());
            record.config
        }
        None => {
            let years = arg
                .dataset
                .years
                .context("--years is required unless --from-run is given")?;
            arg.pipeline_config(years)
        }
    };

    let table = arg.dataset.load(config.year_range)?;
    let run = run_pipeline(&table, &config).with_context(|| {
        format!(
            "Failed to cluster {} ({})",
            arg.dataset.input.display(),
            config.year_range
        )
    })?;

    write_artifacts(&arg.output_dir, &arg.dataset.input, &table, &run)?;
    print_report(&run);
    Ok(())
}

fn write_artifacts(
    output_dir: &Path,
    input: &Path,
    table: &ObservationTable,
    run: &PipelineRun,
) -> anyhow::Result<()> {
    util::ensure_dir(output_dir)?;
    let model = run.config.method.model_name();
    let years = run.config.year_range;
    let names = ArtifactNames::new(output_dir, model, years);

    artifact::write_model_csv(&names.model_csv(), table, run)?;
    artifact::write_concentration_csv(&names.concentration_csv(), &run.concentration)?;

    let pie = names.pie_svg();
    plot::draw_concentration_pies(
        &pie,
        &format!("{model} clusters by position, {years}"),
        &run.concentration,
    )
    .with_context(|| format!("Failed to draw {}", pie.display()))?;

    if let Some(tree) = &run.merge_tree {
        let dendrogram = names.dendrogram_svg();
        let cut_label = format!("cut for {} clusters", run.config.cluster_count);
        plot::draw_dendrogram(
            &dendrogram,
            &format!("Hierarchical clustering dendrogram, {years}"),
            tree,
            run.cut_height.map(|value| Threshold {
                value,
                label: &cut_label,
            }),
        )
        .with_context(|| format!("Failed to draw {}", dendrogram.display()))?;
    }

    if let Some(reduction) = &run.reduction {
        let points = reduction
            .cumulative_explained_variance
            .iter()
            .enumerate()
            .map(|(i, &v)| (i + 1, v))
            .collect::<Vec<_>>();
        artifact::write_curve_csv(
            &names.pca_elbow("csv"),
            ["Components", "CumulativeExplainedVariance"],
            &points,
        )?;
        let svg = names.pca_elbow("svg");
        plot::draw_curve(
            &svg,
            &format!("PCA explained variance, {years}"),
            ["Number of components", "Cumulative explained variance"],
            &points,
            Some(Threshold {
                value: run.config.target_explained_variance,
                label: "target",
            }),
        )
        .with_context(|| format!("Failed to draw {}", svg.display()))?;
    }

    artifact::append_scores(&names.scores_csv(), &ScoreRow::new(run))?;
    util::write_run_file(&names.run_json(), &RunRecord::new(input, run))?;
    log::info!("artifacts written to {}", output_dir.display());
    Ok(())
}

fn print_report(run: &PipelineRun) {
    let config = &run.config;
    println!(
        "{} clustering of {} player-seasons ({})",
        config.method.model_name(),
        run.assignment.len(),
        config.year_range
    );
    println!("==========================================\n");

    println!("Features: {}", run.feature_names.join(", "));
    if !run.skipped_columns.is_empty() {
        println!("Constant columns: {}", run.skipped_columns.join(", "));
    }
    if let Some(reduction) = &run.reduction {
        println!(
            "PCA components: {} (explained variance {:.3})",
            reduction.n_components,
            reduction.cumulative_explained_variance[reduction.n_components - 1]
        );
    }
    println!();

    let concentration = &run.concentration;
    print!("{:>7} {:>6}", "Cluster", "Total");
    for category in concentration.categories() {
        print!(" {category:>6}");
    }
    println!(" {:>7}", "Entropy");
    let entropy = concentration.entropy();
    for ((row, fractions), entropy) in concentration
        .rows()
        .iter()
        .zip(concentration.rounded(3))
        .zip(entropy)
    {
        print!("{:>7} {:>6}", row.cluster, row.total);
        for fraction in fractions {
            print!(" {fraction:>6.3}");
        }
        println!(" {entropy:>7.3}");
    }
    println!(
        "Mean entropy: {:.3}, range: {:.3}",
        concentration.mean_entropy(),
        concentration.entropy_range()
    );
    println!();

    match &run.scores {
        Ok(scores) => {
            println!("Calinski-Harabasz: {:.3}", scores.calinski_harabasz);
            println!("Silhouette:        {:.3}", scores.silhouette);
            println!("Davies-Bouldin:    {:.3}", scores.davies_bouldin);
        }
        Err(e) => println!("Validity scores: n/a ({e})"),
    }
    if let Some(c) = run.cophenetic_correlation {
        println!("Cophenetic correlation: {c:.3}");
    }
    if let Some(h) = run.cut_height {
        println!(
            "Dendrogram cut height for {} clusters: {h:.3}",
            config.cluster_count
        );
    }
    if let Some(inertia) = run.inertia {
        println!("Inertia: {inertia:.3}");
    }
}
