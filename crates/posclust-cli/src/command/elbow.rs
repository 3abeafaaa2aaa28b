use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use posclust_analysis::{config::ClusterMethod, prepare_matrix};
use posclust_cluster::{KMeans, distance};

use crate::{
    artifact::{self, ArtifactNames},
    command::{DatasetArg, FeatureArg, KMeansArg},
    plot, util,
};

#[derive(Debug, Clone, Args)]
pub(crate) struct ElbowArg {
    #[clap(flatten)]
    pub dataset: DatasetArg,

    #[clap(flatten)]
    pub features: FeatureArg,

    #[clap(flatten)]
    pub kmeans: KMeansArg,

    /// Smallest cluster count of the sweep
    #[arg(long, default_value_t = 1)]
    pub k_min: usize,

    /// Largest cluster count of the sweep, lowered to the number of distinct rows
    #[arg(long, default_value_t = 20)]
    pub k_max: usize,

    /// Directory receiving the curve
    #[arg(long, default_value = "model")]
    pub output_dir: PathBuf,
}

pub(crate) fn run(arg: &ElbowArg) -> anyhow::Result<()> {
    anyhow::ensure!(
        arg.k_min >= 1 && arg.k_min <= arg.k_max,
        "Invalid sweep range: --k-min {} --k-max {}",
        arg.k_min,
        arg.k_max
    );
    let years = arg.dataset.years.context("--years is required")?;
    let method = ClusterMethod::KMeans;
    // the cluster count is swept; 2 only satisfies validation
    let config = super::pipeline_config(method, 2, years, &arg.features, &arg.kmeans);

    let table = arg.dataset.load(years)?;
    let prepared = prepare_matrix(&table, &config).with_context(|| {
        format!(
            "Failed to prepare features of {}",
            arg.dataset.input.display()
        )
    })?;

    let distinct = distance::count_distinct_rows(prepared.values.view());
    let k_max = arg.k_max.min(distinct);
    if k_max < arg.k_max {
        log::warn!("lowering --k-max to {k_max}, the number of distinct rows");
    }
    anyhow::ensure!(
        arg.k_min <= k_max,
        "--k-min {} exceeds the {distinct} distinct rows",
        arg.k_min
    );

    let curve = KMeans::new(arg.k_min)
        .with_seed(config.seed)
        .with_n_init(config.n_init)
        .with_max_iter(config.max_iter)
        .inertia_sweep(prepared.values.view(), arg.k_min..=k_max)
        .context("k-means sweep failed")?;
    let points = curve
        .iter()
        .map(|p| (p.n_clusters, p.inertia))
        .collect::<Vec<_>>();

    util::ensure_dir(&arg.output_dir)?;
    let names = ArtifactNames::new(&arg.output_dir, method.model_name(), years);
    artifact::write_curve_csv(&names.inertia_elbow("csv"), ["Clusters", "Inertia"], &points)?;
    let svg = names.inertia_elbow("svg");
    plot::draw_curve(
        &svg,
        &format!("k-means elbow, {years}"),
        ["Number of clusters", "Inertia"],
        &points,
        None,
    )
    .with_context(|| format!("Failed to draw {}", svg.display()))?;

    println!("k-means inertia sweep ({years})");
    println!("==========================================\n");
    println!("{:>8} {:>12}", "Clusters", "Inertia");
    for (k, inertia) in &points {
        println!("{k:>8} {inertia:>12.3}");
    }
    Ok(())
}
