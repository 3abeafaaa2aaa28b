use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde::Serialize;

use crate::{
    artifact,
    util::{Output, round3},
};

#[derive(Debug, Clone, Args)]
pub(crate) struct EntropyArg {
    /// Concentration tables (CONC_*.csv)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output CSV file (stdout if omitted)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct EntropySummary {
    file: String,
    clusters: usize,
    mean_entropy: f64,
    entropy_range: f64,
}

#[expect(clippy::cast_precision_loss)]
pub(crate) fn run(arg: &EntropyArg) -> anyhow::Result<()> {
    let summaries = arg
        .files
        .iter()
        .map(|path| {
            let table = artifact::read_concentration_csv(path)?;
            let file = path
                .file_name()
                .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
            Ok(EntropySummary {
                file,
                clusters: table.rows().len(),
                mean_entropy: round3(table.mean_entropy()),
                entropy_range: round3(table.entropy_range()),
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let output = Output::create(arg.output.as_deref())?;
    let destination = output.name().to_owned();
    let mut writer = csv::Writer::from_writer(output);
    for summary in &summaries {
        writer
            .serialize(summary)
            .with_context(|| format!("Failed to write entropy summary to {destination}"))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush entropy summary to {destination}"))?;

    if summaries.len() > 1 {
        let overall =
            summaries.iter().map(|s| s.mean_entropy).sum::<f64>() / summaries.len() as f64;
        log::info!(
            "mean entropy over {} tables: {overall:.3}",
            summaries.len()
        );
    }
    Ok(())
}
