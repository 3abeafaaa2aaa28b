//! CSV and JSON files written next to each run.

use std::{
    fs::{self, OpenOptions},
    io,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::Context;
use chrono::{DateTime, Utc};
use posclust_analysis::{
    PipelineConfig, PipelineRun,
    concentration::{ClusterConcentration, ConcentrationTable},
    evaluation::ValidityScores,
    normalization::Scaling,
};
use posclust_data::{ObservationTable, PositionScheme, YearRange};
use serde::{Deserialize, Serialize};

use crate::util::round3;

/// File names of the artifacts of one model over one year range.
#[derive(Debug, Clone)]
pub struct ArtifactNames {
    dir: PathBuf,
    model: &'static str,
    years: YearRange,
}

impl ArtifactNames {
    pub fn new(dir: &Path, model: &'static str, years: YearRange) -> Self {
        Self {
            dir: dir.to_owned(),
            model,
            years,
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn model_csv(&self) -> PathBuf {
        self.path(&format!("MODEL_{}_Season_Stats_{}.csv", self.model, self.years))
    }

    pub fn concentration_csv(&self) -> PathBuf {
        self.path(&format!("CONC_{}_Season_Stats_{}.csv", self.model, self.years))
    }

    pub fn pie_svg(&self) -> PathBuf {
        self.path(&format!("PIE_{}_Season_Stats_{}.svg", self.model, self.years))
    }

    pub fn dendrogram_svg(&self) -> PathBuf {
        self.path(&format!("Hierarchy_Dendrogram_{}.svg", self.years))
    }

    /// `extension` is `"csv"` or `"svg"`.
    pub fn pca_elbow(&self, extension: &str) -> PathBuf {
        self.path(&format!("Elbow_Plot_PCA-{}.{extension}", self.years))
    }

    pub fn inertia_elbow(&self, extension: &str) -> PathBuf {
        self.path(&format!("Elbow_Plot_{}-{}.{extension}", self.model, self.years))
    }

    pub fn scores_csv(&self) -> PathBuf {
        self.path(&format!("SCORES_{}.csv", self.model))
    }

    pub fn run_json(&self) -> PathBuf {
        self.path(&format!("RUN_{}_{}.json", self.model, self.years))
    }
}

#[derive(Debug, Serialize)]
struct ModelRow<'a> {
    #[serde(rename = "ID")]
    id: &'a str,
    #[serde(rename = "Year")]
    year: i32,
    #[serde(rename = "Player")]
    player: &'a str,
    #[serde(rename = "Pos")]
    position: &'a str,
    #[serde(rename = "Cluster")]
    cluster: usize,
}

/// Writes one `ID,Year,Player,Pos,Cluster` row per player-season.
pub fn write_model_csv(
    path: &Path,
    table: &ObservationTable,
    run: &PipelineRun,
) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create model file: {}", path.display()))?;
    for (record, &cluster) in table.records().iter().zip(run.assignment.labels()) {
        writer
            .serialize(ModelRow {
                id: &record.id,
                year: record.year,
                player: &record.player,
                position: &record.position,
                cluster,
            })
            .with_context(|| format!("Failed to write model file: {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush model file: {}", path.display()))?;
    Ok(())
}

/// Writes `Cluster,Total,<categories…>` with fractions rounded to three
/// decimals.
pub fn write_concentration_csv(path: &Path, table: &ConcentrationTable) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create concentration file: {}", path.display()))?;
    write_concentration(&mut writer, table)
        .with_context(|| format!("Failed to write concentration file: {}", path.display()))
}

fn write_concentration<W>(
    writer: &mut csv::Writer<W>,
    table: &ConcentrationTable,
) -> anyhow::Result<()>
where
    W: io::Write,
{
    let header = ["Cluster", "Total"]
        .into_iter()
        .chain(table.categories().iter().map(String::as_str));
    writer.write_record(header)?;
    for (row, fractions) in table.rows().iter().zip(table.rounded(3)) {
        let fields = [row.cluster.to_string(), row.total.to_string()]
            .into_iter()
            .chain(fractions.iter().map(|f| format!("{f:.3}")));
        writer.write_record(fields)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_concentration_csv(path: &Path) -> anyhow::Result<ConcentrationTable> {
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open concentration file: {}", path.display()))?;
    read_concentration(file)
        .with_context(|| format!("Failed to read concentration file: {}", path.display()))
}

/// Reads a concentration table.
///
/// Every column after `Total` is a position category. Without a `Cluster`
/// column the clusters are numbered by row.
fn read_concentration<R>(reader: R) -> anyhow::Result<ConcentrationTable>
where
    R: io::Read,
{
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = reader.headers()?.clone();
    let total_index = headers
        .iter()
        .position(|h| h == "Total")
        .context("Missing column: Total")?;
    let cluster_index = headers.iter().position(|h| h == "Cluster");
    let categories = headers
        .iter()
        .skip(total_index + 1)
        .map(str::to_owned)
        .collect::<Vec<_>>();
    anyhow::ensure!(!categories.is_empty(), "No position columns after Total");

    let mut rows = vec![];
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let cluster = match cluster_index {
            Some(index) => parse_field(&record, &headers, index)?,
            None => i,
        };
        let total = parse_field(&record, &headers, total_index)?;
        let fractions = (total_index + 1..headers.len())
            .map(|index| parse_field(&record, &headers, index))
            .collect::<anyhow::Result<Vec<f64>>>()?;
        rows.push(ClusterConcentration {
            cluster,
            total,
            fractions,
        });
    }
    Ok(ConcentrationTable::from_rows(categories, rows)?)
}

fn parse_field<T>(
    record: &csv::StringRecord,
    headers: &csv::StringRecord,
    index: usize,
) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let column = headers.get(index).unwrap_or_default();
    let line = record.position().map_or(0, csv::Position::line);
    let value = record
        .get(index)
        .with_context(|| format!("Missing {column} value on line {line}"))?;
    value
        .parse()
        .with_context(|| format!("Invalid {column} value {value:?} on line {line}"))
}

/// One line of the per-model score history.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreRow {
    pub years: String,
    pub include_position: bool,
    pub scheme: PositionScheme,
    pub cluster_count: usize,
    pub scaling: Scaling,
    pub n_components: Option<usize>,
    pub seed: u64,
    pub calinski_harabasz: Option<f64>,
    pub silhouette: Option<f64>,
    pub davies_bouldin: Option<f64>,
    pub cophenetic_correlation: Option<f64>,
    pub cut_height: Option<f64>,
    pub inertia: Option<f64>,
}

impl ScoreRow {
    pub fn new(run: &PipelineRun) -> Self {
        let scores = run.scores.as_ref().ok();
        Self {
            years: run.config.year_range.to_string(),
            include_position: run.config.include_position,
            scheme: run.config.scheme,
            cluster_count: run.config.cluster_count,
            scaling: run.config.scaling,
            n_components: run.reduction.as_ref().map(|r| r.n_components),
            seed: run.config.seed,
            calinski_harabasz: scores.map(|s| round3(s.calinski_harabasz)),
            silhouette: scores.map(|s| round3(s.silhouette)),
            davies_bouldin: scores.map(|s| round3(s.davies_bouldin)),
            cophenetic_correlation: run.cophenetic_correlation.map(round3),
            cut_height: run.cut_height.map(round3),
            inertia: run.inertia.map(round3),
        }
    }
}

/// Appends `row`, writing the header first when the file is new or empty.
pub fn append_scores(path: &Path, row: &ScoreRow) -> anyhow::Result<()> {
    let has_header = fs::metadata(path).is_ok_and(|m| m.len() > 0);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open score file: {}", path.display()))?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(!has_header)
        .from_writer(file);
    writer
        .serialize(row)
        .with_context(|| format!("Failed to append to score file: {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush score file: {}", path.display()))?;
    Ok(())
}

/// Writes a two-column curve such as an elbow plot's data.
pub fn write_curve_csv(
    path: &Path,
    columns: [&str; 2],
    points: &[(usize, f64)],
) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create curve file: {}", path.display()))?;
    writer
        .write_record(columns)
        .with_context(|| format!("Failed to write curve file: {}", path.display()))?;
    for (x, y) in points {
        writer
            .write_record([x.to_string(), format!("{y:.6}")])
            .with_context(|| format!("Failed to write curve file: {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush curve file: {}", path.display()))?;
    Ok(())
}

/// Effective configuration and summary of a `cluster` run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub generated_at: DateTime<Utc>,
    pub input: PathBuf,
    pub config: PipelineConfig,
    pub rows: usize,
    pub feature_names: Vec<String>,
    pub skipped_columns: Vec<String>,
    pub n_components: Option<usize>,
    pub cluster_sizes: Vec<usize>,
    pub inertia: Option<f64>,
    pub cophenetic_correlation: Option<f64>,
    /// Dendrogram height separating the requested clusters.
    pub cut_height: Option<f64>,
    pub scores: Option<ValidityScores>,
    /// Why the validity scores are missing, if they are.
    pub score_error: Option<String>,
    pub concentration: ConcentrationTable,
}

impl RunRecord {
    pub fn new(input: &Path, run: &PipelineRun) -> Self {
        Self {
            generated_at: Utc::now(),
            input: input.to_owned(),
            config: run.config.clone(),
            rows: run.assignment.len(),
            feature_names: run.feature_names.clone(),
            skipped_columns: run.skipped_columns.clone(),
            n_components: run.reduction.as_ref().map(|r| r.n_components),
            cluster_sizes: run.assignment.sizes(),
            inertia: run.inertia,
            cophenetic_correlation: run.cophenetic_correlation,
            cut_height: run.cut_height,
            scores: run.scores.as_ref().ok().copied(),
            score_error: run.scores.as_ref().err().map(ToString::to_string),
            concentration: run.concentration.clone(),
        }
    }
}
