use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Write},
    path::Path,
};

use anyhow::Context;

use crate::artifact::RunRecord;

/// Report destination: a file when a path is given, stdout otherwise.
pub struct Output {
    writer: Box<dyn Write>,
    name: String,
}

impl Output {
    pub fn create(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self {
                writer: Box::new(io::stdout().lock()),
                name: "stdout".to_owned(),
            });
        };
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Self {
            writer: Box::new(BufWriter::new(file)),
            name: path.display().to_string(),
        })
    }

    /// `stdout` or the file path, for error messages.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Writes `record` as pretty-printed JSON.
pub fn write_run_file(path: &Path, record: &RunRecord) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create run record: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, record)
        .with_context(|| format!("Failed to write run record: {}", path.display()))?;
    writeln!(writer)
        .and_then(|()| writer.flush())
        .with_context(|| format!("Failed to flush run record: {}", path.display()))
}

/// Reads a previous run record to reuse its configuration.
pub fn read_run_file(path: &Path) -> anyhow::Result<RunRecord> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open run record: {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse run record: {}", path.display()))
}

/// Creates `dir` and its parents if missing.
pub fn ensure_dir(dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))
}

/// Rounds to three decimal places, the precision of every reported number.
#[must_use]
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use posclust_analysis::{PipelineConfig, run_pipeline};
    use posclust_data::{ObservationTable, PositionScheme};

    use super::*;

    const SEASONS: &str = "\
ID,Year,Player,Tm,Pos,Pos_G,Pos_F,Pos_C,AST,TRB
1,1975,G1,BOS,G,1,0,0,9.0,3.0
2,1975,C1,BOS,C,0,0,1,1.0,12.0
3,1975,G2,LAL,G,1,0,0,8.5,3.4
4,1975,C2,LAL,C,0,0,1,1.3,11.1
5,1975,F1,CHI,F,0,1,0,4.0,7.5
6,1975,F2,CHI,F,0,1,0,4.4,7.1
";

    fn scratch_file(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("posclust-util-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn test_run_file_keeps_config_and_cut_height() {
        let table = ObservationTable::from_reader(SEASONS.as_bytes()).unwrap();
        let config = PipelineConfig {
            scheme: PositionScheme::Three,
            cluster_count: 3,
            ..PipelineConfig::default()
        };
        let run = run_pipeline(&table, &config).unwrap();
        assert!(run.cut_height.is_some());

        let path = scratch_file("RUN_test.json");
        write_run_file(&path, &RunRecord::new(Path::new("stats.csv"), &run)).unwrap();
        let record = read_run_file(&path).unwrap();
        assert_eq!(record.config, config);
        let (saved, cut) = (record.cut_height.unwrap(), run.cut_height.unwrap());
        assert!((saved - cut).abs() < 1e-12);
        assert_eq!(record.cluster_sizes.len(), 3);
        assert_eq!(record.cluster_sizes.iter().sum::<usize>(), 6);
    }

    #[test]
    fn test_output_names_its_destination() {
        let path = scratch_file("entropy.csv");
        let mut output = Output::create(Some(&path)).unwrap();
        assert_eq!(output.name(), path.display().to_string());
        writeln!(output, "file,clusters").unwrap();
        output.flush().unwrap();
        drop(output);
        assert_eq!(fs::read_to_string(&path).unwrap(), "file,clusters\n");

        assert_eq!(Output::create(None).unwrap().name(), "stdout");
    }
}
