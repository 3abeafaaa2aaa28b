use std::{io, path::PathBuf};

/// Errors raised while loading or validating an observation table.
///
/// Every variant names the offending column, line or value so the input can
/// be fixed; none of them is recoverable automatically.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum SchemaError {
    #[display("failed to open {}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[display("malformed CSV input: {source}")]
    Csv { source: csv::Error },
    #[display("missing required column '{column}'")]
    MissingColumn { column: String },
    #[display("duplicate column '{column}'")]
    DuplicateColumn { column: String },
    #[display("invalid number {value:?} in column '{column}' on line {line}")]
    InvalidNumber {
        column: String,
        line: u64,
        value: String,
    },
    #[display("unknown position {value:?} on line {line} (expected one of {expected})")]
    UnknownPosition {
        line: u64,
        value: String,
        expected: String,
    },
    #[display("numeric block has shape {rows}x{columns}, expected {expected_rows}x{expected_columns}")]
    ShapeMismatch {
        rows: usize,
        columns: usize,
        expected_rows: usize,
        expected_columns: usize,
    },
    #[display("no feature columns left after removing identifier and position columns")]
    NoFeatureColumns,
    #[display("table has no rows")]
    EmptyTable,
}

impl From<csv::Error> for SchemaError {
    fn from(source: csv::Error) -> Self {
        Self::Csv { source }
    }
}
