//! The observation table: one row per player-season.
//!
//! A dataset is a CSV file whose header contains the identifier columns
//! [`ID_COLUMN`], [`YEAR_COLUMN`], [`PLAYER_COLUMN`], [`TEAM_COLUMN`], the
//! ground-truth label column [`POSITION_COLUMN`], and any number of numeric
//! columns (box-score statistics and one-hot position indicators). A leading
//! unnamed index column, as written by dataframe libraries, is ignored.
//!
//! # Example
//!
//! ```
//! use posclust_data::table::ObservationTable;
//!
//! let csv = "\
//! ID,Year,Player,Tm,Pos,PTS,TRB
//! 1,1980,A,BOS,PG,20.1,3.0
//! 2,1980,B,LAL,C,14.2,11.5
//! ";
//! let table = ObservationTable::from_reader(csv.as_bytes()).unwrap();
//! assert_eq!(table.len(), 2);
//! assert_eq!(table.numeric_columns(), ["PTS", "TRB"]);
//! assert_eq!(table.records()[1].position, "C");
//! ```

use std::{collections::HashSet, fs::File, io, path::Path};

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

use crate::{error::SchemaError, years::YearRange};

pub const ID_COLUMN: &str = "ID";
pub const YEAR_COLUMN: &str = "Year";
pub const PLAYER_COLUMN: &str = "Player";
pub const TEAM_COLUMN: &str = "Tm";
pub const POSITION_COLUMN: &str = "Pos";

/// Columns that identify a row or carry its label; never used as features.
pub const IDENTIFIER_COLUMNS: [&str; 5] = [
    ID_COLUMN,
    YEAR_COLUMN,
    PLAYER_COLUMN,
    TEAM_COLUMN,
    POSITION_COLUMN,
];

const INDEX_COLUMN_NAMES: [&str; 2] = ["", "Unnamed: 0"];

/// Identifying fields and ground-truth label of one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSeason {
    pub id: String,
    pub year: i32,
    pub player: String,
    pub team: String,
    pub position: String,
    /// 1-based line of the row in the source file (header is line 1).
    pub line: u64,
}

/// Player-season rows with their numeric statistics.
#[derive(Debug, Clone)]
pub struct ObservationTable {
    records: Vec<PlayerSeason>,
    numeric_columns: Vec<String>,
    numeric: Array2<f64>,
}

#[derive(Debug)]
struct HeaderLayout {
    id: usize,
    year: usize,
    player: usize,
    team: usize,
    position: usize,
    numeric: Vec<(usize, String)>,
}

impl HeaderLayout {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, SchemaError> {
        let mut seen = HashSet::new();
        for name in headers {
            if !seen.insert(name) {
                return Err(SchemaError::DuplicateColumn {
                    column: name.to_owned(),
                });
            }
        }

        let find = |column: &str| {
            headers
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| SchemaError::MissingColumn {
                    column: column.to_owned(),
                })
        };

        let numeric = headers
            .iter()
            .enumerate()
            .filter(|(i, name)| !(*i == 0 && INDEX_COLUMN_NAMES.contains(name)))
            .filter(|(_, name)| !IDENTIFIER_COLUMNS.contains(name))
            .map(|(i, name)| (i, name.to_owned()))
            .collect();

        Ok(Self {
            id: find(ID_COLUMN)?,
            year: find(YEAR_COLUMN)?,
            player: find(PLAYER_COLUMN)?,
            team: find(TEAM_COLUMN)?,
            position: find(POSITION_COLUMN)?,
            numeric,
        })
    }
}

impl ObservationTable {
    /// Builds a table from already-parsed parts.
    ///
    /// `numeric` must have one row per record and one column per name in
    /// `numeric_columns`.
    pub fn new(
        records: Vec<PlayerSeason>,
        numeric_columns: Vec<String>,
        numeric: Array2<f64>,
    ) -> Result<Self, SchemaError> {
        if numeric.dim() != (records.len(), numeric_columns.len()) {
            return Err(SchemaError::ShapeMismatch {
                rows: numeric.nrows(),
                columns: numeric.ncols(),
                expected_rows: records.len(),
                expected_columns: numeric_columns.len(),
            });
        }
        Ok(Self {
            records,
            numeric_columns,
            numeric,
        })
    }

    /// Loads and validates a CSV dataset from disk.
    pub fn from_path<P>(path: P) -> Result<Self, SchemaError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| SchemaError::Io {
            path: path.to_owned(),
            source,
        })?;
        let table = Self::from_reader(io::BufReader::new(file))?;
        log::info!(
            "loaded {} rows with {} numeric columns from {}",
            table.len(),
            table.numeric_columns.len(),
            path.display()
        );
        Ok(table)
    }

    /// Parses and validates a CSV dataset.
    ///
    /// The header must contain every identifier column; all remaining
    /// columns must hold numbers on every row.
    pub fn from_reader<R>(reader: R) -> Result<Self, SchemaError>
    where
        R: io::Read,
    {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let layout = HeaderLayout::from_headers(reader.headers()?)?;

        let mut records = Vec::new();
        let mut values = Vec::new();
        for result in reader.records() {
            let row = result?;
            let line = row.position().map_or(0, csv::Position::line);
            let field = |i: usize| row.get(i).unwrap_or_default();

            let year_text = field(layout.year);
            let year = parse_year(year_text).ok_or_else(|| SchemaError::InvalidNumber {
                column: YEAR_COLUMN.to_owned(),
                line,
                value: year_text.to_owned(),
            })?;
            records.push(PlayerSeason {
                id: field(layout.id).to_owned(),
                year,
                player: field(layout.player).to_owned(),
                team: field(layout.team).to_owned(),
                position: field(layout.position).to_owned(),
                line,
            });

            for (i, column) in &layout.numeric {
                let text = field(*i);
                let value = text
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| SchemaError::InvalidNumber {
                        column: column.clone(),
                        line,
                        value: text.to_owned(),
                    })?;
                values.push(value);
            }
        }

        if records.is_empty() {
            return Err(SchemaError::EmptyTable);
        }

        let numeric_columns = layout
            .numeric
            .into_iter()
            .map(|(_, name)| name)
            .collect::<Vec<_>>();
        let shape = (records.len(), numeric_columns.len());
        let numeric = Array2::from_shape_vec(shape, values).map_err(|_| {
            SchemaError::ShapeMismatch {
                rows: records.len(),
                columns: numeric_columns.len(),
                expected_rows: shape.0,
                expected_columns: shape.1,
            }
        })?;
        Self::new(records, numeric_columns, numeric)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn records(&self) -> &[PlayerSeason] {
        &self.records
    }

    #[must_use]
    pub fn numeric_columns(&self) -> &[String] {
        &self.numeric_columns
    }

    #[must_use]
    pub fn numeric_values(&self) -> ArrayView2<'_, f64> {
        self.numeric.view()
    }

    /// Returns the values of a numeric column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        let index = self.numeric_columns.iter().position(|c| c == name)?;
        Some(self.numeric.column(index))
    }

    /// Position labels in row order.
    pub fn positions(&self) -> impl Iterator<Item = &str> + '_ {
        self.records.iter().map(|r| r.position.as_str())
    }

    /// Keeps only the rows whose season falls inside `range`.
    #[must_use]
    pub fn restrict_to_years(&self, range: YearRange) -> Self {
        let keep = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| range.contains(r.year))
            .map(|(i, _)| i)
            .collect::<Vec<_>>();
        Self {
            records: keep.iter().map(|&i| self.records[i].clone()).collect(),
            numeric_columns: self.numeric_columns.clone(),
            numeric: self.numeric.select(Axis(0), &keep),
        }
    }
}

/// Parses a season year, accepting integral floats such as `1980.0`.
#[expect(clippy::cast_possible_truncation)]
fn parse_year(text: &str) -> Option<i32> {
    if let Ok(year) = text.parse::<i32>() {
        return Some(year);
    }
    let value = text.parse::<f64>().ok()?;
    (value.fract() == 0.0 && value.abs() < f64::from(i32::MAX)).then_some(value as i32)
}
