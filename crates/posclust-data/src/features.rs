//! Feature matrix preparation.
//!
//! Turns an [`ObservationTable`] into the numeric matrix handed to the
//! normalizer. Identifier and label columns are never features; the one-hot
//! position indicators are kept or dropped depending on whether position is
//! allowed to inform the clustering.

use ndarray::{Array2, Axis};

use crate::{
    error::SchemaError,
    position::{ALL_INDICATOR_COLUMNS, PositionScheme},
    table::ObservationTable,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureOptions {
    /// Keep the scheme's one-hot position indicators as features.
    pub include_position: bool,
    pub scheme: PositionScheme,
}

/// Numeric feature matrix, one row per table row.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    pub names: Vec<String>,
    pub values: Array2<f64>,
}

impl FeatureMatrix {
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.values.ncols()
    }
}

/// Selects the feature columns of `table`.
///
/// Every position label is checked against the scheme first. The scheme's
/// indicator columns must be present in either mode; when position is
/// excluded they are removed together with any indicator of the other scheme.
///
/// # Example
///
/// ```
/// use posclust_data::{
///     features::{FeatureOptions, prepare_features},
///     position::PositionScheme,
///     table::ObservationTable,
/// };
///
/// let csv = "\
/// ID,Year,Player,Tm,Pos,Pos_G,Pos_F,Pos_C,PTS,AST
/// 1,1980,A,BOS,G,1,0,0,20.0,7.5
/// 2,1980,B,LAL,C,0,0,1,14.0,1.0
/// ";
/// let table = ObservationTable::from_reader(csv.as_bytes()).unwrap();
///
/// let options = FeatureOptions {
///     include_position: false,
///     scheme: PositionScheme::Three,
/// };
/// let features = prepare_features(&table, options).unwrap();
/// assert_eq!(features.names, ["PTS", "AST"]);
/// assert_eq!(features.values.row(1).to_vec(), vec![14.0, 1.0]);
/// ```
pub fn prepare_features(
    table: &ObservationTable,
    options: FeatureOptions,
) -> Result<FeatureMatrix, SchemaError> {
    validate_positions(table, options.scheme)?;

    let columns = table.numeric_columns();
    for indicator in options.scheme.indicator_columns() {
        if !columns.iter().any(|c| c == indicator) {
            return Err(SchemaError::MissingColumn {
                column: (*indicator).to_owned(),
            });
        }
    }

    let keep = columns
        .iter()
        .enumerate()
        .filter(|(_, name)| {
            options.include_position || !ALL_INDICATOR_COLUMNS.contains(&name.as_str())
        })
        .map(|(i, _)| i)
        .collect::<Vec<_>>();
    if keep.is_empty() {
        return Err(SchemaError::NoFeatureColumns);
    }

    let names = keep.iter().map(|&i| columns[i].clone()).collect::<Vec<_>>();
    let values = table.numeric_values().select(Axis(1), &keep);
    log::debug!(
        "prepared {} features ({} position) for {} rows",
        names.len(),
        if options.include_position {
            "with"
        } else {
            "without"
        },
        values.nrows()
    );
    Ok(FeatureMatrix { names, values })
}

/// Fails on the first row whose position is not a category of `scheme`.
pub fn validate_positions(
    table: &ObservationTable,
    scheme: PositionScheme,
) -> Result<(), SchemaError> {
    if let Some(record) = table
        .records()
        .iter()
        .find(|r| scheme.category_index(&r.position).is_none())
    {
        return Err(SchemaError::UnknownPosition {
            line: record.line,
            value: record.position.clone(),
            expected: scheme.categories().join("/"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIVE: &str = "\
ID,Year,Player,Tm,Pos,Pos_C,Pos_PF,Pos_PG,Pos_SF,Pos_SG,Pos_G,PTS,TRB
1,1990,A,BOS,PG,0,0,1,0,0,1,20.0,4.0
2,1990,B,BOS,SG,0,0,0,0,1,1,18.0,3.5
3,1990,C,BOS,C,1,0,0,0,0,0,12.0,11.0
";

    fn five_table() -> ObservationTable {
        ObservationTable::from_reader(FIVE.as_bytes()).unwrap()
    }

    #[test]
    fn test_excluding_position_drops_all_indicators() {
        let options = FeatureOptions {
            include_position: false,
            scheme: PositionScheme::Five,
        };
        let features = prepare_features(&five_table(), options).unwrap();
        assert_eq!(features.names, ["PTS", "TRB"]);
        assert_eq!(features.n_rows(), 3);
    }

    #[test]
    fn test_including_position_keeps_indicators() {
        let options = FeatureOptions {
            include_position: true,
            scheme: PositionScheme::Five,
        };
        let features = prepare_features(&five_table(), options).unwrap();
        assert_eq!(features.n_features(), 8);
        assert_eq!(features.names[0], "Pos_C");
    }

    #[test]
    fn test_missing_indicator_column() {
        let csv = "ID,Year,Player,Tm,Pos,Pos_PG,PTS\n1,1990,A,BOS,PG,1,20\n";
        let table = ObservationTable::from_reader(csv.as_bytes()).unwrap();
        let err = prepare_features(&table, FeatureOptions::default()).unwrap_err();
        assert!(matches!(err, SchemaError::MissingColumn { ref column } if column == "Pos_SG"));
    }

    #[test]
    fn test_unknown_position_for_scheme() {
        let options = FeatureOptions {
            include_position: false,
            scheme: PositionScheme::Three,
        };
        let err = prepare_features(&five_table(), options).unwrap_err();
        match err {
            SchemaError::UnknownPosition { line, value, .. } => {
                assert_eq!(line, 2);
                assert_eq!(value, "PG");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_no_features_left() {
        let csv = "ID,Year,Player,Tm,Pos,Pos_G,Pos_F,Pos_C\n1,1990,A,BOS,G,1,0,0\n";
        let table = ObservationTable::from_reader(csv.as_bytes()).unwrap();
        let options = FeatureOptions {
            include_position: false,
            scheme: PositionScheme::Three,
        };
        let err = prepare_features(&table, options).unwrap_err();
        assert!(matches!(err, SchemaError::NoFeatureColumns));
    }
}
