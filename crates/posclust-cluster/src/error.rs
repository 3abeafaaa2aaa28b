/// Errors raised by the clustering engine.
///
/// All of them describe input that cannot be clustered as requested; the
/// caller decides whether to retry with other parameters.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ClusterError {
    #[display("cannot cluster an empty matrix")]
    EmptyInput,
    #[display("cannot form {requested} clusters from {n_items} rows")]
    InvalidClusterCount { requested: usize, n_items: usize },
    #[display("non-finite value at row {row}, column {column}")]
    NonFiniteValue { row: usize, column: usize },
    #[display("only {distinct} distinct rows, cannot form {requested} clusters")]
    TooFewDistinctPoints { distinct: usize, requested: usize },
}
