use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Inclusive range of seasons a run covers, e.g. `1971-1980`.
///
/// The range is the key under which artifacts and validity scores are filed.
///
/// ```
/// use posclust_data::years::YearRange;
///
/// let range: YearRange = "1971-1980".parse().unwrap();
/// assert!(range.contains(1975));
/// assert!(!range.contains(1981));
/// assert_eq!(range.to_string(), "1971-1980");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("invalid year range {input:?}: expected START-END, e.g. 1971-1980")]
pub struct ParseYearRangeError {
    input: String,
}

impl YearRange {
    #[must_use]
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn contains(&self, year: i32) -> bool {
        (self.start..=self.end).contains(&year)
    }

    /// Returns `true` if `start <= end`.
    #[must_use]
    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl FromStr for YearRange {
    type Err = ParseYearRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = || ParseYearRangeError {
            input: s.to_owned(),
        };
        let (start, end) = s.trim().split_once('-').ok_or_else(error)?;
        let start = start.trim().parse().map_err(|_| error())?;
        let end = end.trim().parse().map_err(|_| error())?;
        Ok(Self { start, end })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("1971".parse::<YearRange>().is_err());
        assert!("abc-1980".parse::<YearRange>().is_err());
        assert!("1971-".parse::<YearRange>().is_err());
    }

    #[test]
    fn test_parse_allows_reversed_range() {
        let range: YearRange = "1990-1981".parse().unwrap();
        assert!(!range.is_ordered());
    }

    #[test]
    fn test_inclusive_bounds() {
        let range = YearRange::new(2011, 2020);
        assert!(range.contains(2011));
        assert!(range.contains(2020));
        assert!(!range.contains(2010));
    }
}
