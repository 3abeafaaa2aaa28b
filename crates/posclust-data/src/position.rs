//! Position category schemes.
//!
//! Player positions are encoded either with the five canonical positions
//! (PG/SG/SF/PF/C) or with the coarser guard/forward/center split (G/F/C).
//! The ordered category list is always taken from the scheme, never inferred
//! from the order in which labels happen to appear in the data.

use serde::{Deserialize, Serialize};

/// One-hot indicator columns of both schemes, as they appear in the dataset.
pub const ALL_INDICATOR_COLUMNS: [&str; 7] = [
    "Pos_C", "Pos_F", "Pos_G", "Pos_PF", "Pos_PG", "Pos_SF", "Pos_SG",
];

/// Position encoding used by a dataset.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionScheme {
    /// PG, SG, SF, PF, C
    #[default]
    Five,
    /// G, F, C
    Three,
}

impl PositionScheme {
    const FIVE_CATEGORIES: [&str; 5] = ["PG", "SG", "SF", "PF", "C"];
    const FIVE_INDICATORS: [&str; 5] = ["Pos_PG", "Pos_SG", "Pos_SF", "Pos_PF", "Pos_C"];
    const THREE_CATEGORIES: [&str; 3] = ["G", "F", "C"];
    const THREE_INDICATORS: [&str; 3] = ["Pos_G", "Pos_F", "Pos_C"];

    /// Selects the scheme from the "three-category positions" flag.
    #[must_use]
    pub fn from_three_category_flag(three: bool) -> Self {
        if three { Self::Three } else { Self::Five }
    }

    /// Ordered position categories of this scheme.
    ///
    /// ```
    /// use posclust_data::position::PositionScheme;
    ///
    /// assert_eq!(PositionScheme::Three.categories(), ["G", "F", "C"]);
    /// ```
    #[must_use]
    pub fn categories(self) -> &'static [&'static str] {
        match self {
            Self::Five => &Self::FIVE_CATEGORIES,
            Self::Three => &Self::THREE_CATEGORIES,
        }
    }

    /// One-hot indicator columns of this scheme, in category order.
    #[must_use]
    pub fn indicator_columns(self) -> &'static [&'static str] {
        match self {
            Self::Five => &Self::FIVE_INDICATORS,
            Self::Three => &Self::THREE_INDICATORS,
        }
    }

    /// Index of `label` in [`Self::categories`].
    #[must_use]
    pub fn category_index(self, label: &str) -> Option<usize> {
        self.categories().iter().position(|c| *c == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indicators_follow_category_order() {
        for scheme in [PositionScheme::Five, PositionScheme::Three] {
            for (category, indicator) in scheme.categories().iter().zip(scheme.indicator_columns())
            {
                assert_eq!(*indicator, format!("Pos_{category}"));
                assert!(ALL_INDICATOR_COLUMNS.contains(indicator));
            }
        }
    }

    #[test]
    fn test_category_index() {
        assert_eq!(PositionScheme::Five.category_index("PF"), Some(3));
        assert_eq!(PositionScheme::Five.category_index("G"), None);
        assert_eq!(PositionScheme::Three.category_index("C"), Some(2));
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&PositionScheme::Three).unwrap();
        assert_eq!(json, "\"three\"");
        let scheme: PositionScheme = serde_json::from_str("\"five\"").unwrap();
        assert_eq!(scheme, PositionScheme::Five);
    }
}
