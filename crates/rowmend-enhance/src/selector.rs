//! Row range selection

use rowmend_record::Ordinal;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Closed interval `[low, high]` over record ordinals
///
/// # Invariants
/// - `1 <= low <= high`
/// - `high <= record_count` is checked by [`crate::enhance`] against the
///   record set it is applied to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RangeSelector {
    low: Ordinal,
    high: Ordinal,
}

impl RangeSelector {
    /// Selector over ordinals `low..=high`
    ///
    /// # Errors
    /// [`SelectorError::Zero`] if either bound is 0,
    /// [`SelectorError::Inverted`] if `low > high`.
    pub fn new(low: usize, high: usize) -> Result<Self, SelectorError> {
        let (Some(lo), Some(hi)) = (Ordinal::new(low), Ordinal::new(high)) else {
            return Err(SelectorError::Zero);
        };
        if lo > hi {
            return Err(SelectorError::Inverted { low, high });
        }
        Ok(Self { low: lo, high: hi })
    }

    /// Selector from spreadsheet row numbers, where the header is row 1.
    ///
    /// Row `r` is ordinal `r - 1`, so rows `102..=201` select ordinals
    /// `101..=200`.
    ///
    /// # Errors
    /// [`SelectorError::HeaderRow`] if `first_row` is the header row, plus the
    /// errors of [`RangeSelector::new`].
    pub fn from_row_numbers(first_row: usize, last_row: usize) -> Result<Self, SelectorError> {
        if first_row <= 1 || last_row <= 1 {
            return Err(SelectorError::HeaderRow);
        }
        Self::new(first_row - 1, last_row - 1)
    }

    /// Single-record selector
    #[must_use]
    pub fn single(ordinal: Ordinal) -> Self {
        Self {
            low: ordinal,
            high: ordinal,
        }
    }

    /// Lower bound (inclusive)
    #[inline]
    #[must_use]
    pub fn low(&self) -> Ordinal {
        self.low
    }

    /// Upper bound (inclusive)
    #[inline]
    #[must_use]
    pub fn high(&self) -> Ordinal {
        self.high
    }

    /// Whether an ordinal is selected
    #[inline]
    #[must_use]
    pub fn contains(&self, ordinal: Ordinal) -> bool {
        self.low <= ordinal && ordinal <= self.high
    }

    /// Number of selected ordinals
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.high.get() - self.low.get() + 1
    }

    /// Never empty; present for API symmetry with `len`
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether the selector fits a record set of `record_count` records
    #[inline]
    #[must_use]
    pub fn fits(&self, record_count: usize) -> bool {
        self.high.get() <= record_count
    }

    /// Zero-based index range into a record slice
    #[inline]
    #[must_use]
    pub fn index_range(&self) -> std::ops::RangeInclusive<usize> {
        self.low.index()..=self.high.index()
    }
}

impl Display for RangeSelector {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.low, self.high)
    }
}

impl FromStr for RangeSelector {
    type Err = SelectorError;

    /// Accepts `LOW..HIGH`, `LOW..=HIGH`, `LOW-HIGH`, or a single `N`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parse = |part: &str| {
            part.trim()
                .parse::<usize>()
                .map_err(|_| SelectorError::Parse(s.to_string()))
        };

        let bounds = s
            .split_once("..=")
            .or_else(|| s.split_once(".."))
            .or_else(|| s.split_once('-'));
        match bounds {
            Some((low, high)) => Self::new(parse(low)?, parse(high)?),
            None => {
                let n = parse(s)?;
                Self::new(n, n)
            }
        }
    }
}

impl TryFrom<String> for RangeSelector {
    type Error = SelectorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RangeSelector> for String {
    fn from(selector: RangeSelector) -> Self {
        selector.to_string()
    }
}

/// Invalid selector bounds
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    /// Ordinals start at 1
    #[error("range bounds start at 1")]
    Zero,

    /// `low > high`
    #[error("range low bound {low} exceeds high bound {high}")]
    Inverted { low: usize, high: usize },

    /// Row numbers include the header row
    #[error("row 1 is the header row; data rows start at 2")]
    HeaderRow,

    /// Unparseable range text
    #[error("invalid range '{0}': expected LOW..HIGH")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ord(n: usize) -> Ordinal {
        Ordinal::new(n).unwrap()
    }

    #[test]
    fn new_validates_bounds() {
        assert!(RangeSelector::new(102, 201).is_ok());
        assert_eq!(RangeSelector::new(0, 3), Err(SelectorError::Zero));
        assert_eq!(
            RangeSelector::new(5, 4),
            Err(SelectorError::Inverted { low: 5, high: 4 })
        );
    }

    #[test]
    fn contains_is_inclusive() {
        let sel = RangeSelector::new(102, 201).unwrap();
        assert!(sel.contains(ord(102)));
        assert!(sel.contains(ord(201)));
        assert!(!sel.contains(ord(101)));
        assert!(!sel.contains(ord(202)));
        assert_eq!(sel.len(), 100);
    }

    #[test]
    fn row_numbers_skip_header() {
        let sel = RangeSelector::from_row_numbers(102, 201).unwrap();
        assert_eq!(sel.low(), ord(101));
        assert_eq!(sel.high(), ord(200));
        assert_eq!(
            RangeSelector::from_row_numbers(1, 10),
            Err(SelectorError::HeaderRow)
        );
    }

    #[test]
    fn parses_common_forms() {
        let expected = RangeSelector::new(2, 101).unwrap();
        assert_eq!("2..101".parse::<RangeSelector>().unwrap(), expected);
        assert_eq!("2..=101".parse::<RangeSelector>().unwrap(), expected);
        assert_eq!(" 2-101 ".parse::<RangeSelector>().unwrap(), expected);
        assert_eq!(
            "7".parse::<RangeSelector>().unwrap(),
            RangeSelector::single(ord(7))
        );
        assert!(matches!(
            "two..three".parse::<RangeSelector>(),
            Err(SelectorError::Parse(_))
        ));
    }

    #[test]
    fn fits_checks_high_bound() {
        let sel = RangeSelector::new(1, 10).unwrap();
        assert!(sel.fits(10));
        assert!(!sel.fits(9));
    }

    #[test]
    fn serde_as_string() {
        let sel = RangeSelector::new(2, 101).unwrap();
        let json = serde_json::to_string(&sel).unwrap();
        assert_eq!(json, "\"2..101\"");
        assert_eq!(serde_json::from_str::<RangeSelector>(&json).unwrap(), sel);
    }
}
