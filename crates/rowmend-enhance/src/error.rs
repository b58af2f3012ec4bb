//! Error types for range enhancement

use crate::enhancement::EnhancementTarget;
use crate::selector::RangeSelector;
use rowmend_record::{Ordinal, PatchError, RecordKey};

/// How many implicated rows an error message spells out
const LISTED: usize = 10;

/// Errors from [`crate::enhance`]
#[derive(Debug, thiserror::Error)]
pub enum EnhanceError {
    /// Selector reaches past the last record
    #[error("range {selector} is out of bounds: the file has {record_count} records")]
    RangeOutOfBounds {
        selector: RangeSelector,
        record_count: usize,
    },

    /// Strict coverage: some selected records have no enhancement
    #[error(
        "{} of the selected records have no enhancement: {}",
        .missing.len(),
        list_missing(.missing)
    )]
    MissingEnhancement { missing: Vec<(Ordinal, RecordKey)> },

    /// Enhancement names a column the header does not have
    #[error("{target}: column '{column}' is not in the header")]
    UnknownColumn {
        target: EnhancementTarget,
        column: String,
    },

    /// Enhancement targets a key column
    #[error("{target}: column '{column}' is a key column and cannot be enhanced")]
    KeyColumnTarget {
        target: EnhancementTarget,
        column: String,
    },

    /// Building the output failed
    #[error("patch failed: {0}")]
    Patch(#[from] PatchError),
}

impl EnhanceError {
    /// Records implicated by this error
    #[must_use]
    pub fn implicated(&self) -> Vec<Ordinal> {
        match self {
            Self::MissingEnhancement { missing } => missing.iter().map(|(o, _)| *o).collect(),
            Self::Patch(PatchError::BaseMismatch { ordinal, .. }) => vec![*ordinal],
            _ => Vec::new(),
        }
    }
}

fn list_missing(missing: &[(Ordinal, RecordKey)]) -> String {
    let mut out = missing
        .iter()
        .take(LISTED)
        .map(|(ordinal, key)| format!("{ordinal} {key}"))
        .collect::<Vec<_>>()
        .join(", ");
    if missing.len() > LISTED {
        out.push_str(&format!(" and {} more", missing.len() - LISTED));
    }
    out
}
