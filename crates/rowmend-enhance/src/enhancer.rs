//! Range enhancer
//!
//! Appends supplemental text to one field of every selected record that has
//! an enhancement. Records outside the selector are never touched, and a
//! record that already ends with the text is left alone, so running the same
//! batch twice changes nothing the second time.

use crate::enhancement::{EnhancementSet, EnhancementTarget, ParagraphSeparator};
use crate::error::EnhanceError;
use crate::selector::RangeSelector;
use rowmend_record::{FieldPatch, Ordinal, RecordKey, RecordSet};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Column enhanced when an enhancement does not name one
pub const DEFAULT_TARGET_COLUMN: &str = "Description";

/// What to do with selected records that have no enhancement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoveragePolicy {
    /// Pass them through verbatim and log a warning
    #[default]
    Lenient,
    /// Fail with [`EnhanceError::MissingEnhancement`]
    Strict,
}

/// Enhancement options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnhanceOptions {
    /// Column used when an enhancement names none
    pub default_column: String,
    /// Paragraph break between old and new text
    pub separator: ParagraphSeparator,
    /// Missing-enhancement policy
    pub coverage: CoveragePolicy,
}

impl EnhanceOptions {
    /// Default options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With default target column
    #[inline]
    #[must_use]
    pub fn with_default_column(mut self, column: impl Into<String>) -> Self {
        self.default_column = column.into();
        self
    }

    /// With separator
    #[inline]
    #[must_use]
    pub fn with_separator(mut self, separator: ParagraphSeparator) -> Self {
        self.separator = separator;
        self
    }

    /// With coverage policy
    #[inline]
    #[must_use]
    pub fn with_coverage(mut self, coverage: CoveragePolicy) -> Self {
        self.coverage = coverage;
        self
    }
}

impl Default for EnhanceOptions {
    fn default() -> Self {
        Self {
            default_column: DEFAULT_TARGET_COLUMN.to_string(),
            separator: ParagraphSeparator::default(),
            coverage: CoveragePolicy::default(),
        }
    }
}

/// Per-run accounting of what the enhancer did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnhanceReport {
    /// Records whose field was extended
    pub applied: Vec<Ordinal>,
    /// Records that already ended with the enhancement text
    pub already_present: Vec<Ordinal>,
    /// Selected records with no enhancement (lenient mode only)
    pub uncovered: Vec<(Ordinal, RecordKey)>,
    /// Enhancements that matched no selected record
    pub unused: Vec<EnhancementTarget>,
}

impl EnhanceReport {
    /// Number of records changed
    #[inline]
    #[must_use]
    pub fn modified_count(&self) -> usize {
        self.applied.len()
    }

    /// Whether the output differs from the input
    #[inline]
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// Result of a successful [`enhance`]
#[derive(Debug, Clone)]
pub struct EnhanceOutcome {
    /// The enhanced record set
    pub records: RecordSet,
    /// What happened
    pub report: EnhanceReport,
}

/// Append enhancement text to the selected records.
///
/// Each record takes the enhancement addressed to its key, or failing that
/// the one addressed to its ordinal. `records` is not modified; discard the
/// outcome to roll back.
///
/// # Errors
/// - [`EnhanceError::RangeOutOfBounds`] if `selector.high()` exceeds the record count
/// - [`EnhanceError::UnknownColumn`] / [`EnhanceError::KeyColumnTarget`] for bad target columns
/// - [`EnhanceError::MissingEnhancement`] under [`CoveragePolicy::Strict`]
pub fn enhance(
    records: &RecordSet,
    selector: RangeSelector,
    enhancements: &EnhancementSet,
    options: &EnhanceOptions,
) -> Result<EnhanceOutcome, EnhanceError> {
    if !selector.fits(records.len()) {
        return Err(EnhanceError::RangeOutOfBounds {
            selector,
            record_count: records.len(),
        });
    }

    let header = records.header();
    let mut patches = Vec::new();
    let mut used = HashSet::new();
    let mut report = EnhanceReport::default();

    for record in &records.records()[selector.index_range()] {
        let mut matching = enhancements.matching(record);
        let Some(enhancement) = matching.next() else {
            report.uncovered.push((record.ordinal(), record.key().clone()));
            continue;
        };
        if let Some(shadowed) = matching.next() {
            tracing::warn!(
                ordinal = %record.ordinal(),
                key = %record.key(),
                shadowed = %shadowed.target(),
                "record has both a key and an ordinal enhancement; using the key"
            );
        }
        used.insert(enhancement.target().clone());

        let column = enhancement.column().unwrap_or(&options.default_column);
        let position = header
            .position(column)
            .ok_or_else(|| EnhanceError::UnknownColumn {
                target: enhancement.target().clone(),
                column: column.to_string(),
            })?;
        if records.key_columns().contains(position) {
            return Err(EnhanceError::KeyColumnTarget {
                target: enhancement.target().clone(),
                column: column.to_string(),
            });
        }

        let current = record.value(position).unwrap_or_default();
        match options.separator.append(current, enhancement.text()) {
            Some(updated) => {
                patches.push(FieldPatch::new(record, position, updated));
                report.applied.push(record.ordinal());
            }
            None => report.already_present.push(record.ordinal()),
        }
    }

    if !report.uncovered.is_empty() {
        match options.coverage {
            CoveragePolicy::Strict => {
                return Err(EnhanceError::MissingEnhancement {
                    missing: std::mem::take(&mut report.uncovered),
                })
            }
            CoveragePolicy::Lenient => {
                for (ordinal, key) in &report.uncovered {
                    tracing::warn!(%ordinal, %key, "no enhancement for selected record; passing through");
                }
            }
        }
    }

    report.unused = enhancements
        .iter()
        .map(|e| e.target().clone())
        .filter(|target| !used.contains(target))
        .collect();
    for target in &report.unused {
        tracing::warn!(enhancement = %target, %selector, "enhancement matched no selected record");
    }

    let records = records.apply_patches(&patches)?;
    tracing::info!(
        %selector,
        applied = report.applied.len(),
        already_present = report.already_present.len(),
        uncovered = report.uncovered.len(),
        "range enhanced"
    );

    Ok(EnhanceOutcome { records, report })
}
