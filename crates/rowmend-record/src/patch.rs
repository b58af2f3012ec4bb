//! Field patches
//!
//! A [`FieldPatch`] replaces one field of one record. It carries the hash of
//! the record it was prepared against, so a batch prepared on stale data is
//! rejected instead of silently overwriting newer content. A batch is
//! single-writer: no two patches may claim the same field.

use crate::error::PatchError;
use crate::hash::ContentHash;
use crate::record::{Ordinal, Record, RecordSet};
use std::collections::{BTreeMap, HashSet};

/// Replace the value of one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPatch {
    ordinal: Ordinal,
    column: usize,
    text: String,
    base: ContentHash,
}

impl FieldPatch {
    /// Patch prepared against the current state of `record`
    #[must_use]
    pub fn new(record: &Record, column: usize, text: impl Into<String>) -> Self {
        Self {
            ordinal: record.ordinal(),
            column,
            text: text.into(),
            base: record.content_hash(),
        }
    }

    /// Patch prepared earlier against a record whose hash was `base`
    #[must_use]
    pub fn against(ordinal: Ordinal, column: usize, text: impl Into<String>, base: ContentHash) -> Self {
        Self {
            ordinal,
            column,
            text: text.into(),
            base,
        }
    }

    /// Target record
    #[inline]
    #[must_use]
    pub fn ordinal(&self) -> Ordinal {
        self.ordinal
    }

    /// Target column position
    #[inline]
    #[must_use]
    pub fn column(&self) -> usize {
        self.column
    }

    /// New field value
    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Record hash the patch expects
    #[inline]
    #[must_use]
    pub fn base(&self) -> ContentHash {
        self.base
    }
}

impl RecordSet {
    /// Apply a batch of patches, returning a new record set.
    ///
    /// The batch is validated as a whole before anything is built, so an
    /// error means no patch was applied. `self` is never modified.
    ///
    /// # Errors
    /// - [`PatchError::OrdinalOutOfRange`] / [`PatchError::UnknownColumn`] for bad targets
    /// - [`PatchError::KeyColumn`] when a patch would change record identity
    /// - [`PatchError::BaseMismatch`] when a record changed since the patch was prepared
    /// - [`PatchError::Overlapping`] when two patches claim the same field
    pub fn apply_patches(&self, patches: &[FieldPatch]) -> Result<RecordSet, PatchError> {
        let mut claimed = HashSet::with_capacity(patches.len());
        let mut by_record: BTreeMap<Ordinal, Vec<&FieldPatch>> = BTreeMap::new();

        for patch in patches {
            let record = self.get(patch.ordinal).ok_or(PatchError::OrdinalOutOfRange {
                ordinal: patch.ordinal,
                len: self.len(),
            })?;
            let column_name = self
                .header()
                .name(patch.column)
                .ok_or(PatchError::UnknownColumn {
                    column: patch.column,
                    width: self.header().width(),
                })?;
            if self.key_columns().contains(patch.column) {
                return Err(PatchError::KeyColumn {
                    ordinal: patch.ordinal,
                    column: column_name.to_string(),
                });
            }
            let actual = record.content_hash();
            if actual != patch.base {
                return Err(PatchError::BaseMismatch {
                    ordinal: patch.ordinal,
                    expected: patch.base,
                    actual,
                });
            }
            if !claimed.insert((patch.ordinal, patch.column)) {
                return Err(PatchError::Overlapping {
                    ordinal: patch.ordinal,
                    column: column_name.to_string(),
                });
            }
            by_record.entry(patch.ordinal).or_default().push(patch);
        }

        let records = self
            .records()
            .iter()
            .map(|record| match by_record.get(&record.ordinal()) {
                None => record.clone(),
                Some(patches) => {
                    let mut fields = record.fields().to_vec();
                    for patch in patches {
                        fields[patch.column] = fields[patch.column].replaced(patch.text.clone());
                    }
                    record.with_fields(fields)
                }
            })
            .collect();

        Ok(self.with_records(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load;

    const SRC: &str = "Parent,Child,Domain,Description\n\
Chaos,Gaea,Earth,Mother Earth\n\
Chaos,Nyx,Night,Goddess of night\n";

    fn second(set: &RecordSet) -> &Record {
        set.get(Ordinal::new(2).unwrap()).unwrap()
    }

    #[test]
    fn apply_replaces_only_target_field() {
        let set = load(SRC).unwrap();
        let patched = set
            .apply_patches(&[FieldPatch::new(second(&set), 3, "Primordial night")])
            .unwrap();

        assert_eq!(second(&patched).value(3), Some("Primordial night"));
        assert_eq!(patched.records()[0], set.records()[0]);
        assert_eq!(second(&set).value(3), Some("Goddess of night"));
    }

    #[test]
    fn key_columns_are_protected() {
        let set = load(SRC).unwrap();
        let result = set.apply_patches(&[FieldPatch::new(second(&set), 1, "Erebus")]);
        assert!(matches!(result, Err(PatchError::KeyColumn { .. })));
    }

    #[test]
    fn stale_patch_is_rejected() {
        let set = load(SRC).unwrap();
        let stale = FieldPatch::new(second(&set), 3, "first edit");
        let moved_on = set.apply_patches(&[stale.clone()]).unwrap();
        let result = moved_on.apply_patches(&[stale]);
        assert!(matches!(result, Err(PatchError::BaseMismatch { .. })));
    }

    #[test]
    fn deferred_patch_checks_recorded_base() {
        let set = load(SRC).unwrap();
        let base = second(&set).content_hash();
        let deferred = FieldPatch::against(Ordinal::new(2).unwrap(), 3, "Primordial night", base);
        assert_eq!(deferred, FieldPatch::new(second(&set), 3, "Primordial night"));

        let other = FieldPatch::against(Ordinal::FIRST, 3, "x", base);
        assert!(matches!(
            set.apply_patches(&[other]),
            Err(PatchError::BaseMismatch { .. })
        ));
    }

    #[test]
    fn overlapping_patches_are_rejected() {
        let set = load(SRC).unwrap();
        let result = set.apply_patches(&[
            FieldPatch::new(second(&set), 3, "one"),
            FieldPatch::new(second(&set), 3, "two"),
        ]);
        assert!(matches!(result, Err(PatchError::Overlapping { .. })));
    }

    #[test]
    fn bad_targets_are_rejected() {
        let set = load(SRC).unwrap();
        let mut patch = FieldPatch::new(second(&set), 9, "x");
        assert!(matches!(
            set.apply_patches(&[patch.clone()]),
            Err(PatchError::UnknownColumn { column: 9, width: 4 })
        ));

        patch.column = 3;
        patch.ordinal = Ordinal::new(3).unwrap();
        assert!(matches!(
            set.apply_patches(&[patch]),
            Err(PatchError::OrdinalOutOfRange { len: 2, .. })
        ));
    }
}
