//! Working copy vs. snapshot reconciliation
//!
//! Records are paired by key (the n-th occurrence of a duplicated key pairs
//! with its n-th occurrence), so reordering rows is harmless. Each paired
//! field then falls into one of four cases:
//!
//! | current vs. snapshot                  | meaning                      |
//! |---------------------------------------|------------------------------|
//! | equal                                 | nothing to do                |
//! | snapshot + separator + more text      | ahead: enhanced since commit |
//! | snapshot minus its appended paragraphs| regressed: restore           |
//! | anything else                         | diverged: stop               |
//!
//! Append-only is judged with the separator the snapshot was enhanced
//! with; a run configured with a different one is reported as
//! [`Conflict::SeparatorChanged`] before any field is compared.

use crate::error::{Conflict, MissingSource, ReconcileError};
use crate::snapshot::Snapshot;
use rowmend_enhance::ParagraphSeparator;
use rowmend_record::{ContentHash, FieldPatch, Ordinal, PatchError, Record, RecordKey, RecordSet};
use std::collections::{HashMap, VecDeque};
use std::fmt::{self, Display, Formatter};
use ulid::Ulid;

/// Outcome class of a reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Working copy matches or is ahead of the snapshot
    Consistent,
    /// Working copy lost committed enhancement text
    Regressed,
    /// Working copy changed in ways enhancement cannot explain
    Diverged,
    /// No snapshot to compare against
    NoSnapshot,
}

impl Display for Classification {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Consistent => "consistent",
            Self::Regressed => "regressed",
            Self::Diverged => "diverged",
            Self::NoSnapshot => "no-snapshot",
        })
    }
}

impl ReconcileError {
    /// Classification this error stands for
    #[must_use]
    pub fn classification(&self) -> Classification {
        match self {
            Self::NoRecoverySource(_) => Classification::NoSnapshot,
            Self::DivergedState { .. } => Classification::Diverged,
        }
    }
}

/// One field to bring back from the snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restoration {
    /// Position in the working copy
    pub ordinal: Ordinal,
    /// Record identity
    pub key: RecordKey,
    /// Column position
    pub column: usize,
    /// Column name
    pub column_name: String,
    /// Snapshot text to restore
    pub text: String,
    /// Working-copy record hash the restoration was planned against
    pub base: ContentHash,
}

/// A field the working copy has enhanced beyond the snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AheadField {
    /// Position in the working copy
    pub ordinal: Ordinal,
    /// Record identity
    pub key: RecordKey,
    /// Column name
    pub column_name: String,
}

/// What reconciliation found, and what to do about it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryPlan {
    /// Snapshot the working copy was compared with
    pub snapshot: Ulid,
    /// `Consistent` or `Regressed`; the other classes are errors
    pub classification: Classification,
    /// Fields to restore, in working-copy order
    pub restorations: Vec<Restoration>,
    /// Fields ahead of the snapshot
    pub ahead: Vec<AheadField>,
}

impl RecoveryPlan {
    /// Whether applying the plan changes anything
    #[inline]
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.restorations.is_empty()
    }

    /// Distinct records touched by the restorations
    #[must_use]
    pub fn restored_records(&self) -> Vec<Ordinal> {
        let mut ordinals: Vec<_> = self.restorations.iter().map(|r| r.ordinal).collect();
        ordinals.dedup();
        ordinals
    }
}

/// Compare `current` with the last committed snapshot
///
/// # Errors
/// - [`ReconcileError::NoRecoverySource`] when `last_snapshot` is `None`
/// - [`ReconcileError::DivergedState`] listing every unexplained difference
pub fn reconcile(
    current: &RecordSet,
    last_snapshot: Option<&Snapshot>,
    separator: ParagraphSeparator,
) -> Result<RecoveryPlan, ReconcileError> {
    let snapshot = last_snapshot.ok_or(ReconcileError::NoRecoverySource(MissingSource::NoHistory))?;
    let committed = snapshot.records();
    let diverged = |conflicts| ReconcileError::DivergedState {
        snapshot: snapshot.id(),
        conflicts,
    };

    if snapshot.separator() != separator {
        return Err(diverged(vec![Conflict::SeparatorChanged {
            snapshot: snapshot.separator(),
            current: separator,
        }]));
    }

    let snapshot_names: Vec<String> = committed.header().names().map(str::to_string).collect();
    let current_names: Vec<String> = current.header().names().map(str::to_string).collect();
    if snapshot_names != current_names {
        return Err(diverged(vec![Conflict::HeaderChanged {
            snapshot: snapshot_names,
            current: current_names,
        }]));
    }
    if committed.key_columns() != current.key_columns() {
        return Err(diverged(vec![Conflict::KeyColumnsChanged]));
    }

    let mut by_key: HashMap<&RecordKey, VecDeque<&Record>> = HashMap::new();
    for record in committed.records() {
        by_key.entry(record.key()).or_default().push_back(record);
    }

    let mut conflicts = Vec::new();
    let mut restorations = Vec::new();
    let mut ahead = Vec::new();

    for record in current.records() {
        let Some(prior) = by_key.get_mut(record.key()).and_then(VecDeque::pop_front) else {
            conflicts.push(Conflict::Added {
                ordinal: record.ordinal(),
                key: record.key().clone(),
            });
            continue;
        };

        for (column, name) in current.header().names().enumerate() {
            let now = record.value(column).unwrap_or_default();
            let then = prior.value(column).unwrap_or_default();
            if now == then {
                continue;
            }
            if separator.extends(then, now) {
                ahead.push(AheadField {
                    ordinal: record.ordinal(),
                    key: record.key().clone(),
                    column_name: name.to_string(),
                });
            } else if separator.extends(now, then) {
                restorations.push(Restoration {
                    ordinal: record.ordinal(),
                    key: record.key().clone(),
                    column,
                    column_name: name.to_string(),
                    text: then.to_string(),
                    base: record.content_hash(),
                });
            } else {
                conflicts.push(Conflict::Rewritten {
                    ordinal: record.ordinal(),
                    key: record.key().clone(),
                    column: name.to_string(),
                });
            }
        }
    }

    for record in committed.records() {
        if by_key
            .get_mut(record.key())
            .and_then(VecDeque::pop_front)
            .is_some()
        {
            conflicts.push(Conflict::Removed {
                key: record.key().clone(),
            });
        }
    }

    if !conflicts.is_empty() {
        tracing::error!(snapshot = %snapshot.id(), conflicts = conflicts.len(), "working copy diverged");
        return Err(diverged(conflicts));
    }

    let classification = if restorations.is_empty() {
        Classification::Consistent
    } else {
        Classification::Regressed
    };
    tracing::info!(
        snapshot = %snapshot.id(),
        %classification,
        restorations = restorations.len(),
        ahead = ahead.len(),
        "reconciled against snapshot"
    );

    Ok(RecoveryPlan {
        snapshot: snapshot.id(),
        classification,
        restorations,
        ahead,
    })
}

/// Restore the plan's fields into `current`
///
/// Every restoration carries the hash of the record it was planned against;
/// a working copy that changed since [`reconcile`] is rejected.
///
/// # Errors
/// [`PatchError`] if `current` is not the record set the plan was made for.
pub fn apply_plan(current: &RecordSet, plan: &RecoveryPlan) -> Result<RecordSet, PatchError> {
    let patches: Vec<FieldPatch> = plan
        .restorations
        .iter()
        .map(|r| FieldPatch::against(r.ordinal, r.column, r.text.clone(), r.base))
        .collect();

    let restored = current.apply_patches(&patches)?;
    tracing::info!(
        snapshot = %plan.snapshot,
        fields = patches.len(),
        records = plan.restored_records().len(),
        "restorations applied"
    );
    Ok(restored)
}
