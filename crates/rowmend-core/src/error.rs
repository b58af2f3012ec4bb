//! Run errors
//!
//! Every failure a run can hit, with the process exit code it maps to and
//! the recovery steps to suggest.

use crate::config::ConfigError;
use crate::state::StateError;
use rowmend_enhance::{EnhanceError, RangeSelector, SelectorError, SourceError};
use rowmend_record::{LoadError, PatchError};
use rowmend_recovery::{Conflict, ReconcileError, StoreError};
use std::path::PathBuf;

/// Exit codes
pub mod exit_code {
    pub const OK: i32 = 0;
    pub const FAILURE: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const MALFORMED: i32 = 10;
    pub const RANGE_OUT_OF_BOUNDS: i32 = 11;
    pub const MISSING_ENHANCEMENT: i32 = 12;
    pub const DIVERGED: i32 = 13;
    pub const NO_RECOVERY_SOURCE: i32 = 14;
    pub const INVALID_ENHANCEMENTS: i32 = 15;
}

/// A failed run
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Input could not be read or parsed
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Selector text is invalid
    #[error("invalid range: {0}")]
    Selector(#[from] SelectorError),

    /// Enhancement step failed
    #[error(transparent)]
    Enhance(#[from] EnhanceError),

    /// Enhancement file is unusable
    #[error("invalid enhancement source: {0}")]
    Source(#[from] SourceError),

    /// Working copy cannot be reconciled
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    /// Rows are expected to be enhanced but there is no history to prove it
    #[error(
        "no recovery source: rows {expected} are expected to be enhanced already, \
         but no snapshot history exists"
    )]
    ExpectedEnhanced { expected: RangeSelector },

    /// Snapshot store failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Restoring from a plan failed
    #[error("restore failed: {0}")]
    Restore(#[from] PatchError),

    /// Configuration is unusable
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Writing the output failed
    #[error("failed to commit {}: {source}", .path.display())]
    Commit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Internal sequencing bug
    #[error(transparent)]
    State(#[from] StateError),
}

impl RunError {
    /// Process exit code for this error
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        use exit_code::*;
        match self {
            Self::Load(LoadError::Malformed { .. }) => MALFORMED,
            Self::Selector(_) | Self::Enhance(EnhanceError::RangeOutOfBounds { .. }) => {
                RANGE_OUT_OF_BOUNDS
            }
            Self::Enhance(EnhanceError::MissingEnhancement { .. }) => MISSING_ENHANCEMENT,
            Self::Enhance(EnhanceError::UnknownColumn { .. } | EnhanceError::KeyColumnTarget { .. })
            | Self::Source(_) => INVALID_ENHANCEMENTS,
            Self::Reconcile(ReconcileError::DivergedState { .. }) => DIVERGED,
            Self::Reconcile(ReconcileError::NoRecoverySource(_))
            | Self::ExpectedEnhanced { .. }
            | Self::Store(StoreError::Unusable(_)) => NO_RECOVERY_SOURCE,
            _ => FAILURE,
        }
    }

    /// What a human can do about it
    #[must_use]
    pub fn recovery_actions(&self) -> Vec<String> {
        let actions: &[&str] = match self.exit_code() {
            exit_code::MALFORMED => &[
                "fix the reported line in a text editor; an unbalanced quote usually swallows the rows after it",
                "re-export the file from its source spreadsheet",
            ],
            exit_code::RANGE_OUT_OF_BOUNDS => &[
                "check the row count of the input; ranges count data rows from 1",
                "use --rows if the range is in spreadsheet row numbers (header is row 1)",
            ],
            exit_code::MISSING_ENHANCEMENT => &[
                "add enhancements for the listed rows",
                "or drop --strict to pass uncovered rows through unchanged",
            ],
            exit_code::INVALID_ENHANCEMENTS => &[
                "fix the enhancement file: every entry needs exactly one of 'key' or 'ordinal' and a 'text'",
                "check that target columns exist and are not key columns",
            ],
            exit_code::DIVERGED if self.separator_changed() => &[
                "re-run with the paragraph separator the snapshot lists (separator in rowmend.toml, or --escaped-separator)",
                "compare the working copy with the latest snapshot (rowmend snapshots)",
            ],
            exit_code::DIVERGED => &[
                "resolve the listed rows by hand; rowmend will not overwrite text it did not write",
                "compare the working copy with the latest snapshot (rowmend snapshots)",
                "restore the file from a backup or your editor's history, then re-run",
            ],
            exit_code::NO_RECOVERY_SOURCE => &[
                "restore the previously enhanced file from a backup",
                "recover it from your editor's local history",
                "re-run the earlier enhancement batches first, then this one",
            ],
            _ => match self {
                Self::Restore(_) => &["the file changed during the run; re-run rowmend restore"],
                Self::Commit { .. } => &[
                    "the snapshot was stored; re-run rowmend restore to finish writing the output",
                ],
                _ => &[],
            },
        };
        actions.iter().map(|s| (*s).to_string()).collect()
    }

    fn separator_changed(&self) -> bool {
        matches!(
            self,
            Self::Reconcile(ReconcileError::DivergedState { conflicts, .. })
                if conflicts.iter().any(|c| matches!(c, Conflict::SeparatorChanged { .. }))
        )
    }
}
