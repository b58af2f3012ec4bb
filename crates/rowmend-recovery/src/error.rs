//! Recovery errors

use rowmend_enhance::ParagraphSeparator;
use rowmend_record::{Ordinal, RecordKey};
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;
use ulid::Ulid;

/// How many conflicts an error message spells out
const LISTED: usize = 10;

/// A difference between working copy and snapshot that append-only
/// enhancement cannot explain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    /// Column names differ
    HeaderChanged {
        snapshot: Vec<String>,
        current: Vec<String>,
    },
    /// Key columns differ
    KeyColumnsChanged,
    /// The run separates paragraphs differently from the snapshot
    SeparatorChanged {
        snapshot: ParagraphSeparator,
        current: ParagraphSeparator,
    },
    /// Field text was rewritten, not extended or truncated to a prior state
    Rewritten {
        ordinal: Ordinal,
        key: RecordKey,
        column: String,
    },
    /// Record exists only in the working copy
    Added { ordinal: Ordinal, key: RecordKey },
    /// Record exists only in the snapshot
    Removed { key: RecordKey },
}

impl Display for Conflict {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeaderChanged { snapshot, current } => write!(
                f,
                "header changed from [{}] to [{}]",
                snapshot.join(", "),
                current.join(", ")
            ),
            Self::KeyColumnsChanged => f.write_str("key columns changed"),
            Self::SeparatorChanged { snapshot, current } => write!(
                f,
                "paragraph separator is '{current}' but the snapshot was enhanced with '{snapshot}'"
            ),
            Self::Rewritten {
                ordinal,
                key,
                column,
            } => write!(f, "record {ordinal} {key}: '{column}' was rewritten"),
            Self::Added { ordinal, key } => write!(f, "record {ordinal} {key} is not in the snapshot"),
            Self::Removed { key } => write!(f, "{key} is missing from the working copy"),
        }
    }
}

/// Why no trustworthy snapshot is available
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingSource {
    /// The store has no history
    NoHistory,
    /// The manifest lists a snapshot that is gone, unreadable or corrupt
    Unusable { id: Ulid, reason: String },
}

impl Display for MissingSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoHistory => f.write_str("no snapshot history exists"),
            Self::Unusable { id, reason } => write!(f, "snapshot {id} is unusable: {reason}"),
        }
    }
}

/// Reconciliation failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    /// Nothing to compare against
    #[error("no recovery source: {0}")]
    NoRecoverySource(MissingSource),

    /// The working copy changed in a way recovery must not paper over
    #[error(
        "working copy diverged from snapshot {snapshot} in {} place(s): {}",
        .conflicts.len(),
        list_conflicts(.conflicts)
    )]
    DivergedState {
        snapshot: Ulid,
        conflicts: Vec<Conflict>,
    },
}

fn list_conflicts(conflicts: &[Conflict]) -> String {
    let mut out = conflicts
        .iter()
        .take(LISTED)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    if conflicts.len() > LISTED {
        out.push_str(&format!(" and {} more", conflicts.len() - LISTED));
    }
    out
}

/// Snapshot store failure
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem access failed
    #[error("snapshot store io error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A manifest or snapshot file does not decode
    #[error("corrupt snapshot store file {}: {message}", .path.display())]
    Corrupt { path: PathBuf, message: String },

    /// A listed snapshot is missing, unreadable, or fails verification
    #[error("{0}")]
    Unusable(MissingSource),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
