//! Commit boundary
//!
//! The only place a run touches the output file. Order:
//!
//! 1. serialize to `<output>.tmp` and sync it
//! 2. store the snapshot
//! 3. rename the temp file over the output and sync the directory
//!
//! A snapshot failure removes the temp file and leaves both the output and
//! history as they were. A rename failure after step 2 also removes the temp
//! file but leaves a snapshot the working copy lacks, which the next run
//! classifies as regressed and restores.

use crate::error::RunError;
use chrono::{DateTime, Utc};
use rowmend_record::{serialize, RecordSet};
use rowmend_recovery::{atomic, Snapshot, SnapshotStore};
use std::path::Path;

/// Write `records` to `output` and record them in `store`
///
/// # Errors
/// [`RunError::Commit`] for I/O failures on the output,
/// [`RunError::Store`] if the snapshot cannot be stored.
pub fn commit<S: SnapshotStore + ?Sized>(
    output: &Path,
    records: &RecordSet,
    store: &mut S,
    timestamp: DateTime<Utc>,
) -> Result<Snapshot, RunError> {
    let commit_err = |source| RunError::Commit {
        path: output.to_path_buf(),
        source,
    };

    let bytes = serialize(records);
    let tmp = atomic::write_temp(output, bytes.as_bytes()).map_err(commit_err)?;

    let snapshot = match store.put(records, timestamp) {
        Ok(snapshot) => snapshot,
        Err(err) => {
            atomic::discard(&tmp);
            return Err(err.into());
        }
    };

    atomic::replace(&tmp, output).map_err(|source| {
        tracing::error!(
            path = %output.display(),
            snapshot = %snapshot.id(),
            %source,
            "output rename failed after snapshot was stored"
        );
        atomic::discard(&tmp);
        commit_err(source)
    })?;

    tracing::info!(
        path = %output.display(),
        bytes = bytes.len(),
        snapshot = %snapshot.id(),
        "committed"
    );
    Ok(snapshot)
}
