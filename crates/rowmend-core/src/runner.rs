//! Run pipeline
//!
//! Load, reconcile against history, repair a regression, enhance, commit.
//! Everything before the commit works on in-memory record sets, so any
//! error leaves the output file and snapshot history untouched.

use crate::commit::commit;
use crate::config::RunConfig;
use crate::error::RunError;
use crate::state::{RunState, RunTracker};
use chrono::Utc;
use rowmend_enhance::{enhance, EnhanceReport, EnhancementSet, RangeSelector};
use rowmend_record::{load_path, RecordSet};
use rowmend_recovery::{
    apply_plan, reconcile, Classification, MissingSource, ReconcileError, RecoveryPlan, Snapshot,
    SnapshotMeta, SnapshotStore, StoreError,
};
use std::path::{Path, PathBuf};

/// One `enhance` invocation
#[derive(Debug, Clone)]
pub struct EnhanceRequest {
    /// Working copy to read
    pub input: PathBuf,
    /// Where to write; defaults to `input`
    pub output: Option<PathBuf>,
    /// Records to enhance
    pub selector: RangeSelector,
    /// Text to append
    pub enhancements: EnhancementSet,
    /// Compute everything, write nothing
    pub dry_run: bool,
}

impl EnhanceRequest {
    /// In-place request
    #[must_use]
    pub fn new(input: impl Into<PathBuf>, selector: RangeSelector, enhancements: EnhancementSet) -> Self {
        Self {
            input: input.into(),
            output: None,
            selector,
            enhancements,
            dry_run: false,
        }
    }

    /// With explicit output path
    #[must_use]
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// With dry run
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Effective output path
    #[must_use]
    pub fn output_path(&self) -> &Path {
        self.output.as_deref().unwrap_or(&self.input)
    }
}

/// What a finished run did
#[derive(Debug, Clone)]
pub struct RunReport {
    /// States visited
    pub path: Vec<RunState>,
    /// Reconciliation result; `None` on a bootstrap run
    pub plan: Option<RecoveryPlan>,
    /// Enhancement accounting
    pub enhance: EnhanceReport,
    /// Snapshot written by the commit, if one happened
    pub committed: Option<SnapshotMeta>,
    /// Output path
    pub output: PathBuf,
    /// Final document, as committed (or as it would have been on a dry run)
    pub records: RecordSet,
}

impl RunReport {
    /// Fields restored from the snapshot
    #[must_use]
    pub fn restored_fields(&self) -> usize {
        self.plan.as_ref().map_or(0, |p| p.restorations.len())
    }
}

/// Outcome of [`Runner::check`]
#[derive(Debug, Clone)]
pub enum CheckOutcome {
    /// No history; the next run would bootstrap
    Bootstrap,
    /// Compared with the latest snapshot
    Reconciled(RecoveryPlan),
}

impl CheckOutcome {
    /// Classification label
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Bootstrap => "bootstrap".to_string(),
            Self::Reconciled(plan) => plan.classification.to_string(),
        }
    }
}

/// Drives runs against one snapshot store
#[derive(Debug)]
pub struct Runner<S> {
    config: RunConfig,
    store: S,
}

impl<S: SnapshotStore> Runner<S> {
    /// Runner over `store`
    #[must_use]
    pub fn new(config: RunConfig, store: S) -> Self {
        Self { config, store }
    }

    /// Configuration
    #[must_use]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Snapshot store
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Apply one enhancement batch, repairing a regressed working copy first
    ///
    /// # Errors
    /// Any [`RunError`]; on error nothing has been written.
    pub fn enhance(&mut self, request: &EnhanceRequest) -> Result<RunReport, RunError> {
        let mut tracker = RunTracker::new();
        let result = self.enhance_inner(request, &mut tracker);
        finish(&mut tracker, result)
    }

    fn enhance_inner(&mut self, request: &EnhanceRequest, tracker: &mut RunTracker) -> Result<RunReport, RunError> {
        let current = self.load(&request.input, tracker)?;
        let latest = self.fetch_latest(tracker)?;
        let (working, plan) = self.recover(&current, latest, tracker)?;

        let outcome = enhance(
            &working,
            request.selector,
            &request.enhancements,
            &self.config.enhance_options(),
        )?;
        tracker.advance(RunState::Enhanced)?;

        let output = request.output_path();
        let committed = if request.dry_run {
            tracing::info!(path = %output.display(), "dry run: nothing written");
            None
        } else {
            Some(commit(output, &outcome.records, &mut self.store, Utc::now())?.meta())
        };
        tracker.advance(RunState::Done)?;

        Ok(RunReport {
            path: tracker.path().to_vec(),
            plan,
            enhance: outcome.report,
            committed,
            output: output.to_path_buf(),
            records: outcome.records,
        })
    }

    /// Repair a regressed working copy from the latest snapshot
    ///
    /// A consistent working copy is left alone and nothing is written.
    ///
    /// # Errors
    /// [`ReconcileError::NoRecoverySource`] with no history, plus any
    /// [`RunError`] from reconciliation or commit.
    pub fn restore(&mut self, input: &Path, output: Option<&Path>, dry_run: bool) -> Result<RunReport, RunError> {
        let mut tracker = RunTracker::new();
        let result = self.restore_inner(input, output, dry_run, &mut tracker);
        finish(&mut tracker, result)
    }

    fn restore_inner(
        &mut self,
        input: &Path,
        output: Option<&Path>,
        dry_run: bool,
        tracker: &mut RunTracker,
    ) -> Result<RunReport, RunError> {
        let current = self.load(input, tracker)?;
        let latest = self.fetch_latest(tracker)?;
        if latest.is_none() {
            tracker.advance(RunState::NoSnapshot)?;
            return Err(ReconcileError::NoRecoverySource(MissingSource::NoHistory).into());
        }
        let (working, plan) = self.recover(&current, latest, tracker)?;
        tracker.advance(RunState::Enhanced)?;

        let output = output.unwrap_or(input);
        let needs_write = plan.as_ref().is_some_and(|p| !p.is_noop()) || output != input;
        let committed = if dry_run || !needs_write {
            None
        } else {
            Some(commit(output, &working, &mut self.store, Utc::now())?.meta())
        };
        tracker.advance(RunState::Done)?;

        Ok(RunReport {
            path: tracker.path().to_vec(),
            plan,
            enhance: EnhanceReport::default(),
            committed,
            output: output.to_path_buf(),
            records: working,
        })
    }

    /// Classify the working copy without writing anything
    ///
    /// # Errors
    /// Diverged and no-recovery-source conditions are errors, as they would
    /// be for a real run.
    pub fn check(&self, input: &Path) -> Result<CheckOutcome, RunError> {
        let current = load_path(input, &self.config.key_selection())?;
        match self.latest()? {
            None => {
                self.bootstrap_allowed()?;
                Ok(CheckOutcome::Bootstrap)
            }
            Some(snapshot) => {
                let plan = reconcile(&current, Some(&snapshot), self.config.separator)?;
                Ok(CheckOutcome::Reconciled(plan))
            }
        }
    }

    /// Snapshot history, oldest first
    ///
    /// # Errors
    /// [`RunError::Store`] if the history cannot be read.
    pub fn snapshots(&self) -> Result<Vec<SnapshotMeta>, RunError> {
        Ok(self.store.history()?)
    }

    fn load(&self, input: &Path, tracker: &mut RunTracker) -> Result<RecordSet, RunError> {
        let records = load_path(input, &self.config.key_selection())?;
        tracing::info!(
            path = %input.display(),
            records = records.len(),
            columns = records.header().width(),
            "input loaded"
        );
        tracker.advance(RunState::Loaded)?;
        Ok(records)
    }

    fn latest(&self) -> Result<Option<Snapshot>, RunError> {
        match self.store.get_latest() {
            Ok(latest) => Ok(latest),
            Err(StoreError::Unusable(missing)) => Err(ReconcileError::NoRecoverySource(missing).into()),
            Err(err) => Err(err.into()),
        }
    }

    /// Latest snapshot, moving to [`RunState::NoSnapshot`] if it cannot be read
    fn fetch_latest(&self, tracker: &mut RunTracker) -> Result<Option<Snapshot>, RunError> {
        match self.latest() {
            Ok(latest) => Ok(latest),
            Err(err) => {
                tracker.advance(RunState::NoSnapshot)?;
                Err(err)
            }
        }
    }

    fn bootstrap_allowed(&self) -> Result<(), RunError> {
        match self.config.expect_enhanced {
            Some(expected) => Err(RunError::ExpectedEnhanced { expected }),
            None => Ok(()),
        }
    }

    /// Reconcile `current` with history and return the working copy to enhance
    fn recover(
        &self,
        current: &RecordSet,
        latest: Option<Snapshot>,
        tracker: &mut RunTracker,
    ) -> Result<(RecordSet, Option<RecoveryPlan>), RunError> {
        let Some(snapshot) = latest else {
            if let Err(err) = self.bootstrap_allowed() {
                tracker.advance(RunState::NoSnapshot)?;
                return Err(err);
            }
            tracing::info!("no snapshot history; first run");
            tracker.advance(RunState::Bootstrap)?;
            return Ok((current.clone(), None));
        };

        let plan = match reconcile(current, Some(&snapshot), self.config.separator) {
            Ok(plan) => plan,
            Err(err) => {
                tracker.advance(match err.classification() {
                    Classification::NoSnapshot => RunState::NoSnapshot,
                    _ => RunState::Diverged,
                })?;
                return Err(err.into());
            }
        };

        match plan.classification {
            Classification::Regressed => {
                tracker.advance(RunState::Regressed)?;
                tracing::warn!(
                    snapshot = %plan.snapshot,
                    fields = plan.restorations.len(),
                    records = plan.restored_records().len(),
                    "working copy lost committed enhancements; restoring from snapshot"
                );
                let repaired = apply_plan(current, &plan)?;
                tracker.advance(RunState::Reapplied)?;
                Ok((repaired, Some(plan)))
            }
            _ => {
                tracker.advance(RunState::Consistent)?;
                Ok((current.clone(), Some(plan)))
            }
        }
    }
}

fn finish(tracker: &mut RunTracker, result: Result<RunReport, RunError>) -> Result<RunReport, RunError> {
    if let Err(err) = &result {
        tracker.fail();
        tracing::error!(
            error = %err,
            exit_code = err.exit_code(),
            path = ?tracker.path(),
            "run failed"
        );
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use rowmend_recovery::MemorySnapshotStore;
    use rowmend_test_utils::{gods_csv, write_fixture};
    use std::cell::Cell;

    /// Counts reads of the latest snapshot
    #[derive(Default)]
    struct CountingStore {
        inner: MemorySnapshotStore,
        reads: Cell<usize>,
    }

    impl SnapshotStore for CountingStore {
        fn get_latest(&self) -> Result<Option<Snapshot>, StoreError> {
            self.reads.set(self.reads.get() + 1);
            self.inner.get_latest()
        }

        fn put(&mut self, records: &RecordSet, timestamp: DateTime<Utc>) -> Result<Snapshot, StoreError> {
            self.inner.put(records, timestamp)
        }

        fn history(&self) -> Result<Vec<SnapshotMeta>, StoreError> {
            self.inner.history()
        }
    }

    #[test]
    fn restore_reads_latest_snapshot_once() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_fixture(dir.path(), "gods.csv", &gods_csv(10));
        let mut store = CountingStore::default();
        store.put(&load_path(&input, &RunConfig::new().key_selection()).unwrap(), Utc::now()).unwrap();

        let mut runner = Runner::new(RunConfig::new(), store);
        let report = runner.restore(&input, None, false).unwrap();
        assert_eq!(report.path[2], RunState::Consistent);
        assert!(report.committed.is_none());
        assert_eq!(runner.store().reads.get(), 1);
    }

    #[test]
    fn restore_without_history_stops_at_no_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_fixture(dir.path(), "gods.csv", &gods_csv(10));

        let mut runner = Runner::new(RunConfig::new(), CountingStore::default());
        let err = runner.restore(&input, None, false).unwrap_err();
        assert!(matches!(
            err,
            RunError::Reconcile(ReconcileError::NoRecoverySource(MissingSource::NoHistory))
        ));
        assert_eq!(runner.store().reads.get(), 1);
    }
}
