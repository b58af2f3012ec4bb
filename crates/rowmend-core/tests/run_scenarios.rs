//! End-to-end runs over real files

use pretty_assertions::assert_eq;
use rowmend_core::{CheckOutcome, EnhanceRequest, RunConfig, RunError, RunState, Runner};
use rowmend_enhance::{CoveragePolicy, Enhancement, EnhancementSet, ParagraphSeparator, RangeSelector};
use rowmend_record::{load, RecordKey};
use rowmend_recovery::{Classification, FileSnapshotStore, SnapshotStore};
use rowmend_test_utils::{enhancement_text, gods_csv, gods_records, keys_between, write_fixture};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Workspace {
    _dir: TempDir,
    input: PathBuf,
}

impl Workspace {
    fn new(rows: usize) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let input = write_fixture(dir.path(), "gods.csv", &gods_csv(rows));
        Self { _dir: dir, input }
    }

    fn runner(&self, config: RunConfig) -> Runner<FileSnapshotStore> {
        let store = config.snapshot_store(&self.input);
        Runner::new(config, store)
    }

    fn contents(&self) -> String {
        fs::read_to_string(&self.input).unwrap()
    }

    fn history_len(&self) -> usize {
        FileSnapshotStore::for_input(&self.input).history().unwrap().len()
    }
}

fn batch(low: usize, high: usize) -> (RangeSelector, EnhancementSet) {
    let reference = gods_records(250);
    let keys: Vec<RecordKey> = keys_between(&reference, low, high);
    let set = keys
        .iter()
        .map(|key| Enhancement::for_key(key.clone(), enhancement_text(key)))
        .collect();
    (RangeSelector::new(low, high).unwrap(), set)
}

fn run_batch(ws: &Workspace, config: RunConfig, low: usize, high: usize) -> Result<rowmend_core::RunReport, RunError> {
    let (selector, enhancements) = batch(low, high);
    ws.runner(config)
        .enhance(&EnhanceRequest::new(&ws.input, selector, enhancements))
}

fn assert_enhanced(path: &Path, low: usize, high: usize) {
    let set = load(&fs::read_to_string(path).unwrap()).unwrap();
    for record in &set.records()[low - 1..high] {
        let text = record.value(3).unwrap();
        assert!(
            text.ends_with(&enhancement_text(record.key())),
            "record {} not enhanced",
            record.ordinal()
        );
    }
}

#[test]
fn bootstrap_then_second_batch() {
    let ws = Workspace::new(250);

    let first = run_batch(&ws, RunConfig::new(), 1, 100).unwrap();
    assert_eq!(
        first.path,
        vec![RunState::Start, RunState::Loaded, RunState::Bootstrap, RunState::Enhanced, RunState::Done]
    );
    assert_eq!(first.enhance.modified_count(), 100);

    let second = run_batch(&ws, RunConfig::new(), 101, 200).unwrap();
    assert_eq!(second.path[2], RunState::Consistent);
    assert_eq!(second.enhance.modified_count(), 100);

    assert_enhanced(&ws.input, 1, 200);
    assert_eq!(ws.history_len(), 2);
}

#[test]
fn reverted_file_is_restored_before_next_batch() {
    let ws = Workspace::new(250);
    run_batch(&ws, RunConfig::new(), 1, 100).unwrap();

    // someone restores the pre-enhancement export over the working copy
    fs::write(&ws.input, gods_csv(250)).unwrap();

    let report = run_batch(&ws, RunConfig::new(), 101, 200).unwrap();
    assert_eq!(
        report.path,
        vec![
            RunState::Start,
            RunState::Loaded,
            RunState::Regressed,
            RunState::Reapplied,
            RunState::Enhanced,
            RunState::Done
        ]
    );
    assert_eq!(report.plan.unwrap().restored_records().len(), 100);
    assert_enhanced(&ws.input, 1, 200);
}

#[test]
fn expected_enhancement_without_history_fails() {
    let ws = Workspace::new(250);
    let before = ws.contents();
    let config = RunConfig::new().with_expect_enhanced(RangeSelector::new(1, 100).unwrap());

    let err = run_batch(&ws, config, 101, 200).unwrap_err();
    assert_eq!(err.exit_code(), 14);
    assert!(err.to_string().contains("1..100"));
    assert_eq!(ws.contents(), before);
    assert_eq!(ws.history_len(), 0);
}

#[test]
fn rewritten_text_is_never_overwritten() {
    let ws = Workspace::new(250);
    run_batch(&ws, RunConfig::new(), 1, 100).unwrap();
    let edited = ws.contents().replacen("Born of Chaos.", "Hand-edited.", 1);
    fs::write(&ws.input, &edited).unwrap();

    let err = run_batch(&ws, RunConfig::new(), 101, 200).unwrap_err();
    assert_eq!(err.exit_code(), 13);
    assert!(!err.recovery_actions().is_empty());
    assert_eq!(ws.contents(), edited);
    assert_eq!(ws.history_len(), 1);
}

#[test]
fn strict_coverage_failure_writes_nothing() {
    let ws = Workspace::new(250);
    let before = ws.contents();
    let (_, enhancements) = batch(1, 50);
    let config = RunConfig::new().with_coverage(CoveragePolicy::Strict);

    let err = ws
        .runner(config)
        .enhance(&EnhanceRequest::new(&ws.input, RangeSelector::new(1, 100).unwrap(), enhancements))
        .unwrap_err();
    assert_eq!(err.exit_code(), 12);
    assert_eq!(ws.contents(), before);
    assert_eq!(ws.history_len(), 0);
}

#[test]
fn out_of_range_selector_fails_fast() {
    let ws = Workspace::new(150);
    let err = run_batch(&ws, RunConfig::new(), 101, 200).unwrap_err();
    assert_eq!(err.exit_code(), 11);
    assert_eq!(ws.history_len(), 0);
}

#[test]
fn malformed_input_is_reported() {
    let ws = Workspace::new(10);
    fs::write(&ws.input, "Parent,Child,Description\nChaos,Gaea,\"unterminated\n").unwrap();
    let err = run_batch(&ws, RunConfig::new(), 1, 1).unwrap_err();
    assert_eq!(err.exit_code(), 10);
}

#[test]
fn dry_run_writes_nothing() {
    let ws = Workspace::new(250);
    let before = ws.contents();
    let (selector, enhancements) = batch(1, 100);

    let report = ws
        .runner(RunConfig::new())
        .enhance(&EnhanceRequest::new(&ws.input, selector, enhancements).with_dry_run(true))
        .unwrap();
    assert_eq!(report.enhance.modified_count(), 100);
    assert!(report.committed.is_none());
    assert_eq!(ws.contents(), before);
    assert_eq!(ws.history_len(), 0);
}

#[test]
fn separate_output_leaves_input_alone() {
    let ws = Workspace::new(250);
    let before = ws.contents();
    let output = ws.input.with_file_name("gods.enhanced.csv");
    let (selector, enhancements) = batch(1, 100);
    let config = RunConfig::new();
    let store = config.snapshot_store(&output);

    Runner::new(config, store)
        .enhance(&EnhanceRequest::new(&ws.input, selector, enhancements).with_output(&output))
        .unwrap();
    assert_eq!(ws.contents(), before);
    assert_enhanced(&output, 1, 100);
}

#[test]
fn missing_snapshot_file_is_no_recovery_source() {
    let ws = Workspace::new(250);
    let report = run_batch(&ws, RunConfig::new(), 1, 100).unwrap();
    let id = report.committed.unwrap().id;
    let store = FileSnapshotStore::for_input(&ws.input);
    fs::remove_file(store.root().join(format!("{id}.json"))).unwrap();

    let err = run_batch(&ws, RunConfig::new(), 101, 200).unwrap_err();
    assert_eq!(err.exit_code(), 14);
}

#[test]
fn restore_and_check() {
    let ws = Workspace::new(250);
    run_batch(&ws, RunConfig::new(), 1, 100).unwrap();
    let enhanced = ws.contents();
    fs::write(&ws.input, gods_csv(250)).unwrap();

    let mut runner = ws.runner(RunConfig::new());
    match runner.check(&ws.input).unwrap() {
        CheckOutcome::Reconciled(plan) => assert_eq!(plan.classification, Classification::Regressed),
        CheckOutcome::Bootstrap => panic!("history exists"),
    }

    let report = runner.restore(&ws.input, None, false).unwrap();
    assert_eq!(report.restored_fields(), 100);
    assert_eq!(ws.contents(), enhanced);
    assert_eq!(runner.snapshots().unwrap().len(), 2);

    assert_eq!(runner.check(&ws.input).unwrap().label(), "consistent");
}

#[test]
fn escaped_separator_survives_revert_and_restore() {
    let ws = Workspace::new(250);
    let escaped = || RunConfig::new().with_separator(ParagraphSeparator::Escaped);
    run_batch(&ws, escaped(), 1, 100).unwrap();
    let enhanced = ws.contents();
    assert!(enhanced.contains(r"Born of Chaos.\n\nOffspring001 appears"));

    fs::write(&ws.input, gods_csv(250)).unwrap();
    let mut runner = ws.runner(escaped());
    let report = runner.restore(&ws.input, None, false).unwrap();
    assert_eq!(report.path[2], RunState::Regressed);
    assert_eq!(report.restored_fields(), 100);
    assert_eq!(ws.contents(), enhanced);
    assert_enhanced(&ws.input, 1, 100);

    let consistent = run_batch(&ws, escaped(), 101, 200).unwrap();
    assert_eq!(consistent.path[2], RunState::Consistent);
    assert_enhanced(&ws.input, 1, 200);
}

#[test]
fn switching_separator_is_reported_as_divergence() {
    let ws = Workspace::new(250);
    run_batch(&ws, RunConfig::new().with_separator(ParagraphSeparator::Escaped), 1, 100).unwrap();
    fs::write(&ws.input, gods_csv(250)).unwrap();
    let reverted = ws.contents();

    let err = run_batch(&ws, RunConfig::new(), 101, 200).unwrap_err();
    assert_eq!(err.exit_code(), 13);
    assert!(err.to_string().contains("separator"), "{err}");
    assert_eq!(ws.contents(), reverted);
    assert_eq!(ws.history_len(), 1);
}

#[test]
fn restore_without_history_fails() {
    let ws = Workspace::new(20);
    let mut runner = ws.runner(RunConfig::new());
    assert_eq!(runner.check(&ws.input).unwrap().label(), "bootstrap");
    let err = runner.restore(&ws.input, None, false).unwrap_err();
    assert_eq!(err.exit_code(), 14);
}

#[test]
fn rerunning_a_batch_changes_nothing() {
    let ws = Workspace::new(250);
    run_batch(&ws, RunConfig::new(), 1, 100).unwrap();
    let once = ws.contents();
    let again = run_batch(&ws, RunConfig::new(), 1, 100).unwrap();
    assert_eq!(again.enhance.modified_count(), 0);
    assert_eq!(again.enhance.already_present.len(), 100);
    assert_eq!(ws.contents(), once);
}
