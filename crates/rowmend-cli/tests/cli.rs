//! Runs the `rowmend` binary against fixture files

use pretty_assertions::assert_eq;
use rowmend_test_utils::{gods_csv, write_fixture, SAMPLE_GODS};
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn rowmend(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rowmend"))
        .current_dir(dir)
        .env_remove("ROWMEND_SNAPSHOT_DIR")
        .env("RUST_LOG", "off")
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn enhance_then_check() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "gods.csv", SAMPLE_GODS);
    write_fixture(
        dir.path(),
        "batch.json",
        r#"[{"key": ["Chaos", "Gaea"], "text": "Gaea played a pivotal role..."}]"#,
    );

    let out = rowmend(dir.path(), &["enhance", "gods.csv", "--range", "1..2", "--enhancements", "batch.json"]);
    assert_eq!(out.status.code(), Some(0), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(fs::read_to_string(&input)
        .unwrap()
        .contains("\"Mother Earth...\n\nGaea played a pivotal role...\""));
    assert!(dir.path().join("gods.csv.rowmend").join("manifest.json").exists());

    let check = rowmend(dir.path(), &["check", "gods.csv"]);
    assert_eq!(check.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&check.stdout).starts_with("consistent"));

    let history = rowmend(dir.path(), &["snapshots", "gods.csv"]);
    let listing = String::from_utf8_lossy(&history.stdout);
    assert_eq!(listing.lines().count(), 1);
    assert!(listing.trim_end().ends_with("separator=newlines"));
}

#[test]
fn row_numbers_out_of_bounds_exit_11() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), "gods.csv", &gods_csv(150));
    write_fixture(dir.path(), "batch.yaml", "[]\n");

    let out = rowmend(
        dir.path(),
        &["enhance", "gods.csv", "--rows", "--range", "102..201", "--enhancements", "batch.yaml"],
    );
    assert_eq!(out.status.code(), Some(11));
}

#[test]
fn expected_history_missing_exit_14() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "gods.csv", &gods_csv(250));
    write_fixture(dir.path(), "batch.yaml", "[]\n");

    let out = rowmend(
        dir.path(),
        &[
            "enhance",
            "gods.csv",
            "--rows",
            "--range",
            "102..201",
            "--expect-enhanced",
            "2..101",
            "--enhancements",
            "batch.yaml",
        ],
    );
    assert_eq!(out.status.code(), Some(14));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("what you can do"));
    assert_eq!(fs::read_to_string(input).unwrap(), gods_csv(250));
}

#[test]
fn bad_enhancement_file_exit_15() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), "gods.csv", SAMPLE_GODS);
    write_fixture(dir.path(), "batch.json", r#"[{"ordinal": 1, "key": ["a", "b"], "text": "x"}]"#);

    let out = rowmend(dir.path(), &["enhance", "gods.csv", "--range", "1", "--enhancements", "batch.json"]);
    assert_eq!(out.status.code(), Some(15));
}

#[test]
fn usage_error_exit_2() {
    let dir = tempfile::tempdir().unwrap();
    let out = rowmend(dir.path(), &["enhance"]);
    assert_eq!(out.status.code(), Some(2));
}
