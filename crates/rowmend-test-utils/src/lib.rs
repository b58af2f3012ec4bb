//! Testing utilities for rowmend workspace
//!
//! Shared fixtures: genealogy CSVs of any size, enhancement text, and a
//! helper for writing fixture files.

#![allow(missing_docs)]

use rowmend_record::{load, Ordinal, RecordKey, RecordSet};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Header of every generated fixture
pub const GODS_HEADER: &str = "Parent,Child,Domain,Description";

/// Small hand-written fixture with embedded paragraphs and quoting
pub const SAMPLE_GODS: &str = "Parent,Child,Domain,Description\n\
Chaos,Gaea,Earth,Mother Earth...\n\
Chaos,Nyx,Night,\"Goddess of night.\n\nShe was feared even by Zeus.\"\n\
Gaea,Uranus,Sky,\"Personification of the sky, \"\"starry\"\" Uranus\"\n\
Gaea,Pontus,Sea,Primordial sea\n\
Uranus,Cronus,Time,Youngest of the Titans\n";

const PARENTS: [&str; 6] = ["Chaos", "Gaea", "Uranus", "Cronus", "Zeus", "Poseidon"];
const DOMAINS: [&str; 5] = ["Earth", "Sky", "Sea", "War, strife", "Night"];

/// Child name of generated row `ordinal`
pub fn child_name(ordinal: usize) -> String {
    format!("Offspring{ordinal:03}")
}

/// Key of generated row `ordinal`
pub fn gods_key(ordinal: usize) -> RecordKey {
    RecordKey::new([PARENTS[(ordinal - 1) % PARENTS.len()].to_string(), child_name(ordinal)])
}

/// Genealogy CSV with `rows` data rows; every key is unique.
///
/// Every fifth description spans two paragraphs, and domains with commas
/// are quoted.
pub fn gods_csv(rows: usize) -> String {
    let mut out = String::new();
    out.push_str(GODS_HEADER);
    out.push('\n');
    for ordinal in 1..=rows {
        let parent = PARENTS[(ordinal - 1) % PARENTS.len()];
        let domain = DOMAINS[ordinal % DOMAINS.len()];
        let domain = if domain.contains(',') {
            format!("\"{domain}\"")
        } else {
            domain.to_string()
        };
        let description = if ordinal % 5 == 0 {
            format!("\"Born of {parent}.\n\nWorshipped in {ordinal} cities.\"")
        } else {
            format!("Born of {parent}.")
        };
        let _ = writeln!(out, "{parent},{},{domain},{description}", child_name(ordinal));
    }
    out
}

/// Loaded [`gods_csv`]
pub fn gods_records(rows: usize) -> RecordSet {
    load(&gods_csv(rows)).unwrap()
}

/// Deterministic enhancement text for a key
pub fn enhancement_text(key: &RecordKey) -> String {
    format!("{} appears in the later myths of {}.", key.parts()[1], key.parts()[0])
}

/// Keys of the records at `low..=high`
pub fn keys_between(set: &RecordSet, low: usize, high: usize) -> Vec<RecordKey> {
    (low..=high)
        .filter_map(|n| Ordinal::new(n).and_then(|o| set.get(o)))
        .map(|r| r.key().clone())
        .collect()
}

/// Write `contents` to `dir/name` and return the path
pub fn write_fixture(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}
