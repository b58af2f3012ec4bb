//! Immutable copies of committed record sets

use chrono::{DateTime, Utc};
use rowmend_enhance::ParagraphSeparator;
use rowmend_record::{ContentHash, RecordSet};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use ulid::Ulid;

/// A committed record set with integrity hashes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    id: Ulid,
    created_at: DateTime<Utc>,
    content_hash: ContentHash,
    merkle_root: ContentHash,
    #[serde(default)]
    separator: ParagraphSeparator,
    records: RecordSet,
}

impl Snapshot {
    /// Capture `records` as of `created_at`
    #[must_use]
    pub fn capture(records: &RecordSet, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Ulid::from_datetime(SystemTime::from(created_at)),
            created_at,
            content_hash: records.content_hash(),
            merkle_root: records.merkle_root(),
            separator: ParagraphSeparator::default(),
            records: records.clone(),
        }
    }

    /// Record the paragraph separator the captured text was enhanced with
    #[must_use]
    pub fn with_separator(mut self, separator: ParagraphSeparator) -> Self {
        self.separator = separator;
        self
    }

    /// Snapshot id (sortable by creation time)
    #[inline]
    #[must_use]
    pub fn id(&self) -> Ulid {
        self.id
    }

    /// When the snapshot was taken
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Hash of the serialized document
    #[inline]
    #[must_use]
    pub fn content_hash(&self) -> ContentHash {
        self.content_hash
    }

    /// Merkle root over header and records
    #[inline]
    #[must_use]
    pub fn merkle_root(&self) -> ContentHash {
        self.merkle_root
    }

    /// Paragraph separator the captured text was enhanced with
    #[inline]
    #[must_use]
    pub fn separator(&self) -> ParagraphSeparator {
        self.separator
    }

    /// Captured records
    #[inline]
    #[must_use]
    pub fn records(&self) -> &RecordSet {
        &self.records
    }

    /// Whether the stored hashes still describe the stored records
    #[must_use]
    pub fn verify(&self) -> bool {
        self.records.merkle_root() == self.merkle_root
            && self.records.content_hash() == self.content_hash
    }

    /// Summary for history listings
    #[must_use]
    pub fn meta(&self) -> SnapshotMeta {
        SnapshotMeta {
            id: self.id,
            created_at: self.created_at,
            content_hash: self.content_hash,
            merkle_root: self.merkle_root,
            separator: self.separator,
            record_count: self.records.len(),
        }
    }
}

/// Snapshot summary, as listed in a store manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    /// Snapshot id
    pub id: Ulid,
    /// When the snapshot was taken
    pub created_at: DateTime<Utc>,
    /// Hash of the serialized document
    pub content_hash: ContentHash,
    /// Merkle root over header and records
    pub merkle_root: ContentHash,
    /// Paragraph separator the captured text was enhanced with
    #[serde(default)]
    pub separator: ParagraphSeparator,
    /// Number of data rows
    pub record_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowmend_record::load;

    #[test]
    fn capture_records_hashes() {
        let set = load("Parent,Child\nChaos,Gaea\n").unwrap();
        let snapshot = Snapshot::capture(&set, Utc::now());
        assert!(snapshot.verify());
        assert_eq!(snapshot.merkle_root(), set.merkle_root());
        assert_eq!(snapshot.meta().record_count, 1);
    }

    #[test]
    fn json_round_trip_keeps_integrity() {
        let set = load("Parent,Child,Description\nChaos,Gaea,\"Mother Earth.\n\nFirst born.\"\n")
            .unwrap();
        let snapshot = Snapshot::capture(&set, Utc::now());
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
        assert!(back.verify());
    }

    #[test]
    fn separator_is_recorded() {
        let set = load("Parent,Child\nChaos,Gaea\n").unwrap();
        let plain = Snapshot::capture(&set, Utc::now());
        assert_eq!(plain.separator(), ParagraphSeparator::Newlines);

        let escaped = plain.with_separator(ParagraphSeparator::Escaped);
        assert_eq!(escaped.meta().separator, ParagraphSeparator::Escaped);
        let json = serde_json::to_string(&escaped).unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.separator(), ParagraphSeparator::Escaped);
    }

    #[test]
    fn tampered_snapshot_fails_verification() {
        let set = load("Parent,Child,Description\nChaos,Gaea,Earth\n").unwrap();
        let snapshot = Snapshot::capture(&set, Utc::now());
        let json = serde_json::to_string(&snapshot).unwrap().replace("Earth", "Mars");
        let tampered: Snapshot = serde_json::from_str(&json).unwrap();
        assert!(!tampered.verify());
    }
}
