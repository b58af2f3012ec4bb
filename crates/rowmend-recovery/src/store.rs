//! Snapshot storage
//!
//! History is append-only: every commit adds one snapshot and nothing is
//! ever pruned.

use crate::atomic;
use crate::error::{MissingSource, StoreError};
use crate::snapshot::{Snapshot, SnapshotMeta};
use chrono::{DateTime, Utc};
use rowmend_enhance::ParagraphSeparator;
use rowmend_record::RecordSet;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Manifest file name inside a store directory
pub const MANIFEST_FILE: &str = "manifest.json";

/// Suffix appended to an input file name to form its default store directory
pub const SIDECAR_SUFFIX: &str = ".rowmend";

const MANIFEST_VERSION: u32 = 1;

/// Persistent history of committed record sets
pub trait SnapshotStore {
    /// Most recent snapshot, verified
    ///
    /// # Errors
    /// [`StoreError::Unusable`] when history exists but its latest entry
    /// cannot be trusted; I/O and decode errors otherwise.
    fn get_latest(&self) -> Result<Option<Snapshot>, StoreError>;

    /// Record a new snapshot of `records`
    ///
    /// # Errors
    /// Any failure persisting the snapshot; history is unchanged on error.
    fn put(&mut self, records: &RecordSet, timestamp: DateTime<Utc>) -> Result<Snapshot, StoreError>;

    /// All snapshots, oldest first
    ///
    /// # Errors
    /// I/O and decode errors reading the history.
    fn history(&self) -> Result<Vec<SnapshotMeta>, StoreError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Manifest {
    version: u32,
    snapshots: Vec<ManifestEntry>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION,
            snapshots: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ManifestEntry {
    #[serde(flatten)]
    meta: SnapshotMeta,
    file: String,
}

/// Snapshots as JSON files in a directory, indexed by `manifest.json`
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    root: PathBuf,
    separator: ParagraphSeparator,
}

impl FileSnapshotStore {
    /// Store rooted at `root`; the directory is created on first write
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            separator: ParagraphSeparator::default(),
        }
    }

    /// Separator recorded on snapshots this store writes
    #[must_use]
    pub fn with_separator(mut self, separator: ParagraphSeparator) -> Self {
        self.separator = separator;
        self
    }

    /// Default sidecar store for an input file: `<input>.rowmend/`
    #[must_use]
    pub fn for_input(input: &Path) -> Self {
        let mut name = input.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(SIDECAR_SUFFIX);
        Self::new(input.with_file_name(name))
    }

    /// Store directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    fn read_manifest(&self) -> Result<Manifest, StoreError> {
        let path = self.manifest_path();
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Manifest::default()),
            Err(err) => return Err(StoreError::io(path, err)),
        };
        let manifest: Manifest = serde_json::from_str(&text).map_err(|e| StoreError::Corrupt {
            path: path.clone(),
            message: e.to_string(),
        })?;
        if manifest.version != MANIFEST_VERSION {
            return Err(StoreError::Corrupt {
                path,
                message: format!("unsupported manifest version {}", manifest.version),
            });
        }
        Ok(manifest)
    }

    fn read_snapshot(&self, entry: &ManifestEntry) -> Result<Snapshot, StoreError> {
        let unusable = |reason: String| {
            StoreError::Unusable(MissingSource::Unusable {
                id: entry.meta.id,
                reason,
            })
        };
        let path = self.root.join(&entry.file);
        let text = std::fs::read_to_string(&path)
            .map_err(|e| unusable(format!("cannot read {}: {e}", path.display())))?;
        let snapshot: Snapshot = serde_json::from_str(&text)
            .map_err(|e| unusable(format!("cannot decode {}: {e}", path.display())))?;
        if snapshot.meta() != entry.meta || !snapshot.verify() {
            return Err(unusable("integrity check failed".to_string()));
        }
        Ok(snapshot)
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn get_latest(&self) -> Result<Option<Snapshot>, StoreError> {
        let manifest = self.read_manifest()?;
        manifest
            .snapshots
            .last()
            .map(|entry| self.read_snapshot(entry))
            .transpose()
    }

    fn put(&mut self, records: &RecordSet, timestamp: DateTime<Utc>) -> Result<Snapshot, StoreError> {
        std::fs::create_dir_all(&self.root).map_err(|e| StoreError::io(&self.root, e))?;
        let mut manifest = self.read_manifest()?;

        let snapshot = Snapshot::capture(records, timestamp).with_separator(self.separator);
        let file = format!("{}.json", snapshot.id());
        let path = self.root.join(&file);
        let body = serde_json::to_vec_pretty(&snapshot).map_err(|e| StoreError::Corrupt {
            path: path.clone(),
            message: e.to_string(),
        })?;
        atomic::atomic_write(&path, &body).map_err(|e| StoreError::io(&path, e))?;

        manifest.snapshots.push(ManifestEntry {
            meta: snapshot.meta(),
            file,
        });
        let manifest_path = self.manifest_path();
        let body = serde_json::to_vec_pretty(&manifest).map_err(|e| StoreError::Corrupt {
            path: manifest_path.clone(),
            message: e.to_string(),
        })?;
        if let Err(err) = atomic::atomic_write(&manifest_path, &body) {
            atomic::discard(&path);
            return Err(StoreError::io(manifest_path, err));
        }

        tracing::info!(
            id = %snapshot.id(),
            records = records.len(),
            root = %snapshot.merkle_root().short(),
            "snapshot stored"
        );
        Ok(snapshot)
    }

    fn history(&self) -> Result<Vec<SnapshotMeta>, StoreError> {
        Ok(self
            .read_manifest()?
            .snapshots
            .into_iter()
            .map(|entry| entry.meta)
            .collect())
    }
}

/// In-memory store for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    snapshots: Vec<Snapshot>,
    separator: ParagraphSeparator,
}

impl MemorySnapshotStore {
    /// Empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Separator recorded on snapshots this store writes
    #[must_use]
    pub fn with_separator(mut self, separator: ParagraphSeparator) -> Self {
        self.separator = separator;
        self
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn get_latest(&self) -> Result<Option<Snapshot>, StoreError> {
        Ok(self.snapshots.last().cloned())
    }

    fn put(&mut self, records: &RecordSet, timestamp: DateTime<Utc>) -> Result<Snapshot, StoreError> {
        let snapshot = Snapshot::capture(records, timestamp).with_separator(self.separator);
        self.snapshots.push(snapshot.clone());
        Ok(snapshot)
    }

    fn history(&self) -> Result<Vec<SnapshotMeta>, StoreError> {
        Ok(self.snapshots.iter().map(Snapshot::meta).collect())
    }
}
