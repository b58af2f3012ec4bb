//! rowmend recovery
//!
//! Snapshot history for committed record sets, and reconciliation of a
//! working copy against it.
//!
//! # Core Concepts
//!
//! - [`Snapshot`]: Immutable copy of a committed record set with its hashes
//! - [`SnapshotStore`]: Append-only history ([`FileSnapshotStore`], [`MemorySnapshotStore`])
//! - [`reconcile`]: Classify the working copy against the latest snapshot
//! - [`RecoveryPlan`]: Fields to restore after a regression
//!
//! Recovery never invents content. Without a snapshot there is nothing to
//! restore from, and differences that are not append-only enhancement are
//! reported for a human to resolve.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod atomic;
mod error;
mod reconcile;
mod snapshot;
mod store;

pub use error::{Conflict, MissingSource, ReconcileError, StoreError};
pub use reconcile::{
    apply_plan, reconcile, AheadField, Classification, RecoveryPlan, Restoration,
};
pub use snapshot::{Snapshot, SnapshotMeta};
pub use store::{
    FileSnapshotStore, MemorySnapshotStore, SnapshotStore, MANIFEST_FILE, SIDECAR_SUFFIX,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
