//! rowmend record store
//!
//! Typed, byte-exact CSV record sets.
//!
//! # Core Concepts
//!
//! - [`RecordSet`]: Header plus ordered [`Record`]s, immutable once loaded
//! - [`RecordKey`]: Identity derived from key columns, stable across reloads
//! - [`FieldPatch`]: Single-field replacement validated against a record hash
//! - [`ContentHash`]: 32-byte Blake3 hash for records and documents
//!
//! # Example
//!
//! ```rust,ignore
//! use rowmend_record::{load, serialize};
//!
//! let set = load(&std::fs::read_to_string("gods.csv")?)?;
//! assert_eq!(serialize(&set), source);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod hash;
mod loader;
mod merkle;
mod patch;
mod record;
mod writer;

pub use error::{LoadError, MalformedRecordError, PatchError};
pub use hash::{ContentHash, HashError};
pub use loader::{load, load_path, load_with, KeySelection};
pub use merkle::{Blake3Hasher, RecordMerkleTree};
pub use patch::FieldPatch;
pub use record::{
    needs_quoting, Field, Header, KeyColumns, LineEnding, Ordinal, RawRow, Record, RecordKey,
    RecordSet,
};
pub use writer::serialize;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
