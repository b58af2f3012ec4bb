//! Error types for loading and patching record sets

use crate::record::Ordinal;
use crate::hash::ContentHash;
use std::path::PathBuf;

/// The input could not be parsed into a well-formed record set.
///
/// Line numbers are 1-based physical lines of the source text; a record whose
/// description spans several paragraphs covers several lines.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedRecordError {
    /// No header row
    #[error("input is empty: a header row is required")]
    EmptyInput,

    /// A quoted field was still open at end of input
    #[error("unterminated quoted field starting on line {line}{}", ordinal_suffix(.ordinal))]
    UnterminatedQuote {
        line: usize,
        ordinal: Option<Ordinal>,
    },

    /// A closing quote was followed by something other than a separator
    #[error("unexpected {found:?} after closing quote on line {line} (field {field})")]
    UnexpectedAfterQuote {
        line: usize,
        field: usize,
        found: char,
    },

    /// Row arity differs from the header
    #[error("record {ordinal} (line {line}) has {actual} fields, header has {expected}")]
    FieldCount {
        ordinal: Ordinal,
        line: usize,
        expected: usize,
        actual: usize,
    },

    /// Header names a column twice
    #[error("duplicate column name in header: '{name}'")]
    DuplicateColumn { name: String },

    /// Header has an empty column name
    #[error("empty column name at header position {position}")]
    EmptyColumnName { position: usize },

    /// A configured key column is not in the header
    #[error("key column '{name}' is not in the header")]
    UnknownKeyColumn { name: String },

    /// Stored rows do not form a valid record set
    #[error("inconsistent record set: {0}")]
    Inconsistent(String),
}

fn ordinal_suffix(ordinal: &Option<Ordinal>) -> String {
    ordinal.map(|o| format!(" (record {o})")).unwrap_or_default()
}

/// Loading from disk failed
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// File could not be read
    #[error("io error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File content is malformed
    #[error("malformed record in {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: MalformedRecordError,
    },
}

/// A field patch could not be applied
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    /// Patch targets a record that does not exist
    #[error("record {ordinal} does not exist (record count {len})")]
    OrdinalOutOfRange { ordinal: Ordinal, len: usize },

    /// Patch targets a column position beyond the header
    #[error("column position {column} out of range (width {width})")]
    UnknownColumn { column: usize, width: usize },

    /// Key columns carry record identity and are never patched
    #[error("record {ordinal}: column '{column}' is a key column and cannot be patched")]
    KeyColumn { ordinal: Ordinal, column: String },

    /// Record changed since the patch was prepared
    #[error("record {ordinal} changed since patch was prepared: expected {expected}, found {actual}")]
    BaseMismatch {
        ordinal: Ordinal,
        expected: ContentHash,
        actual: ContentHash,
    },

    /// Two patches in one batch claim the same field
    #[error("record {ordinal}: column '{column}' is targeted by more than one patch")]
    Overlapping { ordinal: Ordinal, column: String },
}
