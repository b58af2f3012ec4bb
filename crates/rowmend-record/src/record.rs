//! Record model
//!
//! A [`RecordSet`] is an immutable, ordered view of one CSV document: the
//! [`Header`], every data [`Record`], and the framing (BOM, line endings,
//! per-field quoting, blank lines) needed to write the document back
//! byte-for-byte.
//!
//! # Invariants
//! - Ordinals run `1..=len` in file order
//! - Every record has exactly `header.width()` fields
//! - A record's [`RecordKey`] is always derived from the key columns

use crate::error::MalformedRecordError;
use crate::hash::ContentHash;
use crate::merkle::RecordMerkleTree;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// 1-based position of a data row (the header is not counted)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ordinal(usize);

impl Ordinal {
    /// The first data row
    pub const FIRST: Self = Self(1);

    /// Create an ordinal; `None` for zero
    #[inline]
    #[must_use]
    pub const fn new(value: usize) -> Option<Self> {
        if value == 0 {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Ordinal for a zero-based row index
    #[inline]
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self(index + 1)
    }

    /// 1-based value
    #[inline]
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }

    /// Zero-based row index
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 - 1
    }
}

impl Display for Ordinal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Record identity: the values of the key columns, in key-column order
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordKey(Vec<String>);

impl RecordKey {
    /// Build a key from its parts
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    /// Key parts
    #[must_use]
    pub fn parts(&self) -> &[String] {
        &self.0
    }
}

impl Display for RecordKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0.join(", "))
    }
}

/// How a row was terminated on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineEnding {
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`
    CrLf,
    /// Last row of a file without a trailing newline
    Eof,
}

impl LineEnding {
    /// Terminator text
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
            Self::Eof => "",
        }
    }
}

/// One field value plus whether it was quoted on disk
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    text: String,
    quoted: bool,
}

impl Field {
    /// Field quoted only if its content requires it
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let quoted = needs_quoting(&text);
        Self { text, quoted }
    }

    /// Field with explicit quoting
    #[must_use]
    pub fn with_quoting(text: impl Into<String>, quoted: bool) -> Self {
        Self {
            text: text.into(),
            quoted,
        }
    }

    /// Decoded value (quotes removed, doubled quotes collapsed)
    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the field is written inside quotes
    #[inline]
    #[must_use]
    pub fn is_quoted(&self) -> bool {
        self.quoted
    }

    /// Same field with new content.
    ///
    /// A quoted field stays quoted; a bare field becomes quoted only when the
    /// new content contains a separator, quote, or line break.
    #[must_use]
    pub fn replaced(&self, text: impl Into<String>) -> Self {
        let text = text.into();
        let quoted = self.quoted || needs_quoting(&text);
        Self { text, quoted }
    }

    /// Append the on-disk form of this field
    pub fn encode_into(&self, out: &mut String) {
        if self.quoted {
            out.push('"');
            for ch in self.text.chars() {
                if ch == '"' {
                    out.push('"');
                }
                out.push(ch);
            }
            out.push('"');
        } else {
            out.push_str(&self.text);
        }
    }
}

/// Whether a value must be quoted to survive a round trip
#[must_use]
pub fn needs_quoting(text: &str) -> bool {
    text.contains([',', '"', '\n', '\r'])
}

/// Header row: column names, parsed once and immutable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "HeaderRepr", into = "HeaderRepr")]
pub struct Header {
    fields: Vec<Field>,
    columns: IndexSet<String>,
    terminator: LineEnding,
}

#[derive(Serialize, Deserialize)]
struct HeaderRepr {
    fields: Vec<Field>,
    terminator: LineEnding,
}

impl TryFrom<HeaderRepr> for Header {
    type Error = MalformedRecordError;

    fn try_from(repr: HeaderRepr) -> Result<Self, Self::Error> {
        Header::new(repr.fields, repr.terminator)
    }
}

impl From<Header> for HeaderRepr {
    fn from(header: Header) -> Self {
        Self {
            fields: header.fields,
            terminator: header.terminator,
        }
    }
}

impl Header {
    /// Build a header, rejecting empty and duplicate column names
    ///
    /// # Errors
    /// [`MalformedRecordError::EmptyColumnName`] or
    /// [`MalformedRecordError::DuplicateColumn`]
    pub fn new(fields: Vec<Field>, terminator: LineEnding) -> Result<Self, MalformedRecordError> {
        let mut columns = IndexSet::with_capacity(fields.len());
        for (position, field) in fields.iter().enumerate() {
            if field.text().is_empty() {
                return Err(MalformedRecordError::EmptyColumnName { position });
            }
            if !columns.insert(field.text().to_string()) {
                return Err(MalformedRecordError::DuplicateColumn {
                    name: field.text().to_string(),
                });
            }
        }
        Ok(Self {
            fields,
            columns,
            terminator,
        })
    }

    /// Column count
    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.fields.len()
    }

    /// Position of a column by name
    #[inline]
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.get_index_of(name)
    }

    /// Column name at a position
    #[inline]
    #[must_use]
    pub fn name(&self, position: usize) -> Option<&str> {
        self.columns.get_index(position).map(String::as_str)
    }

    /// Column names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    /// Raw header fields
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Header row terminator
    #[inline]
    #[must_use]
    pub fn terminator(&self) -> LineEnding {
        self.terminator
    }
}

/// Which columns form the record key, by position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyColumns(Vec<usize>);

impl KeyColumns {
    /// First two columns (or the only column of a one-column header)
    #[must_use]
    pub fn leading(header: &Header) -> Self {
        Self((0..header.width().min(2)).collect())
    }

    /// Resolve named key columns against a header
    ///
    /// # Errors
    /// [`MalformedRecordError::UnknownKeyColumn`] for a name not in the header
    pub fn named<S: AsRef<str>>(header: &Header, names: &[S]) -> Result<Self, MalformedRecordError> {
        names
            .iter()
            .map(|name| {
                header
                    .position(name.as_ref())
                    .ok_or_else(|| MalformedRecordError::UnknownKeyColumn {
                        name: name.as_ref().to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Key column positions
    #[inline]
    #[must_use]
    pub fn positions(&self) -> &[usize] {
        &self.0
    }

    /// Whether a column is part of the key
    #[inline]
    #[must_use]
    pub fn contains(&self, position: usize) -> bool {
        self.0.contains(&position)
    }

    fn derive(&self, fields: &[Field]) -> RecordKey {
        RecordKey(
            self.0
                .iter()
                .map(|&i| fields.get(i).map(|f| f.text().to_string()).unwrap_or_default())
                .collect(),
        )
    }
}

/// One data row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    ordinal: Ordinal,
    key: RecordKey,
    fields: Vec<Field>,
    terminator: LineEnding,
    line: usize,
    blank_before: Vec<LineEnding>,
}

impl Record {
    /// Position in the file
    #[inline]
    #[must_use]
    pub fn ordinal(&self) -> Ordinal {
        self.ordinal
    }

    /// Derived identity
    #[inline]
    #[must_use]
    pub fn key(&self) -> &RecordKey {
        &self.key
    }

    /// Fields in header order
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Decoded value at a column position
    #[inline]
    #[must_use]
    pub fn value(&self, column: usize) -> Option<&str> {
        self.fields.get(column).map(Field::text)
    }

    /// Row terminator
    #[inline]
    #[must_use]
    pub fn terminator(&self) -> LineEnding {
        self.terminator
    }

    /// Physical line the row starts on (1-based, header is line 1)
    #[inline]
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Blank lines between the previous row and this one
    #[inline]
    #[must_use]
    pub fn blank_lines_before(&self) -> &[LineEnding] {
        &self.blank_before
    }

    /// Hash of the decoded field values; quoting and position do not count
    #[must_use]
    pub fn content_hash(&self) -> ContentHash {
        ContentHash::of_fields(self.fields.iter().map(Field::text))
    }

    pub(crate) fn with_fields(&self, fields: Vec<Field>) -> Self {
        Self {
            ordinal: self.ordinal,
            key: self.key.clone(),
            fields,
            terminator: self.terminator,
            line: self.line,
            blank_before: self.blank_before.clone(),
        }
    }
}

/// A row before it is numbered and keyed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    /// Fields in order
    pub fields: Vec<Field>,
    /// Row terminator
    pub terminator: LineEnding,
    /// Physical start line
    pub line: usize,
    /// Blank lines skipped before this row
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blank_before: Vec<LineEnding>,
}

/// An ordered, immutable CSV document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RecordSetRepr", into = "RecordSetRepr")]
pub struct RecordSet {
    bom: bool,
    header: Header,
    key_columns: KeyColumns,
    records: Vec<Record>,
    trailer: Vec<LineEnding>,
}

#[derive(Serialize, Deserialize)]
struct RecordSetRepr {
    bom: bool,
    header: Header,
    key_columns: KeyColumns,
    rows: Vec<RawRow>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    trailer: Vec<LineEnding>,
}

impl TryFrom<RecordSetRepr> for RecordSet {
    type Error = MalformedRecordError;

    fn try_from(repr: RecordSetRepr) -> Result<Self, Self::Error> {
        RecordSet::from_rows(repr.header, repr.key_columns, repr.rows, repr.bom)
            .map(|set| set.with_trailer(repr.trailer))
    }
}

impl From<RecordSet> for RecordSetRepr {
    fn from(set: RecordSet) -> Self {
        Self {
            bom: set.bom,
            header: set.header,
            key_columns: set.key_columns,
            rows: set
                .records
                .into_iter()
                .map(|r| RawRow {
                    fields: r.fields,
                    terminator: r.terminator,
                    line: r.line,
                    blank_before: r.blank_before,
                })
                .collect(),
            trailer: set.trailer,
        }
    }
}

impl RecordSet {
    /// Number rows, check their arity, and derive keys
    ///
    /// # Errors
    /// - [`MalformedRecordError::FieldCount`] if a row's arity differs from the header
    /// - [`MalformedRecordError::Inconsistent`] if a key column is outside the header
    pub fn from_rows(
        header: Header,
        key_columns: KeyColumns,
        rows: Vec<RawRow>,
        bom: bool,
    ) -> Result<Self, MalformedRecordError> {
        if let Some(&bad) = key_columns.positions().iter().find(|&&p| p >= header.width()) {
            return Err(MalformedRecordError::Inconsistent(format!(
                "key column position {bad} outside header of width {}",
                header.width()
            )));
        }

        let records = rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| {
                let ordinal = Ordinal::from_index(index);
                if row.fields.len() != header.width() {
                    return Err(MalformedRecordError::FieldCount {
                        ordinal,
                        line: row.line,
                        expected: header.width(),
                        actual: row.fields.len(),
                    });
                }
                Ok(Record {
                    ordinal,
                    key: key_columns.derive(&row.fields),
                    fields: row.fields,
                    terminator: row.terminator,
                    line: row.line,
                    blank_before: row.blank_before,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            bom,
            header,
            key_columns,
            records,
            trailer: Vec::new(),
        })
    }

    /// Same set with blank lines after the last row
    #[must_use]
    pub fn with_trailer(mut self, trailer: Vec<LineEnding>) -> Self {
        self.trailer = trailer;
        self
    }

    /// Header row
    #[inline]
    #[must_use]
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Key column positions
    #[inline]
    #[must_use]
    pub fn key_columns(&self) -> &KeyColumns {
        &self.key_columns
    }

    /// Whether the source started with a UTF-8 byte order mark
    #[inline]
    #[must_use]
    pub fn has_bom(&self) -> bool {
        self.bom
    }

    /// Blank lines after the last row
    #[inline]
    #[must_use]
    pub fn trailer(&self) -> &[LineEnding] {
        &self.trailer
    }

    /// Records in file order
    #[inline]
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Record count
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// No data rows
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record by ordinal
    #[inline]
    #[must_use]
    pub fn get(&self, ordinal: Ordinal) -> Option<&Record> {
        self.records.get(ordinal.index())
    }

    /// Per-record content hashes in ordinal order
    #[must_use]
    pub fn leaf_hashes(&self) -> Vec<ContentHash> {
        self.records.iter().map(Record::content_hash).collect()
    }

    /// Merkle root over the header and all record hashes
    #[must_use]
    pub fn merkle_root(&self) -> ContentHash {
        let mut leaves = Vec::with_capacity(self.records.len() + 1);
        leaves.push(ContentHash::of_fields(self.header.names()));
        leaves.extend(self.leaf_hashes());
        RecordMerkleTree::from_leaves(&leaves).root()
    }

    /// Hash of the exact bytes [`crate::serialize`] produces
    #[must_use]
    pub fn content_hash(&self) -> ContentHash {
        ContentHash::compute(crate::writer::serialize(self).as_bytes())
    }

    pub(crate) fn with_records(&self, records: Vec<Record>) -> Self {
        Self {
            bom: self.bom,
            header: self.header.clone(),
            key_columns: self.key_columns.clone(),
            records,
            trailer: self.trailer.clone(),
        }
    }
}
