//! Record store loader
//!
//! Parses CSV text into a [`RecordSet`]. Quote state is tracked across raw
//! lines: a line break inside a quoted field (a multi-paragraph description)
//! is field content, and a row ends only at a line break outside quotes.
//! Blank lines between rows are not records; they are kept as framing so
//! the document still writes back byte-for-byte.

use crate::error::{LoadError, MalformedRecordError};
use crate::record::{Field, Header, KeyColumns, LineEnding, Ordinal, RawRow, RecordSet};
use std::path::Path;

const BOM: char = '\u{feff}';

/// How record keys are chosen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum KeySelection {
    /// First two columns
    #[default]
    Leading,
    /// Named columns, in the given order
    Named(Vec<String>),
}

/// Parse CSV text, keyed on the first two columns
///
/// # Errors
/// Returns [`MalformedRecordError`] on unbalanced quotes, stray characters
/// after a closing quote, or a row whose arity differs from the header.
pub fn load(source: &str) -> Result<RecordSet, MalformedRecordError> {
    load_with(source, &KeySelection::Leading)
}

/// Parse CSV text with an explicit key selection
///
/// # Errors
/// As [`load`], plus [`MalformedRecordError::UnknownKeyColumn`].
pub fn load_with(source: &str, keys: &KeySelection) -> Result<RecordSet, MalformedRecordError> {
    let (bom, body) = match source.strip_prefix(BOM) {
        Some(rest) => (true, rest),
        None => (false, source),
    };

    let mut scanner = Scanner::new(body);
    let header_row = scanner.next_row(None)?.ok_or(MalformedRecordError::EmptyInput)?;
    let header = Header::new(header_row.fields, header_row.terminator)?;

    let key_columns = match keys {
        KeySelection::Leading => KeyColumns::leading(&header),
        KeySelection::Named(names) => KeyColumns::named(&header, names)?,
    };

    let mut rows = Vec::new();
    let trailer = loop {
        let blanks = scanner.blank_lines();
        match scanner.next_row(Some(Ordinal::from_index(rows.len())))? {
            Some(mut row) => {
                row.blank_before = blanks;
                rows.push(row);
            }
            None => break blanks,
        }
    };

    Ok(RecordSet::from_rows(header, key_columns, rows, bom)?.with_trailer(trailer))
}

/// Read and parse a UTF-8 CSV file
///
/// # Errors
/// [`LoadError::Io`] if the file cannot be read, [`LoadError::Malformed`]
/// if it cannot be parsed.
pub fn load_path(path: impl AsRef<Path>, keys: &KeySelection) -> Result<RecordSet, LoadError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_with(&source, keys).map_err(|source| LoadError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

/// Byte-level CSV scanner.
///
/// Separators, quotes, and line breaks are ASCII, so slicing at their
/// positions always lands on UTF-8 boundaries.
struct Scanner<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0, line: 1 }
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.src.as_bytes().get(self.pos + offset).copied()
    }

    /// Consume empty lines at the current row start
    fn blank_lines(&mut self) -> Vec<LineEnding> {
        let mut blanks = Vec::new();
        loop {
            let ending = match (self.peek(0), self.peek(1)) {
                (Some(b'\n'), _) => LineEnding::Lf,
                (Some(b'\r'), Some(b'\n')) => LineEnding::CrLf,
                _ => return blanks,
            };
            self.pos += ending.as_str().len();
            self.line += 1;
            blanks.push(ending);
        }
    }

    /// Next row, or `None` at end of input
    fn next_row(&mut self, ordinal: Option<Ordinal>) -> Result<Option<RawRow>, MalformedRecordError> {
        if self.pos >= self.src.len() {
            return Ok(None);
        }

        let line = self.line;
        let mut fields = Vec::new();
        loop {
            let field = if self.peek(0) == Some(b'"') {
                self.quoted_field(ordinal, fields.len())?
            } else {
                self.bare_field()
            };
            fields.push(field);

            match self.peek(0) {
                Some(b',') => self.pos += 1,
                Some(b'\n') => {
                    self.pos += 1;
                    self.line += 1;
                    return Ok(Some(RawRow {
                        fields,
                        terminator: LineEnding::Lf,
                        line,
                        blank_before: Vec::new(),
                    }));
                }
                Some(b'\r') => {
                    // bare_field only stops at '\r' when '\n' follows
                    self.pos += 2;
                    self.line += 1;
                    return Ok(Some(RawRow {
                        fields,
                        terminator: LineEnding::CrLf,
                        line,
                        blank_before: Vec::new(),
                    }));
                }
                None => {
                    return Ok(Some(RawRow {
                        fields,
                        terminator: LineEnding::Eof,
                        line,
                        blank_before: Vec::new(),
                    }))
                }
                Some(other) => {
                    return Err(MalformedRecordError::Inconsistent(format!(
                        "field scanner stopped at {:?} on line {}",
                        char::from(other),
                        self.line
                    )))
                }
            }
        }
    }

    fn bare_field(&mut self) -> Field {
        let start = self.pos;
        while let Some(b) = self.peek(0) {
            match b {
                b',' | b'\n' => break,
                b'\r' if self.peek(1) == Some(b'\n') => break,
                _ => self.pos += 1,
            }
        }
        Field::with_quoting(&self.src[start..self.pos], false)
    }

    fn quoted_field(
        &mut self,
        ordinal: Option<Ordinal>,
        field: usize,
    ) -> Result<Field, MalformedRecordError> {
        let start_line = self.line;
        self.pos += 1;
        let mut text = String::new();
        let mut segment = self.pos;

        loop {
            match self.peek(0) {
                None => {
                    return Err(MalformedRecordError::UnterminatedQuote {
                        line: start_line,
                        ordinal,
                    })
                }
                Some(b'"') if self.peek(1) == Some(b'"') => {
                    text.push_str(&self.src[segment..=self.pos]);
                    self.pos += 2;
                    segment = self.pos;
                }
                Some(b'"') => {
                    text.push_str(&self.src[segment..self.pos]);
                    self.pos += 1;
                    break;
                }
                Some(b'\n') => {
                    self.line += 1;
                    self.pos += 1;
                }
                Some(_) => self.pos += 1,
            }
        }

        match self.peek(0) {
            None | Some(b',' | b'\n') => Ok(Field::with_quoting(text, true)),
            Some(b'\r') if self.peek(1) == Some(b'\n') => Ok(Field::with_quoting(text, true)),
            Some(_) => {
                let found = self.src[self.pos..].chars().next().unwrap_or('\u{fffd}');
                Err(MalformedRecordError::UnexpectedAfterQuote {
                    line: self.line,
                    field,
                    found,
                })
            }
        }
    }
}
