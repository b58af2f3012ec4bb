//! Enhancement source files
//!
//! Enhancements are data, not code. A source file lists entries, each
//! addressed by record key or ordinal:
//!
//! ```yaml
//! column: Description
//! enhancements:
//!   - key: [Chaos, Gaea]
//!     text: Gaea played a pivotal role...
//!   - ordinal: 7
//!     text: Father of the Titans.
//! ```
//!
//! JSON and YAML also accept a bare list of entries. TOML needs the
//! document form (`[[enhancements]]` tables).

use crate::enhancement::{Enhancement, EnhancementSet, EnhancementTarget};
use rowmend_record::{Ordinal, RecordKey};
use serde::Deserialize;
use std::path::{Path, PathBuf};

mod json;
mod toml;
mod yaml;

pub use self::json::JsonParser;
pub use self::toml::TomlParser;
pub use self::yaml::YamlParser;

/// Errors reading an enhancement source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// No registered parser handles the file extension
    #[error("no enhancement parser for '{}' (supported: {supported})", .path.display())]
    NoParserForExtension { path: PathBuf, supported: String },

    /// Reading the file failed
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document does not parse
    #[error("{format} syntax error: {message}")]
    Syntax {
        format: &'static str,
        message: String,
    },

    /// Entry is structurally valid but unusable
    #[error("entry {index}: {reason}")]
    InvalidEntry { index: usize, reason: String },

    /// Two entries address the same record
    #[error("duplicate enhancement for {0}")]
    Duplicate(EnhancementTarget),
}

/// One entry as written in a source file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceEntry {
    /// Key column values
    #[serde(default)]
    pub key: Option<Vec<String>>,
    /// 1-based data row position
    #[serde(default)]
    pub ordinal: Option<usize>,
    /// Text to append
    pub text: String,
    /// Target column override
    #[serde(default)]
    pub column: Option<String>,
}

/// Parsed source document
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SourceDocument {
    /// Bare list of entries
    List(Vec<SourceEntry>),
    /// Entries with a document-wide default column
    Document {
        #[serde(default)]
        column: Option<String>,
        enhancements: Vec<SourceEntry>,
    },
}

impl SourceDocument {
    /// Validate entries and build an [`EnhancementSet`]
    ///
    /// # Errors
    /// [`SourceError::InvalidEntry`] for entries with both or neither of
    /// `key`/`ordinal`, an empty key, or ordinal 0;
    /// [`SourceError::Duplicate`] when two entries share a target.
    pub fn into_enhancements(self) -> Result<EnhancementSet, SourceError> {
        let (default_column, entries) = match self {
            Self::List(entries) => (None, entries),
            Self::Document {
                column,
                enhancements,
            } => (column, enhancements),
        };

        let mut set = EnhancementSet::new();
        for (index, entry) in entries.into_iter().enumerate() {
            let invalid = |reason: &str| SourceError::InvalidEntry {
                index,
                reason: reason.to_string(),
            };
            let mut enhancement = match (entry.key, entry.ordinal) {
                (Some(_), Some(_)) => return Err(invalid("has both 'key' and 'ordinal'")),
                (None, None) => return Err(invalid("needs one of 'key' or 'ordinal'")),
                (Some(key), None) if key.is_empty() => return Err(invalid("'key' is empty")),
                (Some(key), None) => Enhancement::for_key(RecordKey::new(key), entry.text),
                (None, Some(n)) => {
                    let ordinal = Ordinal::new(n).ok_or_else(|| invalid("ordinals start at 1"))?;
                    Enhancement::for_ordinal(ordinal, entry.text)
                }
            };
            if let Some(column) = entry.column.or_else(|| default_column.clone()) {
                enhancement = enhancement.with_column(column);
            }
            set.insert(enhancement)
                .map_err(|rejected| SourceError::Duplicate(rejected.target().clone()))?;
        }
        Ok(set)
    }
}

/// Parser for one enhancement source format
///
/// Implement this trait to add support for new file formats.
pub trait EnhancementParser: Send + Sync + 'static {
    /// Format name used in messages
    fn name(&self) -> &'static str;

    /// Parse file content
    fn parse(&self, content: &str) -> Result<SourceDocument, SourceError>;

    /// Supported file extensions (without dot)
    fn extensions(&self) -> &[&str];

    /// Check if this parser can handle the given path
    fn can_parse(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.extensions()
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            })
    }
}

/// Parsers selectable by file extension
pub struct ParserRegistry {
    parsers: Vec<Box<dyn EnhancementParser>>,
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("parser_count", &self.parsers.len())
            .field("extensions", &self.all_extensions())
            .finish()
    }
}

impl ParserRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// Register a parser
    pub fn register<P: EnhancementParser>(&mut self, parser: P) {
        self.parsers.push(Box::new(parser));
    }

    /// Find parser for path
    #[must_use]
    pub fn find_for_path(&self, path: &Path) -> Option<&dyn EnhancementParser> {
        self.parsers.iter().find(|p| p.can_parse(path)).map(|p| &**p)
    }

    /// Get all registered extensions
    #[must_use]
    pub fn all_extensions(&self) -> Vec<&str> {
        self.parsers
            .iter()
            .flat_map(|p| p.extensions())
            .copied()
            .collect()
    }

    /// Read and parse an enhancement file
    ///
    /// # Errors
    /// See [`SourceError`].
    pub fn load(&self, path: &Path) -> Result<EnhancementSet, SourceError> {
        let parser = self
            .find_for_path(path)
            .ok_or_else(|| SourceError::NoParserForExtension {
                path: path.to_path_buf(),
                supported: self.all_extensions().join(", "),
            })?;
        let content = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let set = parser.parse(&content)?.into_enhancements()?;
        tracing::debug!(
            path = %path.display(),
            format = parser.name(),
            entries = set.len(),
            "enhancements loaded"
        );
        Ok(set)
    }
}

/// Create default parser registry with built-in parsers
#[inline]
#[must_use]
pub fn default_parsers() -> ParserRegistry {
    let mut registry = ParserRegistry::new();
    registry.register(JsonParser);
    registry.register(YamlParser);
    registry.register(TomlParser);
    registry
}

/// Load an enhancement file with the built-in parsers
///
/// # Errors
/// See [`SourceError`].
pub fn load_enhancements(path: impl AsRef<Path>) -> Result<EnhancementSet, SourceError> {
    default_parsers().load(path.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: Option<Vec<&str>>, ordinal: Option<usize>) -> SourceEntry {
        SourceEntry {
            key: key.map(|k| k.into_iter().map(str::to_string).collect()),
            ordinal,
            text: "text".to_string(),
            column: None,
        }
    }

    #[test]
    fn registry_selects_by_extension() {
        let registry = default_parsers();
        assert_eq!(registry.find_for_path(Path::new("a.json")).unwrap().name(), "json");
        assert_eq!(registry.find_for_path(Path::new("a.yml")).unwrap().name(), "yaml");
        assert_eq!(registry.find_for_path(Path::new("a.YAML")).unwrap().name(), "yaml");
        assert_eq!(registry.find_for_path(Path::new("a.toml")).unwrap().name(), "toml");
        assert!(registry.find_for_path(Path::new("a.csv")).is_none());
        assert!(registry.find_for_path(Path::new("noext")).is_none());
    }

    #[test]
    fn entry_needs_exactly_one_target() {
        let both = SourceDocument::List(vec![entry(Some(vec!["Chaos", "Gaea"]), Some(1))]);
        assert!(matches!(
            both.into_enhancements(),
            Err(SourceError::InvalidEntry { index: 0, .. })
        ));

        let neither = SourceDocument::List(vec![entry(Some(vec!["a", "b"]), None), entry(None, None)]);
        assert!(matches!(
            neither.into_enhancements(),
            Err(SourceError::InvalidEntry { index: 1, .. })
        ));

        let zero = SourceDocument::List(vec![entry(None, Some(0))]);
        assert!(matches!(
            zero.into_enhancements(),
            Err(SourceError::InvalidEntry { .. })
        ));
    }

    #[test]
    fn duplicate_targets_rejected() {
        let doc = SourceDocument::List(vec![
            entry(Some(vec!["Chaos", "Gaea"]), None),
            entry(Some(vec!["Chaos", "Gaea"]), None),
        ]);
        match doc.into_enhancements() {
            Err(SourceError::Duplicate(target)) => {
                assert_eq!(target.to_string(), "key (Chaos, Gaea)");
            }
            other => panic!("expected Duplicate, got {other:?}"),
        }
    }

    #[test]
    fn document_column_is_default_for_entries() {
        let mut explicit = entry(None, Some(2));
        explicit.column = Some("Domain".to_string());
        let doc = SourceDocument::Document {
            column: Some("Epithet".to_string()),
            enhancements: vec![entry(None, Some(1)), explicit],
        };
        let set = doc.into_enhancements().unwrap();
        let columns: Vec<_> = set.iter().map(Enhancement::column).collect();
        assert_eq!(columns, vec![Some("Epithet"), Some("Domain")]);
    }

    #[test]
    fn unknown_extension_lists_supported() {
        let err = load_enhancements("notes.txt").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("json"));
        assert!(message.contains("toml"));
    }
}
