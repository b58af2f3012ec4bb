//! Enhancements: pending append-only text edits keyed by record identity

use indexmap::IndexMap;
use rowmend_record::{Ordinal, Record, RecordKey};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Paragraph break placed between existing content and appended text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParagraphSeparator {
    /// A real blank line: `"\n\n"`
    #[default]
    Newlines,
    /// The four literal characters `\n\n`, as older exports store it
    Escaped,
}

impl ParagraphSeparator {
    /// Separator text
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newlines => "\n\n",
            Self::Escaped => "\\n\\n",
        }
    }

    /// Append `text` to `current`.
    ///
    /// Returns `None` when there is nothing to do: `text` is empty or
    /// `current` already ends with it. An empty `current` takes `text`
    /// without a leading separator.
    #[must_use]
    pub fn append(self, current: &str, text: &str) -> Option<String> {
        if text.is_empty() || current.ends_with(text) {
            return None;
        }
        if current.is_empty() {
            return Some(text.to_string());
        }
        let mut out = String::with_capacity(current.len() + self.as_str().len() + text.len());
        out.push_str(current);
        out.push_str(self.as_str());
        out.push_str(text);
        Some(out)
    }

    /// Whether `longer` is `shorter` followed by this separator and more text
    #[must_use]
    pub fn extends(self, shorter: &str, longer: &str) -> bool {
        if shorter.is_empty() {
            return !longer.is_empty();
        }
        longer
            .strip_prefix(shorter)
            .and_then(|rest| rest.strip_prefix(self.as_str()))
            .is_some_and(|appended| !appended.is_empty())
    }
}

impl Display for ParagraphSeparator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Newlines => "newlines",
            Self::Escaped => "escaped",
        })
    }
}

/// What an enhancement is addressed to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnhancementTarget {
    /// Record identity (preferred: survives reordering)
    Key(RecordKey),
    /// File position
    Ordinal(Ordinal),
}

impl Display for EnhancementTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, "key {key}"),
            Self::Ordinal(ordinal) => write!(f, "record {ordinal}"),
        }
    }
}

/// A pending append-only edit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enhancement {
    target: EnhancementTarget,
    column: Option<String>,
    text: String,
}

impl Enhancement {
    /// Enhancement addressed by record key
    #[must_use]
    pub fn for_key(key: RecordKey, text: impl Into<String>) -> Self {
        Self {
            target: EnhancementTarget::Key(key),
            column: None,
            text: text.into(),
        }
    }

    /// Enhancement addressed by ordinal
    #[must_use]
    pub fn for_ordinal(ordinal: Ordinal, text: impl Into<String>) -> Self {
        Self {
            target: EnhancementTarget::Ordinal(ordinal),
            column: None,
            text: text.into(),
        }
    }

    /// Target a specific column instead of the configured default
    #[must_use]
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Target
    #[inline]
    #[must_use]
    pub fn target(&self) -> &EnhancementTarget {
        &self.target
    }

    /// Explicit target column, if any
    #[inline]
    #[must_use]
    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    /// Text to append
    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Enhancements indexed by target, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnhancementSet {
    by_key: IndexMap<RecordKey, Enhancement>,
    by_ordinal: IndexMap<Ordinal, Enhancement>,
}

impl EnhancementSet {
    /// Empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an enhancement
    ///
    /// # Errors
    /// Returns the rejected enhancement if its target is already taken.
    pub fn insert(&mut self, enhancement: Enhancement) -> Result<(), Box<Enhancement>> {
        let taken = match &enhancement.target {
            EnhancementTarget::Key(key) => self.by_key.contains_key(key),
            EnhancementTarget::Ordinal(ordinal) => self.by_ordinal.contains_key(ordinal),
        };
        if taken {
            return Err(Box::new(enhancement));
        }
        match enhancement.target.clone() {
            EnhancementTarget::Key(key) => self.by_key.insert(key, enhancement),
            EnhancementTarget::Ordinal(ordinal) => self.by_ordinal.insert(ordinal, enhancement),
        };
        Ok(())
    }

    /// Enhancements addressed to a record: by key, then by ordinal
    pub fn matching<'a>(&'a self, record: &Record) -> impl Iterator<Item = &'a Enhancement> {
        self.by_key
            .get(record.key())
            .into_iter()
            .chain(self.by_ordinal.get(&record.ordinal()))
    }

    /// All enhancements, keyed ones first
    pub fn iter(&self) -> impl Iterator<Item = &Enhancement> {
        self.by_key.values().chain(self.by_ordinal.values())
    }

    /// Number of enhancements
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_key.len() + self.by_ordinal.len()
    }

    /// No enhancements
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<Enhancement> for EnhancementSet {
    /// Later duplicates of a target are dropped with a warning; use
    /// [`EnhancementSet::insert`] to reject them instead.
    fn from_iter<I: IntoIterator<Item = Enhancement>>(iter: I) -> Self {
        let mut set = Self::new();
        for enhancement in iter {
            if let Err(dropped) = set.insert(enhancement) {
                tracing::warn!(
                    enhancement = %dropped.target(),
                    "duplicate enhancement dropped; keeping the first"
                );
            }
        }
        set
    }
}
