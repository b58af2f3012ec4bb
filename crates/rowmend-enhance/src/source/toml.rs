//! TOML enhancement sources
//!
//! TOML has no top-level arrays, so only the document form applies:
//!
//! ```toml
//! column = "Description"
//!
//! [[enhancements]]
//! key = ["Chaos", "Gaea"]
//! text = "Gaea played a pivotal role..."
//! ```

use super::{EnhancementParser, SourceDocument, SourceError};

/// TOML parser
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlParser;

impl EnhancementParser for TomlParser {
    fn name(&self) -> &'static str {
        "toml"
    }

    fn parse(&self, content: &str) -> Result<SourceDocument, SourceError> {
        ::toml::from_str(content).map_err(|e| SourceError::Syntax {
            format: self.name(),
            message: e.message().to_string(),
        })
    }

    fn extensions(&self) -> &[&str] {
        &["toml"]
    }
}
