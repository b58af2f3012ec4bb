//! JSON enhancement sources

use super::{EnhancementParser, SourceDocument, SourceError};

/// JSON parser
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl EnhancementParser for JsonParser {
    fn name(&self) -> &'static str {
        "json"
    }

    fn parse(&self, content: &str) -> Result<SourceDocument, SourceError> {
        serde_json::from_str(content).map_err(|e| SourceError::Syntax {
            format: self.name(),
            message: format!("line {}, column {}: {}", e.line(), e.column(), e),
        })
    }

    fn extensions(&self) -> &[&str] {
        &["json"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enhancement::EnhancementTarget;
    use rowmend_record::{Ordinal, RecordKey};

    #[test]
    fn parses_bare_list() {
        let doc = JsonParser
            .parse(r#"[{"key": ["Chaos", "Gaea"], "text": "Gaea played a pivotal role..."}]"#)
            .unwrap();
        let set = doc.into_enhancements().unwrap();
        let first = set.iter().next().unwrap();
        assert_eq!(
            first.target(),
            &EnhancementTarget::Key(RecordKey::new(["Chaos", "Gaea"]))
        );
        assert_eq!(first.text(), "Gaea played a pivotal role...");
    }

    #[test]
    fn parses_document_form() {
        let doc = JsonParser
            .parse(r#"{"column": "Description", "enhancements": [{"ordinal": 4, "text": "x"}]}"#)
            .unwrap();
        let set = doc.into_enhancements().unwrap();
        let first = set.iter().next().unwrap();
        assert_eq!(first.target(), &EnhancementTarget::Ordinal(Ordinal::new(4).unwrap()));
        assert_eq!(first.column(), Some("Description"));
    }

    #[test]
    fn rejects_unknown_fields_and_bad_syntax() {
        assert!(JsonParser.parse(r#"[{"ordinal": 1, "txt": "typo"}]"#).is_err());
        assert!(matches!(
            JsonParser.parse("[{"),
            Err(SourceError::Syntax { format: "json", .. })
        ));
    }
}
