//! YAML enhancement sources

use super::{EnhancementParser, SourceDocument, SourceError};

/// YAML parser
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlParser;

impl EnhancementParser for YamlParser {
    fn name(&self) -> &'static str {
        "yaml"
    }

    fn parse(&self, content: &str) -> Result<SourceDocument, SourceError> {
        serde_yaml::from_str(content).map_err(|e| SourceError::Syntax {
            format: self.name(),
            message: e.to_string(),
        })
    }

    fn extensions(&self) -> &[&str] {
        &["yaml", "yml"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multiline_text() {
        let yaml = "\
column: Description
enhancements:
  - key: [Chaos, Gaea]
    text: |-
      Gaea played a pivotal role.

      She bore Uranus.
  - ordinal: 3
    text: Father of the Titans.
    column: Domain
";
        let set = YamlParser.parse(yaml).unwrap().into_enhancements().unwrap();
        assert_eq!(set.len(), 2);
        let texts: Vec<_> = set.iter().map(|e| e.text()).collect();
        assert_eq!(
            texts,
            vec!["Gaea played a pivotal role.\n\nShe bore Uranus.", "Father of the Titans."]
        );
        let columns: Vec<_> = set.iter().map(|e| e.column()).collect();
        assert_eq!(columns, vec![Some("Description"), Some("Domain")]);
    }

    #[test]
    fn bad_yaml_is_syntax_error() {
        assert!(matches!(
            YamlParser.parse("- key: [unterminated"),
            Err(SourceError::Syntax { format: "yaml", .. })
        ));
    }
}
