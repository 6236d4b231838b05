//! YAML parsing with diagnostics

pub mod diagnostics;

use std::path::Path;

use serde::de::DeserializeOwned;

pub use diagnostics::{YamlError, YamlSyntaxError};

/// Parse YAML text, turning parser errors into a span-annotated diagnostic
pub fn parse_yaml<T: DeserializeOwned>(source: &str, filename: &str) -> Result<T, YamlError> {
    serde_yml::from_str(source)
        .map_err(|e| YamlError::Syntax(YamlSyntaxError::from_serde_error(&e, source, filename)))
}

/// Read and parse a YAML file
pub fn parse_yaml_file<T: DeserializeOwned>(path: &Path) -> Result<T, YamlError> {
    let source = std::fs::read_to_string(path)?;
    parse_yaml(&source, &path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, serde::Deserialize)]
    struct Named {
        name: String,
    }

    #[test]
    fn test_parse_yaml_ok() {
        let named: Named = parse_yaml("name: Acme\n", "test.yaml").unwrap();
        assert_eq!(named.name, "Acme");
    }

    #[test]
    fn test_parse_yaml_reports_syntax_error() {
        let err = parse_yaml::<Named>("name: [unclosed\n", "test.yaml").unwrap_err();
        assert!(matches!(err, YamlError::Syntax(_)));
    }
}
