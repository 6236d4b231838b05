//! YAML error diagnostics with source spans

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// A record file problem pointing at the offending spot
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(corpweb::yaml::syntax))]
pub struct YamlSyntaxError {
    #[source_code]
    src: NamedSource<String>,

    #[label("here")]
    span: SourceSpan,

    #[help]
    help: Option<String>,

    message: String,
}

impl YamlSyntaxError {
    pub fn from_serde_error(err: &serde_yml::Error, source: &str, filename: &str) -> Self {
        let (line, column) = err
            .location()
            .map(|loc| (loc.line(), loc.column()))
            .unwrap_or((1, 1));
        let message = err.to_string();
        let help = record_hint(&message).map(str::to_string);
        Self::at_location(message, source, filename, line, column, help)
    }

    /// Error at a 1-based line and column
    pub fn at_location(
        message: impl Into<String>,
        source: &str,
        filename: &str,
        line: usize,
        column: usize,
        help: Option<String>,
    ) -> Self {
        let offset = byte_offset(source, line, column);
        Self {
            src: NamedSource::new(filename, source.to_string()),
            span: SourceSpan::from(offset..offset.saturating_add(1)),
            help,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum YamlError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] YamlSyntaxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Byte offset of a 1-based line/column, clamped to the end of the source
fn byte_offset(source: &str, line: usize, column: usize) -> usize {
    let mut start = 0;
    for (n, text) in source.split_inclusive('\n').enumerate() {
        if n + 1 == line {
            let within = text
                .char_indices()
                .nth(column.saturating_sub(1))
                .map_or(text.trim_end_matches('\n').len(), |(i, _)| i);
            return start + within;
        }
        start += text.len();
    }
    source.len().saturating_sub(1)
}

/// Hints for the mistakes people make when editing company records by hand
const HINTS: &[(&str, &str)] = &[
    ("tab", "Indent with spaces; YAML does not allow tabs"),
    ("duplicate", "Each key may appear only once per record"),
    (
        "expected ownership",
        "Relationship type is ownership, investment or other (legacy codes 1, 2, 3 also work)",
    ),
    (
        "record prefix",
        "Record IDs look like CO-<ulid>, ISS-<ulid>, ITYP-<ulid> or CAT-<ulid>",
    ),
    ("invalid ulid", "Copy the full ID from 'corpweb company list -f id'"),
    ("premature end of input", "Dates are written as YYYY-MM-DD, e.g. 2021-03-04"),
    ("input is out of range", "Dates are written as YYYY-MM-DD, e.g. 2021-03-04"),
    ("input contains invalid characters", "Dates are written as YYYY-MM-DD, e.g. 2021-03-04"),
    (
        "missing field",
        "Add the field, or create the record with a 'new' command to get a complete file",
    ),
    (
        "mapping values are not allowed",
        "Quote values that contain ': ', e.g. name: \"Acme: Europe\"",
    ),
];

fn record_hint(message: &str) -> Option<&'static str> {
    let lower = message.to_lowercase();
    HINTS
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, hint)| *hint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_offset() {
        let source = "id: CO-1\nname: Acme\n";
        assert_eq!(byte_offset(source, 1, 1), 0);
        assert_eq!(byte_offset(source, 2, 1), 9);
        assert_eq!(byte_offset(source, 2, 7), 15);
        assert_eq!(byte_offset(source, 9, 1), source.len() - 1);
    }

    #[test]
    fn test_record_hints() {
        assert!(record_hint("found character that cannot start any token: tab").is_some());
        assert!(record_hint(
            "relationships[0].type: invalid value: string \"parent\", expected ownership, investment, other, or a code from 1 to 3"
        )
        .unwrap()
        .contains("legacy codes"));
        assert!(record_hint("missing field `name`").is_some());
        assert!(record_hint("some random error").is_none());
    }

    #[test]
    fn test_bad_relation_type_gets_hint() {
        let source = "id: CO-01HC2JB7SMQX7RS1Y0GFKBHPTD\nname: Sub\nrelationships:\n  - parent: CO-01HC2JB7SMQX7RS1Y0GFKBHPTE\n    type: parent\n";
        let err = serde_yml::from_str::<crate::entities::Company>(source).unwrap_err();
        let diag = YamlSyntaxError::from_serde_error(&err, source, "sub.cw.yaml");
        assert!(diag.help.as_deref().unwrap().contains("ownership, investment or other"));
    }
}
