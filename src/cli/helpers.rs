//! Shared helper functions for CLI commands
//!
//! Small formatting and parsing helpers used across multiple command
//! modules.

use chrono::NaiveDate;

use crate::core::graph::RelationSet;
use crate::core::identity::EntityId;

/// Format an EntityId for display, truncating if too long
///
/// IDs longer than 16 characters are truncated to 13 chars with "..." suffix.
pub fn format_short_id(id: &EntityId) -> String {
    let s = id.to_string();
    if s.len() > 16 {
        format!("{}...", &s[..13])
    } else {
        s
    }
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// clap value parser for `YYYY-MM-DD` dates
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{}' ({}); expected YYYY-MM-DD", s, e))
}

/// Relation types a family or issue view follows
///
/// `--all` on the command line wins; otherwise the configured default
/// applies, which is ownership only unless `show_all_relations` is set.
pub fn relation_scope(all_flag: bool, config_default: bool) -> RelationSet {
    RelationSet::from_flag(all_flag || config_default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::RelationType;
    use crate::core::identity::EntityPrefix;

    #[test]
    fn test_format_short_id() {
        let id = EntityId::new(EntityPrefix::Co);
        let formatted = format_short_id(&id);
        // CO- plus a 26 char ULID is 29 chars, so it is truncated
        assert!(formatted.len() <= 16);
        assert!(formatted.ends_with("..."));
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("Société Générale", 8), "Socié...");
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2021-03-04").unwrap(),
            NaiveDate::from_ymd_opt(2021, 3, 4).unwrap()
        );
        assert!(parse_date("04/03/2021").is_err());
    }

    #[test]
    fn test_relation_scope() {
        assert!(!relation_scope(false, false).contains(RelationType::Investment));
        assert!(relation_scope(true, false).contains(RelationType::Other));
        assert!(relation_scope(false, true).contains(RelationType::Investment));
    }
}
