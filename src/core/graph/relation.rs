//! Relationship types and allowed-type sets

use serde::de::{self, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of edge between two companies
///
/// `parent` is always the owner/investor/source side, `child` the
/// owned/investee/target side.
///
/// Records may spell the type in any case or use a legacy code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationType {
    /// Parent owns the child
    Ownership,
    /// Parent holds an investment in the child
    Investment,
    /// Any other association
    Other,
}

/// Per-type lookup table: (type, persisted name, legacy code, path separator)
static RELATION_TABLE: [(RelationType, &str, u8, &str); 3] = [
    (RelationType::Ownership, "ownership", 1, "|"),
    (RelationType::Investment, "investment", 2, "|>"),
    (RelationType::Other, "other", 3, "|["),
];

impl RelationType {
    pub const ALL: [RelationType; 3] = [
        RelationType::Ownership,
        RelationType::Investment,
        RelationType::Other,
    ];

    fn row(&self) -> &'static (RelationType, &'static str, u8, &'static str) {
        // Table rows are in declaration order
        &RELATION_TABLE[*self as usize]
    }

    /// Name used in YAML records and the cache
    pub fn as_str(&self) -> &'static str {
        self.row().1
    }

    /// Separator appended to a name path when walking an edge of this type
    pub fn separator(&self) -> &'static str {
        self.row().3
    }

    /// Resolve a numeric code used by older exports (1 = ownership,
    /// 2 = investment, 3 = other)
    pub fn from_code(code: u8) -> Option<Self> {
        RELATION_TABLE
            .iter()
            .find(|(_, _, c, _)| *c == code)
            .map(|(t, _, _, _)| *t)
    }

    fn bit(&self) -> u8 {
        1 << (*self as u8)
    }
}

impl Default for RelationType {
    fn default() -> Self {
        RelationType::Ownership
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RelationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        let by_code = lower.parse::<u8>().ok().and_then(Self::from_code);
        by_code
            .or_else(|| {
                RELATION_TABLE
                    .iter()
                    .find(|(_, name, _, _)| *name == lower)
                    .map(|(t, _, _, _)| *t)
            })
            .ok_or_else(|| {
                format!(
                    "Invalid relationship type: {}. Use ownership, investment, or other",
                    s
                )
            })
    }
}

impl<'de> Deserialize<'de> for RelationType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RelationVisitor;

        impl Visitor<'_> for RelationVisitor {
            type Value = RelationType;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("ownership, investment, other, or a code from 1 to 3")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<RelationType, E> {
                v.parse()
                    .map_err(|_| E::invalid_value(Unexpected::Str(v), &self))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<RelationType, E> {
                u8::try_from(v)
                    .ok()
                    .and_then(RelationType::from_code)
                    .ok_or_else(|| E::invalid_value(Unexpected::Unsigned(v), &self))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<RelationType, E> {
                match u64::try_from(v) {
                    Ok(code) => self.visit_u64(code),
                    Err(_) => Err(E::invalid_value(Unexpected::Signed(v), &self)),
                }
            }
        }

        deserializer.deserialize_any(RelationVisitor)
    }
}

/// A set of allowed relationship types for one traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RelationSet(u8);

impl RelationSet {
    /// Ownership edges only (the default family view)
    pub const OWNERSHIP: RelationSet = RelationSet(1);
    /// Every relationship type
    pub const ALL: RelationSet = RelationSet(0b111);
    pub const EMPTY: RelationSet = RelationSet(0);

    /// Ownership only, or every type when `include_others` is set
    pub fn from_flag(include_others: bool) -> Self {
        if include_others {
            Self::ALL
        } else {
            Self::OWNERSHIP
        }
    }

    pub fn with(self, relation: RelationType) -> Self {
        RelationSet(self.0 | relation.bit())
    }

    pub fn contains(&self, relation: RelationType) -> bool {
        self.0 & relation.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Member types in declaration order
    pub fn iter(&self) -> impl Iterator<Item = RelationType> {
        let set = *self;
        RelationType::ALL
            .into_iter()
            .filter(move |t| set.contains(*t))
    }
}

impl FromIterator<RelationType> for RelationSet {
    fn from_iter<I: IntoIterator<Item = RelationType>>(iter: I) -> Self {
        iter.into_iter().fold(RelationSet::EMPTY, RelationSet::with)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separators() {
        assert_eq!(RelationType::Ownership.separator(), "|");
        assert_eq!(RelationType::Investment.separator(), "|>");
        assert_eq!(RelationType::Other.separator(), "|[");
    }

    #[test]
    fn test_legacy_codes() {
        assert_eq!(RelationType::from_code(1), Some(RelationType::Ownership));
        assert_eq!(RelationType::from_code(3), Some(RelationType::Other));
        assert_eq!(RelationType::from_code(9), None);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("Ownership".parse::<RelationType>().unwrap(), RelationType::Ownership);
        assert_eq!("2".parse::<RelationType>().unwrap(), RelationType::Investment);
        assert!("parent".parse::<RelationType>().is_err());
    }

    #[test]
    fn test_deserialize_names_and_codes() {
        let parse = |yaml: &str| serde_yml::from_str::<RelationType>(yaml);
        assert_eq!(parse("investment").unwrap(), RelationType::Investment);
        assert_eq!(parse("Ownership").unwrap(), RelationType::Ownership);
        assert_eq!(parse("2").unwrap(), RelationType::Investment);
        assert_eq!(parse("\"3\"").unwrap(), RelationType::Other);
        assert!(parse("7").is_err());
        assert!(parse("-1").is_err());
        assert!(parse("parent").is_err());
        assert_eq!(serde_yml::to_string(&RelationType::Other).unwrap().trim(), "other");
    }

    #[test]
    fn test_relation_set() {
        let owned = RelationSet::OWNERSHIP;
        assert!(owned.contains(RelationType::Ownership));
        assert!(!owned.contains(RelationType::Investment));

        let all = RelationSet::from_flag(true);
        assert_eq!(all.iter().count(), 3);

        let custom: RelationSet = [RelationType::Investment, RelationType::Other]
            .into_iter()
            .collect();
        assert!(!custom.contains(RelationType::Ownership));
        assert!(custom.contains(RelationType::Other));
        assert!(RelationSet::EMPTY.is_empty());
    }
}
