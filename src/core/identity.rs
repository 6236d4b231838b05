//! Record identity system using type-prefixed ULIDs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use ulid::Ulid;

/// Record type prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityPrefix {
    /// Company or other organization (graph node)
    Co,
    /// Issue / controversy attached to a company
    Iss,
    /// Issue type (display metadata for issues)
    Ityp,
    /// Company category
    Cat,
}

impl EntityPrefix {
    /// Get the string representation of the prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::Co => "CO",
            EntityPrefix::Iss => "ISS",
            EntityPrefix::Ityp => "ITYP",
            EntityPrefix::Cat => "CAT",
        }
    }

    /// Get all valid prefixes
    pub fn all() -> &'static [EntityPrefix] {
        &[
            EntityPrefix::Co,
            EntityPrefix::Iss,
            EntityPrefix::Ityp,
            EntityPrefix::Cat,
        ]
    }

    /// Directory (relative to the project root) holding records of this type
    pub fn directory(&self) -> &'static str {
        match self {
            EntityPrefix::Co => "companies",
            EntityPrefix::Iss => "issues",
            EntityPrefix::Ityp => "issue-types",
            EntityPrefix::Cat => "categories",
        }
    }

    /// Try to determine the prefix from a filename like "CO-xxx.cw.yaml"
    pub fn from_filename(filename: &str) -> Option<Self> {
        let upper = filename.to_uppercase();
        Self::all()
            .iter()
            .find(|prefix| upper.starts_with(&format!("{}-", prefix.as_str())))
            .copied()
    }

    /// Try to determine the prefix from a file path, falling back to the parent directory
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        if let Some(filename) = path.file_name() {
            if let Some(prefix) = Self::from_filename(&filename.to_string_lossy()) {
                return Some(prefix);
            }
        }

        for component in path.components() {
            if let std::path::Component::Normal(os_str) = component {
                let dir_name = os_str.to_string_lossy().to_lowercase();
                if let Some(prefix) = Self::all().iter().find(|p| p.directory() == dir_name) {
                    return Some(*prefix);
                }
            }
        }
        None
    }
}

impl fmt::Display for EntityPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityPrefix {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CO" => Ok(EntityPrefix::Co),
            "ISS" => Ok(EntityPrefix::Iss),
            "ITYP" => Ok(EntityPrefix::Ityp),
            "CAT" => Ok(EntityPrefix::Cat),
            _ => Err(IdParseError::InvalidPrefix(s.to_string())),
        }
    }
}

/// A unique record identifier combining a type prefix and ULID
///
/// Ordering follows the prefix and then the ULID, so ids of one type sort
/// by creation time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId {
    prefix: EntityPrefix,
    ulid: Ulid,
}

impl EntityId {
    /// Create a new EntityId with the given prefix
    pub fn new(prefix: EntityPrefix) -> Self {
        Self {
            prefix,
            ulid: Ulid::new(),
        }
    }

    /// Get the record prefix
    pub fn prefix(&self) -> EntityPrefix {
        self.prefix
    }

    /// Parse an EntityId from a string
    pub fn parse(s: &str) -> Result<Self, IdParseError> {
        s.parse()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.prefix, self.ulid)
    }
}

impl FromStr for EntityId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix_str, ulid_str) = s
            .split_once('-')
            .ok_or_else(|| IdParseError::MissingDelimiter(s.to_string()))?;

        let prefix = prefix_str.parse()?;
        let ulid = Ulid::from_string(ulid_str)
            .map_err(|e| IdParseError::InvalidUlid(ulid_str.to_string(), e.to_string()))?;

        Ok(Self { prefix, ulid })
    }
}

impl Serialize for EntityId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when parsing record IDs
#[derive(Debug, Error)]
pub enum IdParseError {
    #[error("invalid record prefix: '{0}' (valid: CO, ISS, ITYP, CAT)")]
    InvalidPrefix(String),

    #[error("missing '-' delimiter in record ID: '{0}'")]
    MissingDelimiter(String),

    #[error("invalid ULID '{0}': {1}")]
    InvalidUlid(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_generation() {
        let id = EntityId::new(EntityPrefix::Co);
        assert!(id.to_string().starts_with("CO-"));
        assert_eq!(id.to_string().len(), 29); // CO- (3) + ULID (26)
    }

    #[test]
    fn test_entity_id_parsing() {
        let original = EntityId::new(EntityPrefix::Iss);
        let parsed = EntityId::parse(&original.to_string()).unwrap();
        assert_eq!(parsed.prefix(), EntityPrefix::Iss);
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_entity_id_invalid_prefix() {
        let err = EntityId::parse("XXX-01HQ3K4N5M6P7R8S9T0VWXYZ").unwrap_err();
        assert!(matches!(err, IdParseError::InvalidPrefix(_)));
    }

    #[test]
    fn test_entity_id_missing_delimiter() {
        let err = EntityId::parse("CO01HQ3K4N5M6P7R8S9T0VWXYZ").unwrap_err();
        assert!(matches!(err, IdParseError::MissingDelimiter(_)));
    }

    #[test]
    fn test_entity_id_invalid_ulid() {
        let err = EntityId::parse("CO-notaulid").unwrap_err();
        assert!(matches!(err, IdParseError::InvalidUlid(_, _)));
    }

    #[test]
    fn test_prefix_from_path() {
        let path = std::path::Path::new("project/companies/CO-01HQ3K4N5M6P7R8S9T0VWXYZ.cw.yaml");
        assert_eq!(EntityPrefix::from_path(path), Some(EntityPrefix::Co));

        let by_dir = std::path::Path::new("project/issue-types/renamed.cw.yaml");
        assert_eq!(EntityPrefix::from_path(by_dir), Some(EntityPrefix::Ityp));
    }

    #[test]
    fn test_all_prefixes_parse() {
        for prefix in EntityPrefix::all() {
            let id = EntityId::new(*prefix);
            let parsed = EntityId::parse(&id.to_string()).unwrap();
            assert_eq!(parsed.prefix(), *prefix);
        }
    }
}
