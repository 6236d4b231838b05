//! ITYP entity type - display metadata shared by issues

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{default_revision, Entity};
use crate::core::identity::{EntityId, EntityPrefix};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueType {
    /// Unique identifier (ITYP-xxx)
    pub id: EntityId,

    pub name: String,

    #[serde(default)]
    pub icon: String,

    /// Display color, e.g. "#c0392b"
    #[serde(default)]
    pub color: String,

    /// Listed ahead of other types in issue listings
    #[serde(default)]
    pub show_on_top: bool,

    pub created: DateTime<Utc>,

    pub author: String,

    #[serde(default = "default_revision")]
    pub entity_revision: u32,
}

impl Entity for IssueType {
    const PREFIX: EntityPrefix = EntityPrefix::Ityp;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.name
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }
}

impl IssueType {
    pub fn new(name: String, author: String) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Ityp),
            name,
            icon: String::new(),
            color: String::new(),
            show_on_top: false,
            created: Utc::now(),
            author,
            entity_revision: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_type_defaults() {
        let yaml = r#"
id: ITYP-01HC2JB7SMQX7RS1Y0GFKBHPTD
name: Labor
created: 2024-01-15T10:00:00Z
author: a
"#;
        let issue_type: IssueType = serde_yml::from_str(yaml).unwrap();
        assert_eq!(issue_type.name, "Labor");
        assert!(!issue_type.show_on_top);
        assert!(issue_type.color.is_empty());
    }
}
