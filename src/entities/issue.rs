//! ISS entity type - an issue or controversy attached to one company

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{default_revision, Entity};
use crate::core::identity::{EntityId, EntityPrefix};

/// Issue entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Unique identifier (ISS-xxx)
    pub id: EntityId,

    /// Company the issue is about (CO-xxx)
    pub company: EntityId,

    /// Issue type (ITYP-xxx)
    pub issue_type: EntityId,

    /// Free-text description
    pub text: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source_url: String,

    pub start_date: NaiveDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,

    /// Still happening; sorts as today
    #[serde(default)]
    pub ongoing: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_warning: Option<String>,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author
    pub author: String,

    /// Record revision number
    #[serde(default = "default_revision")]
    pub entity_revision: u32,
}

impl Entity for Issue {
    const PREFIX: EntityPrefix = EntityPrefix::Iss;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.text
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }
}

impl Issue {
    /// Create a new Issue
    pub fn new(
        company: EntityId,
        issue_type: EntityId,
        text: String,
        start_date: NaiveDate,
        author: String,
    ) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Iss),
            company,
            issue_type,
            text,
            source_url: String::new(),
            start_date,
            end_date: None,
            ongoing: false,
            content_warning: None,
            created: Utc::now(),
            author,
            entity_revision: 1,
        }
    }

    /// End date if present, else start date
    pub fn listing_date(&self) -> NaiveDate {
        self.end_date.unwrap_or(self.start_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_issue_creation() {
        let issue = Issue::new(
            EntityId::new(EntityPrefix::Co),
            EntityId::new(EntityPrefix::Ityp),
            "Fined for price fixing".to_string(),
            date(2021, 3, 4),
            "Test Author".to_string(),
        );
        assert!(issue.id.to_string().starts_with("ISS-"));
        assert!(!issue.ongoing);
        assert_eq!(issue.listing_date(), date(2021, 3, 4));
    }

    #[test]
    fn test_issue_deserialization() {
        let yaml = r#"
id: ISS-01HC2JB7SMQX7RS1Y0GFKBHPTD
company: CO-01HC2JB7SMQX7RS1Y0GFKBHPTE
issue_type: ITYP-01HC2JB7SMQX7RS1Y0GFKBHPTF
text: "Factory strike"
source_url: https://example.org/story
start_date: 2022-05-01
end_date: 2022-07-15
content_warning: violence
created: 2024-01-15T10:00:00Z
author: "Test Author"
"#;
        let issue: Issue = serde_yml::from_str(yaml).unwrap();
        assert_eq!(issue.text, "Factory strike");
        assert_eq!(issue.listing_date(), date(2022, 7, 15));
        assert_eq!(issue.content_warning.as_deref(), Some("violence"));
        assert!(!issue.ongoing);
    }
}
