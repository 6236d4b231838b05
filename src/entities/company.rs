//! CO entity type - a company or other organization in the graph

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{default_revision, Entity};
use crate::core::graph::{CompanyNode, Icon, RelationType, Relationship};
use crate::core::identity::{EntityId, EntityPrefix};

/// Icon coordinates used by graph renderings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconPosition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
}

impl IconPosition {
    fn is_unset(&self) -> bool {
        self.x.is_none() && self.y.is_none()
    }
}

/// An edge pointing at this company from one of its parents
///
/// Edges live on the child's record: a company lists who owns it, who
/// invests in it, and who it is otherwise associated with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentLink {
    /// Owner / investor / associated company (CO-xxx)
    pub parent: EntityId,

    #[serde(rename = "type", default)]
    pub relation: RelationType,

    /// Date the relationship took effect
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
}

/// Company entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    /// Unique identifier (CO-xxx)
    pub id: EntityId,

    pub name: String,

    /// Category (CAT-xxx)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<EntityId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Image reference (file name or URL)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,

    #[serde(default, skip_serializing_if = "IconPosition::is_unset")]
    pub icon: IconPosition,

    /// Alternative names the company is known by
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<String>,

    /// Incoming edges, in the order they were added
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<ParentLink>,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author
    pub author: String,

    /// Record revision number
    #[serde(default = "default_revision")]
    pub entity_revision: u32,
}

impl Entity for Company {
    const PREFIX: EntityPrefix = EntityPrefix::Co;

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

impl Company {
    /// Create a new Company
    pub fn new(name: String, author: String) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Co),
            name,
            category: None,
            description: None,
            img: None,
            icon: IconPosition::default(),
            synonyms: Vec::new(),
            relationships: Vec::new(),
            created: Utc::now(),
            author,
            entity_revision: 1,
        }
    }

    /// Record a new incoming edge. Returns false if an edge of the same type
    /// from the same parent already exists.
    pub fn add_relationship(
        &mut self,
        parent: EntityId,
        relation: RelationType,
        as_of: Option<NaiveDate>,
    ) -> bool {
        if self
            .relationships
            .iter()
            .any(|r| r.parent == parent && r.relation == relation)
        {
            return false;
        }
        self.relationships.push(ParentLink {
            parent,
            relation,
            as_of,
        });
        true
    }

    /// Remove edges from `parent`, optionally only those of one type.
    /// Returns the number of edges removed.
    pub fn remove_relationship(&mut self, parent: &EntityId, relation: Option<RelationType>) -> usize {
        let before = self.relationships.len();
        self.relationships
            .retain(|r| !(r.parent == *parent && relation.map_or(true, |t| r.relation == t)));
        before - self.relationships.len()
    }

    /// The graph view of this company
    pub fn to_node(&self) -> CompanyNode {
        CompanyNode {
            id: self.id.clone(),
            name: self.name.clone(),
            category: self.category.clone(),
            description: self.description.clone().unwrap_or_default(),
            icon: Icon {
                img: self.img.clone().unwrap_or_default(),
                x: self.icon.x,
                y: self.icon.y,
            },
        }
    }

    /// The incoming edges as graph relationships
    pub fn edges(&self) -> Vec<Relationship> {
        self.relationships
            .iter()
            .map(|link| Relationship {
                parent: link.parent.clone(),
                child: self.id.clone(),
                relation: link.relation,
                as_of: link.as_of,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_company_creation() {
        let company = Company::new("Acme Holdings".to_string(), "Test Author".to_string());
        assert!(company.id.to_string().starts_with("CO-"));
        assert_eq!(company.name, "Acme Holdings");
        assert!(company.relationships.is_empty());
    }

    #[test]
    fn test_add_relationship_rejects_duplicate() {
        let mut company = Company::new("Sub".to_string(), "a".to_string());
        let parent = EntityId::new(EntityPrefix::Co);
        assert!(company.add_relationship(parent.clone(), RelationType::Ownership, None));
        assert!(!company.add_relationship(parent.clone(), RelationType::Ownership, None));
        assert!(company.add_relationship(parent, RelationType::Investment, None));
        assert_eq!(company.relationships.len(), 2);
    }

    #[test]
    fn test_remove_relationship_by_type() {
        let mut company = Company::new("Sub".to_string(), "a".to_string());
        let parent = EntityId::new(EntityPrefix::Co);
        company.add_relationship(parent.clone(), RelationType::Ownership, None);
        company.add_relationship(parent.clone(), RelationType::Other, None);

        assert_eq!(
            company.remove_relationship(&parent, Some(RelationType::Other)),
            1
        );
        assert_eq!(company.remove_relationship(&parent, None), 1);
        assert!(company.relationships.is_empty());
    }

    #[test]
    fn test_edges_point_at_company() {
        let mut company = Company::new("Sub".to_string(), "a".to_string());
        let parent = EntityId::new(EntityPrefix::Co);
        company.add_relationship(parent.clone(), RelationType::Investment, None);

        let edges = company.edges();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].parent, parent);
        assert_eq!(edges[0].child, company.id);
    }

    #[test]
    fn test_company_deserialization() {
        let yaml = r#"
id: CO-01HC2JB7SMQX7RS1Y0GFKBHPTD
name: "Globex Europe"
img: globex.png
icon:
  x: 120
  y: -40
synonyms: [Globex EU]
relationships:
  - parent: CO-01HC2JB7SMQX7RS1Y0GFKBHPTE
    type: ownership
    as_of: 2019-04-01
  - parent: CO-01HC2JB7SMQX7RS1Y0GFKBHPTF
    type: investment
created: 2024-01-15T10:00:00Z
author: "Test Author"
"#;
        let company: Company = serde_yml::from_str(yaml).unwrap();
        assert_eq!(company.name, "Globex Europe");
        assert_eq!(company.icon.x, Some(120));
        assert_eq!(company.relationships.len(), 2);
        assert_eq!(company.relationships[1].relation, RelationType::Investment);
        assert_eq!(
            company.relationships[0].as_of,
            NaiveDate::from_ymd_opt(2019, 4, 1)
        );
        assert_eq!(company.entity_revision, 1);

        let node = company.to_node();
        assert_eq!(node.icon.img, "globex.png");
    }

    #[test]
    fn test_relationship_type_defaults_to_ownership() {
        let yaml = r#"
id: CO-01HC2JB7SMQX7RS1Y0GFKBHPTD
name: Sub
relationships:
  - parent: CO-01HC2JB7SMQX7RS1Y0GFKBHPTE
created: 2024-01-15T10:00:00Z
author: a
"#;
        let company: Company = serde_yml::from_str(yaml).unwrap();
        assert_eq!(company.relationships[0].relation, RelationType::Ownership);
    }

    #[test]
    fn test_relationship_type_accepts_legacy_spellings() {
        let yaml = r#"
id: CO-01HC2JB7SMQX7RS1Y0GFKBHPTD
name: Sub
relationships:
  - parent: CO-01HC2JB7SMQX7RS1Y0GFKBHPTE
    type: 2
  - parent: CO-01HC2JB7SMQX7RS1Y0GFKBHPTF
    type: Other
created: 2024-01-15T10:00:00Z
author: a
"#;
        let company: Company = serde_yml::from_str(yaml).unwrap();
        assert_eq!(company.relationships[0].relation, RelationType::Investment);
        assert_eq!(company.relationships[1].relation, RelationType::Other);
    }
}
