//! CAT entity type - hierarchical company classification

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{default_revision, Entity};
use crate::core::identity::{EntityId, EntityPrefix};

/// Category entity. Categories form a DAG through `parents`; a category
/// without parents is a root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier (CAT-xxx)
    pub id: EntityId,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Parent categories (CAT-xxx)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<EntityId>,

    pub created: DateTime<Utc>,

    pub author: String,

    #[serde(default = "default_revision")]
    pub entity_revision: u32,
}

impl Entity for Category {
    const PREFIX: EntityPrefix = EntityPrefix::Cat;

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

impl Category {
    pub fn new(name: String, author: String) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Cat),
            name,
            description: None,
            parents: Vec::new(),
            created: Utc::now(),
            author,
            entity_revision: 1,
        }
    }
}
