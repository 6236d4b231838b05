//! Records exchanged between the graph store and the traversal components

use chrono::NaiveDate;
use serde::Serialize;

use super::relation::RelationType;
use crate::core::identity::EntityId;

/// Icon placement for a company in graph renderings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Icon {
    /// Image reference (file name or URL)
    pub img: String,
    pub x: Option<i32>,
    pub y: Option<i32>,
}

/// A company as seen by the graph core
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyNode {
    pub id: EntityId,
    pub name: String,
    pub category: Option<EntityId>,
    pub description: String,
    pub icon: Icon,
}

impl CompanyNode {
    /// Minimal node with only an id and a name
    pub fn named(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            category: None,
            description: String::new(),
            icon: Icon::default(),
        }
    }
}

/// A directed, typed edge. `parent` owns / invests in / relates to `child`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relationship {
    pub parent: EntityId,
    pub child: EntityId,
    pub relation: RelationType,
    pub as_of: Option<NaiveDate>,
}

impl Relationship {
    pub fn new(parent: EntityId, child: EntityId, relation: RelationType) -> Self {
        Self {
            parent,
            child,
            relation,
            as_of: None,
        }
    }
}

/// Display metadata for an issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueTypeRecord {
    pub id: EntityId,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub show_on_top: bool,
}

/// An issue attached to one company, joined with its issue type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueRecord {
    pub id: EntityId,
    pub entity_id: EntityId,
    /// `None` when the referenced issue type does not exist
    pub issue_type: Option<IssueTypeRecord>,
    pub text: String,
    pub source_url: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub ongoing: bool,
    pub content_warning: Option<String>,
}

/// One row of the ancestor closure cache
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ClosureRow {
    pub entity_id: EntityId,
    pub ancestor_id: EntityId,
}

/// A company reached by a downward walk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainNode {
    pub node: CompanyNode,
    /// Root name followed by `separator + name` for every edge walked
    pub name_path: String,
    /// True only for the company the walk was requested for
    pub is_source: bool,
}

/// One row of the issue-chain view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueChainRow {
    pub entity_id: EntityId,
    pub entity_name: String,
    /// `None` only for the placeholder row of a source without issues
    pub issue: Option<IssueRecord>,
    pub name_path: String,
    pub is_source: bool,
}

/// One edge of the family-graph view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FamilyEdge {
    pub parent_id: EntityId,
    pub parent_name: String,
    pub child_id: EntityId,
    pub child_name: String,
    pub relation: RelationType,
    pub as_of: Option<NaiveDate>,
    pub parent_icon: Icon,
    pub child_icon: Icon,
    /// Edge leaves the queried company
    pub is_source_edge: bool,
}

/// The top of one ownership lineage, keyed by the immediate parent that starts it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainRoot {
    pub parent_id: EntityId,
    pub parent_name: String,
    pub root_id: EntityId,
    pub root_name: String,
}
