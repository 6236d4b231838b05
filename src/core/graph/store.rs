//! Store contracts consumed by the graph core
//!
//! The traversal components only ever read through [`GraphStore`] and
//! [`IssueStore`]; the ancestor cache is the one writer, through
//! [`ClosureStore::replace_all`].

use super::relation::RelationSet;
use super::types::{ClosureRow, CompanyNode, IssueRecord, Relationship};
use super::GraphError;
use crate::core::identity::EntityId;

/// Companies and the typed edges between them
pub trait GraphStore {
    /// Look up a single company
    fn get_entity(&self, id: &EntityId) -> Result<Option<CompanyNode>, GraphError>;

    /// Edges whose parent is `id`, restricted to `types`, in stable store order
    fn edges_by_parent(
        &self,
        id: &EntityId,
        types: RelationSet,
    ) -> Result<Vec<Relationship>, GraphError>;

    /// Edges whose child is `id`, restricted to `types`, in stable store order
    fn edges_by_child(
        &self,
        id: &EntityId,
        types: RelationSet,
    ) -> Result<Vec<Relationship>, GraphError>;

    fn all_entities(&self) -> Result<Vec<CompanyNode>, GraphError>;

    fn all_edges(&self) -> Result<Vec<Relationship>, GraphError>;
}

/// Issues attached to companies
pub trait IssueStore {
    /// All issues of the given companies, each joined with its issue type
    fn issues_for_entities(&self, ids: &[EntityId]) -> Result<Vec<IssueRecord>, GraphError>;
}

/// Materialized `(entity, top ancestor)` cache
pub trait ClosureStore {
    /// Replace the whole cache atomically: either every row is written or
    /// the previous contents stay untouched
    fn replace_all(&mut self, rows: &[ClosureRow]) -> Result<(), GraphError>;

    fn lookup(&self, id: &EntityId) -> Result<Option<EntityId>, GraphError>;
}
