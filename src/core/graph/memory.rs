//! In-memory graph store
//!
//! Used as the working snapshot for whole-graph computations (the ancestor
//! closure) and as a lightweight store in tests.

use std::collections::{BTreeMap, HashMap};

use super::relation::{RelationSet, RelationType};
use super::store::{ClosureStore, GraphStore, IssueStore};
use super::types::{ClosureRow, CompanyNode, IssueRecord, Relationship};
use super::GraphError;
use crate::core::identity::{EntityId, EntityPrefix};

#[derive(Debug, Default, Clone)]
pub struct MemoryGraph {
    nodes: BTreeMap<EntityId, CompanyNode>,
    edges: Vec<Relationship>,
    by_parent: HashMap<EntityId, Vec<usize>>,
    by_child: HashMap<EntityId, Vec<usize>>,
    issues: Vec<IssueRecord>,
    closure: BTreeMap<EntityId, EntityId>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot any store into memory
    pub fn snapshot<S: GraphStore + ?Sized>(store: &S) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        for node in store.all_entities()? {
            graph.add_company(node);
        }
        for edge in store.all_edges()? {
            graph.add_edge(edge);
        }
        Ok(graph)
    }

    pub fn add_company(&mut self, node: CompanyNode) {
        self.nodes.insert(node.id.clone(), node);
    }

    /// Create a company with a fresh id and return the id
    pub fn add_named(&mut self, name: &str) -> EntityId {
        let id = EntityId::new(EntityPrefix::Co);
        self.add_company(CompanyNode::named(id.clone(), name));
        id
    }

    /// Append an edge; edges keep insertion order per parent and per child
    pub fn add_edge(&mut self, edge: Relationship) {
        let index = self.edges.len();
        self.by_parent
            .entry(edge.parent.clone())
            .or_default()
            .push(index);
        self.by_child.entry(edge.child.clone()).or_default().push(index);
        self.edges.push(edge);
    }

    pub fn link(&mut self, parent: &EntityId, child: &EntityId, relation: RelationType) {
        self.add_edge(Relationship::new(parent.clone(), child.clone(), relation));
    }

    pub fn add_issue(&mut self, issue: IssueRecord) {
        self.issues.push(issue);
    }

    /// Company ids in id order
    pub fn ids(&self) -> impl Iterator<Item = &EntityId> {
        self.nodes.keys()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Current closure contents in entity id order
    pub fn closure_rows(&self) -> Vec<ClosureRow> {
        self.closure
            .iter()
            .map(|(entity_id, ancestor_id)| ClosureRow {
                entity_id: entity_id.clone(),
                ancestor_id: ancestor_id.clone(),
            })
            .collect()
    }

    /// Parent edges of `id` without cloning
    pub fn parents_of<'a>(
        &'a self,
        id: &EntityId,
        types: RelationSet,
    ) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.indexed(self.by_child.get(id), types)
    }

    /// Child edges of `id` without cloning
    pub fn children_of<'a>(
        &'a self,
        id: &EntityId,
        types: RelationSet,
    ) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.indexed(self.by_parent.get(id), types)
    }

    fn indexed<'a>(
        &'a self,
        indexes: Option<&'a Vec<usize>>,
        types: RelationSet,
    ) -> impl Iterator<Item = &'a Relationship> + 'a {
        indexes
            .into_iter()
            .flatten()
            .map(move |i| &self.edges[*i])
            .filter(move |e| types.contains(e.relation))
    }
}

impl GraphStore for MemoryGraph {
    fn get_entity(&self, id: &EntityId) -> Result<Option<CompanyNode>, GraphError> {
        Ok(self.nodes.get(id).cloned())
    }

    fn edges_by_parent(
        &self,
        id: &EntityId,
        types: RelationSet,
    ) -> Result<Vec<Relationship>, GraphError> {
        Ok(self.children_of(id, types).cloned().collect())
    }

    fn edges_by_child(
        &self,
        id: &EntityId,
        types: RelationSet,
    ) -> Result<Vec<Relationship>, GraphError> {
        Ok(self.parents_of(id, types).cloned().collect())
    }

    fn all_entities(&self) -> Result<Vec<CompanyNode>, GraphError> {
        Ok(self.nodes.values().cloned().collect())
    }

    fn all_edges(&self) -> Result<Vec<Relationship>, GraphError> {
        Ok(self.edges.clone())
    }
}

impl IssueStore for MemoryGraph {
    fn issues_for_entities(&self, ids: &[EntityId]) -> Result<Vec<IssueRecord>, GraphError> {
        Ok(self
            .issues
            .iter()
            .filter(|issue| ids.contains(&issue.entity_id))
            .cloned()
            .collect())
    }
}

impl ClosureStore for MemoryGraph {
    fn replace_all(&mut self, rows: &[ClosureRow]) -> Result<(), GraphError> {
        self.closure = rows
            .iter()
            .map(|row| (row.entity_id.clone(), row.ancestor_id.clone()))
            .collect();
        Ok(())
    }

    fn lookup(&self, id: &EntityId) -> Result<Option<EntityId>, GraphError> {
        Ok(self.closure.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges_filtered_by_type() {
        let mut graph = MemoryGraph::new();
        let a = graph.add_named("A");
        let b = graph.add_named("B");
        let c = graph.add_named("C");
        graph.link(&a, &b, RelationType::Ownership);
        graph.link(&a, &c, RelationType::Investment);

        let owned = graph.edges_by_parent(&a, RelationSet::OWNERSHIP).unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].child, b);

        let all = graph.edges_by_parent(&a, RelationSet::ALL).unwrap();
        assert_eq!(all.len(), 2);

        let parents = graph.edges_by_child(&c, RelationSet::ALL).unwrap();
        assert_eq!(parents[0].parent, a);
    }

    #[test]
    fn test_snapshot_preserves_edge_order() {
        let mut graph = MemoryGraph::new();
        let child = graph.add_named("Child");
        let p1 = graph.add_named("P1");
        let p2 = graph.add_named("P2");
        graph.link(&p2, &child, RelationType::Ownership);
        graph.link(&p1, &child, RelationType::Ownership);

        let copy = MemoryGraph::snapshot(&graph).unwrap();
        let parents: Vec<_> = copy
            .parents_of(&child, RelationSet::OWNERSHIP)
            .map(|e| e.parent.clone())
            .collect();
        assert_eq!(parents, vec![p2, p1]);
        assert_eq!(copy.len(), 3);
    }
}
