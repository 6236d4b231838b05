//! Ancestor closure cache: one `(company, top ownership ancestor)` row per
//! owned company

use std::time::Instant;

use serde::Serialize;

use super::lineage::LineageIndex;
use super::memory::MemoryGraph;
use super::store::{ClosureStore, GraphStore};
use super::types::ClosureRow;
use super::GraphError;
use crate::core::identity::EntityId;

/// Summary of one rebuild
#[derive(Debug, Clone, Default, Serialize)]
pub struct RebuildStats {
    pub entities: usize,
    pub rows: usize,
    /// Ownership edges cut because they closed a cycle
    pub cycles_cut: usize,
    pub duration_ms: u64,
}

/// Owner of the closure cache held by a store
pub struct AncestorClosure<'a, S: GraphStore + ClosureStore + ?Sized> {
    store: &'a mut S,
}

impl<'a, S: GraphStore + ClosureStore + ?Sized> AncestorClosure<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    /// Recompute every row from the current ownership edges and swap the
    /// cache contents in one step
    ///
    /// On failure the previous cache is left as it was.
    pub fn rebuild(&mut self) -> Result<RebuildStats, GraphError> {
        let start = Instant::now();

        let snapshot = MemoryGraph::snapshot(&*self.store).map_err(rebuild_failed)?;
        let (rows, cycles_cut) = compute_rows(&snapshot).map_err(rebuild_failed)?;

        if let Err(e) = self.store.replace_all(&rows) {
            log::warn!("ancestor cache rebuild rolled back: {}", e);
            return Err(rebuild_failed(e));
        }

        let stats = RebuildStats {
            entities: snapshot.len(),
            rows: rows.len(),
            cycles_cut,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        log::info!(
            "ancestor cache rebuilt: {} rows for {} companies in {}ms",
            stats.rows,
            stats.entities,
            stats.duration_ms
        );
        Ok(stats)
    }

    /// Cached top ancestor; `None` for companies without an ownership parent
    /// or added since the last rebuild
    pub fn lookup(&self, id: &EntityId) -> Result<Option<EntityId>, GraphError> {
        self.store.lookup(id)
    }
}

fn rebuild_failed(err: GraphError) -> GraphError {
    match err {
        GraphError::RebuildFailed(_) => err,
        other => GraphError::RebuildFailed(other.to_string()),
    }
}

/// Closure rows for every company that has an ownership parent, in id order,
/// plus the number of cycle edges cut along the way
pub fn compute_rows(graph: &MemoryGraph) -> Result<(Vec<ClosureRow>, usize), GraphError> {
    let mut index = LineageIndex::new(graph);
    let mut rows = Vec::new();

    for id in graph.ids() {
        if let Some(lineage) = index.top_of(id)? {
            rows.push(ClosureRow {
                entity_id: id.clone(),
                ancestor_id: lineage.ancestor,
            });
        }
    }

    Ok((rows, index.cycle_edges().len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use crate::core::graph::relation::{RelationSet, RelationType};
    use crate::core::graph::types::{CompanyNode, Relationship};

    #[test]
    fn test_rebuild_maps_to_deepest_ancestor() {
        let mut graph = MemoryGraph::new();
        let top = graph.add_named("Top");
        let mid = graph.add_named("Mid");
        let leaf = graph.add_named("Leaf");
        graph.link(&top, &mid, RelationType::Ownership);
        graph.link(&mid, &leaf, RelationType::Ownership);

        let stats = AncestorClosure::new(&mut graph).rebuild().unwrap();
        assert_eq!(stats.entities, 3);
        assert_eq!(stats.rows, 2);

        let closure = AncestorClosure::new(&mut graph);
        assert_eq!(closure.lookup(&leaf).unwrap(), Some(top.clone()));
        assert_eq!(closure.lookup(&mid).unwrap(), Some(top.clone()));
    }

    #[test]
    fn test_company_without_parent_gets_no_row() {
        let mut graph = MemoryGraph::new();
        let alone = graph.add_named("Alone");
        let investee = graph.add_named("Investee");
        graph.link(&alone, &investee, RelationType::Investment);

        let stats = AncestorClosure::new(&mut graph).rebuild().unwrap();
        assert_eq!(stats.rows, 0);
        assert_eq!(graph.lookup(&alone).unwrap(), None);
        assert_eq!(graph.lookup(&investee).unwrap(), None);
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let mut graph = MemoryGraph::new();
        let a = graph.add_named("A");
        let b = graph.add_named("B");
        let c = graph.add_named("C");
        let d = graph.add_named("D");
        graph.link(&a, &b, RelationType::Ownership);
        graph.link(&b, &c, RelationType::Ownership);
        graph.link(&d, &c, RelationType::Ownership);

        AncestorClosure::new(&mut graph).rebuild().unwrap();
        let first = graph.closure_rows();
        AncestorClosure::new(&mut graph).rebuild().unwrap();
        assert_eq!(graph.closure_rows(), first);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_equal_depth_tie_takes_first_lineage() {
        // E has two parents whose lineages are both two levels deep
        let mut graph = MemoryGraph::new();
        let e = graph.add_named("E");
        let p1 = graph.add_named("P1");
        let p2 = graph.add_named("P2");
        let r1 = graph.add_named("R1");
        let r2 = graph.add_named("R2");
        graph.link(&p1, &e, RelationType::Ownership);
        graph.link(&p2, &e, RelationType::Ownership);
        graph.link(&r1, &p1, RelationType::Ownership);
        graph.link(&r2, &p2, RelationType::Ownership);

        let (rows, _) = compute_rows(&graph).unwrap();
        let row = rows.iter().find(|r| r.entity_id == e).unwrap();
        assert_eq!(row.ancestor_id, r1);
    }

    #[test]
    fn test_cycle_rebuild_terminates() {
        let mut graph = MemoryGraph::new();
        let a = graph.add_named("A");
        let b = graph.add_named("B");
        let c = graph.add_named("C");
        graph.link(&a, &b, RelationType::Ownership);
        graph.link(&b, &c, RelationType::Ownership);
        graph.link(&c, &a, RelationType::Ownership);

        let stats = AncestorClosure::new(&mut graph).rebuild().unwrap();
        assert!(stats.cycles_cut >= 1);
        assert!(stats.rows <= 3);
    }

    /// U owns T owns B, A and B own each other, A owns X; ids are handed out
    /// so that `order` lists the companies in ascending id order
    fn cyclic_family(order: &[&str]) -> (MemoryGraph, HashMap<EntityId, String>) {
        let mut graph = MemoryGraph::new();
        let mut ids = HashMap::new();
        let mut names = HashMap::new();
        for (i, name) in order.iter().enumerate() {
            let id = EntityId::parse(&format!("CO-01HC2JB7SMQX7RS1Y0GFKBHPT{}", i + 1)).unwrap();
            graph.add_company(CompanyNode::named(id.clone(), *name));
            ids.insert(*name, id.clone());
            names.insert(id, name.to_string());
        }
        for (parent, child) in [("U", "T"), ("T", "B"), ("A", "B"), ("B", "A"), ("A", "X")] {
            graph.link(&ids[parent], &ids[child], RelationType::Ownership);
        }
        (graph, names)
    }

    fn rows_by_name(order: &[&str]) -> Vec<(String, String)> {
        let (graph, names) = cyclic_family(order);
        let (rows, _) = compute_rows(&graph).unwrap();
        let mut named: Vec<_> = rows
            .iter()
            .map(|r| (names[&r.entity_id].clone(), names[&r.ancestor_id].clone()))
            .collect();
        named.sort();
        named
    }

    #[test]
    fn test_cycle_rows_do_not_depend_on_id_order() {
        let forward = rows_by_name(&["B", "A", "X", "T", "U"]);
        let backward = rows_by_name(&["U", "T", "X", "A", "B"]);
        assert_eq!(forward, backward);

        let expected: Vec<(String, String)> = ["A", "B", "T", "X"]
            .iter()
            .map(|n| (n.to_string(), "U".to_string()))
            .collect();
        assert_eq!(forward, expected);
    }

    /// Store whose closure writes always fail
    struct ReadOnlyClosure {
        inner: MemoryGraph,
    }

    impl GraphStore for ReadOnlyClosure {
        fn get_entity(&self, id: &EntityId) -> Result<Option<CompanyNode>, GraphError> {
            self.inner.get_entity(id)
        }
        fn edges_by_parent(
            &self,
            id: &EntityId,
            types: RelationSet,
        ) -> Result<Vec<Relationship>, GraphError> {
            self.inner.edges_by_parent(id, types)
        }
        fn edges_by_child(
            &self,
            id: &EntityId,
            types: RelationSet,
        ) -> Result<Vec<Relationship>, GraphError> {
            self.inner.edges_by_child(id, types)
        }
        fn all_entities(&self) -> Result<Vec<CompanyNode>, GraphError> {
            self.inner.all_entities()
        }
        fn all_edges(&self) -> Result<Vec<Relationship>, GraphError> {
            self.inner.all_edges()
        }
    }

    impl ClosureStore for ReadOnlyClosure {
        fn replace_all(&mut self, _rows: &[ClosureRow]) -> Result<(), GraphError> {
            Err(GraphError::Store("attempt to write a readonly database".to_string()))
        }
        fn lookup(&self, id: &EntityId) -> Result<Option<EntityId>, GraphError> {
            self.inner.lookup(id)
        }
    }

    #[test]
    fn test_failed_replace_keeps_previous_cache() {
        let mut graph = MemoryGraph::new();
        let top = graph.add_named("Top");
        let leaf = graph.add_named("Leaf");
        graph.link(&top, &leaf, RelationType::Ownership);
        AncestorClosure::new(&mut graph).rebuild().unwrap();

        let new_top = graph.add_named("NewTop");
        graph.link(&new_top, &top, RelationType::Ownership);

        let mut store = ReadOnlyClosure { inner: graph };
        let err = AncestorClosure::new(&mut store).rebuild().unwrap_err();
        assert!(matches!(err, GraphError::RebuildFailed(_)));
        assert_eq!(store.lookup(&leaf).unwrap(), Some(top));
    }
}
