//! Ownership chain roots for a single company

use super::lineage::LineageIndex;
use super::store::GraphStore;
use super::types::ChainRoot;
use super::GraphError;
use crate::core::identity::EntityId;

/// Resolves, per immediate ownership parent, the company at the top of that
/// parent's lineage
///
/// Used to label "owned by X, ultimately controlled by Y". Two parents start
/// two chains even when their lineages meet further up.
pub struct ChainRootResolver<'a, S: GraphStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: GraphStore + ?Sized> ChainRootResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn resolve(&self, id: &EntityId) -> Result<Vec<ChainRoot>, GraphError> {
        if self.store.get_entity(id)?.is_none() {
            return Err(GraphError::NotFound(id.clone()));
        }

        let mut index = LineageIndex::new(self.store);
        let mut chains = Vec::new();

        for (parent_id, above) in index.parent_lineages(id)? {
            let root_id = above.map_or_else(|| parent_id.clone(), |l| l.ancestor);
            let parent_name = self.name_of(&parent_id)?;
            let root_name = self.name_of(&root_id)?;
            chains.push(ChainRoot {
                parent_id,
                parent_name,
                root_id,
                root_name,
            });
        }

        Ok(chains)
    }

    fn name_of(&self, id: &EntityId) -> Result<String, GraphError> {
        Ok(self
            .store
            .get_entity(id)?
            .map(|node| node.name)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::memory::MemoryGraph;
    use crate::core::graph::relation::RelationType;
    use crate::core::identity::EntityPrefix;

    #[test]
    fn test_two_parents_give_two_chains() {
        let mut graph = MemoryGraph::new();
        let e = graph.add_named("E");
        let p1 = graph.add_named("P1");
        let x = graph.add_named("X");
        let r1 = graph.add_named("R1");
        let p2 = graph.add_named("P2");
        let r2 = graph.add_named("R2");
        graph.link(&p1, &e, RelationType::Ownership);
        graph.link(&p2, &e, RelationType::Ownership);
        graph.link(&x, &p1, RelationType::Ownership);
        graph.link(&r1, &x, RelationType::Ownership);
        graph.link(&r2, &p2, RelationType::Ownership);

        let chains = ChainRootResolver::new(&graph).resolve(&e).unwrap();
        assert_eq!(chains.len(), 2);
        assert_eq!((&chains[0].parent_id, &chains[0].root_id), (&p1, &r1));
        assert_eq!((&chains[1].parent_id, &chains[1].root_id), (&p2, &r2));
        assert_eq!(chains[0].parent_name, "P1");
        assert_eq!(chains[0].root_name, "R1");
    }

    #[test]
    fn test_converging_chains_are_not_merged() {
        let mut graph = MemoryGraph::new();
        let e = graph.add_named("E");
        let p1 = graph.add_named("P1");
        let p2 = graph.add_named("P2");
        let top = graph.add_named("Top");
        graph.link(&p1, &e, RelationType::Ownership);
        graph.link(&p2, &e, RelationType::Ownership);
        graph.link(&top, &p1, RelationType::Ownership);
        graph.link(&top, &p2, RelationType::Ownership);

        let chains = ChainRootResolver::new(&graph).resolve(&e).unwrap();
        assert_eq!(chains.len(), 2);
        assert!(chains.iter().all(|c| c.root_id == top));
    }

    #[test]
    fn test_parent_without_parents_is_its_own_root() {
        let mut graph = MemoryGraph::new();
        let e = graph.add_named("E");
        let p = graph.add_named("P");
        graph.link(&p, &e, RelationType::Ownership);

        let chains = ChainRootResolver::new(&graph).resolve(&e).unwrap();
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].root_id, p);
    }

    #[test]
    fn test_no_ownership_parents_is_empty() {
        let mut graph = MemoryGraph::new();
        let e = graph.add_named("E");
        let investor = graph.add_named("Investor");
        graph.link(&investor, &e, RelationType::Investment);

        let chains = ChainRootResolver::new(&graph).resolve(&e).unwrap();
        assert!(chains.is_empty());
    }

    #[test]
    fn test_cycle_back_to_source_is_cut() {
        let mut graph = MemoryGraph::new();
        let e = graph.add_named("E");
        let p = graph.add_named("P");
        graph.link(&p, &e, RelationType::Ownership);
        graph.link(&e, &p, RelationType::Ownership);

        let chains = ChainRootResolver::new(&graph).resolve(&e).unwrap();
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].root_id, p);
    }

    #[test]
    fn test_unknown_entity_is_not_found() {
        let graph = MemoryGraph::new();
        let err = ChainRootResolver::new(&graph)
            .resolve(&EntityId::new(EntityPrefix::Co))
            .unwrap_err();
        assert!(matches!(err, GraphError::NotFound(_)));
    }
}
