//! Longest upward ownership lineage per company
//!
//! Shared by the ancestor closure and the chain roots. Depth 0 is an
//! immediate parent. Among lineages of equal depth the first one found
//! wins, where "first" follows the order in which the store lists a
//! company's parent edges.

use std::collections::{HashMap, HashSet};

use super::relation::RelationSet;
use super::store::GraphStore;
use super::GraphError;
use crate::core::identity::EntityId;

/// Topmost ownership ancestor of a company and how far up it sits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lineage {
    pub ancestor: EntityId,
    pub depth: usize,
}

/// Memoised depth-first search over ownership parent edges
///
/// An edge into a company that is still on the search stack closes a cycle
/// and is cut; the cut edge is remembered in [`LineageIndex::cycle_edges`].
/// A result is only memoised when no edge was cut while computing it, since
/// a cut depends on the stack and the stack depends on where the search
/// started. Companies above a cycle are therefore searched again per query.
pub struct LineageIndex<'a, S: GraphStore + ?Sized> {
    store: &'a S,
    memo: HashMap<EntityId, Option<Lineage>>,
    on_stack: HashSet<EntityId>,
    cuts: usize,
    cycles: Vec<(EntityId, EntityId)>,
    cycle_set: HashSet<(EntityId, EntityId)>,
}

impl<'a, S: GraphStore + ?Sized> LineageIndex<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            memo: HashMap::new(),
            on_stack: HashSet::new(),
            cuts: 0,
            cycles: Vec::new(),
            cycle_set: HashSet::new(),
        }
    }

    /// Deepest ownership ancestor of `id`, or `None` when it has no parent
    pub fn top_of(&mut self, id: &EntityId) -> Result<Option<Lineage>, GraphError> {
        if let Some(done) = self.memo.get(id) {
            return Ok(done.clone());
        }

        let cuts_before = self.cuts;
        self.on_stack.insert(id.clone());
        let result = self.deepest_parent_lineage(id);
        self.on_stack.remove(id);

        let best = result?;
        if self.cuts == cuts_before {
            self.memo.insert(id.clone(), best.clone());
        }
        Ok(best)
    }

    /// Each distinct live parent of `id` in edge order, with the deepest
    /// lineage above that parent
    pub fn parent_lineages(
        &mut self,
        id: &EntityId,
    ) -> Result<Vec<(EntityId, Option<Lineage>)>, GraphError> {
        self.on_stack.insert(id.clone());
        let result = self.collect_parent_lineages(id);
        self.on_stack.remove(id);
        result
    }

    /// `(parent, child)` edges cut because they closed a cycle, each listed
    /// once in the order first cut
    pub fn cycle_edges(&self) -> &[(EntityId, EntityId)] {
        &self.cycles
    }

    fn collect_parent_lineages(
        &mut self,
        id: &EntityId,
    ) -> Result<Vec<(EntityId, Option<Lineage>)>, GraphError> {
        let mut seen = HashSet::new();
        let mut lineages = Vec::new();
        for parent in self.live_parents(id)? {
            if seen.insert(parent.clone()) {
                let above = self.top_of(&parent)?;
                lineages.push((parent, above));
            }
        }
        Ok(lineages)
    }

    fn deepest_parent_lineage(&mut self, id: &EntityId) -> Result<Option<Lineage>, GraphError> {
        let mut best: Option<Lineage> = None;

        for parent in self.live_parents(id)? {
            let candidate = match self.top_of(&parent)? {
                Some(above) => Lineage {
                    ancestor: above.ancestor,
                    depth: above.depth + 1,
                },
                None => Lineage {
                    ancestor: parent,
                    depth: 0,
                },
            };
            // Strictly deeper only: ties keep the earlier lineage
            if best.as_ref().map_or(true, |b| candidate.depth > b.depth) {
                best = Some(candidate);
            }
        }

        Ok(best)
    }

    /// Ownership parents that exist and do not close a cycle
    fn live_parents(&mut self, id: &EntityId) -> Result<Vec<EntityId>, GraphError> {
        let mut parents = Vec::new();
        for edge in self.store.edges_by_child(id, RelationSet::OWNERSHIP)? {
            if self.on_stack.contains(&edge.parent) {
                self.cuts += 1;
                let cut = (edge.parent, id.clone());
                if self.cycle_set.insert(cut.clone()) {
                    log::debug!("ownership cycle: cutting edge {} -> {}", cut.0, cut.1);
                    self.cycles.push(cut);
                }
                continue;
            }
            if self.store.get_entity(&edge.parent)?.is_none() {
                log::debug!("skipping dangling ownership edge {} -> {}", edge.parent, id);
                continue;
            }
            parents.push(edge.parent);
        }
        Ok(parents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::memory::MemoryGraph;
    use crate::core::graph::relation::RelationType;

    #[test]
    fn test_no_parent_has_no_lineage() {
        let mut graph = MemoryGraph::new();
        let a = graph.add_named("A");
        let mut index = LineageIndex::new(&graph);
        assert_eq!(index.top_of(&a).unwrap(), None);
    }

    #[test]
    fn test_deepest_lineage_wins_over_shorter_path() {
        // R owns A owns B owns E, and R also owns E directly
        let mut graph = MemoryGraph::new();
        let e = graph.add_named("E");
        let b = graph.add_named("B");
        let a = graph.add_named("A");
        let r = graph.add_named("R");
        graph.link(&r, &e, RelationType::Ownership);
        graph.link(&b, &e, RelationType::Ownership);
        graph.link(&a, &b, RelationType::Ownership);
        graph.link(&r, &a, RelationType::Ownership);

        let mut index = LineageIndex::new(&graph);
        let top = index.top_of(&e).unwrap().unwrap();
        assert_eq!(top.ancestor, r);
        assert_eq!(top.depth, 2);
    }

    #[test]
    fn test_tie_keeps_first_parent_edge() {
        let mut graph = MemoryGraph::new();
        let e = graph.add_named("E");
        let p1 = graph.add_named("P1");
        let p2 = graph.add_named("P2");
        graph.link(&p2, &e, RelationType::Ownership);
        graph.link(&p1, &e, RelationType::Ownership);

        let mut index = LineageIndex::new(&graph);
        assert_eq!(index.top_of(&e).unwrap().unwrap().ancestor, p2);
    }

    #[test]
    fn test_non_ownership_edges_ignored() {
        let mut graph = MemoryGraph::new();
        let e = graph.add_named("E");
        let investor = graph.add_named("Investor");
        graph.link(&investor, &e, RelationType::Investment);

        let mut index = LineageIndex::new(&graph);
        assert_eq!(index.top_of(&e).unwrap(), None);
    }

    #[test]
    fn test_cycle_is_cut_and_recorded() {
        let mut graph = MemoryGraph::new();
        let a = graph.add_named("A");
        let b = graph.add_named("B");
        graph.link(&b, &a, RelationType::Ownership);
        graph.link(&a, &b, RelationType::Ownership);

        let mut index = LineageIndex::new(&graph);
        let top = index.top_of(&a).unwrap().unwrap();
        assert_eq!(top.ancestor, b);
        assert_eq!(top.depth, 0);
        assert_eq!(index.cycle_edges(), &[(a.clone(), b.clone())]);
    }

    #[test]
    fn test_parent_lineages_dedupes_parents() {
        let mut graph = MemoryGraph::new();
        let e = graph.add_named("E");
        let p = graph.add_named("P");
        graph.link(&p, &e, RelationType::Ownership);
        graph.link(&p, &e, RelationType::Ownership);

        let mut index = LineageIndex::new(&graph);
        let lineages = index.parent_lineages(&e).unwrap();
        assert_eq!(lineages, vec![(p, None)]);
    }
}
