//! Downward chain walk from a set of roots

use std::collections::{BTreeSet, HashSet, VecDeque};

use super::relation::RelationSet;
use super::store::GraphStore;
use super::types::{ChainNode, Relationship};
use super::GraphError;
use crate::core::identity::EntityId;

/// Result of one downward traversal
#[derive(Debug, Clone, Default)]
pub struct Walk {
    /// Reached companies in breadth-first order, roots first
    pub nodes: Vec<ChainNode>,
    /// Every edge leaving an expanded company, each exactly once
    pub edges: Vec<Relationship>,
}

/// Breadth-first walk from roots down child edges
pub struct ChainWalker<'a, S: GraphStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: GraphStore + ?Sized> ChainWalker<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Every company reachable from `roots` with its name path and source marker
    pub fn walk(
        &self,
        roots: &BTreeSet<EntityId>,
        allowed: RelationSet,
        source: &EntityId,
    ) -> Result<Vec<ChainNode>, GraphError> {
        Ok(self.traverse(roots, allowed, source)?.nodes)
    }

    /// Full traversal, keeping the edges as well as the nodes
    ///
    /// A company is emitted the first time it is reached and never expanded
    /// twice, so the path recorded for it is the first one found.
    pub fn traverse(
        &self,
        roots: &BTreeSet<EntityId>,
        allowed: RelationSet,
        source: &EntityId,
    ) -> Result<Walk, GraphError> {
        if roots.is_empty() {
            return Err(GraphError::NotFound(source.clone()));
        }

        let mut walk = Walk::default();
        let mut visited: HashSet<EntityId> = HashSet::new();

        for root_id in roots {
            if visited.contains(root_id) {
                continue;
            }
            let Some(root) = self.store.get_entity(root_id)? else {
                log::debug!("root {} does not exist, skipping", root_id);
                continue;
            };
            visited.insert(root_id.clone());

            let mut queue: VecDeque<(EntityId, String)> = VecDeque::new();
            queue.push_back((root_id.clone(), root.name.clone()));
            walk.nodes.push(ChainNode {
                is_source: root.id == *source,
                name_path: root.name.clone(),
                node: root,
            });

            while let Some((current, path)) = queue.pop_front() {
                for edge in self.store.edges_by_parent(&current, allowed)? {
                    let Some(child) = self.store.get_entity(&edge.child)? else {
                        log::debug!("skipping dangling edge {} -> {}", edge.parent, edge.child);
                        continue;
                    };

                    if visited.insert(child.id.clone()) {
                        let name_path =
                            format!("{}{}{}", path, edge.relation.separator(), child.name);
                        queue.push_back((child.id.clone(), name_path.clone()));
                        walk.nodes.push(ChainNode {
                            is_source: child.id == *source,
                            name_path,
                            node: child,
                        });
                    } else {
                        log::debug!("{} already reached, not expanding again", child.id);
                    }
                    walk.edges.push(edge);
                }
            }
        }

        Ok(walk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::memory::MemoryGraph;
    use crate::core::graph::relation::RelationType;
    use crate::core::graph::types::CompanyNode;

    fn paths(nodes: &[ChainNode]) -> Vec<String> {
        nodes.iter().map(|n| n.name_path.clone()).collect()
    }

    #[test]
    fn test_path_labels_use_relation_separators() {
        let mut graph = MemoryGraph::new();
        let a = graph.add_named("A");
        let b = graph.add_named("B");
        let c = graph.add_named("C");
        let d = graph.add_named("D");
        graph.link(&a, &b, RelationType::Ownership);
        graph.link(&b, &c, RelationType::Investment);
        graph.link(&c, &d, RelationType::Other);

        let nodes = ChainWalker::new(&graph)
            .walk(&BTreeSet::from([a.clone()]), RelationSet::ALL, &a)
            .unwrap();
        assert_eq!(paths(&nodes), vec!["A", "A|B", "A|B|>C", "A|B|>C|[D"]);
    }

    #[test]
    fn test_only_source_is_marked() {
        let mut graph = MemoryGraph::new();
        let a = graph.add_named("A");
        let b = graph.add_named("B");
        let c = graph.add_named("C");
        graph.link(&a, &b, RelationType::Ownership);
        graph.link(&a, &c, RelationType::Ownership);

        let nodes = ChainWalker::new(&graph)
            .walk(&BTreeSet::from([a.clone()]), RelationSet::OWNERSHIP, &b)
            .unwrap();
        let marked: Vec<_> = nodes.iter().filter(|n| n.is_source).collect();
        assert_eq!(marked.len(), 1);
        assert_eq!(marked[0].node.id, b);
    }

    #[test]
    fn test_cycle_visits_each_entity_once() {
        let mut graph = MemoryGraph::new();
        let a = graph.add_named("A");
        let b = graph.add_named("B");
        let c = graph.add_named("C");
        graph.link(&a, &b, RelationType::Ownership);
        graph.link(&b, &c, RelationType::Ownership);
        graph.link(&c, &a, RelationType::Ownership);

        let walk = ChainWalker::new(&graph)
            .traverse(&BTreeSet::from([a.clone()]), RelationSet::OWNERSHIP, &a)
            .unwrap();
        assert_eq!(walk.nodes.len(), 3);
        assert_eq!(walk.edges.len(), 3);
    }

    #[test]
    fn test_first_reached_path_wins_and_diamond_edges_kept() {
        let mut graph = MemoryGraph::new();
        let top = graph.add_named("Top");
        let left = graph.add_named("Left");
        let right = graph.add_named("Right");
        let bottom = graph.add_named("Bottom");
        graph.link(&top, &left, RelationType::Ownership);
        graph.link(&top, &right, RelationType::Investment);
        graph.link(&left, &bottom, RelationType::Ownership);
        graph.link(&right, &bottom, RelationType::Ownership);

        let walk = ChainWalker::new(&graph)
            .traverse(&BTreeSet::from([top.clone()]), RelationSet::ALL, &bottom)
            .unwrap();
        let bottom_node = walk.nodes.iter().find(|n| n.node.id == bottom).unwrap();
        assert_eq!(bottom_node.name_path, "Top|Left|Bottom");
        assert_eq!(walk.nodes.len(), 4);
        assert_eq!(walk.edges.len(), 4);
    }

    #[test]
    fn test_roots_walked_in_order_and_shared_child_keeps_first_path() {
        let mut graph = MemoryGraph::new();
        let id = |n: u8| EntityId::parse(&format!("CO-01HC2JB7SMQX7RS1Y0GFKBHPT{}", n)).unwrap();
        let (r1, r2, mid, shared) = (id(1), id(2), id(3), id(4));
        for (node_id, name) in [(&r1, "R1"), (&r2, "R2"), (&mid, "Mid"), (&shared, "Shared")] {
            graph.add_company(CompanyNode::named(node_id.clone(), name));
        }
        graph.link(&r1, &mid, RelationType::Ownership);
        graph.link(&mid, &shared, RelationType::Ownership);
        graph.link(&r2, &shared, RelationType::Investment);

        let roots = BTreeSet::from([r2.clone(), r1.clone()]);
        let walk = ChainWalker::new(&graph)
            .traverse(&roots, RelationSet::ALL, &shared)
            .unwrap();

        assert_eq!(paths(&walk.nodes), vec!["R1", "R1|Mid", "R1|Mid|Shared", "R2"]);
        assert_eq!(walk.edges.len(), 3);
        assert!(walk
            .edges
            .iter()
            .any(|e| e.parent == r2 && e.child == shared && e.relation == RelationType::Investment));
    }

    #[test]
    fn test_allowed_types_filter_children() {
        let mut graph = MemoryGraph::new();
        let a = graph.add_named("A");
        let b = graph.add_named("B");
        graph.link(&a, &b, RelationType::Investment);

        let nodes = ChainWalker::new(&graph)
            .walk(&BTreeSet::from([a.clone()]), RelationSet::OWNERSHIP, &a)
            .unwrap();
        assert_eq!(paths(&nodes), vec!["A"]);
    }

    #[test]
    fn test_empty_roots_is_not_found() {
        let mut graph = MemoryGraph::new();
        let a = graph.add_named("A");
        let err = ChainWalker::new(&graph)
            .walk(&BTreeSet::new(), RelationSet::ALL, &a)
            .unwrap_err();
        assert!(matches!(err, GraphError::NotFound(_)));
    }
}
