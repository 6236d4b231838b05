//! Upward root resolution

use std::collections::{BTreeSet, HashSet, VecDeque};

use super::relation::RelationSet;
use super::store::GraphStore;
use super::GraphError;
use crate::core::identity::EntityId;

/// Finds the topmost ancestors of a company under an allowed relation set
pub struct RootResolver<'a, S: GraphStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: GraphStore + ?Sized> RootResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Every terminal entity reachable by following parent edges of `allowed`
    /// types upward from `id`.
    ///
    /// A company that is only reachable through cycles has no terminal
    /// ancestor; in that case the company itself is returned as the single
    /// root so the downward walk still has somewhere to start.
    pub fn find_roots(
        &self,
        id: &EntityId,
        allowed: RelationSet,
    ) -> Result<BTreeSet<EntityId>, GraphError> {
        if self.store.get_entity(id)?.is_none() {
            return Err(GraphError::NotFound(id.clone()));
        }

        let mut roots = BTreeSet::new();
        let mut visited: HashSet<EntityId> = HashSet::new();
        let mut queue: VecDeque<EntityId> = VecDeque::new();

        visited.insert(id.clone());
        queue.push_back(id.clone());

        while let Some(current) = queue.pop_front() {
            let mut has_parent = false;

            for edge in self.store.edges_by_child(&current, allowed)? {
                if self.store.get_entity(&edge.parent)?.is_none() {
                    log::debug!(
                        "skipping dangling {} edge {} -> {}",
                        edge.relation,
                        edge.parent,
                        edge.child
                    );
                    continue;
                }
                has_parent = true;
                if visited.insert(edge.parent.clone()) {
                    queue.push_back(edge.parent);
                } else {
                    log::debug!("{} already visited, not expanding again", edge.parent);
                }
            }

            if !has_parent {
                roots.insert(current);
            }
        }

        if roots.is_empty() {
            log::debug!("no terminal ancestor above {} (cycle), using it as root", id);
            roots.insert(id.clone());
        }

        Ok(roots)
    }
}
