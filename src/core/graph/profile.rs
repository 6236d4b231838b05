//! Company detail page data

use std::collections::{BTreeSet, HashSet, VecDeque};

use serde::Serialize;

use super::chain::ChainRootResolver;
use super::relation::{RelationSet, RelationType};
use super::store::GraphStore;
use super::types::{ChainRoot, CompanyNode};
use super::GraphError;
use crate::core::identity::EntityId;

/// Everything shown about one company apart from its issues
#[derive(Debug, Clone, Serialize)]
pub struct CompanyProfile {
    pub company: CompanyNode,
    /// Immediate ownership parents, in edge order
    pub parents: Vec<CompanyNode>,
    /// Companies this one owns directly
    pub children: Vec<CompanyNode>,
    /// Top of each ownership lineage, one per immediate parent
    pub chains: Vec<ChainRoot>,
    /// Whether investment or other edges appear around or above this company
    pub has_additional_relationships: bool,
}

impl CompanyProfile {
    pub fn load<S: GraphStore + ?Sized>(store: &S, id: &EntityId) -> Result<Self, GraphError> {
        let company = store
            .get_entity(id)?
            .ok_or_else(|| GraphError::NotFound(id.clone()))?;

        let mut seen = HashSet::new();
        let mut parents = Vec::new();
        for edge in store.edges_by_child(id, RelationSet::OWNERSHIP)? {
            if seen.insert(edge.parent.clone()) {
                if let Some(node) = store.get_entity(&edge.parent)? {
                    parents.push(node);
                }
            }
        }

        let mut children = Vec::new();
        for edge in store.edges_by_parent(id, RelationSet::OWNERSHIP)? {
            if let Some(node) = store.get_entity(&edge.child)? {
                children.push(node);
            }
        }

        Ok(Self {
            chains: ChainRootResolver::new(store).resolve(id)?,
            has_additional_relationships: has_additional_relationships(store, id)?,
            company,
            parents,
            children,
        })
    }
}

/// True when any non-ownership edge touches `id`, or sits anywhere above the
/// parents of the edges that touch it
pub fn has_additional_relationships<S: GraphStore + ?Sized>(
    store: &S,
    id: &EntityId,
) -> Result<bool, GraphError> {
    let mut touching = store.edges_by_child(id, RelationSet::ALL)?;
    touching.extend(store.edges_by_parent(id, RelationSet::ALL)?);

    let mut visited: HashSet<EntityId> = HashSet::new();
    let mut queue: VecDeque<EntityId> = VecDeque::new();

    for edge in touching {
        if store.get_entity(&edge.parent)?.is_none() {
            continue;
        }
        if edge.relation != RelationType::Ownership {
            return Ok(true);
        }
        if visited.insert(edge.parent.clone()) {
            queue.push_back(edge.parent);
        }
    }

    while let Some(current) = queue.pop_front() {
        for edge in store.edges_by_child(&current, RelationSet::ALL)? {
            if store.get_entity(&edge.parent)?.is_none() {
                continue;
            }
            if edge.relation != RelationType::Ownership {
                return Ok(true);
            }
            if visited.insert(edge.parent.clone()) {
                queue.push_back(edge.parent);
            }
        }
    }

    Ok(false)
}

/// Names of investors, investments and otherwise related companies
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdditionalInfo {
    pub investors: Vec<String>,
    pub investments: Vec<String>,
    pub related: Vec<String>,
}

impl AdditionalInfo {
    /// Distinct names, each list sorted
    pub fn load<S: GraphStore + ?Sized>(store: &S, id: &EntityId) -> Result<Self, GraphError> {
        let investment = RelationSet::EMPTY.with(RelationType::Investment);
        let other = RelationSet::EMPTY.with(RelationType::Other);

        let mut investors = BTreeSet::new();
        for edge in store.edges_by_child(id, investment)? {
            investors.extend(name_of(store, &edge.parent)?);
        }

        let mut investments = BTreeSet::new();
        for edge in store.edges_by_parent(id, investment)? {
            investments.extend(name_of(store, &edge.child)?);
        }

        let mut related = BTreeSet::new();
        for edge in store.edges_by_child(id, other)? {
            if edge.parent != *id {
                related.extend(name_of(store, &edge.parent)?);
            }
        }
        for edge in store.edges_by_parent(id, other)? {
            if edge.child != *id {
                related.extend(name_of(store, &edge.child)?);
            }
        }

        Ok(Self {
            investors: investors.into_iter().collect(),
            investments: investments.into_iter().collect(),
            related: related.into_iter().collect(),
        })
    }
}

fn name_of<S: GraphStore + ?Sized>(store: &S, id: &EntityId) -> Result<Option<String>, GraphError> {
    Ok(store.get_entity(id)?.map(|node| node.name))
}
