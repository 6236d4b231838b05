//! Presentation views built on the chain walk: issue chain, family graph,
//! full graph export

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use super::relation::RelationSet;
use super::roots::RootResolver;
use super::store::{GraphStore, IssueStore};
use super::types::{ChainNode, CompanyNode, FamilyEdge, IssueChainRow, IssueRecord, Relationship};
use super::walk::ChainWalker;
use super::GraphError;
use crate::core::identity::EntityId;

/// Issues of every company in the family of `source`, newest first, the
/// source's own issues on top
///
/// The source always gets at least one row; when it has no issues that row
/// carries `issue: None` and sorts last.
pub fn issue_chain<S>(
    store: &S,
    source: &EntityId,
    allowed: RelationSet,
    today: NaiveDate,
) -> Result<Vec<IssueChainRow>, GraphError>
where
    S: GraphStore + IssueStore + ?Sized,
{
    let roots = RootResolver::new(store).find_roots(source, allowed)?;
    let nodes = ChainWalker::new(store).walk(&roots, allowed, source)?;

    let ids: Vec<EntityId> = nodes.iter().map(|n| n.node.id.clone()).collect();
    let mut by_entity: HashMap<EntityId, Vec<IssueRecord>> = HashMap::new();
    for issue in store.issues_for_entities(&ids)? {
        by_entity
            .entry(issue.entity_id.clone())
            .or_default()
            .push(issue);
    }

    let mut rows = Vec::new();
    for chain_node in nodes {
        let issues = by_entity.remove(&chain_node.node.id).unwrap_or_default();
        if issues.is_empty() {
            if chain_node.is_source {
                rows.push(chain_row(&chain_node, None));
            }
            continue;
        }
        for issue in issues {
            rows.push(chain_row(&chain_node, Some(issue)));
        }
    }

    rows.sort_by(|a, b| compare_relevance(b, a, today));
    Ok(rows)
}

fn chain_row(chain_node: &ChainNode, issue: Option<IssueRecord>) -> IssueChainRow {
    IssueChainRow {
        entity_id: chain_node.node.id.clone(),
        entity_name: chain_node.node.name.clone(),
        issue,
        name_path: chain_node.name_path.clone(),
        is_source: chain_node.is_source,
    }
}

/// Date an issue counts as for recency ordering
pub fn relevance_date(issue: &IssueRecord, today: NaiveDate) -> NaiveDate {
    if issue.ongoing {
        today
    } else {
        issue.end_date.unwrap_or(issue.start_date)
    }
}

/// Ascending comparison: source rows above every non-source row, then by
/// relevance date; rows without an issue have no date and are lowest
fn compare_relevance(a: &IssueChainRow, b: &IssueChainRow, today: NaiveDate) -> Ordering {
    let key = |row: &IssueChainRow| {
        row.issue
            .as_ref()
            .map(|issue| (row.is_source, relevance_date(issue, today)))
    };
    key(a).cmp(&key(b))
}

/// Companies and edges around one company, ready for drawing
#[derive(Debug, Clone, Serialize)]
pub struct FamilyGraph {
    pub nodes: Vec<ChainNode>,
    pub edges: Vec<FamilyEdge>,
}

/// The family of `source`: everything reachable downward from its roots
pub fn family_graph<S>(
    store: &S,
    source: &EntityId,
    allowed: RelationSet,
) -> Result<FamilyGraph, GraphError>
where
    S: GraphStore + ?Sized,
{
    let roots = RootResolver::new(store).find_roots(source, allowed)?;
    let walk = ChainWalker::new(store).traverse(&roots, allowed, source)?;

    let by_id: HashMap<&EntityId, &CompanyNode> =
        walk.nodes.iter().map(|n| (&n.node.id, &n.node)).collect();

    let edges = walk
        .edges
        .iter()
        .filter_map(|edge| {
            let parent = by_id.get(&edge.parent)?;
            let child = by_id.get(&edge.child)?;
            Some(FamilyEdge {
                parent_id: parent.id.clone(),
                parent_name: parent.name.clone(),
                child_id: child.id.clone(),
                child_name: child.name.clone(),
                relation: edge.relation,
                as_of: edge.as_of,
                parent_icon: parent.icon.clone(),
                child_icon: child.icon.clone(),
                is_source_edge: edge.parent == *source,
            })
        })
        .collect();

    Ok(FamilyGraph {
        nodes: walk.nodes,
        edges,
    })
}

/// Every company and every edge between existing companies
#[derive(Debug, Clone, Serialize)]
pub struct FullGraph {
    pub nodes: Vec<CompanyNode>,
    pub links: Vec<Relationship>,
}

pub fn full_graph<S: GraphStore + ?Sized>(store: &S) -> Result<FullGraph, GraphError> {
    let nodes = store.all_entities()?;
    let known: HashSet<&EntityId> = nodes.iter().map(|n| &n.id).collect();
    let links = store
        .all_edges()?
        .into_iter()
        .filter(|edge| {
            let keep = known.contains(&edge.parent) && known.contains(&edge.child);
            if !keep {
                log::debug!("dropping dangling edge {} -> {}", edge.parent, edge.child);
            }
            keep
        })
        .collect();
    Ok(FullGraph { nodes, links })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::memory::MemoryGraph;
    use crate::core::graph::relation::RelationType;
    use crate::core::identity::EntityPrefix;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn issue(
        entity: &EntityId,
        start: NaiveDate,
        end: Option<NaiveDate>,
        ongoing: bool,
    ) -> IssueRecord {
        IssueRecord {
            id: EntityId::new(EntityPrefix::Iss),
            entity_id: entity.clone(),
            issue_type: None,
            text: "issue".to_string(),
            source_url: String::new(),
            start_date: start,
            end_date: end,
            ongoing,
            content_warning: None,
        }
    }

    #[test]
    fn test_source_issue_sorts_above_ongoing_descendant() {
        let today = date(2024, 6, 1);
        let mut graph = MemoryGraph::new();
        let x = graph.add_named("X");
        let y = graph.add_named("Y");
        graph.link(&x, &y, RelationType::Ownership);
        graph.add_issue(issue(&y, date(2020, 1, 1), None, true));
        graph.add_issue(issue(&x, date(2023, 3, 1), Some(date(2023, 4, 1)), false));

        let rows = issue_chain(&graph, &x, RelationSet::OWNERSHIP, today).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].entity_id, x);
        assert!(rows[0].is_source);
        assert_eq!(rows[1].entity_id, y);
        assert_eq!(rows[1].name_path, "X|Y");
    }

    #[test]
    fn test_descendants_sorted_by_relevance() {
        let today = date(2024, 6, 1);
        let mut graph = MemoryGraph::new();
        let x = graph.add_named("X");
        let a = graph.add_named("A");
        let b = graph.add_named("B");
        graph.link(&x, &a, RelationType::Ownership);
        graph.link(&x, &b, RelationType::Ownership);
        graph.add_issue(issue(&a, date(2021, 1, 1), Some(date(2022, 1, 1)), false));
        graph.add_issue(issue(&b, date(2023, 1, 1), None, false));
        graph.add_issue(issue(&a, date(2010, 1, 1), None, true));

        let rows = issue_chain(&graph, &x, RelationSet::OWNERSHIP, today).unwrap();
        let dates: Vec<_> = rows
            .iter()
            .filter_map(|r| r.issue.as_ref())
            .map(|i| relevance_date(i, today))
            .collect();
        assert_eq!(dates, vec![today, date(2023, 1, 1), date(2022, 1, 1)]);
        // Source without issues gets a trailing placeholder row
        let last = rows.last().unwrap();
        assert!(last.is_source);
        assert!(last.issue.is_none());
        assert_eq!(rows.len(), 4);
    }

    #[test]
    fn test_issue_chain_includes_ancestor_family() {
        let today = date(2024, 6, 1);
        let mut graph = MemoryGraph::new();
        let root = graph.add_named("Root");
        let source = graph.add_named("Source");
        let sibling = graph.add_named("Sibling");
        graph.link(&root, &source, RelationType::Ownership);
        graph.link(&root, &sibling, RelationType::Ownership);
        graph.add_issue(issue(&root, date(2024, 1, 1), None, false));
        graph.add_issue(issue(&sibling, date(2023, 1, 1), None, false));

        let rows = issue_chain(&graph, &source, RelationSet::OWNERSHIP, today).unwrap();
        let names: Vec<_> = rows.iter().map(|r| r.entity_name.as_str()).collect();
        assert_eq!(names, vec!["Root", "Sibling", "Source"]);
    }

    #[test]
    fn test_family_graph_marks_source_edges() {
        let mut graph = MemoryGraph::new();
        let root = graph.add_named("Root");
        let source = graph.add_named("Source");
        let child = graph.add_named("Child");
        graph.link(&root, &source, RelationType::Ownership);
        graph.link(&source, &child, RelationType::Investment);

        let owned = family_graph(&graph, &source, RelationSet::OWNERSHIP).unwrap();
        assert_eq!(owned.edges.len(), 1);
        assert!(!owned.edges[0].is_source_edge);

        let all = family_graph(&graph, &source, RelationSet::ALL).unwrap();
        assert_eq!(all.nodes.len(), 3);
        let from_source: Vec<_> = all.edges.iter().filter(|e| e.is_source_edge).collect();
        assert_eq!(from_source.len(), 1);
        assert_eq!(from_source[0].child_name, "Child");
        assert_eq!(from_source[0].relation, RelationType::Investment);
    }

    #[test]
    fn test_full_graph_drops_dangling_links() {
        let mut graph = MemoryGraph::new();
        let a = graph.add_named("A");
        let b = graph.add_named("B");
        graph.link(&a, &b, RelationType::Ownership);
        graph.link(&EntityId::new(EntityPrefix::Co), &b, RelationType::Other);

        let full = full_graph(&graph).unwrap();
        assert_eq!(full.nodes.len(), 2);
        assert_eq!(full.links.len(), 1);
    }
}
