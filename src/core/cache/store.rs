//! Graph store contracts over the SQLite cache
//!
//! Edge queries read `ORDER BY rowid`, which is the order relationships
//! appear on each child's record, and filter relation types in Rust.

use rusqlite::{params, OptionalExtension};

use super::{date_column, parse_date, EntityCache};
use crate::core::graph::{
    ClosureRow, ClosureStore, CompanyNode, GraphError, GraphStore, Icon, IssueRecord,
    IssueStore, IssueTypeRecord, RelationSet, RelationType, Relationship,
};
use crate::core::identity::EntityId;

const COMPANY_COLUMNS: &str = "id, name, category_id, description, img, icon_x, icon_y";

const EDGE_COLUMNS: &str = "parent_id, child_id, relation_type, as_of";

/// Raw company row before id parsing
type CompanyRow = (
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<i32>,
    Option<i32>,
);

/// Raw relationship row before id parsing
type EdgeRow = (String, String, String, Option<String>);

fn parse_id(raw: &str) -> Result<EntityId, GraphError> {
    EntityId::parse(raw).map_err(|e| GraphError::Store(format!("bad id '{}' in cache: {}", raw, e)))
}

fn company_from_row(row: CompanyRow) -> Result<CompanyNode, GraphError> {
    let (id, name, category, description, img, x, y) = row;
    Ok(CompanyNode {
        id: parse_id(&id)?,
        name,
        // A malformed category id is not worth failing a traversal over
        category: category.and_then(|c| EntityId::parse(&c).ok()),
        description: description.unwrap_or_default(),
        icon: Icon {
            img: img.unwrap_or_default(),
            x,
            y,
        },
    })
}

fn edge_from_row(row: EdgeRow) -> Result<Relationship, GraphError> {
    let (parent, child, relation, as_of) = row;
    let relation: RelationType = relation.parse().map_err(GraphError::Store)?;
    Ok(Relationship {
        parent: parse_id(&parent)?,
        child: parse_id(&child)?,
        relation,
        as_of: parse_date(as_of),
    })
}

impl EntityCache {
    fn query_companies(
        &self,
        clause: &str,
        param: Option<&str>,
    ) -> Result<Vec<CompanyNode>, GraphError> {
        let sql = format!("SELECT {} FROM companies {}", COMPANY_COLUMNS, clause);
        let mut stmt = self.conn.prepare(&sql)?;
        let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<CompanyRow> {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
            ))
        };
        let rows = match param {
            Some(p) => stmt
                .query_map(params![p], map_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
            None => stmt
                .query_map([], map_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
        };
        rows.into_iter().map(company_from_row).collect()
    }

    fn query_edges(
        &self,
        clause: &str,
        param: Option<&str>,
        types: RelationSet,
    ) -> Result<Vec<Relationship>, GraphError> {
        let sql = format!(
            "SELECT {} FROM relationships {} ORDER BY rowid",
            EDGE_COLUMNS, clause
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<EdgeRow> {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        };
        let rows = match param {
            Some(p) => stmt
                .query_map(params![p], map_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
            None => stmt
                .query_map([], map_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
        };

        let mut edges = Vec::with_capacity(rows.len());
        for row in rows {
            let edge = edge_from_row(row)?;
            if types.contains(edge.relation) {
                edges.push(edge);
            }
        }
        Ok(edges)
    }
}

impl GraphStore for EntityCache {
    fn get_entity(&self, id: &EntityId) -> Result<Option<CompanyNode>, GraphError> {
        Ok(self
            .query_companies("WHERE id = ?1", Some(&id.to_string()))?
            .into_iter()
            .next())
    }

    fn edges_by_parent(
        &self,
        id: &EntityId,
        types: RelationSet,
    ) -> Result<Vec<Relationship>, GraphError> {
        self.query_edges("WHERE parent_id = ?1", Some(&id.to_string()), types)
    }

    fn edges_by_child(
        &self,
        id: &EntityId,
        types: RelationSet,
    ) -> Result<Vec<Relationship>, GraphError> {
        self.query_edges("WHERE child_id = ?1", Some(&id.to_string()), types)
    }

    fn all_entities(&self) -> Result<Vec<CompanyNode>, GraphError> {
        self.query_companies("ORDER BY id", None)
    }

    fn all_edges(&self) -> Result<Vec<Relationship>, GraphError> {
        self.query_edges("", None, RelationSet::ALL)
    }
}

impl IssueStore for EntityCache {
    fn issues_for_entities(&self, ids: &[EntityId]) -> Result<Vec<IssueRecord>, GraphError> {
        let mut stmt = self.conn.prepare(
            r#"SELECT i.id, i.company_id, i.text, i.source_url, i.start_date, i.end_date,
                      i.ongoing, i.content_warning,
                      t.id, t.name, t.icon, t.color, t.show_on_top
               FROM issues i
               LEFT JOIN issue_types t ON t.id = i.issue_type_id
               WHERE i.company_id = ?1
               ORDER BY i.rowid"#,
        )?;

        let mut issues = Vec::new();
        for entity in ids {
            let rows = stmt
                .query_map(params![entity.to_string()], |row| {
                    let issue_type = match row.get::<_, Option<String>>(8)? {
                        Some(type_id) => Some((
                            type_id,
                            row.get::<_, String>(9)?,
                            row.get::<_, String>(10)?,
                            row.get::<_, String>(11)?,
                            row.get::<_, bool>(12)?,
                        )),
                        None => None,
                    };
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        date_column(row, 4)?,
                        parse_date(row.get(5)?),
                        row.get::<_, bool>(6)?,
                        row.get::<_, Option<String>>(7)?,
                        issue_type,
                    ))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            for (id, text, source_url, start_date, end_date, ongoing, content_warning, ty) in rows
            {
                let issue_type = match ty {
                    Some((type_id, name, icon, color, show_on_top)) => Some(IssueTypeRecord {
                        id: parse_id(&type_id)?,
                        name,
                        icon,
                        color,
                        show_on_top,
                    }),
                    None => None,
                };
                issues.push(IssueRecord {
                    id: parse_id(&id)?,
                    entity_id: entity.clone(),
                    issue_type,
                    text,
                    source_url,
                    start_date,
                    end_date,
                    ongoing,
                    content_warning,
                });
            }
        }

        Ok(issues)
    }
}

impl ClosureStore for EntityCache {
    fn replace_all(&mut self, rows: &[ClosureRow]) -> Result<(), GraphError> {
        // Dropping the transaction without commit rolls it back
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM entity_ancestors", [])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO entity_ancestors (entity_id, ancestor_id) VALUES (?1, ?2)",
            )?;
            for row in rows {
                insert.execute(params![row.entity_id.to_string(), row.ancestor_id.to_string()])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn lookup(&self, id: &EntityId) -> Result<Option<EntityId>, GraphError> {
        let ancestor: Option<String> = self
            .conn
            .query_row(
                "SELECT ancestor_id FROM entity_ancestors WHERE entity_id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        ancestor.map(|a| parse_id(&a)).transpose()
    }
}
