//! Query methods for retrieving cached records
//!
//! Lookup, listing and category-hierarchy queries used by the commands.

use std::collections::HashSet;
use std::path::PathBuf;

use rusqlite::{params, OptionalExtension};

use super::{
    date_column, parse_date, parse_datetime, CachedCategory, CachedCompany, CachedEntity,
    CachedIssue, CachedIssueType, CompanyFilter, EntityCache, IssueFilter,
};
use crate::core::identity::EntityPrefix;

impl EntityCache {
    /// Resolve user input to a full record ID of the given type
    ///
    /// Accepts, in order: a short ID (`CO@3`), a full ID, a unique ID
    /// fragment, an exact name (case-insensitive) and, for companies, a
    /// synonym.
    pub fn resolve_id(&self, input: &str, prefix: EntityPrefix) -> Option<String> {
        let input = input.trim();

        if input.contains('@') {
            return self
                .resolve_short_id(input)
                .filter(|id| id.starts_with(&format!("{}-", prefix.as_str())));
        }

        let exact: Option<String> = self
            .conn
            .query_row(
                "SELECT id FROM entities WHERE id = ?1 AND prefix = ?2",
                params![input.to_uppercase(), prefix.as_str()],
                |row| row.get(0),
            )
            .optional()
            .ok()
            .flatten();
        if exact.is_some() {
            return exact;
        }

        // A fragment only counts when it is unambiguous
        if input.len() >= 4 {
            let matches = self.ids_where(
                "SELECT id FROM entities WHERE prefix = ?1 AND id LIKE ?2 LIMIT 2",
                prefix.as_str(),
                &format!("%{}%", input.to_uppercase()),
            );
            if matches.len() == 1 {
                return matches.into_iter().next();
            }
        }

        let by_title = self.ids_where(
            "SELECT id FROM entities WHERE prefix = ?1 AND title = ?2 COLLATE NOCASE LIMIT 2",
            prefix.as_str(),
            input,
        );
        if let Some(id) = by_title.into_iter().next() {
            return Some(id);
        }

        if prefix == EntityPrefix::Co {
            return self
                .conn
                .query_row(
                    "SELECT company_id FROM synonyms WHERE synonym = ?1 COLLATE NOCASE LIMIT 1",
                    params![input],
                    |row| row.get(0),
                )
                .optional()
                .ok()
                .flatten();
        }

        None
    }

    fn ids_where(&self, sql: &str, prefix: &str, value: &str) -> Vec<String> {
        let mut stmt = match self.conn.prepare(sql) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        let rows = match stmt.query_map(params![prefix, value], |row| row.get::<_, String>(0)) {
            Ok(r) => r,
            Err(_) => return vec![],
        };
        rows.filter_map(|r| r.ok()).collect()
    }

    /// Get record metadata by full ID
    pub fn get_cached_entity(&self, id: &str) -> Option<CachedEntity> {
        self.conn
            .query_row(
                "SELECT id, prefix, title, author, created, file_path FROM entities WHERE id = ?1",
                params![id],
                |row| {
                    Ok(CachedEntity {
                        id: row.get(0)?,
                        prefix: row.get(1)?,
                        title: row.get(2)?,
                        author: row.get(3)?,
                        created: parse_datetime(row.get::<_, String>(4)?),
                        file_path: PathBuf::from(row.get::<_, String>(5)?),
                    })
                },
            )
            .optional()
            .ok()
            .flatten()
    }

    /// Display title of any cached record
    pub fn title_of(&self, id: &str) -> Option<String> {
        self.conn
            .query_row(
                "SELECT title FROM entities WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .ok()
            .flatten()
    }

    /// List companies with issue and child counts and the cached top ancestor
    pub fn list_companies(&self, filter: &CompanyFilter) -> Vec<CachedCompany> {
        let mut sql = String::from(
            r#"SELECT c.id, c.name, c.category_id, cat.name, c.description,
                      (SELECT COUNT(*) FROM issues i WHERE i.company_id = c.id),
                      (SELECT COUNT(*) FROM relationships r
                         WHERE r.parent_id = c.id AND r.relation_type IN ('ownership', 'investment')),
                      a.ancestor_id, top.name, e.file_path
               FROM companies c
               JOIN entities e ON e.id = c.id
               LEFT JOIN categories cat ON cat.id = c.category_id
               LEFT JOIN entity_ancestors a ON a.entity_id = c.id
               LEFT JOIN companies top ON top.id = a.ancestor_id
               WHERE 1=1"#,
        );
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![];

        if let Some(ref categories) = filter.categories {
            if categories.is_empty() {
                return vec![];
            }
            let placeholders = vec!["?"; categories.len()].join(", ");
            sql.push_str(&format!(" AND c.category_id IN ({})", placeholders));
            for category in categories {
                params_vec.push(Box::new(category.clone()));
            }
        }

        if let Some(ref search) = filter.search {
            sql.push_str(
                " AND (c.name LIKE ? OR EXISTS \
                 (SELECT 1 FROM synonyms s WHERE s.company_id = c.id AND s.synonym LIKE ?))",
            );
            let pattern = format!("%{}%", search);
            params_vec.push(Box::new(pattern.clone()));
            params_vec.push(Box::new(pattern));
        }

        sql.push_str(" ORDER BY c.name COLLATE NOCASE");

        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let mut stmt = match self.conn.prepare(&sql) {
            Ok(s) => s,
            Err(_) => return vec![],
        };

        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();

        let rows = match stmt.query_map(params_refs.as_slice(), |row| {
            Ok(CachedCompany {
                id: row.get(0)?,
                name: row.get(1)?,
                category_id: row.get(2)?,
                category_name: row.get(3)?,
                description: row.get(4)?,
                issue_count: row.get::<_, i64>(5)? as usize,
                child_count: row.get::<_, i64>(6)? as usize,
                top_ancestor_id: row.get(7)?,
                top_ancestor_name: row.get(8)?,
                file_path: PathBuf::from(row.get::<_, String>(9)?),
            })
        }) {
            Ok(r) => r,
            Err(_) => return vec![],
        };

        rows.filter_map(|r| r.ok()).collect()
    }

    /// Alternative names recorded for a company
    pub fn company_synonyms(&self, company_id: &str) -> Vec<String> {
        let mut stmt = match self
            .conn
            .prepare("SELECT synonym FROM synonyms WHERE company_id = ?1 ORDER BY rowid")
        {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        let rows = match stmt.query_map(params![company_id], |row| row.get::<_, String>(0)) {
            Ok(r) => r,
            Err(_) => return vec![],
        };
        rows.filter_map(|r| r.ok()).collect()
    }

    /// List issues, newest first by end date (start date when still open)
    pub fn list_issues(&self, filter: &IssueFilter) -> Vec<CachedIssue> {
        let mut sql = String::from(
            r#"SELECT i.id, i.company_id, c.name, i.issue_type_id, t.name, i.text, i.source_url,
                      i.start_date, i.end_date, i.ongoing, i.content_warning
               FROM issues i
               LEFT JOIN companies c ON c.id = i.company_id
               LEFT JOIN issue_types t ON t.id = i.issue_type_id
               WHERE 1=1"#,
        );
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![];

        if let Some(ref company) = filter.company {
            sql.push_str(" AND i.company_id = ?");
            params_vec.push(Box::new(company.clone()));
        }

        if let Some(ref types) = filter.issue_types {
            if types.is_empty() {
                return vec![];
            }
            let placeholders = vec!["?"; types.len()].join(", ");
            sql.push_str(&format!(" AND i.issue_type_id IN ({})", placeholders));
            for issue_type in types {
                params_vec.push(Box::new(issue_type.clone()));
            }
        }

        if filter.ongoing_only {
            sql.push_str(" AND i.ongoing = 1");
        }

        // ISO dates sort correctly as text
        sql.push_str(" ORDER BY COALESCE(i.end_date, i.start_date) DESC, i.id");

        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let mut stmt = match self.conn.prepare(&sql) {
            Ok(s) => s,
            Err(_) => return vec![],
        };

        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();

        let rows = match stmt.query_map(params_refs.as_slice(), |row| {
            Ok(CachedIssue {
                id: row.get(0)?,
                company_id: row.get(1)?,
                company_name: row.get(2)?,
                issue_type_id: row.get(3)?,
                issue_type_name: row.get(4)?,
                text: row.get(5)?,
                source_url: row.get(6)?,
                start_date: date_column(row, 7)?,
                end_date: parse_date(row.get(8)?),
                ongoing: row.get(9)?,
                content_warning: row.get(10)?,
            })
        }) {
            Ok(r) => r,
            Err(_) => return vec![],
        };

        rows.filter_map(|r| r.ok()).collect()
    }

    /// List issue types ordered by name
    pub fn list_issue_types(&self) -> Vec<CachedIssueType> {
        let mut stmt = match self.conn.prepare(
            "SELECT id, name, icon, color, show_on_top FROM issue_types ORDER BY name COLLATE NOCASE",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };

        let rows = match stmt.query_map([], |row| {
            Ok(CachedIssueType {
                id: row.get(0)?,
                name: row.get(1)?,
                icon: row.get(2)?,
                color: row.get(3)?,
                show_on_top: row.get(4)?,
            })
        }) {
            Ok(r) => r,
            Err(_) => return vec![],
        };

        rows.filter_map(|r| r.ok()).collect()
    }

    /// Categories without a parent
    pub fn category_roots(&self) -> Vec<CachedCategory> {
        self.categories_where(
            "WHERE NOT EXISTS (SELECT 1 FROM category_parents p WHERE p.category_id = cat.id)",
            None,
        )
    }

    /// Direct children of a category
    pub fn category_children(&self, parent_id: &str) -> Vec<CachedCategory> {
        self.categories_where(
            "WHERE cat.id IN (SELECT p.category_id FROM category_parents p WHERE p.parent_id = ?1)",
            Some(parent_id),
        )
    }

    pub fn get_category(&self, id: &str) -> Option<CachedCategory> {
        self.categories_where("WHERE cat.id = ?1", Some(id))
            .into_iter()
            .next()
    }

    fn categories_where(&self, clause: &str, param: Option<&str>) -> Vec<CachedCategory> {
        let sql = format!(
            r#"SELECT cat.id, cat.name, cat.description,
                      (SELECT COUNT(*) FROM companies c WHERE c.category_id = cat.id)
               FROM categories cat {} ORDER BY cat.name COLLATE NOCASE"#,
            clause
        );

        let mut stmt = match self.conn.prepare(&sql) {
            Ok(s) => s,
            Err(_) => return vec![],
        };

        let map_row = |row: &rusqlite::Row<'_>| {
            Ok(CachedCategory {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                company_count: row.get::<_, i64>(3)? as usize,
            })
        };

        let rows = match param {
            Some(p) => stmt.query_map(params![p], map_row),
            None => stmt.query_map([], map_row),
        };

        match rows {
            Ok(r) => r.filter_map(|r| r.ok()).collect(),
            Err(_) => vec![],
        }
    }

    /// Every category reachable downward from `root` with its depth, in
    /// depth-first order, root first
    ///
    /// Categories form a DAG in intent only; the visited set keeps a
    /// misrecorded cycle from looping.
    pub fn category_subtree(&self, root: &str) -> Vec<(String, usize)> {
        let mut result = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut stack: Vec<(String, usize)> = vec![(root.to_string(), 0)];

        while let Some((id, depth)) = stack.pop() {
            if !visited.insert(id.clone()) {
                continue;
            }
            let children = self.category_children(&id);
            for child in children.into_iter().rev() {
                if !visited.contains(&child.id) {
                    stack.push((child.id, depth + 1));
                }
            }
            result.push((id, depth));
        }

        result
    }
}
