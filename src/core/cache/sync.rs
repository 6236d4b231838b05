//! Cache synchronization with filesystem
//!
//! Methods for rebuilding and incrementally syncing the cache with YAML records.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use miette::{IntoDiagnostic, Result};
use rusqlite::{params, OptionalExtension};

use super::schema::MIRROR_TABLES;
use super::{compute_hash, get_file_mtime, EntityCache, SyncStats, RACY_WINDOW_NANOS};
use crate::core::entity::Entity;
use crate::core::identity::EntityPrefix;
use crate::entities::{Category, Company, Issue, IssueType};
use crate::yaml::parse_yaml;

impl EntityCache {
    /// Full rebuild of cache from filesystem
    ///
    /// Short IDs and the ancestor table survive; everything mirrored from
    /// record files is reloaded.
    pub fn rebuild(&mut self) -> Result<SyncStats> {
        let start = std::time::Instant::now();
        let mut stats = SyncStats::default();

        let sql: String = MIRROR_TABLES
            .iter()
            .map(|table| format!("DELETE FROM {};\n", table))
            .collect();
        self.conn.execute_batch(&sql).into_diagnostic()?;

        let files = self.record_files();
        self.scan_files(&files, &mut stats);

        stats.duration_ms = start.elapsed().as_millis() as u64;
        log::debug!(
            "cache rebuilt: {} files, {} failed, {}ms",
            stats.files_scanned,
            stats.files_failed,
            stats.duration_ms
        );
        Ok(stats)
    }

    /// Cache every file, counting failures instead of aborting
    pub(super) fn scan_files(&mut self, files: &[PathBuf], stats: &mut SyncStats) {
        for path in files {
            stats.files_scanned += 1;

            if let Err(e) = self.cache_entity_file(path) {
                log::warn!("failed to cache {}: {}", path.display(), e);
                stats.files_failed += 1;
            } else {
                stats.entities_added += 1;
            }
        }
    }

    /// Cache a single record file
    pub(super) fn cache_entity_file(&mut self, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path).into_diagnostic()?;
        let mtime = get_file_mtime(path)?;
        let hash = compute_hash(&content);
        let rel_path = self.relative_path(path);

        // The file may have been rewritten under a different id
        if let Some(previous) = self.entity_id_for_file(&rel_path)? {
            self.remove_entity(&previous)?;
        }

        let prefix = EntityPrefix::from_path(path)
            .ok_or_else(|| miette::miette!("cannot tell the record type of {}", rel_path))?;

        let file = FileMeta {
            rel_path: &rel_path,
            mtime,
            hash: &hash,
        };

        match prefix {
            EntityPrefix::Co => {
                let company: Company = parse_yaml(&content, &rel_path)?;
                self.cache_record(&company, &file)?;
                self.cache_company_data(&company)?;
            }
            EntityPrefix::Iss => {
                let issue: Issue = parse_yaml(&content, &rel_path)?;
                self.cache_record(&issue, &file)?;
                self.cache_issue_data(&issue)?;
            }
            EntityPrefix::Ityp => {
                let issue_type: IssueType = parse_yaml(&content, &rel_path)?;
                self.cache_record(&issue_type, &file)?;
                self.cache_issue_type_data(&issue_type)?;
            }
            EntityPrefix::Cat => {
                let category: Category = parse_yaml(&content, &rel_path)?;
                self.cache_record(&category, &file)?;
                self.cache_category_data(&category)?;
            }
        }

        Ok(())
    }

    /// Incremental sync - only update changed files
    pub fn sync(&mut self) -> Result<SyncStats> {
        let start = std::time::Instant::now();
        let mut stats = SyncStats::default();

        let mut current_files: HashMap<String, PathBuf> = HashMap::new();
        for path in self.record_files() {
            current_files.insert(self.relative_path(&path), path);
            stats.files_scanned += 1;
        }

        let mut cached_files: HashMap<String, (i64, String)> = HashMap::new();
        {
            let mut stmt = self
                .conn
                .prepare("SELECT file_path, file_mtime, file_hash FROM entities")
                .into_diagnostic()?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                })
                .into_diagnostic()?;

            for row in rows {
                let (path, mtime, hash) = row.into_diagnostic()?;
                cached_files.insert(path, (mtime, hash));
            }
        }

        let newest_cached = cached_files.values().map(|(mtime, _)| *mtime).max().unwrap_or(0);

        // Deletions first, so an id moved between files is not dropped afterwards
        for rel_path in cached_files.keys() {
            if !current_files.contains_key(rel_path) {
                if let Some(id) = self.entity_id_for_file(rel_path)? {
                    self.remove_entity(&id)?;
                    stats.entities_removed += 1;
                }
            }
        }

        let mut paths: Vec<&String> = current_files.keys().collect();
        paths.sort();

        for rel_path in paths {
            let full_path = &current_files[rel_path];
            let needs_update = match cached_files.get(rel_path) {
                Some((cached_mtime, cached_hash)) => {
                    let current_mtime = get_file_mtime(full_path)?;
                    let racy = current_mtime >= newest_cached - RACY_WINDOW_NANOS;
                    if current_mtime != *cached_mtime || racy {
                        let content = fs::read_to_string(full_path).into_diagnostic()?;
                        compute_hash(&content) != *cached_hash
                    } else {
                        false
                    }
                }
                None => true,
            };

            if !needs_update {
                continue;
            }

            match self.cache_entity_file(full_path) {
                Ok(()) if cached_files.contains_key(rel_path) => stats.entities_updated += 1,
                Ok(()) => stats.entities_added += 1,
                Err(e) => {
                    log::warn!("failed to cache {}: {}", full_path.display(), e);
                    stats.files_failed += 1;
                }
            }
        }

        stats.duration_ms = start.elapsed().as_millis() as u64;
        Ok(stats)
    }

    /// Remove a record from the cache
    ///
    /// Edges recorded on the record go with it; edges other records hold
    /// towards it stay and dangle until those records change.
    pub(super) fn remove_entity(&self, id: &str) -> Result<()> {
        for (table, column) in [
            ("entities", "id"),
            ("companies", "id"),
            ("synonyms", "company_id"),
            ("relationships", "child_id"),
            ("issues", "id"),
            ("issue_types", "id"),
            ("categories", "id"),
            ("category_parents", "category_id"),
        ] {
            self.conn
                .execute(
                    &format!("DELETE FROM {} WHERE {} = ?1", table, column),
                    params![id],
                )
                .into_diagnostic()?;
        }

        Ok(())
    }

    fn entity_id_for_file(&self, rel_path: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT id FROM entities WHERE file_path = ?1",
                params![rel_path],
                |row| row.get(0),
            )
            .optional()
            .into_diagnostic()
    }

    /// Common metadata row plus short ID
    fn cache_record<T: Entity>(&mut self, record: &T, file: &FileMeta<'_>) -> Result<()> {
        let id = record.id().to_string();
        self.remove_entity(&id)?;

        self.conn
            .execute(
                r#"INSERT OR REPLACE INTO entities
                   (id, prefix, title, author, created, file_path, file_mtime, file_hash)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"#,
                params![
                    id,
                    T::PREFIX.as_str(),
                    record.title(),
                    record.author(),
                    record.created().to_rfc3339(),
                    file.rel_path,
                    file.mtime,
                    file.hash
                ],
            )
            .into_diagnostic()?;

        self.ensure_short_id(&id)?;
        Ok(())
    }

    fn cache_company_data(&self, company: &Company) -> Result<()> {
        let id = company.id.to_string();
        self.conn
            .execute(
                r#"INSERT OR REPLACE INTO companies
                   (id, name, category_id, description, img, icon_x, icon_y)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
                params![
                    id,
                    company.name,
                    company.category.as_ref().map(|c| c.to_string()),
                    company.description,
                    company.img,
                    company.icon.x,
                    company.icon.y
                ],
            )
            .into_diagnostic()?;

        for synonym in &company.synonyms {
            self.conn
                .execute(
                    "INSERT INTO synonyms (company_id, synonym) VALUES (?1, ?2)",
                    params![id, synonym],
                )
                .into_diagnostic()?;
        }

        // Insertion order is the record's list order; edge queries read it back by rowid
        for link in &company.relationships {
            self.conn
                .execute(
                    r#"INSERT INTO relationships (parent_id, child_id, relation_type, as_of)
                       VALUES (?1, ?2, ?3, ?4)"#,
                    params![
                        link.parent.to_string(),
                        id,
                        link.relation.as_str(),
                        link.as_of.map(|d| d.to_string())
                    ],
                )
                .into_diagnostic()?;
        }

        Ok(())
    }

    fn cache_issue_data(&self, issue: &Issue) -> Result<()> {
        self.conn
            .execute(
                r#"INSERT OR REPLACE INTO issues
                   (id, company_id, issue_type_id, text, source_url, start_date, end_date,
                    ongoing, content_warning)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
                params![
                    issue.id.to_string(),
                    issue.company.to_string(),
                    issue.issue_type.to_string(),
                    issue.text,
                    issue.source_url,
                    issue.start_date.to_string(),
                    issue.end_date.map(|d| d.to_string()),
                    issue.ongoing,
                    issue.content_warning
                ],
            )
            .into_diagnostic()?;
        Ok(())
    }

    fn cache_issue_type_data(&self, issue_type: &IssueType) -> Result<()> {
        self.conn
            .execute(
                r#"INSERT OR REPLACE INTO issue_types (id, name, icon, color, show_on_top)
                   VALUES (?1, ?2, ?3, ?4, ?5)"#,
                params![
                    issue_type.id.to_string(),
                    issue_type.name,
                    issue_type.icon,
                    issue_type.color,
                    issue_type.show_on_top
                ],
            )
            .into_diagnostic()?;
        Ok(())
    }

    fn cache_category_data(&self, category: &Category) -> Result<()> {
        let id = category.id.to_string();
        self.conn
            .execute(
                "INSERT OR REPLACE INTO categories (id, name, description) VALUES (?1, ?2, ?3)",
                params![id, category.name, category.description],
            )
            .into_diagnostic()?;

        for parent in &category.parents {
            self.conn
                .execute(
                    "INSERT INTO category_parents (category_id, parent_id) VALUES (?1, ?2)",
                    params![id, parent.to_string()],
                )
                .into_diagnostic()?;
        }
        Ok(())
    }
}

/// File facts stored alongside every cached record
struct FileMeta<'a> {
    rel_path: &'a str,
    mtime: i64,
    hash: &'a str,
}
