//! SQLite-backed record cache for fast lookups
//!
//! This module provides a local SQLite cache that:
//! - Maps short IDs (PREFIX@N) to full record IDs
//! - Mirrors companies, relationships, issues and categories for graph queries
//! - Holds the materialized top-ancestor table
//! - Auto-detects file changes and syncs incrementally
//! - Supports direct SQL queries for power users
//!
//! IMPORTANT: The cache is user-local and gitignored.
//! Record files must NEVER contain short IDs - only full ULIDs.

mod queries;
mod schema;
mod store;
mod sync;
mod types;

pub use types::*;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use miette::{IntoDiagnostic, Result};
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::core::identity::EntityPrefix;
use crate::core::project::{Project, RECORD_SUFFIX};

/// Cache file location within a project
const CACHE_FILE: &str = ".corpweb/cache.db";

/// Current schema version - cache is rebuilt on version mismatch
const SCHEMA_VERSION: i32 = 2;

/// Files modified this close to the newest cached mtime may have been
/// rewritten within one filesystem timestamp tick, so their hash is checked
const RACY_WINDOW_NANOS: i64 = 2_000_000_000;

/// The record cache backed by SQLite
pub struct EntityCache {
    conn: Connection,
    project_root: PathBuf,
}

impl EntityCache {
    /// Open or create cache for a project
    ///
    /// If the cache doesn't exist, it will be created and populated.
    /// If the cache is stale (files changed), it will be synced automatically.
    pub fn open(project: &Project) -> Result<Self> {
        let needs_init = !project.root().join(CACHE_FILE).exists();
        let mut cache = Self::connect(project)?;

        if needs_init {
            cache.init_schema()?;
            cache.rebuild()?;
        } else {
            // Schema mismatch means a full rebuild, there are no migrations
            if cache.needs_schema_rebuild()? {
                cache.reinitialize_schema()?;
            }
            cache.auto_sync()?;
        }

        Ok(cache)
    }

    /// Open cache without auto-sync (for testing)
    pub fn open_without_sync(project: &Project) -> Result<Self> {
        let needs_init = !project.root().join(CACHE_FILE).exists();
        let mut cache = Self::connect(project)?;
        if needs_init {
            cache.init_schema()?;
        }
        Ok(cache)
    }

    fn connect(project: &Project) -> Result<Self> {
        let cache_path = project.root().join(CACHE_FILE);
        if let Some(parent) = cache_path.parent() {
            fs::create_dir_all(parent).into_diagnostic()?;
        }

        let conn = Connection::open(&cache_path).into_diagnostic()?;
        // WAL lets readers keep the old ancestor table while a rebuild commits
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .into_diagnostic()?;

        Ok(Self {
            conn,
            project_root: project.root().to_path_buf(),
        })
    }

    /// Check if schema version matches current version
    fn needs_schema_rebuild(&self) -> Result<bool> {
        let current_version: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        Ok(current_version != SCHEMA_VERSION)
    }

    /// Drop all tables and reinitialize schema, then rebuild
    fn reinitialize_schema(&mut self) -> Result<()> {
        log::info!("cache schema changed, rebuilding {}", CACHE_FILE);
        self.drop_tables()?;
        self.init_schema()?;
        self.rebuild()?;
        Ok(())
    }

    /// Auto-sync: quickly check if any files changed and sync if needed
    fn auto_sync(&mut self) -> Result<()> {
        let cached_max_mtime: Option<i64> = self
            .conn
            .query_row("SELECT MAX(file_mtime) FROM entities", [], |row| row.get(0))
            .optional()
            .into_diagnostic()?
            .flatten();

        if self.has_newer_files(cached_max_mtime.unwrap_or(0))? {
            self.sync()?;
        }

        Ok(())
    }

    /// Check if any record files are at least as new as the given mtime, or
    /// were added or deleted since the last sync
    ///
    /// Equal counts as newer: a rewrite within the same timestamp tick keeps
    /// the mtime.
    fn has_newer_files(&self, max_cached_mtime: i64) -> Result<bool> {
        let files = self.record_files();

        for path in &files {
            if get_file_mtime(path)? >= max_cached_mtime {
                return Ok(true);
            }
        }

        let cached_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM entities", [], |row| row.get(0))
            .into_diagnostic()?;

        Ok(files.len() as i64 != cached_count)
    }

    /// Every record file under the project, in a stable order
    fn record_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for prefix in EntityPrefix::all() {
            let dir = self.project_root.join(prefix.directory());
            if !dir.exists() {
                continue;
            }
            for entry in WalkDir::new(&dir)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                if entry.path().to_string_lossy().ends_with(RECORD_SUFFIX) {
                    files.push(entry.into_path());
                }
            }
        }
        files
    }

    /// Path relative to the project root, as stored in the entities table
    fn relative_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.project_root)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string()
    }

    /// Assign a short ID to a record if it doesn't have one yet
    pub fn ensure_short_id(&mut self, entity_id: &str) -> Result<String> {
        let existing: Option<String> = self
            .conn
            .query_row(
                "SELECT short_id FROM short_ids WHERE entity_id = ?1",
                params![entity_id],
                |row| row.get(0),
            )
            .optional()
            .into_diagnostic()?;

        if let Some(short_id) = existing {
            return Ok(short_id);
        }

        let prefix = entity_id
            .split('-')
            .next()
            .ok_or_else(|| miette::miette!("Invalid record ID format"))?;

        let next_id: i64 = self
            .conn
            .query_row(
                "SELECT next_id FROM short_id_counters WHERE prefix = ?1",
                params![prefix],
                |row| row.get(0),
            )
            .optional()
            .into_diagnostic()?
            .unwrap_or(1);

        let short_id = format!("{}@{}", prefix, next_id);

        self.conn
            .execute(
                "INSERT INTO short_ids (short_id, entity_id, prefix) VALUES (?1, ?2, ?3)",
                params![short_id, entity_id, prefix],
            )
            .into_diagnostic()?;

        self.conn
            .execute(
                "INSERT OR REPLACE INTO short_id_counters (prefix, next_id) VALUES (?1, ?2)",
                params![prefix, next_id + 1],
            )
            .into_diagnostic()?;

        Ok(short_id)
    }

    /// Resolve a short ID to full record ID
    pub fn resolve_short_id(&self, short_id: &str) -> Option<String> {
        // PREFIX@N, prefix is case-insensitive
        let (prefix, num) = short_id.split_once('@')?;
        let normalized = format!("{}@{}", prefix.to_ascii_uppercase(), num);

        self.conn
            .query_row(
                "SELECT entity_id FROM short_ids WHERE short_id = ?1",
                params![normalized],
                |row| row.get(0),
            )
            .optional()
            .ok()
            .flatten()
    }

    /// Get short ID for a record
    pub fn get_short_id(&self, entity_id: &str) -> Option<String> {
        self.conn
            .query_row(
                "SELECT short_id FROM short_ids WHERE entity_id = ?1",
                params![entity_id],
                |row| row.get(0),
            )
            .optional()
            .ok()
            .flatten()
    }

    /// Get cache statistics
    pub fn statistics(&self) -> Result<CacheStats> {
        let count = |sql: &str| -> Result<usize> {
            self.conn
                .query_row(sql, [], |row| row.get::<_, i64>(0))
                .map(|n| n as usize)
                .into_diagnostic()
        };

        let total_entities = count("SELECT COUNT(*) FROM entities")?;
        let total_short_ids = count("SELECT COUNT(*) FROM short_ids")?;
        let total_relationships = count("SELECT COUNT(*) FROM relationships")?;
        let ancestor_rows = count("SELECT COUNT(*) FROM entity_ancestors")?;

        let mut by_prefix = HashMap::new();
        {
            let mut stmt = self
                .conn
                .prepare("SELECT prefix, COUNT(*) FROM entities GROUP BY prefix")
                .into_diagnostic()?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
                })
                .into_diagnostic()?;

            for row in rows {
                let (prefix, count) = row.into_diagnostic()?;
                by_prefix.insert(prefix, count);
            }
        }

        let db_path = self.project_root.join(CACHE_FILE);
        let db_size_bytes = fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

        Ok(CacheStats {
            total_entities,
            total_short_ids,
            total_relationships,
            ancestor_rows,
            by_prefix,
            db_size_bytes,
        })
    }

    /// Execute raw SQL query (read-only)
    pub fn query_raw(&self, sql: &str) -> Result<Vec<Vec<String>>> {
        let mut stmt = self.conn.prepare(sql).into_diagnostic()?;
        if !stmt.readonly() {
            return Err(miette::miette!("only read-only queries are allowed"));
        }
        let column_count = stmt.column_count();

        let rows = stmt
            .query_map([], |row| {
                let mut values = Vec::with_capacity(column_count);
                for i in 0..column_count {
                    let value: String = row
                        .get::<_, rusqlite::types::Value>(i)
                        .map(|v| match v {
                            rusqlite::types::Value::Null => "NULL".to_string(),
                            rusqlite::types::Value::Integer(i) => i.to_string(),
                            rusqlite::types::Value::Real(f) => f.to_string(),
                            rusqlite::types::Value::Text(s) => s,
                            rusqlite::types::Value::Blob(_) => "<blob>".to_string(),
                        })
                        .unwrap_or_default();
                    values.push(value);
                }
                Ok(values)
            })
            .into_diagnostic()?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .into_diagnostic()
    }

    /// Get column names for a query
    pub fn query_columns(&self, sql: &str) -> Result<Vec<String>> {
        let stmt = self.conn.prepare(sql).into_diagnostic()?;
        Ok(stmt.column_names().iter().map(|s| s.to_string()).collect())
    }

    /// Clear the entire cache, including short IDs and the ancestor table
    pub fn clear(&mut self) -> Result<()> {
        let mut sql = String::from(
            "DELETE FROM short_ids;
             DELETE FROM short_id_counters;
             DELETE FROM entity_ancestors;\n",
        );
        for table in schema::MIRROR_TABLES {
            sql.push_str(&format!("DELETE FROM {};\n", table));
        }
        self.conn.execute_batch(&sql).into_diagnostic()
    }
}

/// Get file modification time in nanoseconds since the Unix epoch
fn get_file_mtime(path: &Path) -> Result<i64> {
    let metadata = fs::metadata(path).into_diagnostic()?;
    let mtime = metadata
        .modified()
        .into_diagnostic()?
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0);
    Ok(mtime)
}

/// Compute SHA256 hash of content
fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Parse datetime string to DateTime<Utc>
fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc.timestamp_opt(0, 0).single().unwrap_or_default())
}

/// Parse an optional ISO date column
fn parse_date(s: Option<String>) -> Option<NaiveDate> {
    s.and_then(|s| s.parse().ok())
}

/// Read a required ISO date column
fn date_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(idx)?;
    text.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
