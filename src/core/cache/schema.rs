//! Database schema initialization

use miette::{IntoDiagnostic, Result};
use rusqlite::params;

use super::{EntityCache, SCHEMA_VERSION};

/// Tables mirrored from record files; emptied on every full rebuild
pub(super) const MIRROR_TABLES: &[&str] = &[
    "entities",
    "companies",
    "synonyms",
    "relationships",
    "issues",
    "issue_types",
    "categories",
    "category_parents",
];

impl EntityCache {
    /// Initialize database schema
    pub(super) fn init_schema(&mut self) -> Result<()> {
        self.conn
            .execute_batch(
                r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            -- Short ID mappings
            CREATE TABLE IF NOT EXISTS short_ids (
                short_id TEXT PRIMARY KEY,
                entity_id TEXT NOT NULL UNIQUE,
                prefix TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_short_ids_entity ON short_ids(entity_id);
            CREATE INDEX IF NOT EXISTS idx_short_ids_prefix ON short_ids(prefix);

            -- Next available short ID per prefix
            CREATE TABLE IF NOT EXISTS short_id_counters (
                prefix TEXT PRIMARY KEY,
                next_id INTEGER NOT NULL DEFAULT 1
            );

            -- Record metadata (common fields for all record types)
            CREATE TABLE IF NOT EXISTS entities (
                id TEXT PRIMARY KEY,
                prefix TEXT NOT NULL,
                title TEXT NOT NULL,
                author TEXT NOT NULL,
                created TEXT NOT NULL,
                file_path TEXT NOT NULL,
                file_mtime INTEGER NOT NULL,
                file_hash TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_entities_prefix ON entities(prefix);
            CREATE INDEX IF NOT EXISTS idx_entities_file_path ON entities(file_path);

            -- Graph nodes
            CREATE TABLE IF NOT EXISTS companies (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                category_id TEXT,
                description TEXT,
                img TEXT,
                icon_x INTEGER,
                icon_y INTEGER
            );
            CREATE INDEX IF NOT EXISTS idx_companies_name ON companies(name);
            CREATE INDEX IF NOT EXISTS idx_companies_category ON companies(category_id);

            CREATE TABLE IF NOT EXISTS synonyms (
                company_id TEXT NOT NULL,
                synonym TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_synonyms_company ON synonyms(company_id);

            -- Graph edges; rowid order is the order edges appear on the child's record
            CREATE TABLE IF NOT EXISTS relationships (
                parent_id TEXT NOT NULL,
                child_id TEXT NOT NULL,
                relation_type TEXT NOT NULL,
                as_of TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_relationships_parent ON relationships(parent_id);
            CREATE INDEX IF NOT EXISTS idx_relationships_child ON relationships(child_id);

            CREATE TABLE IF NOT EXISTS issue_types (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                icon TEXT NOT NULL,
                color TEXT NOT NULL,
                show_on_top INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS issues (
                id TEXT PRIMARY KEY,
                company_id TEXT NOT NULL,
                issue_type_id TEXT NOT NULL,
                text TEXT NOT NULL,
                source_url TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT,
                ongoing INTEGER NOT NULL DEFAULT 0,
                content_warning TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_issues_company ON issues(company_id);
            CREATE INDEX IF NOT EXISTS idx_issues_type ON issues(issue_type_id);

            CREATE TABLE IF NOT EXISTS categories (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT
            );

            CREATE TABLE IF NOT EXISTS category_parents (
                category_id TEXT NOT NULL,
                parent_id TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_category_parents_parent ON category_parents(parent_id);
            CREATE INDEX IF NOT EXISTS idx_category_parents_category ON category_parents(category_id);

            -- Derived: top ownership ancestor per company, replaced wholesale
            CREATE TABLE IF NOT EXISTS entity_ancestors (
                entity_id TEXT PRIMARY KEY,
                ancestor_id TEXT NOT NULL
            );
            "#,
            )
            .into_diagnostic()?;

        // Set schema version
        self.conn
            .execute(
                "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )
            .into_diagnostic()?;

        Ok(())
    }

    /// Drop every table, keeping the database file
    pub(super) fn drop_tables(&mut self) -> Result<()> {
        let mut sql = String::from(
            "DROP TABLE IF EXISTS schema_version;
             DROP TABLE IF EXISTS short_ids;
             DROP TABLE IF EXISTS short_id_counters;
             DROP TABLE IF EXISTS entity_ancestors;\n",
        );
        for table in MIRROR_TABLES {
            sql.push_str(&format!("DROP TABLE IF EXISTS {};\n", table));
        }
        self.conn.execute_batch(&sql).into_diagnostic()
    }
}
