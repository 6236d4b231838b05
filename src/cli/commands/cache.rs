//! `corpweb cache` command - Manage the record cache
//!
//! The cache is a local SQLite database that stores:
//! - Short ID mappings (PREFIX@N -> full record ID)
//! - Mirrors of companies, relationships, issues and categories
//! - The materialized top-ancestor table
//!
//! The cache is user-local (gitignored) and auto-rebuilds from record files.

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::commands::utils::open_project;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::cache::EntityCache;
use crate::core::project::Project;

#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Rebuild the cache from scratch
    Rebuild,

    /// Sync cache with filesystem changes (incremental)
    Sync,

    /// Show cache statistics
    Status,

    /// Execute SQL query against cache (read-only)
    Query {
        /// SQL query to execute
        sql: String,
    },

    /// Empty the cache (short IDs are reassigned on next use)
    Clear {
        /// Delete the database files instead of emptying them
        #[arg(long)]
        purge: bool,
    },
}

pub fn run(cmd: CacheCommands, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    match cmd {
        CacheCommands::Rebuild => run_rebuild(&project, global),
        CacheCommands::Sync => run_sync(&project, global),
        CacheCommands::Status => run_status(&project),
        CacheCommands::Query { sql } => run_query(&project, &sql, global.format),
        CacheCommands::Clear { purge } => run_clear(&project, purge),
    }
}

fn cache_path(project: &Project) -> std::path::PathBuf {
    project.config_dir().join("cache.db")
}

fn run_rebuild(project: &Project, global: &GlobalOpts) -> Result<()> {
    let mut cache = EntityCache::open_without_sync(project)?;

    if !global.quiet {
        println!("{} Rebuilding cache...", style("→").blue());
    }
    let stats = cache.rebuild()?;

    println!(
        "{} Cache rebuilt in {}ms",
        style("✓").green(),
        stats.duration_ms
    );
    println!("  Files scanned:  {}", stats.files_scanned);
    println!("  Records cached: {}", stats.entities_added);
    if stats.files_failed > 0 {
        println!(
            "  {} {} file(s) could not be read. Run {} for details.",
            style("!").yellow(),
            stats.files_failed,
            style("corpweb validate").yellow()
        );
    }

    Ok(())
}

fn run_sync(project: &Project, global: &GlobalOpts) -> Result<()> {
    let mut cache = EntityCache::open_without_sync(project)?;
    let stats = cache.sync()?;

    if stats.entities_added == 0 && stats.entities_updated == 0 && stats.entities_removed == 0 {
        if !global.quiet {
            println!("{} Cache is up to date", style("✓").green());
        }
        return Ok(());
    }

    println!(
        "{} Cache synced in {}ms",
        style("✓").green(),
        stats.duration_ms
    );
    if stats.entities_added > 0 {
        println!("  Added:   {}", style(stats.entities_added).green());
    }
    if stats.entities_updated > 0 {
        println!("  Updated: {}", style(stats.entities_updated).yellow());
    }
    if stats.entities_removed > 0 {
        println!("  Removed: {}", style(stats.entities_removed).red());
    }

    Ok(())
}

fn run_status(project: &Project) -> Result<()> {
    let cache = EntityCache::open(project)?;
    let stats = cache.statistics()?;

    println!("{}", style("Cache Status").bold());
    println!("{}", style("─".repeat(40)).dim());
    println!("  Location:        {}", cache_path(project).display());
    println!("  Total records:   {}", style(stats.total_entities).cyan());
    println!("  Total short IDs: {}", style(stats.total_short_ids).cyan());
    println!("  Relationships:   {}", style(stats.total_relationships).cyan());
    println!("  Ancestor rows:   {}", style(stats.ancestor_rows).cyan());
    println!(
        "  Database size:   {} KB",
        style(stats.db_size_bytes / 1024).cyan()
    );

    if !stats.by_prefix.is_empty() {
        println!();
        println!("  {}", style("By Type:").bold());
        let mut prefixes: Vec<_> = stats.by_prefix.iter().collect();
        prefixes.sort_by_key(|(k, _)| *k);
        for (prefix, count) in prefixes {
            println!("    {:<6} {}", prefix, count);
        }
    }

    Ok(())
}

fn run_query(project: &Project, sql: &str, format: OutputFormat) -> Result<()> {
    let cache = EntityCache::open(project)?;

    let columns = cache.query_columns(sql)?;
    let rows = cache.query_raw(sql)?;

    let objects = || -> Vec<serde_json::Value> {
        rows.iter()
            .map(|row| {
                let obj: serde_json::Map<String, serde_json::Value> = columns
                    .iter()
                    .zip(row)
                    .map(|(col, val)| (col.clone(), serde_json::Value::String(val.clone())))
                    .collect();
                serde_json::Value::Object(obj)
            })
            .collect()
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&objects()).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&objects()).into_diagnostic()?);
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            writer.write_record(&columns).into_diagnostic()?;
            for row in &rows {
                writer.write_record(row).into_diagnostic()?;
            }
            writer.flush().into_diagnostic()?;
        }
        _ => {
            println!("{}", columns.join("\t"));
            for row in &rows {
                println!("{}", row.join("\t"));
            }
        }
    }

    Ok(())
}

fn run_clear(project: &Project, purge: bool) -> Result<()> {
    let path = cache_path(project);
    if !path.exists() {
        println!("No cache to clear");
        return Ok(());
    }

    if !purge {
        let mut cache = EntityCache::open_without_sync(project)?;
        cache.clear()?;
        println!("{} Cache cleared", style("✓").green());
        return Ok(());
    }

    std::fs::remove_file(&path)
        .map_err(|e| miette::miette!("Failed to remove cache: {}", e))?;
    for suffix in ["-journal", "-wal", "-shm"] {
        let side = project.config_dir().join(format!("cache.db{}", suffix));
        if side.exists() {
            std::fs::remove_file(&side).into_diagnostic()?;
        }
    }
    println!("{} Cache removed", style("✓").green());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn create_test_project() -> (tempfile::TempDir, Project) {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        (tmp, project)
    }

    fn write_company(project: &Project, id: &str, name: &str) {
        let path = project
            .root()
            .join("companies")
            .join(format!("{}.cw.yaml", id));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            format!(
                "id: {}\nname: {}\ncreated: 2024-01-15T10:30:00Z\nauthor: Test\n",
                id, name
            ),
        )
        .unwrap();
    }

    #[test]
    fn test_cache_purge_removes_file() {
        let (_tmp, project) = create_test_project();
        {
            let _cache = EntityCache::open(&project).unwrap();
        }
        let path = cache_path(&project);
        assert!(path.exists());

        run_clear(&project, true).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_cache_rebuild_and_query() {
        let (_tmp, project) = create_test_project();
        write_company(&project, "CO-01HC2JB7SMQX7RS1Y0GFKBHPTD", "Acme");

        let mut cache = EntityCache::open_without_sync(&project).unwrap();
        let stats = cache.rebuild().unwrap();
        assert_eq!(stats.entities_added, 1);

        let rows = cache.query_raw("SELECT id, title FROM entities").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][1], "Acme");
    }

    #[test]
    fn test_cache_clear_keeps_database() {
        let (_tmp, project) = create_test_project();
        write_company(&project, "CO-01HC2JB7SMQX7RS1Y0GFKBHPTD", "Acme");
        {
            let _cache = EntityCache::open(&project).unwrap();
        }

        run_clear(&project, false).unwrap();
        assert!(cache_path(&project).exists());

        let cache = EntityCache::open_without_sync(&project).unwrap();
        assert_eq!(cache.statistics().unwrap().total_entities, 0);
    }
}
