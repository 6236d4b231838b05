//! Cache type definitions
//!
//! Structs returned by cache queries and maintenance operations.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

// =========================================================================
// Cached Record Types
// =========================================================================

/// Cached record metadata (fast access without YAML parsing)
#[derive(Debug, Clone, Serialize)]
pub struct CachedEntity {
    pub id: String,
    pub prefix: String,
    pub title: String,
    pub author: String,
    pub created: DateTime<Utc>,
    pub file_path: PathBuf,
}

/// Cached company with list statistics
#[derive(Debug, Clone, Serialize)]
pub struct CachedCompany {
    pub id: String,
    pub name: String,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
    pub description: Option<String>,
    /// Issues attached to this company
    pub issue_count: usize,
    /// Companies this one owns or invests in
    pub child_count: usize,
    /// Cached top ownership ancestor (from the last ancestor rebuild)
    pub top_ancestor_id: Option<String>,
    pub top_ancestor_name: Option<String>,
    pub file_path: PathBuf,
}

/// Cached issue joined with its company and issue type
#[derive(Debug, Clone, Serialize)]
pub struct CachedIssue {
    pub id: String,
    pub company_id: String,
    pub company_name: Option<String>,
    pub issue_type_id: String,
    pub issue_type_name: Option<String>,
    pub text: String,
    pub source_url: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub ongoing: bool,
    pub content_warning: Option<String>,
}

impl CachedIssue {
    /// End date if present, else start date
    pub fn listing_date(&self) -> NaiveDate {
        self.end_date.unwrap_or(self.start_date)
    }
}

/// Cached issue type
#[derive(Debug, Clone, Serialize)]
pub struct CachedIssueType {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub show_on_top: bool,
}

/// Cached category
#[derive(Debug, Clone, Serialize)]
pub struct CachedCategory {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Companies placed directly in this category
    pub company_count: usize,
}

// =========================================================================
// Filters
// =========================================================================

/// Filter for listing companies
#[derive(Debug, Default)]
pub struct CompanyFilter {
    /// Restrict to these category ids (typically a category subtree)
    pub categories: Option<Vec<String>>,
    /// Case-insensitive substring of the name or a synonym
    pub search: Option<String>,
    pub limit: Option<usize>,
}

/// Filter for listing issues
#[derive(Debug, Default)]
pub struct IssueFilter {
    pub company: Option<String>,
    /// Restrict to these issue type ids
    pub issue_types: Option<Vec<String>>,
    pub ongoing_only: bool,
    pub limit: Option<usize>,
}

// =========================================================================
// Maintenance
// =========================================================================

/// Statistics from a sync or rebuild operation
#[derive(Debug, Default)]
pub struct SyncStats {
    pub files_scanned: usize,
    pub entities_added: usize,
    pub entities_updated: usize,
    pub entities_removed: usize,
    /// Files that could not be parsed
    pub files_failed: usize,
    pub duration_ms: u64,
}

/// Cache statistics
#[derive(Debug, Default)]
pub struct CacheStats {
    pub total_entities: usize,
    pub total_short_ids: usize,
    pub total_relationships: usize,
    pub ancestor_rows: usize,
    pub by_prefix: HashMap<String, usize>,
    pub db_size_bytes: u64,
}
