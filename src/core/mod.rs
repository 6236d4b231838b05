//! Core module - fundamental types and utilities

pub mod cache;
pub mod config;
pub mod entity;
pub mod graph;
pub mod identity;
pub mod loader;
pub mod project;

pub use cache::{CachedCompany, CachedEntity, CachedIssue, EntityCache, SyncStats};
pub use config::Config;
pub use entity::Entity;
pub use graph::{GraphError, RelationSet, RelationType};
pub use identity::{EntityId, EntityPrefix, IdParseError};
pub use project::{Project, ProjectError};
