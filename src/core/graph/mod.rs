//! Company graph core
//!
//! Traversals over the typed company graph: upward root resolution, the
//! downward chain walk and its two views, the ancestor closure cache, and
//! per-parent chain roots. Everything here reads through the store traits in
//! [`store`], so the same code runs against the SQLite cache and the
//! in-memory [`MemoryGraph`].

pub mod chain;
pub mod closure;
pub mod lineage;
pub mod memory;
pub mod profile;
pub mod relation;
pub mod roots;
pub mod store;
pub mod types;
pub mod views;
pub mod walk;

use miette::Diagnostic;
use thiserror::Error;

use crate::core::identity::EntityId;

pub use chain::ChainRootResolver;
pub use closure::{AncestorClosure, RebuildStats};
pub use memory::MemoryGraph;
pub use profile::{AdditionalInfo, CompanyProfile};
pub use relation::{RelationSet, RelationType};
pub use roots::RootResolver;
pub use store::{ClosureStore, GraphStore, IssueStore};
pub use types::{
    ChainNode, ChainRoot, ClosureRow, CompanyNode, FamilyEdge, Icon, IssueChainRow, IssueRecord,
    IssueTypeRecord, Relationship,
};
pub use walk::{ChainWalker, Walk};

/// Errors surfaced by graph operations
#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("company not found: {0}")]
    #[diagnostic(
        code(corpweb::graph::not_found),
        help("check the id with 'corpweb company list'")
    )]
    NotFound(EntityId),

    #[error("ancestor cache rebuild failed: {0}")]
    #[diagnostic(
        code(corpweb::graph::rebuild_failed),
        help("the previous ancestor cache is still in place; the rebuild is safe to retry")
    )]
    RebuildFailed(String),

    #[error("store error: {0}")]
    #[diagnostic(code(corpweb::graph::store))]
    Store(String),
}

impl From<rusqlite::Error> for GraphError {
    fn from(err: rusqlite::Error) -> Self {
        GraphError::Store(err.to_string())
    }
}
