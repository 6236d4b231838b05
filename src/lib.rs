//! corpweb: a plain-text corporate relationship graph
//!
//! Companies, the ownership / investment / other relationships between them
//! and the issues attached to them live as YAML records in a project
//! directory. A local SQLite cache mirrors the records so the graph core
//! (root resolution, chain walks, the ancestor closure) can answer
//! family-tree questions quickly.

pub mod cli;
pub mod core;
pub mod entities;
pub mod yaml;
