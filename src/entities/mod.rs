//! Record type definitions
//!
//! corpweb stores four record types as YAML files:
//!
//! - [`Company`] - graph nodes; each company lists its incoming relationships
//! - [`Issue`] - issues attached to one company
//! - [`IssueType`] - display metadata shared by issues
//! - [`Category`] - hierarchical company classification

pub mod category;
pub mod company;
pub mod issue;
pub mod issue_type;

pub use category::Category;
pub use company::{Company, IconPosition, ParentLink};
pub use issue::Issue;
pub use issue_type::IssueType;
