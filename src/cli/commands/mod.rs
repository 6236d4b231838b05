//! CLI command implementations

pub mod utils;

pub mod ancestors;
pub mod cache;
pub mod category;
pub mod company;
pub mod completions;
pub mod family;
pub mod init;
pub mod issue;
pub mod issue_type;
pub mod link;
pub mod validate;
