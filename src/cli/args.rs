//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    ancestors::AncestorsCommands, cache::CacheCommands, category::CategoryCommands,
    company::CompanyCommands, completions::CompletionsArgs, family::FamilyCommands,
    init::InitArgs, issue::IssueCommands, issue_type::IssueTypeCommands, link::LinkCommands,
    validate::ValidateArgs,
};

#[derive(Parser)]
#[command(name = "corpweb")]
#[command(author, version, about = "Corporate relationship graph toolkit")]
#[command(
    long_about = "Track companies, who owns or invests in whom, and the issues attached to them, as plain-text YAML records with a local query cache."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (default: auto-detect by finding .corpweb/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new corpweb project
    Init(InitArgs),

    /// Company records
    #[command(subcommand)]
    Company(CompanyCommands),

    /// Add or remove relationships between companies
    #[command(subcommand)]
    Link(LinkCommands),

    /// Issues attached to companies
    #[command(subcommand)]
    Issue(IssueCommands),

    /// Issue types (display metadata for issues)
    #[command(subcommand)]
    IssueType(IssueTypeCommands),

    /// Company categories
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Family graph, roots and full-graph export
    #[command(subcommand)]
    Family(FamilyCommands),

    /// Materialized top-ancestor cache
    #[command(subcommand)]
    Ancestors(AncestorsCommands),

    /// Validate records, references and ownership cycles
    Validate(ValidateArgs),

    /// Manage the local record cache
    #[command(subcommand)]
    Cache(CacheCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (tsv for lists, pretty for show)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just IDs, one per line
    Id,
    /// Just short IDs (PREFIX@N), one per line
    ShortId,
}

impl OutputFormat {
    /// Resolve `Auto` to a concrete format
    pub fn or(self, fallback: OutputFormat) -> OutputFormat {
        match self {
            OutputFormat::Auto => fallback,
            f => f,
        }
    }
}
