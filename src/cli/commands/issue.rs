//! `corpweb issue` command - Issues attached to companies

use chrono::NaiveDate;
use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::commands::utils::{open_project, output_format, print_structured, resolve};
use crate::cli::helpers::{format_short_id, parse_date, relation_scope, truncate_str};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::cache::{EntityCache, IssueFilter};
use crate::core::graph::views::{issue_chain, relevance_date};
use crate::core::identity::EntityPrefix;
use crate::core::loader::save_entity;
use crate::core::Config;
use crate::entities::Issue;

#[derive(Subcommand, Debug)]
pub enum IssueCommands {
    /// List issues, newest first
    List(ListArgs),

    /// Record a new issue against a company
    New(NewArgs),

    /// Issues across a company's whole family
    Chain(ChainArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only issues of this company (CO@N, ID or name)
    #[arg(long, short = 'c')]
    pub company: Option<String>,

    /// Only issues of these types (repeatable)
    #[arg(long = "type", short = 't')]
    pub issue_types: Vec<String>,

    /// Only ongoing issues
    #[arg(long)]
    pub ongoing: bool,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show count only
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Company the issue is about (CO@N, ID or name)
    pub company: String,

    /// Issue type (ITYP@N, ID or name)
    #[arg(long = "type", short = 't')]
    pub issue_type: String,

    /// Description of the issue
    #[arg(long)]
    pub text: String,

    /// Start date (YYYY-MM-DD, default: today)
    #[arg(long, value_parser = parse_date)]
    pub start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub end: Option<NaiveDate>,

    /// Still happening
    #[arg(long)]
    pub ongoing: bool,

    /// Source link
    #[arg(long)]
    pub source_url: Option<String>,

    /// Warning shown before the text
    #[arg(long)]
    pub content_warning: Option<String>,

    /// Open in editor after creation
    #[arg(long, short = 'e')]
    pub edit: bool,
}

#[derive(clap::Args, Debug)]
pub struct ChainArgs {
    /// Company (CO@N, ID or name)
    pub company: String,

    /// Follow investment and other relationships as well as ownership
    #[arg(long)]
    pub all: bool,
}

const LIST_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("date", "DATE", 12),
    ColumnDef::new("company", "COMPANY", 24),
    ColumnDef::new("type", "TYPE", 16),
    ColumnDef::new("ongoing", "ONGOING", 8),
    ColumnDef::new("text", "TEXT", 48),
];

const CHAIN_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("date", "DATE", 12),
    ColumnDef::new("path", "PATH", 40),
    ColumnDef::new("type", "TYPE", 16),
    ColumnDef::new("text", "TEXT", 48),
];

pub fn run(cmd: IssueCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        IssueCommands::List(args) => run_list(args, global),
        IssueCommands::New(args) => run_new(args, global),
        IssueCommands::Chain(args) => run_chain(args, global),
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let cache = EntityCache::open(&project)?;

    let company = match args.company {
        Some(ref input) => Some(resolve(&cache, input, EntityPrefix::Co)?.to_string()),
        None => None,
    };
    let issue_types = if args.issue_types.is_empty() {
        None
    } else {
        let ids = args
            .issue_types
            .iter()
            .map(|input| resolve(&cache, input, EntityPrefix::Ityp).map(|id| id.to_string()))
            .collect::<Result<Vec<_>>>()?;
        Some(ids)
    };

    let issues = cache.list_issues(&IssueFilter {
        company,
        issue_types,
        ongoing_only: args.ongoing,
        limit: args.limit,
    });

    if args.count {
        println!("{}", issues.len());
        return Ok(());
    }

    let format = output_format(global, &config, OutputFormat::Tsv);
    if print_structured(&issues, format)? {
        return Ok(());
    }

    let rows = issues.iter().map(|issue| {
        TableRow::new(issue.id.clone(), cache.get_short_id(&issue.id))
            .cell("date", CellValue::Date(issue.listing_date()))
            .cell(
                "company",
                CellValue::Name(
                    issue
                        .company_name
                        .clone()
                        .unwrap_or_else(|| issue.company_id.clone()),
                ),
            )
            .cell(
                "type",
                issue
                    .issue_type_name
                    .clone()
                    .map(CellValue::Text)
                    .unwrap_or(CellValue::Empty),
            )
            .cell("ongoing", CellValue::Flag(issue.ongoing))
            .cell("text", CellValue::Text(issue.text.clone()))
    });

    TableFormatter::new(LIST_COLUMNS, "issue", "ISS")
        .quiet(global.quiet)
        .output(rows, format)
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let cache = EntityCache::open(&project)?;

    let company = resolve(&cache, &args.company, EntityPrefix::Co)?;
    let issue_type = resolve(&cache, &args.issue_type, EntityPrefix::Ityp)?;

    let start = args
        .start
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    if let Some(end) = args.end {
        if end < start {
            return Err(miette::miette!(
                "End date {} is before start date {}",
                end,
                start
            ));
        }
    }

    let mut issue = Issue::new(company, issue_type, args.text, start, config.author());
    issue.end_date = args.end;
    issue.ongoing = args.ongoing;
    issue.source_url = args.source_url.unwrap_or_default();
    issue.content_warning = args.content_warning;

    let file_path = save_entity(&project, &issue)?;
    drop(cache);

    let cache = EntityCache::open(&project)?;
    let short_id = cache.get_short_id(&issue.id.to_string());

    println!(
        "{} Created issue {}",
        style("✓").green(),
        style(short_id.unwrap_or_else(|| format_short_id(&issue.id))).cyan()
    );
    println!("   {}", style(file_path.display()).dim());
    println!("   {}", truncate_str(&issue.text, 60));

    if args.edit {
        println!();
        println!("Opening in {}...", style(config.editor()).yellow());
        config.run_editor(&file_path).into_diagnostic()?;
    }

    Ok(())
}

fn run_chain(args: ChainArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let cache = EntityCache::open(&project)?;

    let source = resolve(&cache, &args.company, EntityPrefix::Co)?;
    let allowed = relation_scope(args.all, config.show_all_relations());
    let today = chrono::Local::now().date_naive();
    let rows = issue_chain(&cache, &source, allowed, today)?;

    let format = output_format(global, &config, OutputFormat::Tsv);
    if print_structured(&rows, format)? {
        return Ok(());
    }

    let table_rows = rows.iter().map(|row| {
        let (id, short_id) = match row.issue {
            Some(ref issue) => {
                let id = issue.id.to_string();
                let short = cache.get_short_id(&id);
                (id, short)
            }
            None => (row.entity_id.to_string(), None),
        };
        let path = if row.is_source {
            CellValue::Name(row.name_path.clone())
        } else {
            CellValue::Text(row.name_path.clone())
        };
        let table_row = TableRow::new(id, short_id).cell("path", path);
        match row.issue {
            Some(ref issue) => table_row
                .cell("date", CellValue::Date(relevance_date(issue, today)))
                .cell(
                    "type",
                    issue
                        .issue_type
                        .as_ref()
                        .map(|t| CellValue::Text(t.name.clone()))
                        .unwrap_or(CellValue::Empty),
                )
                .cell("text", CellValue::Text(issue.text.clone())),
            None => table_row
                .cell("date", CellValue::Empty)
                .cell("text", CellValue::Text("(no issues)".to_string())),
        }
    });

    TableFormatter::new(CHAIN_COLUMNS, "issue", "ISS")
        .quiet(global.quiet)
        .output(table_rows, format)
}
