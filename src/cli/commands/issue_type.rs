//! `corpweb issue-type` command - Issue type records

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::commands::utils::{open_project, output_format, print_structured};
use crate::cli::helpers::format_short_id;
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::cache::EntityCache;
use crate::core::loader::save_entity;
use crate::core::Config;
use crate::entities::IssueType;

#[derive(Subcommand, Debug)]
pub enum IssueTypeCommands {
    /// List issue types by name
    List,

    /// Create a new issue type
    New(NewArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Issue type name
    #[arg(long, short = 'n')]
    pub name: String,

    /// Icon name or image reference
    #[arg(long, default_value = "")]
    pub icon: String,

    /// Display color, e.g. "#c0392b"
    #[arg(long, default_value = "")]
    pub color: String,

    /// List issues of this type ahead of the others
    #[arg(long)]
    pub show_on_top: bool,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("name", "NAME", 28),
    ColumnDef::new("icon", "ICON", 16),
    ColumnDef::new("color", "COLOR", 10),
    ColumnDef::new("top", "ON TOP", 8),
];

pub fn run(cmd: IssueTypeCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        IssueTypeCommands::List => run_list(global),
        IssueTypeCommands::New(args) => run_new(args, global),
    }
}

fn run_list(global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let cache = EntityCache::open(&project)?;
    let types = cache.list_issue_types();

    let format = output_format(global, &config, OutputFormat::Tsv);
    if print_structured(&types, format)? {
        return Ok(());
    }

    let rows = types.iter().map(|t| {
        TableRow::new(t.id.clone(), cache.get_short_id(&t.id))
            .cell("name", CellValue::Name(t.name.clone()))
            .cell("icon", CellValue::Text(t.icon.clone()))
            .cell("color", CellValue::Text(t.color.clone()))
            .cell("top", CellValue::Flag(t.show_on_top))
    });

    TableFormatter::new(COLUMNS, "issue type", "ITYP")
        .quiet(global.quiet)
        .output(rows, format)
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();

    let name = args.name.trim();
    if name.is_empty() {
        return Err(miette::miette!("Issue type name cannot be empty"));
    }

    let mut issue_type = IssueType::new(name.to_string(), config.author());
    issue_type.icon = args.icon;
    issue_type.color = args.color;
    issue_type.show_on_top = args.show_on_top;

    let file_path = save_entity(&project, &issue_type)?;
    let cache = EntityCache::open(&project)?;
    let short_id = cache.get_short_id(&issue_type.id.to_string());

    println!(
        "{} Created issue type {}",
        style("✓").green(),
        style(short_id.unwrap_or_else(|| format_short_id(&issue_type.id))).cyan()
    );
    println!("   {}", style(file_path.display()).dim());
    println!("   Name: {}", style(&issue_type.name).yellow());

    Ok(())
}
