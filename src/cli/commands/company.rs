//! `corpweb company` command - Company record management

use clap::Subcommand;
use console::style;
use dialoguer::{theme::ColorfulTheme, Input};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::commands::utils::{
    display_ref, open_project, output_format, print_structured, resolve,
};
use crate::cli::helpers::format_short_id;
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::cache::{CompanyFilter, EntityCache, IssueFilter};
use crate::core::graph::{AdditionalInfo, CompanyProfile};
use crate::core::identity::EntityPrefix;
use crate::core::loader::save_entity;
use crate::core::Config;
use crate::entities::{Company, IconPosition};

#[derive(Subcommand, Debug)]
pub enum CompanyCommands {
    /// List companies
    List(ListArgs),

    /// Create a new company
    New(NewArgs),

    /// Show a company's profile
    Show(ShowArgs),

    /// Edit a company in your editor
    Edit(EditArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only companies in this category or any category below it
    #[arg(long, short = 'c')]
    pub category: Option<String>,

    /// Search in names and synonyms (case-insensitive)
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show count only
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Company name
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Category (CAT@N, ID or name)
    #[arg(long, short = 'c')]
    pub category: Option<String>,

    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// Image file name or URL
    #[arg(long)]
    pub img: Option<String>,

    /// Icon x coordinate
    #[arg(long, allow_negative_numbers = true)]
    pub icon_x: Option<i32>,

    /// Icon y coordinate
    #[arg(long, allow_negative_numbers = true)]
    pub icon_y: Option<i32>,

    /// Alternative name (repeatable)
    #[arg(long = "synonym")]
    pub synonyms: Vec<String>,

    /// Prompt for fields interactively
    #[arg(long, short = 'i')]
    pub interactive: bool,

    /// Open in editor after creation
    #[arg(long, short = 'e')]
    pub edit: bool,

    /// Don't open in editor after creation
    #[arg(long)]
    pub no_edit: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Company (CO@N, ID, name or synonym)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Company (CO@N, ID, name or synonym)
    pub id: String,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("name", "NAME", 32),
    ColumnDef::new("category", "CATEGORY", 20),
    ColumnDef::new("issues", "ISSUES", 8),
    ColumnDef::new("children", "CHILDREN", 10),
    ColumnDef::new("top", "TOP ANCESTOR", 28),
];

pub fn run(cmd: CompanyCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        CompanyCommands::List(args) => run_list(args, global),
        CompanyCommands::New(args) => run_new(args, global),
        CompanyCommands::Show(args) => run_show(args, global),
        CompanyCommands::Edit(args) => run_edit(args, global),
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let cache = EntityCache::open(&project)?;

    let categories = match args.category {
        Some(ref input) => {
            let root = resolve(&cache, input, EntityPrefix::Cat)?;
            let ids = cache
                .category_subtree(&root.to_string())
                .into_iter()
                .map(|(id, _)| id)
                .collect();
            Some(ids)
        }
        None => None,
    };

    let companies = cache.list_companies(&CompanyFilter {
        categories,
        search: args.search,
        limit: args.limit,
    });

    if args.count {
        println!("{}", companies.len());
        return Ok(());
    }

    let format = output_format(global, &config, OutputFormat::Tsv);
    if print_structured(&companies, format)? {
        return Ok(());
    }

    if companies.is_empty() && !global.quiet && matches!(format, OutputFormat::Tsv) {
        println!("No companies found.");
        return Ok(());
    }

    let rows = companies.iter().map(|c| {
        TableRow::new(c.id.clone(), cache.get_short_id(&c.id))
            .cell("name", CellValue::Name(c.name.clone()))
            .cell(
                "category",
                c.category_name
                    .clone()
                    .map(CellValue::Text)
                    .unwrap_or(CellValue::Empty),
            )
            .cell("issues", CellValue::Number(c.issue_count as i64))
            .cell("children", CellValue::Number(c.child_count as i64))
            .cell(
                "top",
                c.top_ancestor_name
                    .clone()
                    .map(CellValue::Name)
                    .unwrap_or(CellValue::Empty),
            )
    });

    TableFormatter::new(COLUMNS, "company", "CO")
        .quiet(global.quiet)
        .output(rows, format)
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();

    let (name, description) = if args.interactive {
        let theme = ColorfulTheme::default();
        let name: String = Input::with_theme(&theme)
            .with_prompt("Name")
            .interact_text()
            .into_diagnostic()?;
        let description: String = Input::with_theme(&theme)
            .with_prompt("Description")
            .allow_empty(true)
            .interact_text()
            .into_diagnostic()?;
        let description = Some(description).filter(|d| !d.trim().is_empty());
        (name, description.or(args.description))
    } else {
        let name = args
            .name
            .ok_or_else(|| miette::miette!("--name is required (or use --interactive)"))?;
        (name, args.description)
    };

    if name.trim().is_empty() {
        return Err(miette::miette!("Company name cannot be empty"));
    }

    let mut company = Company::new(name.trim().to_string(), config.author());
    company.description = description;
    company.img = args.img;
    company.icon = IconPosition {
        x: args.icon_x,
        y: args.icon_y,
    };
    company.synonyms = args.synonyms;

    if let Some(ref input) = args.category {
        let cache = EntityCache::open(&project)?;
        company.category = Some(resolve(&cache, input, EntityPrefix::Cat)?);
    }

    let file_path = save_entity(&project, &company)?;

    // Opening the cache picks up the new file and assigns its short ID
    let cache = EntityCache::open(&project)?;
    let short_id = cache.get_short_id(&company.id.to_string());

    println!(
        "{} Created company {}",
        style("✓").green(),
        style(short_id.unwrap_or_else(|| format_short_id(&company.id))).cyan()
    );
    println!("   {}", style(file_path.display()).dim());
    println!("   Name: {}", style(&company.name).yellow());

    if args.edit || (!args.no_edit && !args.interactive) {
        println!();
        println!("Opening in {}...", style(config.editor()).yellow());
        config.run_editor(&file_path).into_diagnostic()?;
    }

    Ok(())
}

/// Structured form of `company show`
#[derive(Serialize)]
struct CompanyReport<'a> {
    #[serde(flatten)]
    profile: &'a CompanyProfile,
    synonyms: Vec<String>,
    additional: &'a AdditionalInfo,
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let cache = EntityCache::open(&project)?;

    let id = resolve(&cache, &args.id, EntityPrefix::Co)?;
    let profile = CompanyProfile::load(&cache, &id)?;
    let additional = AdditionalInfo::load(&cache, &id)?;
    let synonyms = cache.company_synonyms(&id.to_string());

    let format = output_format(global, &config, OutputFormat::Auto);
    if format == OutputFormat::Id {
        println!("{}", id);
        return Ok(());
    }
    let report = CompanyReport {
        profile: &profile,
        synonyms,
        additional: &additional,
    };
    if print_structured(&report, format)? {
        return Ok(());
    }

    let company = &profile.company;
    println!("{}", style("─".repeat(60)).dim());
    println!(
        "{}: {}",
        style("ID").bold(),
        style(company.id.to_string()).cyan()
    );
    println!("{}: {}", style("Name").bold(), style(&company.name).yellow());
    if let Some(ref category) = company.category {
        println!(
            "{}: {}",
            style("Category").bold(),
            display_ref(&cache, &category.to_string())
        );
    }
    if !report.synonyms.is_empty() {
        println!(
            "{}: {}",
            style("Also known as").bold(),
            report.synonyms.join(", ")
        );
    }
    if !company.icon.img.is_empty() {
        println!("{}: {}", style("Image").bold(), company.icon.img);
    }
    println!("{}", style("─".repeat(60)).dim());

    if !company.description.is_empty() {
        println!();
        println!("{}", company.description);
    }

    if !profile.parents.is_empty() {
        println!();
        println!("{}", style("Owned by:").bold());
        for parent in &profile.parents {
            println!("  {}", display_ref(&cache, &parent.id.to_string()));
        }
    }

    if !profile.chains.is_empty() {
        println!();
        println!("{}", style("Ownership chains:").bold());
        for chain in &profile.chains {
            if chain.parent_id == chain.root_id {
                println!("  {}", style(&chain.root_name).yellow());
            } else {
                println!(
                    "  {} {} {}",
                    chain.parent_name,
                    style("→").dim(),
                    style(&chain.root_name).yellow()
                );
            }
        }
    }

    if !profile.children.is_empty() {
        println!();
        println!("{}", style("Owns:").bold());
        for child in &profile.children {
            println!("  {}", display_ref(&cache, &child.id.to_string()));
        }
    }

    print_names("Investors:", &additional.investors);
    print_names("Investments:", &additional.investments);
    print_names("Related:", &additional.related);

    if profile.has_additional_relationships && !config.show_all_relations() {
        println!();
        println!(
            "{} Investment or other relationships exist around this company. Use {} to include them.",
            style("ℹ").blue(),
            style("--all").yellow()
        );
    }

    let issues = cache.list_issues(&IssueFilter {
        company: Some(id.to_string()),
        ..Default::default()
    });
    if !issues.is_empty() {
        println!();
        println!("{} ({})", style("Issues:").bold(), issues.len());
        for issue in issues.iter().take(5) {
            println!(
                "  {} {}  {}",
                style(issue.listing_date()).dim(),
                issue.issue_type_name.as_deref().unwrap_or("-"),
                issue.text
            );
        }
    }

    if let Some(entity) = cache.get_cached_entity(&id.to_string()) {
        println!();
        println!(
            "{} {} | {} {}",
            style("Created:").dim(),
            style(entity.created.format("%Y-%m-%d %H:%M")).dim(),
            style("Author:").dim(),
            style(&entity.author).dim()
        );
    }

    Ok(())
}

fn print_names(heading: &str, names: &[String]) {
    if names.is_empty() {
        return;
    }
    println!();
    println!("{}", style(heading).bold());
    for name in names {
        println!("  {}", name);
    }
}

fn run_edit(args: EditArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let cache = EntityCache::open(&project)?;

    let id = resolve(&cache, &args.id, EntityPrefix::Co)?;
    let path = project.entity_path(&id);
    if !path.exists() {
        return Err(miette::miette!("Record file for {} not found", id));
    }

    println!(
        "Opening {} in {}...",
        style(path.display()).cyan(),
        style(config.editor()).yellow()
    );
    config.run_editor(&path).into_diagnostic()?;

    Ok(())
}
