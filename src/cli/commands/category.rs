//! `corpweb category` command - Company categories
//!
//! Categories nest through parent links. `list` shows one level at a time,
//! `tree` the whole subtree below a category.

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::commands::utils::{open_project, output_format, print_structured, resolve};
use crate::cli::helpers::format_short_id;
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::cache::{CachedCategory, EntityCache};
use crate::core::identity::EntityPrefix;
use crate::core::loader::save_entity;
use crate::core::Config;
use crate::entities::Category;

#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    /// List root categories, or the children of one category
    List(ListArgs),

    /// Create a new category
    New(NewArgs),

    /// Show every category below a category
    Tree(TreeArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// List the children of this category instead of the roots
    #[arg(long, short = 'p')]
    pub parent: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Category name
    #[arg(long, short = 'n')]
    pub name: String,

    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// Parent category (repeatable)
    #[arg(long = "parent", short = 'p')]
    pub parents: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct TreeArgs {
    /// Category (CAT@N, ID or name)
    pub category: String,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("name", "NAME", 32),
    ColumnDef::new("companies", "COMPANIES", 10),
    ColumnDef::new("description", "DESCRIPTION", 48),
];

pub fn run(cmd: CategoryCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        CategoryCommands::List(args) => run_list(args, global),
        CategoryCommands::New(args) => run_new(args, global),
        CategoryCommands::Tree(args) => run_tree(args, global),
    }
}

fn category_row(cache: &EntityCache, category: &CachedCategory) -> TableRow {
    TableRow::new(category.id.clone(), cache.get_short_id(&category.id))
        .cell("name", CellValue::Name(category.name.clone()))
        .cell("companies", CellValue::Number(category.company_count as i64))
        .cell(
            "description",
            category
                .description
                .clone()
                .map(CellValue::Text)
                .unwrap_or(CellValue::Empty),
        )
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let cache = EntityCache::open(&project)?;

    let categories = match args.parent {
        Some(ref input) => {
            let parent = resolve(&cache, input, EntityPrefix::Cat)?;
            cache.category_children(&parent.to_string())
        }
        None => cache.category_roots(),
    };

    let format = output_format(global, &config, OutputFormat::Tsv);
    if print_structured(&categories, format)? {
        return Ok(());
    }

    let rows: Vec<TableRow> = categories
        .iter()
        .map(|c| category_row(&cache, c))
        .collect();
    TableFormatter::new(COLUMNS, "category", "CAT")
        .quiet(global.quiet)
        .output(rows, format)
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();

    let name = args.name.trim();
    if name.is_empty() {
        return Err(miette::miette!("Category name cannot be empty"));
    }

    let mut category = Category::new(name.to_string(), config.author());
    category.description = args.description;

    if !args.parents.is_empty() {
        let cache = EntityCache::open(&project)?;
        for input in &args.parents {
            let parent = resolve(&cache, input, EntityPrefix::Cat)?;
            if !category.parents.contains(&parent) {
                category.parents.push(parent);
            }
        }
    }

    let file_path = save_entity(&project, &category)?;
    let cache = EntityCache::open(&project)?;
    let short_id = cache.get_short_id(&category.id.to_string());

    println!(
        "{} Created category {}",
        style("✓").green(),
        style(short_id.unwrap_or_else(|| format_short_id(&category.id))).cyan()
    );
    println!("   {}", style(file_path.display()).dim());
    println!("   Name: {}", style(&category.name).yellow());

    Ok(())
}

fn run_tree(args: TreeArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let cache = EntityCache::open(&project)?;

    let root = resolve(&cache, &args.category, EntityPrefix::Cat)?;
    let subtree: Vec<(CachedCategory, usize)> = cache
        .category_subtree(&root.to_string())
        .into_iter()
        .filter_map(|(id, depth)| cache.get_category(&id).map(|c| (c, depth)))
        .collect();

    let format = output_format(global, &config, OutputFormat::Auto);
    match format {
        OutputFormat::Json | OutputFormat::Yaml => {
            let categories: Vec<&CachedCategory> = subtree.iter().map(|(c, _)| c).collect();
            print_structured(&categories, format)?;
        }
        OutputFormat::Auto => {
            for (category, depth) in &subtree {
                let short = cache
                    .get_short_id(&category.id)
                    .unwrap_or_else(|| category.id.clone());
                println!(
                    "{}{} {} {}",
                    "  ".repeat(*depth),
                    style(short).cyan(),
                    style(&category.name).yellow(),
                    style(format!("({})", category.company_count)).dim()
                );
            }
        }
        _ => {
            let rows: Vec<TableRow> = subtree
                .iter()
                .map(|(c, _)| category_row(&cache, c))
                .collect();
            TableFormatter::new(COLUMNS, "category", "CAT")
                .quiet(global.quiet)
                .output(rows, format)?;
        }
    }

    Ok(())
}
