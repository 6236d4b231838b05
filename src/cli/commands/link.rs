//! `corpweb link` command - Manage relationships between companies
//!
//! Edges are stored on the child's record, so both subcommands rewrite the
//! child file and leave the parent untouched.

use chrono::NaiveDate;
use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::commands::utils::{display_ref, load_record, open_project, resolve};
use crate::cli::helpers::parse_date;
use crate::cli::GlobalOpts;
use crate::core::cache::EntityCache;
use crate::core::graph::RelationType;
use crate::core::identity::EntityPrefix;
use crate::core::loader::save_entity;
use crate::entities::Company;

#[derive(Subcommand, Debug)]
pub enum LinkCommands {
    /// Add a relationship: <parent> owns / invests in / relates to <child>
    Add(AddArgs),

    /// Remove relationships between two companies
    Remove(RemoveArgs),
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Child company (CO@N, ID or name)
    pub child: String,

    /// Parent company (CO@N, ID or name)
    pub parent: String,

    /// Relationship type
    #[arg(long = "type", short = 't', default_value = "ownership")]
    pub relation: RelationType,

    /// Date the relationship took effect (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub as_of: Option<NaiveDate>,
}

#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    /// Child company (CO@N, ID or name)
    pub child: String,

    /// Parent company (CO@N, ID or name)
    pub parent: String,

    /// Only remove edges of this type (default: all types)
    #[arg(long = "type", short = 't')]
    pub relation: Option<RelationType>,
}

pub fn run(cmd: LinkCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        LinkCommands::Add(args) => run_add(args, global),
        LinkCommands::Remove(args) => run_remove(args, global),
    }
}

fn run_add(args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let cache = EntityCache::open(&project)?;

    let child_id = resolve(&cache, &args.child, EntityPrefix::Co)?;
    let parent_id = resolve(&cache, &args.parent, EntityPrefix::Co)?;
    if child_id == parent_id {
        return Err(miette::miette!("A company cannot be linked to itself"));
    }

    let (_, mut child): (_, Company) = load_record(&project, &child_id)?;
    if !child.add_relationship(parent_id.clone(), args.relation, args.as_of) {
        if !global.quiet {
            println!(
                "{} {} already has a {} link from {}",
                style("!").yellow(),
                display_ref(&cache, &child_id.to_string()),
                args.relation,
                display_ref(&cache, &parent_id.to_string())
            );
        }
        return Ok(());
    }
    child.entity_revision += 1;
    save_entity(&project, &child)?;

    if !global.quiet {
        println!(
            "{} Linked {} {} {}",
            style("✓").green(),
            style(display_ref(&cache, &parent_id.to_string())).yellow(),
            style(format!("--{}-->", args.relation)).dim(),
            style(display_ref(&cache, &child_id.to_string())).yellow()
        );
    }
    log::debug!("added {} edge {} -> {}", args.relation, parent_id, child_id);

    Ok(())
}

fn run_remove(args: RemoveArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let cache = EntityCache::open(&project)?;

    let child_id = resolve(&cache, &args.child, EntityPrefix::Co)?;
    let parent_id = resolve(&cache, &args.parent, EntityPrefix::Co)?;

    let (_, mut child): (_, Company) = load_record(&project, &child_id)?;
    let removed = child.remove_relationship(&parent_id, args.relation);
    if removed == 0 {
        return Err(miette::miette!(
            "No {}link from {} to {}",
            args.relation.map(|r| format!("{} ", r)).unwrap_or_default(),
            display_ref(&cache, &parent_id.to_string()),
            display_ref(&cache, &child_id.to_string())
        ));
    }
    child.entity_revision += 1;
    save_entity(&project, &child)?;

    if !global.quiet {
        println!(
            "{} Removed {} link(s) from {} to {}",
            style("✓").green(),
            removed,
            style(display_ref(&cache, &parent_id.to_string())).yellow(),
            style(display_ref(&cache, &child_id.to_string())).yellow()
        );
    }

    Ok(())
}
