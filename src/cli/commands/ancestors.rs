//! `corpweb ancestors` command - Materialized top-ancestor cache

use clap::Subcommand;
use console::style;
use miette::Result;
use serde::Serialize;

use crate::cli::commands::utils::{display_ref, open_project, output_format, print_structured, resolve};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::cache::EntityCache;
use crate::core::graph::{AncestorClosure, ClosureStore};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum AncestorsCommands {
    /// Recompute every company's top ownership ancestor
    Rebuild,

    /// Show the cached top ancestor of a company
    Lookup(LookupArgs),
}

#[derive(clap::Args, Debug)]
pub struct LookupArgs {
    /// Company (CO@N, ID or name)
    pub company: String,
}

pub fn run(cmd: AncestorsCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        AncestorsCommands::Rebuild => run_rebuild(global),
        AncestorsCommands::Lookup(args) => run_lookup(args, global),
    }
}

fn run_rebuild(global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let mut cache = EntityCache::open(&project)?;

    let format = output_format(global, &config, OutputFormat::Auto);
    if !global.quiet && format == OutputFormat::Auto {
        println!("{} Rebuilding ancestor cache...", style("→").blue());
    }
    let stats = AncestorClosure::new(&mut cache).rebuild()?;

    if print_structured(&stats, format)? {
        return Ok(());
    }
    if global.quiet {
        return Ok(());
    }

    println!(
        "{} Ancestor cache rebuilt in {}ms",
        style("✓").green(),
        stats.duration_ms
    );
    println!("  Companies: {}", stats.entities);
    println!("  Rows:      {}", style(stats.rows).cyan());
    if stats.cycles_cut > 0 {
        println!(
            "  {} {} ownership edge(s) close a cycle and were ignored. Run {} for details.",
            style("!").yellow(),
            stats.cycles_cut,
            style("corpweb validate").yellow()
        );
    }

    Ok(())
}

#[derive(Serialize)]
struct LookupResult {
    company: EntityId,
    top_ancestor: Option<EntityId>,
}

fn run_lookup(args: LookupArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let cache = EntityCache::open(&project)?;

    let id = resolve(&cache, &args.company, EntityPrefix::Co)?;
    let ancestor = ClosureStore::lookup(&cache, &id)?;

    let format = output_format(global, &config, OutputFormat::Auto);
    let result = LookupResult {
        company: id.clone(),
        top_ancestor: ancestor,
    };
    if print_structured(&result, format)? {
        return Ok(());
    }

    match result.top_ancestor {
        Some(ref ancestor) => match format {
            OutputFormat::Id => println!("{}", ancestor),
            _ => println!("{}", display_ref(&cache, &ancestor.to_string())),
        },
        None if !global.quiet => {
            println!(
                "{} {} has no cached top ancestor",
                style("-").dim(),
                display_ref(&cache, &id.to_string())
            );
            println!(
                "  Companies without an owner have none; otherwise run {}",
                style("corpweb ancestors rebuild").yellow()
            );
        }
        None => {}
    }

    Ok(())
}
