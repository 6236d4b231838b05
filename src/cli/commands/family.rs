//! `corpweb family` command - Family graph, roots and full-graph export

use std::fmt::Write as _;

use clap::{Subcommand, ValueEnum};
use console::style;
use miette::Result;

use crate::cli::commands::utils::{display_ref, open_project, output_format, print_structured, resolve};
use crate::cli::helpers::relation_scope;
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::cache::EntityCache;
use crate::core::graph::views::{family_graph, full_graph};
use crate::core::graph::{RelationType, RootResolver};
use crate::core::identity::EntityPrefix;
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum FamilyCommands {
    /// Edges of the family a company belongs to
    Graph(GraphArgs),

    /// Top-most companies above a company
    Roots(RootsArgs),

    /// Every company and every relationship
    Export(ExportArgs),
}

/// Rendering for graph output
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GraphRender {
    /// Use the global --format
    #[default]
    Table,
    /// Graphviz dot
    Dot,
}

#[derive(clap::Args, Debug)]
pub struct GraphArgs {
    /// Company (CO@N, ID or name)
    pub company: String,

    /// Follow investment and other relationships as well as ownership
    #[arg(long)]
    pub all: bool,

    /// Output as a table (honours --format) or Graphviz dot
    #[arg(long, default_value = "table")]
    pub render: GraphRender,
}

#[derive(clap::Args, Debug)]
pub struct RootsArgs {
    /// Company (CO@N, ID or name)
    pub company: String,

    /// Follow investment and other relationships as well as ownership
    #[arg(long)]
    pub all: bool,
}

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Output as structured data (honours --format, default json) or Graphviz dot
    #[arg(long, default_value = "table")]
    pub render: GraphRender,
}

const EDGE_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("parent", "PARENT", 28),
    ColumnDef::new("relation", "TYPE", 12),
    ColumnDef::new("child", "CHILD", 28),
    ColumnDef::new("as_of", "AS OF", 12),
];

pub fn run(cmd: FamilyCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        FamilyCommands::Graph(args) => run_graph(args, global),
        FamilyCommands::Roots(args) => run_roots(args, global),
        FamilyCommands::Export(args) => run_export(args, global),
    }
}

fn run_graph(args: GraphArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let cache = EntityCache::open(&project)?;

    let source = resolve(&cache, &args.company, EntityPrefix::Co)?;
    let allowed = relation_scope(args.all, config.show_all_relations());
    let graph = family_graph(&cache, &source, allowed)?;

    if args.render == GraphRender::Dot {
        let nodes: Vec<DotNode> = graph
            .nodes
            .iter()
            .map(|n| DotNode {
                id: n.node.id.to_string(),
                name: n.node.name.clone(),
                highlight: n.is_source,
            })
            .collect();
        let edges: Vec<DotEdge> = graph
            .edges
            .iter()
            .map(|e| DotEdge {
                parent: e.parent_id.to_string(),
                child: e.child_id.to_string(),
                relation: e.relation,
            })
            .collect();
        print!("{}", render_dot(&nodes, &edges));
        return Ok(());
    }

    let format = output_format(global, &config, OutputFormat::Tsv);
    if print_structured(&graph, format)? {
        return Ok(());
    }

    let rows = graph.edges.iter().map(|edge| {
        let parent = if edge.is_source_edge {
            CellValue::Name(edge.parent_name.clone())
        } else {
            CellValue::Text(edge.parent_name.clone())
        };
        TableRow::new(
            edge.child_id.to_string(),
            cache.get_short_id(&edge.child_id.to_string()),
        )
        .cell("parent", parent)
        .cell("relation", CellValue::Relation(edge.relation))
        .cell("child", CellValue::Text(edge.child_name.clone()))
        .cell("as_of", CellValue::OptionalDate(edge.as_of))
    });

    TableFormatter::new(EDGE_COLUMNS, "relationship", "CO")
        .quiet(global.quiet)
        .output(rows, format)
}

fn run_roots(args: RootsArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let cache = EntityCache::open(&project)?;

    let source = resolve(&cache, &args.company, EntityPrefix::Co)?;
    let allowed = relation_scope(args.all, config.show_all_relations());
    let roots = RootResolver::new(&cache).find_roots(&source, allowed)?;

    let format = output_format(global, &config, OutputFormat::Auto);
    if print_structured(&roots, format)? {
        return Ok(());
    }

    for root in &roots {
        let id = root.to_string();
        match format {
            OutputFormat::Id => println!("{}", id),
            OutputFormat::ShortId => {
                println!("{}", cache.get_short_id(&id).unwrap_or(id))
            }
            _ => println!("{}", display_ref(&cache, &id)),
        }
    }

    Ok(())
}

fn run_export(args: ExportArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let cache = EntityCache::open(&project)?;
    let graph = full_graph(&cache)?;

    if args.render == GraphRender::Dot {
        let nodes: Vec<DotNode> = graph
            .nodes
            .iter()
            .map(|n| DotNode {
                id: n.id.to_string(),
                name: n.name.clone(),
                highlight: false,
            })
            .collect();
        let edges: Vec<DotEdge> = graph
            .links
            .iter()
            .map(|l| DotEdge {
                parent: l.parent.to_string(),
                child: l.child.to_string(),
                relation: l.relation,
            })
            .collect();
        print!("{}", render_dot(&nodes, &edges));
        return Ok(());
    }

    let format = output_format(global, &config, OutputFormat::Json);
    if !print_structured(&graph, format)? {
        return Err(miette::miette!(
            "family export supports {} or {}; use {} for Graphviz",
            style("--format json").yellow(),
            style("--format yaml").yellow(),
            style("--render dot").yellow()
        ));
    }
    Ok(())
}

struct DotNode {
    id: String,
    name: String,
    highlight: bool,
}

struct DotEdge {
    parent: String,
    child: String,
    relation: RelationType,
}

fn dot_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Graphviz digraph with one edge style per relationship type
fn render_dot(nodes: &[DotNode], edges: &[DotEdge]) -> String {
    let mut out = String::from("digraph family {\n  rankdir=TB;\n  node [shape=box];\n");

    for node in nodes {
        let extra = if node.highlight {
            ", style=bold, color=blue"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "  \"{}\" [label=\"{}\"{}];",
            dot_escape(&node.id),
            dot_escape(&node.name),
            extra
        );
    }

    for edge in edges {
        let edge_style = match edge.relation {
            RelationType::Ownership => "solid",
            RelationType::Investment => "dashed",
            RelationType::Other => "dotted",
        };
        let _ = writeln!(
            out,
            "  \"{}\" -> \"{}\" [style={}, label=\"{}\"];",
            dot_escape(&edge.parent),
            dot_escape(&edge.child),
            edge_style,
            edge.relation
        );
    }

    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_dot_styles_edges_by_type() {
        let nodes = vec![
            DotNode {
                id: "CO-A".to_string(),
                name: "Acme \"Holdings\"".to_string(),
                highlight: true,
            },
            DotNode {
                id: "CO-B".to_string(),
                name: "Widgets".to_string(),
                highlight: false,
            },
        ];
        let edges = vec![
            DotEdge {
                parent: "CO-A".to_string(),
                child: "CO-B".to_string(),
                relation: RelationType::Ownership,
            },
            DotEdge {
                parent: "CO-B".to_string(),
                child: "CO-A".to_string(),
                relation: RelationType::Investment,
            },
        ];

        let dot = render_dot(&nodes, &edges);
        assert!(dot.starts_with("digraph family {"));
        assert!(dot.contains("label=\"Acme \\\"Holdings\\\"\", style=bold"));
        assert!(dot.contains("\"CO-A\" -> \"CO-B\" [style=solid, label=\"ownership\"]"));
        assert!(dot.contains("[style=dashed, label=\"investment\"]"));
        assert!(dot.trim_end().ends_with('}'));
    }
}
