//! `corpweb validate` command - Check records, references and ownership cycles

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use console::style;
use miette::Result;
use serde::de::DeserializeOwned;

use crate::cli::commands::utils::{kind_name, open_project};
use crate::cli::GlobalOpts;
use crate::core::entity::Entity;
use crate::core::graph::lineage::LineageIndex;
use crate::core::graph::MemoryGraph;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::project::Project;
use crate::entities::{Category, Company, Issue, IssueType};
use crate::yaml::{parse_yaml, YamlSyntaxError};

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Show summary only, don't show individual errors
    #[arg(long)]
    pub summary: bool,

    /// Treat ownership cycles as errors rather than warnings
    #[arg(long)]
    pub strict: bool,
}

/// Validation statistics
#[derive(Default)]
struct ValidationStats {
    files_checked: usize,
    files_failed: usize,
    total_errors: usize,
    total_warnings: usize,
}

/// A parsed record together with the file text it came from
struct Loaded<T> {
    path: PathBuf,
    source: String,
    record: T,
}

/// Records of every type that parsed cleanly
#[derive(Default)]
struct Records {
    companies: Vec<Loaded<Company>>,
    issues: Vec<Loaded<Issue>>,
    issue_types: Vec<Loaded<IssueType>>,
    categories: Vec<Loaded<Category>>,
}

pub fn run(args: ValidateArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let mut report = Reporter {
        root: project.root().to_path_buf(),
        summary: args.summary || global.quiet,
        stats: ValidationStats::default(),
        failed_files: HashSet::new(),
    };

    let records = load_records(&project, &mut report);
    if !report.summary {
        println!(
            "{} Checked {} file(s)",
            style("→").blue(),
            report.stats.files_checked
        );
    }

    check_references(&records, &mut report);
    check_file_names(&records, &mut report);
    check_cycles(&records, args.strict, &mut report);

    report.print_summary();

    let stats = &report.stats;
    if stats.total_errors > 0 {
        Err(miette::miette!(
            "Validation failed: {} error(s) in {} file(s)",
            stats.total_errors,
            stats.files_failed
        ))
    } else {
        if !global.quiet {
            println!("{} All records passed validation!", style("✓").green().bold());
        }
        Ok(())
    }
}

struct Reporter {
    root: PathBuf,
    summary: bool,
    stats: ValidationStats,
    failed_files: HashSet<PathBuf>,
}

impl Reporter {
    fn relative<'p>(&self, path: &'p Path) -> std::path::Display<'p> {
        path.strip_prefix(&self.root).unwrap_or(path).display()
    }

    fn error(&mut self, path: &Path, diagnostic: miette::Report) {
        self.stats.total_errors += 1;
        if self.failed_files.insert(path.to_path_buf()) {
            self.stats.files_failed += 1;
        }
        if !self.summary {
            println!("{} {}", style("✗").red(), self.relative(path));
            println!("{:?}", diagnostic);
        }
    }

    fn warning(&mut self, message: String) {
        self.stats.total_warnings += 1;
        if !self.summary {
            println!("{} {}", style("!").yellow(), message);
        }
    }

    fn print_summary(&self) {
        println!();
        println!("{}", style("─".repeat(60)).dim());
        println!("{}", style("Validation Summary").bold());
        println!("{}", style("─".repeat(60)).dim());
        println!("  Files checked:  {}", style(self.stats.files_checked).cyan());
        println!("  Files failed:   {}", style(self.stats.files_failed).red());
        println!("  Total errors:   {}", style(self.stats.total_errors).red());
        if self.stats.total_warnings > 0 {
            println!(
                "  Total warnings: {}",
                style(self.stats.total_warnings).yellow()
            );
        }
        println!();
    }
}

fn load_records(project: &Project, report: &mut Reporter) -> Records {
    let mut records = Records::default();
    for prefix in EntityPrefix::all() {
        let mut files: Vec<PathBuf> = project.iter_entity_files(*prefix).collect();
        files.sort();
        for path in files {
            report.stats.files_checked += 1;
            match prefix {
                EntityPrefix::Co => load_into(&path, &mut records.companies, report),
                EntityPrefix::Iss => load_into(&path, &mut records.issues, report),
                EntityPrefix::Ityp => load_into(&path, &mut records.issue_types, report),
                EntityPrefix::Cat => load_into(&path, &mut records.categories, report),
            }
        }
    }
    records
}

fn load_into<T: DeserializeOwned>(path: &Path, out: &mut Vec<Loaded<T>>, report: &mut Reporter) {
    let source = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            report.error(path, miette::miette!("cannot read file: {}", e));
            return;
        }
    };
    let filename = path.to_string_lossy().to_string();
    match parse_yaml::<T>(&source, &filename) {
        Ok(record) => out.push(Loaded {
            path: path.to_path_buf(),
            source,
            record,
        }),
        Err(e) => report.error(path, miette::Report::new(e)),
    }
}

/// Diagnostic pointing at the first place `needle` appears in the file
fn reference_error<T>(loaded: &Loaded<T>, message: String, needle: &str) -> miette::Report {
    let (line, column) = loaded
        .source
        .lines()
        .enumerate()
        .find_map(|(i, text)| text.find(needle).map(|col| (i + 1, col + 1)))
        .unwrap_or((1, 1));
    miette::Report::new(YamlSyntaxError::at_location(
        message,
        &loaded.source,
        &loaded.path.to_string_lossy(),
        line,
        column,
        None,
    ))
}

fn ids<T: Entity>(loaded: &[Loaded<T>]) -> HashSet<EntityId> {
    loaded.iter().map(|l| l.record.id().clone()).collect()
}

fn check_references(records: &Records, report: &mut Reporter) {
    let companies = ids(&records.companies);
    let issue_types = ids(&records.issue_types);
    let categories = ids(&records.categories);

    for loaded in &records.companies {
        let company = &loaded.record;
        for link in &company.relationships {
            if link.parent == company.id {
                let err = reference_error(
                    loaded,
                    format!("{} lists itself as a {} parent", company.id, link.relation),
                    &format!("parent: {}", link.parent),
                );
                report.error(&loaded.path, err);
            } else if !companies.contains(&link.parent) {
                let err = reference_error(
                    loaded,
                    format!("{} parent {} does not exist", link.relation, link.parent),
                    &link.parent.to_string(),
                );
                report.error(&loaded.path, err);
            }
        }
        if let Some(ref category) = company.category {
            if !categories.contains(category) {
                let err = reference_error(
                    loaded,
                    format!("category {} does not exist", category),
                    &category.to_string(),
                );
                report.error(&loaded.path, err);
            }
        }
    }

    for loaded in &records.issues {
        let issue = &loaded.record;
        if !companies.contains(&issue.company) {
            let err = reference_error(
                loaded,
                format!("company {} does not exist", issue.company),
                &issue.company.to_string(),
            );
            report.error(&loaded.path, err);
        }
        if !issue_types.contains(&issue.issue_type) {
            let err = reference_error(
                loaded,
                format!("issue type {} does not exist", issue.issue_type),
                &issue.issue_type.to_string(),
            );
            report.error(&loaded.path, err);
        }
        if let Some(end) = issue.end_date {
            if end < issue.start_date {
                let err = reference_error(
                    loaded,
                    format!("end date {} is before start date {}", end, issue.start_date),
                    "end_date",
                );
                report.error(&loaded.path, err);
            }
        }
    }

    for loaded in &records.categories {
        for parent in &loaded.record.parents {
            if !categories.contains(parent) {
                let err = reference_error(
                    loaded,
                    format!("parent category {} does not exist", parent),
                    &parent.to_string(),
                );
                report.error(&loaded.path, err);
            }
        }
    }
}

/// Records are looked up by file name, so the name must match the id
fn check_file_names(records: &Records, report: &mut Reporter) {
    fn check<T: Entity>(loaded: &[Loaded<T>], report: &mut Reporter) {
        for l in loaded {
            let expected = l.record.file_name();
            let actual = l
                .path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            if actual != expected {
                let err = reference_error(
                    l,
                    format!(
                        "{} {} is stored as {}, expected {}",
                        kind_name(T::PREFIX),
                        l.record.id(),
                        actual,
                        expected
                    ),
                    "id:",
                );
                report.error(&l.path, err);
            }
        }
    }

    check(&records.companies, report);
    check(&records.issues, report);
    check(&records.issue_types, report);
    check(&records.categories, report);
}

/// Ownership cycles, found with the same depth-first guard the ancestor
/// cache uses
fn check_cycles(records: &Records, strict: bool, report: &mut Reporter) {
    let mut graph = MemoryGraph::new();
    for loaded in &records.companies {
        graph.add_company(loaded.record.to_node());
    }
    for loaded in &records.companies {
        for edge in loaded.record.edges() {
            graph.add_edge(edge);
        }
    }

    let mut index = LineageIndex::new(&graph);
    let company_ids: Vec<EntityId> = graph.ids().cloned().collect();
    for id in &company_ids {
        if let Err(e) = index.top_of(id) {
            report.warning(format!("cycle check stopped at {}: {}", id, e));
            return;
        }
    }

    let cut: BTreeSet<(EntityId, EntityId)> = index.cycle_edges().iter().cloned().collect();
    if cut.is_empty() {
        return;
    }

    let names: HashMap<&EntityId, &str> = records
        .companies
        .iter()
        .map(|l| (&l.record.id, l.record.name.as_str()))
        .collect();
    let paths: HashMap<&EntityId, &Path> = records
        .companies
        .iter()
        .map(|l| (&l.record.id, l.path.as_path()))
        .collect();

    for (parent, child) in cut {
        let label = |id: &EntityId| {
            names
                .get(id)
                .map(|n| format!("{} ({})", n, id))
                .unwrap_or_else(|| id.to_string())
        };
        let message = format!(
            "ownership cycle: {} owns {}, which is already above it",
            label(&parent),
            label(&child)
        );
        match (strict, paths.get(&child)) {
            (true, Some(path)) => report.error(path, miette::miette!("{}", message)),
            _ => report.warning(message),
        }
    }
}
