//! Shared utilities for CLI commands

use std::path::PathBuf;

use clap::ValueEnum;
use miette::{IntoDiagnostic, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::cache::EntityCache;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::project::Project;
use crate::core::Config;
use crate::yaml::parse_yaml_file;

/// Find the project from `--project` or the current directory
pub fn open_project(global: &GlobalOpts) -> Result<Project> {
    let project = match global.project {
        Some(ref path) => Project::discover_from(path),
        None => Project::discover(),
    };
    project.map_err(|e| miette::miette!("{}", e))
}

/// Human name for a record type, used in messages
pub fn kind_name(prefix: EntityPrefix) -> &'static str {
    match prefix {
        EntityPrefix::Co => "company",
        EntityPrefix::Iss => "issue",
        EntityPrefix::Ityp => "issue type",
        EntityPrefix::Cat => "category",
    }
}

/// Resolve a short ID, full ID, ID fragment or name to a record ID
pub fn resolve(cache: &EntityCache, input: &str, prefix: EntityPrefix) -> Result<EntityId> {
    let full = cache.resolve_id(input, prefix).ok_or_else(|| {
        miette::miette!(
            "No {} found matching '{}'. Use {}@N, a full ID or the exact name.",
            kind_name(prefix),
            input,
            prefix
        )
    })?;
    EntityId::parse(&full).into_diagnostic()
}

/// Load the record file for an ID, reporting YAML problems with spans
pub fn load_record<T: DeserializeOwned>(project: &Project, id: &EntityId) -> Result<(PathBuf, T)> {
    let path = project.entity_path(id);
    if !path.exists() {
        return Err(miette::miette!(
            "Record file for {} not found at {}",
            id,
            path.display()
        ));
    }
    let record: T = parse_yaml_file(&path)?;
    Ok((path, record))
}

/// "CO@3 (Acme)" style reference, falling back to the full ID
pub fn display_ref(cache: &EntityCache, id: &str) -> String {
    let short = cache.get_short_id(id).unwrap_or_else(|| id.to_string());
    match cache.title_of(id) {
        Some(title) => format!("{} ({})", short, title),
        None => short,
    }
}

/// Output format after applying the configured default to `auto`
pub fn output_format(global: &GlobalOpts, config: &Config, fallback: OutputFormat) -> OutputFormat {
    if global.format != OutputFormat::Auto {
        return global.format;
    }
    config
        .default_format
        .as_deref()
        .and_then(|name| OutputFormat::from_str(name, true).ok())
        .unwrap_or(OutputFormat::Auto)
        .or(fallback)
}

/// Print a value as JSON or YAML; returns false for other formats
pub fn print_structured<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Result<bool> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
            Ok(true)
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(value).into_diagnostic()?);
            Ok(true)
        }
        _ => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global(format: OutputFormat) -> GlobalOpts {
        GlobalOpts {
            format,
            quiet: false,
            verbose: false,
            project: None,
        }
    }

    #[test]
    fn test_output_format_prefers_flag() {
        let config = Config {
            default_format: Some("json".to_string()),
            ..Default::default()
        };
        assert_eq!(
            output_format(&global(OutputFormat::Csv), &config, OutputFormat::Tsv),
            OutputFormat::Csv
        );
        assert_eq!(
            output_format(&global(OutputFormat::Auto), &config, OutputFormat::Tsv),
            OutputFormat::Json
        );
        assert_eq!(
            output_format(&global(OutputFormat::Auto), &Config::default(), OutputFormat::Tsv),
            OutputFormat::Tsv
        );
    }

    #[test]
    fn test_kind_name() {
        assert_eq!(kind_name(EntityPrefix::Ityp), "issue type");
    }
}
