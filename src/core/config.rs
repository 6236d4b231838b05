//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::PathBuf;

use crate::core::Project;

/// corpweb configuration with layered hierarchy
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default author for new records
    pub author: Option<String>,

    /// Editor command for `corpweb company edit`
    pub editor: Option<String>,

    /// Default output format
    pub default_format: Option<String>,

    /// Include investment and other edges in family and issue views
    pub show_all_relations: Option<bool>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/corpweb/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // 3. Project config (.corpweb/config.yaml)
        if let Ok(project) = Project::discover() {
            if let Some(project_config) = Self::read_file(&project.config_dir().join("config.yaml"))
            {
                config.merge(project_config);
            }
        }

        // 4. Environment variables
        if let Ok(author) = std::env::var("CORPWEB_AUTHOR") {
            config.author = Some(author);
        }
        if let Ok(editor) = std::env::var("CORPWEB_EDITOR") {
            config.editor = Some(editor);
        }

        config
    }

    fn read_file(path: &std::path::Path) -> Option<Config> {
        let contents = std::fs::read_to_string(path).ok()?;
        match Self::parse(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("ignoring unreadable config {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Parse one config layer; an empty or comment-only file is an empty layer
    fn parse(contents: &str) -> Result<Config, serde_yml::Error> {
        Ok(serde_yml::from_str::<Option<Config>>(contents)?.unwrap_or_default())
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "corpweb")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.author.is_some() {
            self.author = other.author;
        }
        if other.editor.is_some() {
            self.editor = other.editor;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        if other.show_all_relations.is_some() {
            self.show_all_relations = other.show_all_relations;
        }
    }

    /// Get the author name, falling back to git config or username
    pub fn author(&self) -> String {
        if let Some(ref author) = self.author {
            return author.clone();
        }

        if let Ok(output) = std::process::Command::new("git")
            .args(["config", "user.name"])
            .output()
        {
            if output.status.success() {
                let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !name.is_empty() {
                    return name;
                }
            }
        }

        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string())
    }

    /// Whether views include every relation type by default
    pub fn show_all_relations(&self) -> bool {
        self.show_all_relations.unwrap_or(false)
    }

    /// Get the editor command
    pub fn editor(&self) -> String {
        self.editor
            .clone()
            .or_else(|| std::env::var("EDITOR").ok())
            .or_else(|| std::env::var("VISUAL").ok())
            .unwrap_or_else(|| "vi".to_string())
    }

    /// Run the editor on a file, handling commands with arguments
    /// (e.g., "emacsclient -nw" or "code --wait")
    pub fn run_editor(
        &self,
        file_path: &std::path::Path,
    ) -> std::io::Result<std::process::ExitStatus> {
        let editor = self.editor();
        let parts: Vec<&str> = editor.split_whitespace().collect();

        let Some((cmd, args)) = parts.split_first() else {
            return std::process::Command::new("vi").arg(file_path).status();
        };

        std::process::Command::new(cmd)
            .args(args)
            .arg(file_path)
            .status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefers_later_layer() {
        let mut config = Config {
            author: Some("global".to_string()),
            show_all_relations: Some(true),
            ..Default::default()
        };
        config.merge(Config {
            author: Some("project".to_string()),
            ..Default::default()
        });
        assert_eq!(config.author.as_deref(), Some("project"));
        assert!(config.show_all_relations());
    }

    #[test]
    fn test_parse_project_config() {
        let config: Config =
            serde_yml::from_str("author: Jo\nshow_all_relations: true\n").unwrap();
        assert_eq!(config.author(), "Jo");
        assert!(config.show_all_relations());
        assert!(Config::default().editor.is_none());
    }

    #[test]
    fn test_fresh_project_config_is_empty_layer() {
        let tmp = tempfile::tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        let contents =
            std::fs::read_to_string(project.config_dir().join("config.yaml")).unwrap();

        let config = Config::parse(&contents).unwrap();
        assert!(config.author.is_none());
        assert!(config.default_format.is_none());
        assert!(Config::parse("").unwrap().editor.is_none());
        assert!(Config::parse("author: [unclosed").is_err());
    }
}
