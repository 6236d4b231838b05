//! Record saving
//!
//! Records are written whole: serialize, then replace the file under the
//! record type's directory.

use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::PathBuf;

use crate::core::entity::Entity;
use crate::core::project::Project;

/// Write a record to its file under the project, returning the path
pub fn save_entity<T: Entity>(project: &Project, entity: &T) -> Result<PathBuf> {
    let path = project.entity_path(entity.id());
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).into_diagnostic()?;
    }
    let yaml = serde_yml::to_string(entity).into_diagnostic()?;
    fs::write(&path, yaml).into_diagnostic()?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Company;
    use crate::yaml::parse_yaml_file;
    use tempfile::tempdir;

    #[test]
    fn test_save_then_parse() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        let company = Company::new("Initech".to_string(), "a".to_string());

        let path = save_entity(&project, &company).unwrap();
        assert!(path.exists());
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            crate::core::entity::Entity::file_name(&company)
        );

        let loaded: Company = parse_yaml_file(&path).unwrap();
        assert_eq!(loaded.name, "Initech");
        assert_eq!(loaded.id, company.id);
    }

    #[test]
    fn test_save_overwrites_previous_revision() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        let mut company = Company::new("Initech".to_string(), "a".to_string());
        save_entity(&project, &company).unwrap();

        company.name = "Initrode".to_string();
        company.entity_revision += 1;
        let path = save_entity(&project, &company).unwrap();

        let loaded: Company = parse_yaml_file(&path).unwrap();
        assert_eq!(loaded.name, "Initrode");
        assert_eq!(loaded.entity_revision, 2);
    }
}
