//! Reader for version-3 (`project.xml` style) descriptors found in legacy
//! layout repositories.

use std::path::Path;

use crate::errors::{PomStoreError, PomStoreResult};
use crate::models::{ProjectModel, DEFAULT_PACKAGING};
use crate::reader::{load_project_element, parse_dependency, split_legacy_id, DescriptorReader};

const MODEL_VERSION: &str = "3.0.0";

/// Property under which an `<extend>` directive is kept. Inheritance through
/// `extend` is file-relative and is not followed.
pub const EXTEND_PROPERTY: &str = "maven1.extend";

#[derive(Clone, Debug, Default)]
pub struct LegacyProjectReader;

impl DescriptorReader for LegacyProjectReader {
    fn read(&self, path: &Path) -> PomStoreResult<ProjectModel> {
        let project = load_project_element(path)?;

        if let Some(pom_version) = project.child_text("pomVersion") {
            if pom_version != "3" {
                return Err(PomStoreError::ProjectModel(format!(
                    "{} declares unsupported pomVersion {pom_version}",
                    path.display()
                )));
            }
        }

        let (id_group, id_artifact) = match project.child_text("id") {
            Some(id) => {
                let (g, a) = split_legacy_id(&id);
                (Some(g), Some(a))
            }
            None => (None, None),
        };

        let group_id = project.child_text("groupId").or(id_group);
        let artifact_id = project.child_text("artifactId").or(id_artifact);
        let Some(artifact_id) = artifact_id else {
            return Err(PomStoreError::ProjectModel(format!(
                "{} is missing both <artifactId> and <id>",
                path.display()
            )));
        };

        let mut model = ProjectModel {
            group_id: group_id.unwrap_or_else(|| artifact_id.clone()),
            artifact_id,
            version: project.child_text("currentVersion").unwrap_or_default(),
            packaging: DEFAULT_PACKAGING.to_string(),
            name: project.child_text("name"),
            description: project
                .child_text("description")
                .or_else(|| project.child_text("shortDescription")),
            url: project.child_text("url"),
            ..ProjectModel::default()
        };

        if let Some(extend) = project.child_text("extend") {
            model.properties.insert(EXTEND_PROPERTY.to_string(), extend);
        }

        if let Some(deps) = project.child("dependencies") {
            for dep in deps.children_named("dependency") {
                model.dependencies.push(parse_dependency(dep, path, true)?);
            }
        }

        Ok(model)
    }

    fn model_version(&self) -> &'static str {
        MODEL_VERSION
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn read(body: &str) -> PomStoreResult<ProjectModel> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("foo-1.0.pom");
        fs::write(&path, body).unwrap();
        LegacyProjectReader.read(&path)
    }

    #[test]
    fn test_read_legacy_project() {
        let model = read(
            r#"<project>
                 <pomVersion>3</pomVersion>
                 <extend>../project.xml</extend>
                 <id>foo</id>
                 <groupId>com.x</groupId>
                 <currentVersion>1.0</currentVersion>
                 <shortDescription>short</shortDescription>
                 <dependencies>
                   <dependency><id>commons-lang:commons-lang</id><version>2.1</version></dependency>
                   <dependency><groupId>ant</groupId><artifactId>ant</artifactId><version>1.6</version><type>jar</type></dependency>
                 </dependencies>
               </project>"#,
        )
        .unwrap();
        assert_eq!(model.group_id, "com.x");
        assert_eq!(model.artifact_id, "foo");
        assert_eq!(model.version, "1.0");
        assert_eq!(model.packaging, "jar");
        assert_eq!(model.description.as_deref(), Some("short"));
        assert_eq!(
            model.properties.get(EXTEND_PROPERTY).map(String::as_str),
            Some("../project.xml")
        );
        assert_eq!(model.dependencies.len(), 2);
        assert_eq!(model.dependencies[0].group_id, "commons-lang");
        assert_eq!(model.dependencies[0].artifact_id, "commons-lang");
    }

    #[test]
    fn test_bare_id_doubles_as_group() {
        let model = read("<project><id>ant</id><currentVersion>1.6</currentVersion></project>").unwrap();
        assert_eq!(model.group_id, "ant");
        assert_eq!(model.artifact_id, "ant");
    }

    #[test]
    fn test_missing_identity_fails() {
        assert!(read("<project><currentVersion>1</currentVersion></project>").is_err());
    }

    #[test]
    fn test_wrong_pom_version_fails() {
        let err = read("<project><pomVersion>4</pomVersion><id>a</id></project>").unwrap_err();
        assert!(err.to_string().contains("pomVersion"));
    }
}
