//! Reader for 4.0.0 POM documents.

use std::path::Path;

use crate::errors::{PomStoreError, PomStoreResult};
use crate::models::{ProjectModel, VersionedReference, DEFAULT_PACKAGING};
use crate::reader::xml::Element;
use crate::reader::{load_project_element, parse_dependency, DescriptorReader};

const MODEL_VERSION: &str = "4.0.0";

#[derive(Clone, Debug, Default)]
pub struct ModernPomReader;

impl ModernPomReader {
    fn parent(project: &Element, path: &Path) -> PomStoreResult<Option<VersionedReference>> {
        let Some(parent) = project.child("parent") else {
            return Ok(None);
        };
        match (
            parent.child_text("groupId"),
            parent.child_text("artifactId"),
            parent.child_text("version"),
        ) {
            (Some(g), Some(a), Some(v)) => Ok(Some(VersionedReference::new(&g, &a, &v))),
            _ => Err(PomStoreError::ProjectModel(format!(
                "{} has an incomplete <parent> reference",
                path.display()
            ))),
        }
    }
}

impl DescriptorReader for ModernPomReader {
    fn read(&self, path: &Path) -> PomStoreResult<ProjectModel> {
        let project = load_project_element(path)?;

        if let Some(declared) = project.child_text("modelVersion") {
            if declared != MODEL_VERSION {
                return Err(PomStoreError::ProjectModel(format!(
                    "{} declares unsupported modelVersion {declared}",
                    path.display()
                )));
            }
        }

        let artifact_id = project.child_text("artifactId").ok_or_else(|| {
            PomStoreError::ProjectModel(format!("{} is missing <artifactId>", path.display()))
        })?;

        let mut model = ProjectModel {
            group_id: project.child_text("groupId").unwrap_or_default(),
            artifact_id,
            version: project.child_text("version").unwrap_or_default(),
            packaging: project
                .child_text("packaging")
                .unwrap_or_else(|| DEFAULT_PACKAGING.to_string()),
            name: project.child_text("name"),
            description: project.child_text("description"),
            url: project.child_text("url"),
            parent: Self::parent(&project, path)?,
            ..ProjectModel::default()
        };

        if let Some(properties) = project.child("properties") {
            for prop in &properties.children {
                model
                    .properties
                    .insert(prop.name.clone(), prop.text.trim().to_string());
            }
        }

        if let Some(deps) = project.child("dependencies") {
            for dep in deps.children_named("dependency") {
                model.dependencies.push(parse_dependency(dep, path, false)?);
            }
        }

        if let Some(deps) = project
            .child("dependencyManagement")
            .and_then(|dm| dm.child("dependencies"))
        {
            for dep in deps.children_named("dependency") {
                model
                    .dependency_management
                    .push(parse_dependency(dep, path, false)?);
            }
        }

        if let Some(modules) = project.child("modules") {
            model.modules = modules
                .children_named("module")
                .map(|m| m.text.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect();
        }

        Ok(model)
    }

    fn model_version(&self) -> &'static str {
        MODEL_VERSION
    }
}
