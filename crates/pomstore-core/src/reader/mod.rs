//! Descriptor readers, one per supported schema version.
//!
//! The reader is chosen by the layout tag of the repository the descriptor
//! was found in: modern (`default`) repositories hold 4.0.0 POMs, legacy
//! repositories hold version-3 `project.xml` style descriptors.

pub mod legacy;
pub mod modern;
pub mod xml;

use std::path::Path;

use crate::errors::{PomStoreError, PomStoreResult};
use crate::models::{Dependency, ProjectModel, DEFAULT_PACKAGING};
use crate::repository::RepositoryLayout;

pub use legacy::LegacyProjectReader;
pub use modern::ModernPomReader;
use xml::Element;

/// Reads a descriptor file into a raw (unfiltered) project model.
pub trait DescriptorReader: Send + Sync {
    fn read(&self, path: &Path) -> PomStoreResult<ProjectModel>;

    /// Schema version handled by this reader, e.g. `"4.0.0"`.
    fn model_version(&self) -> &'static str;
}

/// The reader pair, selected by repository layout.
#[derive(Clone, Debug, Default)]
pub struct ReaderSet {
    modern: ModernPomReader,
    legacy: LegacyProjectReader,
}

impl ReaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_layout(&self, layout: RepositoryLayout) -> &dyn DescriptorReader {
        match layout {
            RepositoryLayout::Default => &self.modern,
            RepositoryLayout::Legacy => &self.legacy,
        }
    }
}

/// Read and parse `path`, checking that the root is `<project>`.
pub(crate) fn load_project_element(path: &Path) -> PomStoreResult<Element> {
    let source = std::fs::read_to_string(path).map_err(|e| {
        PomStoreError::ProjectModel(format!("Unable to read {}: {e}", path.display()))
    })?;
    let root = xml::parse_document(&source).map_err(|e| {
        PomStoreError::ProjectModel(format!("Unable to parse {}: {e}", path.display()))
    })?;
    if root.name != "project" {
        return Err(PomStoreError::ProjectModel(format!(
            "{} is not a project descriptor (root element <{}>)",
            path.display(),
            root.name
        )));
    }
    Ok(root)
}

/// Build a dependency from a `<dependency>` element.
///
/// `legacy_id` allows the version-3 `<id>group:artifact</id>` shorthand.
pub(crate) fn parse_dependency(
    element: &Element,
    path: &Path,
    legacy_id: bool,
) -> PomStoreResult<Dependency> {
    let id = if legacy_id {
        element.child_text("id")
    } else {
        None
    };
    let (id_group, id_artifact) = match id.as_deref().map(split_legacy_id) {
        Some((g, a)) => (Some(g), Some(a)),
        None => (None, None),
    };

    let group_id = element.child_text("groupId").or(id_group);
    let artifact_id = element.child_text("artifactId").or(id_artifact);
    let (Some(group_id), Some(artifact_id)) = (group_id, artifact_id) else {
        return Err(PomStoreError::ProjectModel(format!(
            "{} declares a dependency without groupId/artifactId",
            path.display()
        )));
    };

    Ok(Dependency {
        group_id,
        artifact_id,
        version: element.child_text("version"),
        dep_type: element
            .child_text("type")
            .unwrap_or_else(|| DEFAULT_PACKAGING.to_string()),
        classifier: element.child_text("classifier"),
        scope: element.child_text("scope"),
        optional: element
            .child_text("optional")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false),
    })
}

/// `group:artifact` or a bare `artifact` (which doubles as the group).
pub(crate) fn split_legacy_id(id: &str) -> (String, String) {
    match id.split_once(':') {
        Some((g, a)) => (g.to_string(), a.to_string()),
        None => (id.to_string(), id.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_legacy_id() {
        assert_eq!(
            split_legacy_id("commons-lang:commons-lang"),
            ("commons-lang".to_string(), "commons-lang".to_string())
        );
        assert_eq!(
            split_legacy_id("ant"),
            ("ant".to_string(), "ant".to_string())
        );
    }

    #[test]
    fn test_reader_selected_by_layout() {
        let readers = ReaderSet::new();
        assert_eq!(
            readers.for_layout(RepositoryLayout::Default).model_version(),
            "4.0.0"
        );
        assert_eq!(
            readers.for_layout(RepositoryLayout::Legacy).model_version(),
            "3.0.0"
        );
    }

    #[test]
    fn test_missing_file_is_project_model_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_project_element(&dir.path().join("missing.pom")).unwrap_err();
        assert!(matches!(err, PomStoreError::ProjectModel(_)));
        assert!(err.to_string().contains("missing.pom"));
    }

    #[test]
    fn test_wrong_root_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.xml");
        std::fs::write(&path, "<settings/>").unwrap();
        let err = load_project_element(&path).unwrap_err();
        assert!(err.to_string().contains("root element <settings>"));
    }
}
