//! Shared typed models used across reading, filtering, validation and storage.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::version::{base_version, version_key};

// ---------------------------------------------------------------------------
// Contract constants
// ---------------------------------------------------------------------------

/// Origin tag stamped on every model read straight from a managed repository.
pub const ORIGIN_FILESYSTEM: &str = "filesystem";

/// The only artifact type the project-model consumer looks at.
pub const POM_TYPE: &str = "pom";

/// Problem type attached to every record written for an unusable descriptor.
pub const PROBLEM_TYPE_CORRUPT_ARTIFACT: &str = "corrupt-artifact";

pub const DEFAULT_PACKAGING: &str = "jar";

// ---------------------------------------------------------------------------
// 1. VersionedReference
// ---------------------------------------------------------------------------

/// A (groupId, artifactId, version) pointer, used for parent references.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionedReference {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

impl VersionedReference {
    pub fn new(group_id: &str, artifact_id: &str, version: &str) -> Self {
        Self {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            version: version.to_string(),
        }
    }

    pub fn key(&self) -> String {
        version_key(&self.group_id, &self.artifact_id, &self.version)
    }
}

// ---------------------------------------------------------------------------
// 2. Dependency
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    #[serde(rename = "type")]
    pub dep_type: String,
    pub classifier: Option<String>,
    pub scope: Option<String>,
    pub optional: bool,
}

impl Dependency {
    pub fn new(group_id: &str, artifact_id: &str, version: Option<&str>) -> Self {
        Self {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            version: version.map(str::to_string),
            dep_type: DEFAULT_PACKAGING.to_string(),
            classifier: None,
            scope: None,
            optional: false,
        }
    }

    /// Identity used to match a dependency against dependencyManagement.
    pub fn management_key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.group_id,
            self.artifact_id,
            self.dep_type,
            self.classifier.as_deref().unwrap_or("")
        )
    }
}

// ---------------------------------------------------------------------------
// 3. ProjectModel
// ---------------------------------------------------------------------------

/// A project descriptor, raw or effective.
///
/// Identity is the coordinate triple. Everything else is descriptor payload
/// that is stored verbatim and only touched by the filters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectModel {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub packaging: String,
    pub origin: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub parent: Option<VersionedReference>,
    pub properties: IndexMap<String, String>,
    pub dependencies: Vec<Dependency>,
    pub dependency_management: Vec<Dependency>,
    pub modules: Vec<String>,
}

impl ProjectModel {
    pub fn new(group_id: &str, artifact_id: &str, version: &str) -> Self {
        Self {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            version: version.to_string(),
            packaging: DEFAULT_PACKAGING.to_string(),
            ..Self::default()
        }
    }

    pub fn key(&self) -> String {
        version_key(&self.group_id, &self.artifact_id, &self.version)
    }

    pub fn reference(&self) -> VersionedReference {
        VersionedReference::new(&self.group_id, &self.artifact_id, &self.version)
    }

    /// `groupId:..|artifactId:..|version:..|packaging:..`, as embedded in
    /// validation diagnostics.
    pub fn describe(&self) -> String {
        format!(
            "groupId:{}|artifactId:{}|version:{}|packaging:{}",
            self.group_id, self.artifact_id, self.version, self.packaging
        )
    }

    pub fn has_complete_coordinates(&self) -> bool {
        !self.group_id.trim().is_empty()
            && !self.artifact_id.trim().is_empty()
            && !self.version.trim().is_empty()
    }
}

// ---------------------------------------------------------------------------
// 4. Artifact
// ---------------------------------------------------------------------------

/// A file discovered in a managed repository, identified by the coordinates
/// derived from its location.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub classifier: Option<String>,
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub repository_id: String,
}

impl Artifact {
    pub fn new(
        group_id: &str,
        artifact_id: &str,
        version: &str,
        artifact_type: &str,
        repository_id: &str,
    ) -> Self {
        Self {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            version: version.to_string(),
            classifier: None,
            artifact_type: artifact_type.to_string(),
            repository_id: repository_id.to_string(),
        }
    }

    pub fn with_classifier(mut self, classifier: &str) -> Self {
        self.classifier = Some(classifier.to_string());
        self
    }

    pub fn key(&self) -> String {
        version_key(&self.group_id, &self.artifact_id, &self.version)
    }

    pub fn base_version(&self) -> String {
        base_version(&self.version)
    }
}

// ---------------------------------------------------------------------------
// 5. RepositoryProblem
// ---------------------------------------------------------------------------

/// A rejected or unreadable artifact, surfaced to operators through the
/// problem table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryProblem {
    pub repository_id: String,
    pub path: String,
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub problem_type: String,
    pub origin: String,
    pub message: String,
}
