//! Path formatting for the two supported repository layouts.

use crate::models::{Artifact, VersionedReference};
use crate::version::base_version;

/// File extension for an artifact type. Types that package as jars map to
/// `jar`; everything else uses the type name itself.
pub fn extension_for_type(artifact_type: &str) -> &str {
    match artifact_type {
        "maven-plugin" | "ejb" | "ejb-client" | "java-source" | "javadoc" | "test-jar" => "jar",
        other => other,
    }
}

fn file_name(artifact_id: &str, version: &str, classifier: Option<&str>, ext: &str) -> String {
    match classifier {
        Some(c) if !c.is_empty() => format!("{artifact_id}-{version}-{c}.{ext}"),
        _ => format!("{artifact_id}-{version}.{ext}"),
    }
}

/// `com/example/foo/1.0-SNAPSHOT/foo-1.0-20090101.120000-1.pom`
pub fn default_path(artifact: &Artifact) -> String {
    format!(
        "{}/{}/{}/{}",
        artifact.group_id.replace('.', "/"),
        artifact.artifact_id,
        base_version(&artifact.version),
        file_name(
            &artifact.artifact_id,
            &artifact.version,
            artifact.classifier.as_deref(),
            extension_for_type(&artifact.artifact_type),
        )
    )
}

/// `com.example/poms/foo-1.0.pom`
pub fn legacy_path(artifact: &Artifact) -> String {
    let ext = extension_for_type(&artifact.artifact_type);
    let dir = match artifact.artifact_type.as_str() {
        "maven-plugin" => "plugins".to_string(),
        "java-source" => "java-sources".to_string(),
        "javadoc" => "javadoc.jars".to_string(),
        other => format!("{other}s"),
    };
    format!(
        "{}/{}/{}",
        artifact.group_id,
        dir,
        file_name(
            &artifact.artifact_id,
            &artifact.version,
            artifact.classifier.as_deref(),
            ext
        )
    )
}

/// Artifact describing the descriptor of a referenced project.
pub fn pom_artifact(reference: &VersionedReference, repository_id: &str) -> Artifact {
    Artifact::new(
        &reference.group_id,
        &reference.artifact_id,
        &reference.version,
        "pom",
        repository_id,
    )
}
