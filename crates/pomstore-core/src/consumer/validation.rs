//! Checks a resolved model's identity against the file it was read from.

use crate::models::{Artifact, ProjectModel};
use crate::version::base_version;

/// Compare `model` with the coordinates derived from the artifact's location.
///
/// Returns the diagnostic for the first mismatch, or `None` when the model
/// belongs at that location. artifactId compares case-insensitively; the
/// version may match either the artifact version or its base version, so a
/// descriptor declaring `1.0-SNAPSHOT` is accepted for a timestamped file.
pub fn check_model(model: &ProjectModel, artifact: &Artifact, file_name: &str) -> Option<String> {
    if !artifact.artifact_id.eq_ignore_ascii_case(&model.artifact_id) {
        return Some(format!(
            "File {file_name} has an invalid project model [{}]: The model artifactId [{}] does not match the artifactId portion of the filename: {}",
            model.describe(),
            model.artifact_id,
            artifact.artifact_id
        ));
    }

    if !artifact.version.eq_ignore_ascii_case(&model.version)
        && !base_version(&artifact.version).eq_ignore_ascii_case(&model.version)
    {
        return Some(format!(
            "File {file_name} has an invalid project model [{}]; The model version [{}] does not match the version portion of the filename: {}",
            model.describe(),
            model.version,
            artifact.version
        ));
    }

    None
}
