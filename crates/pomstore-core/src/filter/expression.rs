//! `${...}` expression interpolation.
//!
//! Expressions resolve, in order, against `project.*` / `pom.*` accessors,
//! `env.*` variables and the model's own properties. Nested expressions are
//! expanded up to [`MAX_INTERPOLATION_DEPTH`] passes.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::errors::{PomStoreError, PomStoreResult};
use crate::filter::ProjectModelFilter;
use crate::models::{Dependency, ProjectModel};

pub const MAX_INTERPOLATION_DEPTH: usize = 10;

static EXPRESSION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

#[derive(Clone, Debug)]
pub struct ExpressionFilter {
    use_environment: bool,
}

impl Default for ExpressionFilter {
    fn default() -> Self {
        Self {
            use_environment: true,
        }
    }
}

impl ExpressionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter that leaves `env.*` expressions unresolved.
    pub fn without_environment() -> Self {
        Self {
            use_environment: false,
        }
    }

    fn evaluate(&self, expression: &str, model: &ProjectModel) -> Option<String> {
        let expression = expression.trim();
        if let Some(field) = expression
            .strip_prefix("project.")
            .or_else(|| expression.strip_prefix("pom."))
        {
            return project_field(field, model);
        }
        if let Some(var) = expression.strip_prefix("env.") {
            if !self.use_environment {
                return None;
            }
            return std::env::var(var).ok();
        }
        model.properties.get(expression).cloned()
    }

    /// Expand every expression in `value` that can be resolved; unresolvable
    /// ones are kept verbatim.
    pub fn interpolate(&self, value: &str, model: &ProjectModel) -> String {
        let mut current = value.to_string();
        for _ in 0..MAX_INTERPOLATION_DEPTH {
            if !EXPRESSION_RE.is_match(&current) {
                break;
            }
            let next = EXPRESSION_RE
                .replace_all(&current, |caps: &Captures<'_>| {
                    self.evaluate(&caps[1], model)
                        .unwrap_or_else(|| caps[0].to_string())
                })
                .into_owned();
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    /// Interpolate all string fields of `model`.
    ///
    /// With `strict_identity`, an expression left unresolved in groupId,
    /// artifactId or version is an error. Without it such expressions are
    /// kept, since they may resolve once parent properties are merged in.
    pub fn filter_with(&self, model: &ProjectModel, strict_identity: bool) -> PomStoreResult<ProjectModel> {
        let group_id = self.interpolate(&model.group_id, model);
        let artifact_id = self.interpolate(&model.artifact_id, model);
        let version = self.interpolate(&model.version, model);

        if strict_identity {
            for (field, value) in [
                ("groupId", &group_id),
                ("artifactId", &artifact_id),
                ("version", &version),
            ] {
                if let Some(unresolved) = EXPRESSION_RE.find(value) {
                    return Err(PomStoreError::ProjectModel(format!(
                        "Unable to resolve expression {} in {field} of project {}",
                        unresolved.as_str(),
                        model.key()
                    )));
                }
            }
        }

        // Evaluate the remaining fields against the resolved identity so that
        // `${project.version}` inside dependencies sees the final value.
        let mut context = model.clone();
        context.group_id = group_id.clone();
        context.artifact_id = artifact_id.clone();
        context.version = version.clone();

        let mut filtered = model.clone();
        filtered.group_id = group_id;
        filtered.artifact_id = artifact_id;
        filtered.version = version;
        filtered.packaging = self.interpolate(&model.packaging, &context);
        filtered.name = model.name.as_deref().map(|v| self.interpolate(v, &context));
        filtered.description = model
            .description
            .as_deref()
            .map(|v| self.interpolate(v, &context));
        filtered.url = model.url.as_deref().map(|v| self.interpolate(v, &context));
        if let Some(parent) = filtered.parent.as_mut() {
            parent.group_id = self.interpolate(&parent.group_id, &context);
            parent.artifact_id = self.interpolate(&parent.artifact_id, &context);
            parent.version = self.interpolate(&parent.version, &context);
        }
        for value in filtered.properties.values_mut() {
            *value = self.interpolate(value.as_str(), &context);
        }
        for dep in filtered
            .dependencies
            .iter_mut()
            .chain(filtered.dependency_management.iter_mut())
        {
            self.interpolate_dependency(dep, &context);
        }
        for module in filtered.modules.iter_mut() {
            *module = self.interpolate(module.as_str(), &context);
        }
        Ok(filtered)
    }

    fn interpolate_dependency(&self, dep: &mut Dependency, context: &ProjectModel) {
        dep.group_id = self.interpolate(&dep.group_id, context);
        dep.artifact_id = self.interpolate(&dep.artifact_id, context);
        dep.version = dep.version.as_deref().map(|v| self.interpolate(v, context));
        dep.dep_type = self.interpolate(&dep.dep_type, context);
        dep.classifier = dep.classifier.as_deref().map(|v| self.interpolate(v, context));
        dep.scope = dep.scope.as_deref().map(|v| self.interpolate(v, context));
    }
}

impl ProjectModelFilter for ExpressionFilter {
    /// Identity expressions must resolve unless the model has a parent to
    /// inherit them from.
    fn filter(&self, model: &ProjectModel) -> PomStoreResult<ProjectModel> {
        self.filter_with(model, model.parent.is_none())
    }
}

/// `project.<field>` accessor. Empty groupId/version fall back to the parent
/// reference, as they would be inherited from it.
fn project_field(field: &str, model: &ProjectModel) -> Option<String> {
    let inherited = |own: &str, from_parent: Option<&str>| {
        if own.is_empty() {
            from_parent.map(str::to_string)
        } else {
            Some(own.to_string())
        }
    };
    match field {
        "groupId" => inherited(
            &model.group_id,
            model.parent.as_ref().map(|p| p.group_id.as_str()),
        ),
        "artifactId" => Some(model.artifact_id.clone()),
        "version" => inherited(
            &model.version,
            model.parent.as_ref().map(|p| p.version.as_str()),
        ),
        "packaging" => Some(model.packaging.clone()),
        "name" => model.name.clone(),
        "description" => model.description.clone(),
        "url" => model.url.clone(),
        "parent.groupId" => model.parent.as_ref().map(|p| p.group_id.clone()),
        "parent.artifactId" => model.parent.as_ref().map(|p| p.artifact_id.clone()),
        "parent.version" => model.parent.as_ref().map(|p| p.version.clone()),
        _ => None,
    }
}
