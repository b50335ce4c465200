//! Effective-model resolution: parent inheritance merged into the child,
//! re-interpolated, with dependencyManagement applied.
//!
//! Every effective model built here, including intermediate parents, is put
//! into the shared [`ResolutionCache`] under its `g:a:v` key. Invalidation is
//! the caller's job: whoever replaces a stored model must evict its key.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::cache::ResolutionCache;
use crate::errors::{PomStoreError, PomStoreResult};
use crate::filter::expression::ExpressionFilter;
use crate::filter::resolver::ResolverStack;
use crate::filter::ProjectModelFilter;
use crate::models::{Dependency, ProjectModel};

/// Upper bound on parent-chain length.
pub const MAX_PARENT_DEPTH: usize = 32;

pub struct EffectiveProjectModelFilter {
    resolvers: ResolverStack,
    cache: Arc<ResolutionCache>,
    expression: ExpressionFilter,
}

impl EffectiveProjectModelFilter {
    pub fn new(resolvers: ResolverStack, cache: Arc<ResolutionCache>, expression: ExpressionFilter) -> Self {
        Self {
            resolvers,
            cache,
            expression,
        }
    }

    pub fn cache(&self) -> &Arc<ResolutionCache> {
        &self.cache
    }

    fn build(&self, model: &ProjectModel, chain: &mut Vec<String>) -> PomStoreResult<ProjectModel> {
        let merged = match &model.parent {
            None => model.clone(),
            Some(reference) => {
                let parent_key = reference.key();
                if chain.contains(&parent_key) {
                    chain.push(parent_key);
                    return Err(PomStoreError::ProjectModel(format!(
                        "Cycle detected in parent chain: {}",
                        chain.join(" -> ")
                    )));
                }
                if chain.len() >= MAX_PARENT_DEPTH {
                    return Err(PomStoreError::ProjectModel(format!(
                        "Parent chain of {} exceeds {MAX_PARENT_DEPTH} levels",
                        model.key()
                    )));
                }
                chain.push(parent_key.clone());

                let parent = match self.cache.get(&parent_key) {
                    Some(cached) => cached,
                    None => {
                        let raw = self.resolvers.resolve(reference)?.ok_or_else(|| {
                            PomStoreError::ProjectModel(format!(
                                "Unable to resolve parent {parent_key} of project {}",
                                model.key()
                            ))
                        })?;
                        let interpolated = self.expression.filter(&raw)?;
                        let effective = self.build(&interpolated, chain)?;
                        self.cache.put(parent_key.clone(), effective.clone());
                        effective
                    }
                };
                debug!("Merging parent {parent_key} into {}", model.key());
                merge_parent(&parent, model)
            }
        };

        let mut effective = self.expression.filter_with(&merged, true)?;
        apply_dependency_management(&mut effective);

        if !effective.has_complete_coordinates() {
            return Err(PomStoreError::ProjectModel(format!(
                "Project {} has incomplete coordinates after inheritance",
                effective.key()
            )));
        }
        Ok(effective)
    }
}

impl ProjectModelFilter for EffectiveProjectModelFilter {
    fn filter(&self, model: &ProjectModel) -> PomStoreResult<ProjectModel> {
        if model.has_complete_coordinates() {
            if let Some(cached) = self.cache.get(&model.key()) {
                debug!("Effective model cache hit for {}", model.key());
                return Ok(cached);
            }
        }

        let mut chain = vec![model.key()];
        let effective = self.build(model, &mut chain)?;
        self.cache.put(effective.key(), effective.clone());
        Ok(effective)
    }
}

/// Merge an effective parent into a child. Child values win; groupId and
/// version are inherited when the child leaves them empty.
pub fn merge_parent(parent: &ProjectModel, child: &ProjectModel) -> ProjectModel {
    let mut merged = child.clone();

    if merged.group_id.is_empty() {
        merged.group_id = parent.group_id.clone();
    }
    if merged.version.is_empty() {
        merged.version = parent.version.clone();
    }
    if merged.description.is_none() {
        merged.description = parent.description.clone();
    }
    if merged.url.is_none() {
        merged.url = parent
            .url
            .as_ref()
            .map(|url| format!("{}/{}", url.trim_end_matches('/'), child.artifact_id));
    }

    let mut properties = parent.properties.clone();
    for (k, v) in &child.properties {
        properties.insert(k.clone(), v.clone());
    }
    merged.properties = properties;

    merged.dependency_management =
        merge_dependencies(&parent.dependency_management, &child.dependency_management);
    merged.dependencies = merge_dependencies(&parent.dependencies, &child.dependencies);
    merged
}

fn merge_dependencies(parent: &[Dependency], child: &[Dependency]) -> Vec<Dependency> {
    let mut by_key: IndexMap<String, Dependency> = IndexMap::new();
    for dep in parent.iter().chain(child.iter()) {
        by_key.insert(dep.management_key(), dep.clone());
    }
    by_key.into_values().collect()
}

/// Fill missing dependency versions and scopes from dependencyManagement.
fn apply_dependency_management(model: &mut ProjectModel) {
    if model.dependency_management.is_empty() {
        return;
    }
    let managed: IndexMap<String, Dependency> = model
        .dependency_management
        .iter()
        .map(|d| (d.management_key(), d.clone()))
        .collect();
    for dep in model.dependencies.iter_mut() {
        if let Some(m) = managed.get(&dep.management_key()) {
            if dep.version.is_none() {
                dep.version = m.version.clone();
            }
            if dep.scope.is_none() {
                dep.scope = m.scope.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::resolver::StoreResolver;
    use crate::models::VersionedReference;
    use crate::store::{MemoryStore, ProjectModelStore};

    fn parent() -> ProjectModel {
        let mut p = ProjectModel::new("com.x", "parent", "3");
        p.packaging = "pom".into();
        p.url = Some("https://x.example/".into());
        p.properties.insert("lib.version".into(), "2.1".into());
        p.properties.insert("shared".into(), "parent".into());
        let mut managed = Dependency::new("org.lib", "lib", Some("${lib.version}"));
        managed.scope = Some("test".into());
        p.dependency_management.push(managed);
        p
    }

    fn child() -> ProjectModel {
        let mut c = ProjectModel::new("", "foo", "");
        c.parent = Some(VersionedReference::new("com.x", "parent", "3"));
        c.properties.insert("shared".into(), "child".into());
        c.dependencies.push(Dependency::new("org.lib", "lib", None));
        c
    }

    fn filter_with_store(store: Arc<MemoryStore>) -> EffectiveProjectModelFilter {
        EffectiveProjectModelFilter::new(
            ResolverStack::new().with(Box::new(StoreResolver::new(store))),
            Arc::new(ResolutionCache::default()),
            ExpressionFilter::without_environment(),
        )
    }

    #[test]
    fn test_inherits_from_parent() {
        let store = Arc::new(MemoryStore::new());
        store.save_project_model(&parent()).unwrap();
        let filter = filter_with_store(store);

        let effective = filter.filter(&child()).unwrap();
        assert_eq!(effective.group_id, "com.x");
        assert_eq!(effective.version, "3");
        assert_eq!(effective.url.as_deref(), Some("https://x.example/foo"));
        assert_eq!(effective.properties["shared"], "child");
        assert_eq!(effective.dependencies[0].version.as_deref(), Some("2.1"));
        assert_eq!(effective.dependencies[0].scope.as_deref(), Some("test"));

        assert!(filter.cache().has_key("com.x:foo:3"));
        assert!(filter.cache().has_key("com.x:parent:3"));
    }

    #[test]
    fn test_missing_parent_fails() {
        let filter = filter_with_store(Arc::new(MemoryStore::new()));
        let err = filter.filter(&child()).unwrap_err();
        assert!(matches!(err, PomStoreError::ProjectModel(_)));
        assert!(err.to_string().contains("com.x:parent:3"));
    }

    #[test]
    fn test_parent_cycle_detected() {
        let store = Arc::new(MemoryStore::new());
        let mut a = ProjectModel::new("com.x", "a", "1");
        a.parent = Some(VersionedReference::new("com.x", "b", "1"));
        let mut b = ProjectModel::new("com.x", "b", "1");
        b.parent = Some(VersionedReference::new("com.x", "a", "1"));
        store.save_project_model(&a).unwrap();
        store.save_project_model(&b).unwrap();

        let err = filter_with_store(store).filter(&a).unwrap_err();
        assert!(err.to_string().contains("Cycle detected"));
    }

    #[test]
    fn test_cache_hit_short_circuits_resolution() {
        let filter = filter_with_store(Arc::new(MemoryStore::new()));
        let mut cached = ProjectModel::new("com.x", "foo", "1.0");
        cached.name = Some("from cache".into());
        filter.cache().put("com.x:foo:1.0".into(), cached);

        let mut raw = ProjectModel::new("com.x", "foo", "1.0");
        raw.parent = Some(VersionedReference::new("com.x", "absent", "1"));
        let effective = filter.filter(&raw).unwrap();
        assert_eq!(effective.name.as_deref(), Some("from cache"));
    }

    #[test]
    fn test_model_without_parent_passes_through() {
        let filter = filter_with_store(Arc::new(MemoryStore::new()));
        let model = ProjectModel::new("com.x", "solo", "1.0");
        assert_eq!(filter.filter(&model).unwrap(), model);
    }

    #[test]
    fn test_merge_dependencies_child_wins() {
        let mut parent_dep = Dependency::new("g", "a", Some("1"));
        parent_dep.scope = Some("compile".into());
        let child_dep = Dependency::new("g", "a", Some("2"));
        let merged = merge_dependencies(&[parent_dep], &[child_dep]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].version.as_deref(), Some("2"));
    }
}
