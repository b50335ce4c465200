//! Parent-model resolvers consulted by the effective filter.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::errors::{PomStoreError, PomStoreResult};
use crate::models::{ProjectModel, VersionedReference};
use crate::reader::ReaderSet;
use crate::repository::layout::pom_artifact;
use crate::repository::RepositoryContentFactory;
use crate::store::ProjectModelStore;

/// Looks up the descriptor for a referenced project.
pub trait ProjectModelResolver: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(None)` when this resolver does not know the reference.
    fn resolve(&self, reference: &VersionedReference) -> PomStoreResult<Option<ProjectModel>>;
}

// ---------------------------------------------------------------------------
// StoreResolver
// ---------------------------------------------------------------------------

/// Resolves against models already persisted in the coordinate store.
pub struct StoreResolver {
    store: Arc<dyn ProjectModelStore>,
}

impl StoreResolver {
    pub fn new(store: Arc<dyn ProjectModelStore>) -> Self {
        Self { store }
    }
}

impl ProjectModelResolver for StoreResolver {
    fn name(&self) -> &'static str {
        "store"
    }

    fn resolve(&self, reference: &VersionedReference) -> PomStoreResult<Option<ProjectModel>> {
        self.store
            .get_project_model(&reference.group_id, &reference.artifact_id, &reference.version)
            .map_err(|e| {
                PomStoreError::ProjectModel(format!(
                    "Unable to look up {} in the database: {e}",
                    reference.key()
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// RepositoryResolver
// ---------------------------------------------------------------------------

/// Resolves by reading the referenced descriptor from any managed
/// repository, in configuration order.
pub struct RepositoryResolver {
    repositories: Arc<dyn RepositoryContentFactory>,
    readers: ReaderSet,
}

impl RepositoryResolver {
    pub fn new(repositories: Arc<dyn RepositoryContentFactory>, readers: ReaderSet) -> Self {
        Self {
            repositories,
            readers,
        }
    }
}

impl ProjectModelResolver for RepositoryResolver {
    fn name(&self) -> &'static str {
        "repository"
    }

    fn resolve(&self, reference: &VersionedReference) -> PomStoreResult<Option<ProjectModel>> {
        for content in self.repositories.all_repository_contents() {
            let artifact = pom_artifact(reference, content.id());
            let file = content.to_file(&artifact);
            if !file.is_file() {
                continue;
            }
            debug!("Resolved {} from {}", reference.key(), file.display());
            let model = self.readers.for_layout(content.layout()).read(&file)?;
            return Ok(Some(model));
        }
        Ok(None)
    }
}

// ---------------------------------------------------------------------------
// ResolverStack
// ---------------------------------------------------------------------------

/// Ordered resolvers; the first hit wins.
///
/// A resolver that fails does not stop the search. If no resolver finds the
/// reference, the first failure is returned instead of `Ok(None)`.
#[derive(Default)]
pub struct ResolverStack {
    resolvers: Vec<Box<dyn ProjectModelResolver>>,
}

impl ResolverStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, resolver: Box<dyn ProjectModelResolver>) {
        self.resolvers.push(resolver);
    }

    pub fn with(mut self, resolver: Box<dyn ProjectModelResolver>) -> Self {
        self.push(resolver);
        self
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    pub fn resolve(&self, reference: &VersionedReference) -> PomStoreResult<Option<ProjectModel>> {
        let mut first_error = None;
        for resolver in &self.resolvers {
            match resolver.resolve(reference) {
                Ok(Some(model)) => return Ok(Some(model)),
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        "Resolver {} failed for {}: {e}",
                        resolver.name(),
                        reference.key()
                    );
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::repository::{ManagedRepository, RepositoryLayout, RepositoryRegistry};
    use crate::store::MemoryStore;

    struct Failing;

    impl ProjectModelResolver for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn resolve(&self, _: &VersionedReference) -> PomStoreResult<Option<ProjectModel>> {
            Err(PomStoreError::ProjectModel("boom".into()))
        }
    }

    fn parent_ref() -> VersionedReference {
        VersionedReference::new("com.x", "parent", "1")
    }

    #[test]
    fn test_store_resolver() {
        let store = Arc::new(MemoryStore::new());
        store
            .save_project_model(&ProjectModel::new("com.x", "parent", "1"))
            .unwrap();
        let resolver = StoreResolver::new(store.clone());
        assert!(resolver.resolve(&parent_ref()).unwrap().is_some());

        store.fail_gets(true);
        let err = resolver.resolve(&parent_ref()).unwrap_err();
        assert!(matches!(err, PomStoreError::ProjectModel(_)));
    }

    #[test]
    fn test_repository_resolver_reads_from_layout_path() {
        let dir = tempfile::tempdir().unwrap();
        let pom_dir = dir.path().join("com/x/parent/1");
        fs::create_dir_all(&pom_dir).unwrap();
        fs::write(
            pom_dir.join("parent-1.pom"),
            "<project><groupId>com.x</groupId><artifactId>parent</artifactId><version>1</version></project>",
        )
        .unwrap();
        let registry = RepositoryRegistry::from_repositories(&[ManagedRepository::new(
            "internal",
            dir.path(),
            RepositoryLayout::Default,
        )])
        .unwrap();
        let resolver = RepositoryResolver::new(Arc::new(registry), ReaderSet::new());
        let model = resolver.resolve(&parent_ref()).unwrap().unwrap();
        assert_eq!(model.artifact_id, "parent");
        assert!(resolver
            .resolve(&VersionedReference::new("com.x", "other", "1"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_stack_prefers_first_hit_and_reports_errors_on_miss() {
        let store = Arc::new(MemoryStore::new());
        let stack = ResolverStack::new()
            .with(Box::new(Failing))
            .with(Box::new(StoreResolver::new(store.clone())));
        assert!(stack.resolve(&parent_ref()).is_err());

        store
            .save_project_model(&ProjectModel::new("com.x", "parent", "1"))
            .unwrap();
        assert!(stack.resolve(&parent_ref()).unwrap().is_some());
    }

    #[test]
    fn test_empty_stack_resolves_nothing() {
        assert!(ResolverStack::new().resolve(&parent_ref()).unwrap().is_none());
    }
}
