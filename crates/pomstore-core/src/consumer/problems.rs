//! Repository problem records for descriptors that could not be ingested.

use std::sync::Arc;

use tracing::warn;

use crate::consumer::resolve_repository;
use crate::errors::{PomStoreError, PomStoreResult};
use crate::models::{Artifact, RepositoryProblem, PROBLEM_TYPE_CORRUPT_ARTIFACT};
use crate::repository::RepositoryContentFactory;
use crate::store::ProjectModelStore;

pub struct ProblemRecorder {
    store: Arc<dyn ProjectModelStore>,
    repositories: Arc<dyn RepositoryContentFactory>,
    origin: String,
}

impl ProblemRecorder {
    /// `origin` is the id of the consumer the problems are attributed to.
    pub fn new(
        store: Arc<dyn ProjectModelStore>,
        repositories: Arc<dyn RepositoryContentFactory>,
        origin: &str,
    ) -> Self {
        Self {
            store,
            repositories,
            origin: origin.to_string(),
        }
    }

    /// Upsert a `corrupt-artifact` problem for `artifact`.
    ///
    /// Both failure modes are returned as [`PomStoreError::Consumer`]: the
    /// repository no longer resolving, and the store rejecting the record.
    pub fn record_problem(&self, artifact: &Artifact, message: &str) -> PomStoreResult<()> {
        let repo = resolve_repository(self.repositories.as_ref(), artifact)?;

        let problem = RepositoryProblem {
            repository_id: artifact.repository_id.clone(),
            path: repo.to_path(artifact),
            group_id: artifact.group_id.clone(),
            artifact_id: artifact.artifact_id.clone(),
            version: artifact.version.clone(),
            problem_type: PROBLEM_TYPE_CORRUPT_ARTIFACT.to_string(),
            origin: self.origin.clone(),
            message: message.to_string(),
        };

        self.store.save_repository_problem(&problem).map_err(|e| {
            let msg = format!("Unable to save problem with artifact location to DB: {e}");
            warn!("{msg}");
            PomStoreError::Consumer(msg)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{ManagedRepository, RepositoryLayout, RepositoryRegistry};
    use crate::store::MemoryStore;

    fn recorder(store: Arc<MemoryStore>) -> ProblemRecorder {
        let registry = RepositoryRegistry::from_repositories(&[ManagedRepository::new(
            "internal",
            "/repos/internal",
            RepositoryLayout::Default,
        )])
        .unwrap();
        ProblemRecorder::new(store, Arc::new(registry), "update-db-project")
    }

    #[test]
    fn test_records_problem_with_repository_path() {
        let store = Arc::new(MemoryStore::new());
        let artifact = Artifact::new("com.x", "foo", "1.0", "pom", "internal");
        recorder(store.clone())
            .record_problem(&artifact, "broken")
            .unwrap();

        let problems = store.list_repository_problems("internal").unwrap();
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].path, "com/x/foo/1.0/foo-1.0.pom");
        assert_eq!(problems[0].problem_type, "corrupt-artifact");
        assert_eq!(problems[0].origin, "update-db-project");
        assert_eq!(problems[0].message, "broken");
    }

    #[test]
    fn test_rerecording_replaces_the_problem() {
        let store = Arc::new(MemoryStore::new());
        let artifact = Artifact::new("com.x", "foo", "1.0", "pom", "internal");
        let recorder = recorder(store.clone());
        recorder.record_problem(&artifact, "first").unwrap();
        recorder.record_problem(&artifact, "second").unwrap();

        let problems = store.all_problems();
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].message, "second");
    }

    #[test]
    fn test_store_failure_is_escalated() {
        let store = Arc::new(MemoryStore::new());
        store.fail_problem_saves(true);
        let artifact = Artifact::new("com.x", "foo", "1.0", "pom", "internal");
        let err = recorder(store).record_problem(&artifact, "broken").unwrap_err();
        assert!(matches!(err, PomStoreError::Consumer(_)));
        assert!(err
            .to_string()
            .contains("Unable to save problem with artifact location to DB"));
    }

    #[test]
    fn test_unknown_repository_propagates() {
        let store = Arc::new(MemoryStore::new());
        let artifact = Artifact::new("com.x", "foo", "1.0", "pom", "gone");
        let err = recorder(store.clone()).record_problem(&artifact, "broken").unwrap_err();
        assert!(matches!(err, PomStoreError::Consumer(_)));
        assert!(store.all_problems().is_empty());
    }
}
