//! The `update-db-project` consumer: reads each scanned POM, resolves it to
//! its effective form, checks it against its location and stores it.
//!
//! Error policy, per artifact:
//!
//! | failure                                   | outcome                      |
//! |-------------------------------------------|------------------------------|
//! | repository id does not resolve            | returned as `Consumer` error |
//! | read / expression / effective filter      | warn, problem recorded       |
//! | identity does not match the file location | warn, problem recorded       |
//! | store rejects the model                   | warn, swallowed              |
//! | recording a problem fails                 | returned as `Consumer` error |
//! | anything else                             | error logged, swallowed      |
//!
//! Lookup or delete of the previously stored model never fails the step.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::cache::ResolutionCache;
use crate::config::PomStoreConfig;
use crate::consumer::problems::ProblemRecorder;
use crate::consumer::validation::check_model;
use crate::consumer::{resolve_repository, ArtifactConsumer};
use crate::errors::{PomStoreError, PomStoreResult};
use crate::filter::{
    EffectiveProjectModelFilter, ExpressionFilter, ProjectModelFilter, RepositoryResolver,
    ResolverStack, StoreResolver,
};
use crate::models::{Artifact, ProjectModel, ORIGIN_FILESYSTEM, POM_TYPE};
use crate::reader::{DescriptorReader, ReaderSet};
use crate::repository::{ManagedRepositoryContent, RepositoryContentFactory, RepositoryRegistry};
use crate::store::{Database, ProjectModelStore};
use crate::version::is_unique_snapshot;

pub const CONSUMER_ID: &str = "update-db-project";
pub const CONSUMER_DESCRIPTION: &str = "Update database with project model information.";

const INCLUDED_TYPES: &[&str] = &[POM_TYPE];

pub struct ProjectModelToDatabaseConsumer {
    store: Arc<dyn ProjectModelStore>,
    repositories: Arc<dyn RepositoryContentFactory>,
    readers: ReaderSet,
    expression_filter: Arc<dyn ProjectModelFilter>,
    effective_filter: Arc<dyn ProjectModelFilter>,
    cache: Arc<ResolutionCache>,
    problems: ProblemRecorder,
}

impl ProjectModelToDatabaseConsumer {
    /// `cache` must be the same cache the effective filter writes to, or
    /// stale effective models will outlive the stored ones.
    pub fn new(
        store: Arc<dyn ProjectModelStore>,
        repositories: Arc<dyn RepositoryContentFactory>,
        readers: ReaderSet,
        expression_filter: Arc<dyn ProjectModelFilter>,
        effective_filter: Arc<dyn ProjectModelFilter>,
        cache: Arc<ResolutionCache>,
    ) -> Self {
        let problems = ProblemRecorder::new(store.clone(), repositories.clone(), CONSUMER_ID);
        Self {
            store,
            repositories,
            readers,
            expression_filter,
            effective_filter,
            cache,
            problems,
        }
    }

    /// Wire the standard filter chain: `${...}` interpolation, then
    /// inheritance resolved from the store first and the repositories second.
    pub fn with_standard_filters(
        store: Arc<dyn ProjectModelStore>,
        repositories: Arc<dyn RepositoryContentFactory>,
        cache: Arc<ResolutionCache>,
    ) -> Self {
        let readers = ReaderSet::new();
        let resolvers = ResolverStack::new()
            .with(Box::new(StoreResolver::new(store.clone())))
            .with(Box::new(RepositoryResolver::new(
                repositories.clone(),
                readers.clone(),
            )));
        let effective = EffectiveProjectModelFilter::new(
            resolvers,
            cache.clone(),
            ExpressionFilter::new(),
        );
        Self::new(
            store,
            repositories,
            readers,
            Arc::new(ExpressionFilter::new()),
            Arc::new(effective),
            cache,
        )
    }

    /// Open the SQLite store and the repository registry named by `config`.
    pub fn from_config(config: &PomStoreConfig) -> PomStoreResult<Self> {
        config.validate()?;
        let store = Arc::new(Database::open(&config.database_path)?);
        let repositories = Arc::new(RepositoryRegistry::from_repositories(&config.repositories)?);
        let cache = Arc::new(ResolutionCache::new(config.cache.max_entries));
        Ok(Self::with_standard_filters(store, repositories, cache))
    }

    pub fn cache(&self) -> &Arc<ResolutionCache> {
        &self.cache
    }

    /// Ingest one artifact. Only `Consumer` errors are returned; see the
    /// module docs for how every other failure is handled.
    pub fn process(&self, artifact: &Artifact) -> PomStoreResult<()> {
        if artifact.artifact_type != POM_TYPE {
            return Ok(());
        }

        self.remove_stale_model(artifact);

        let repo = resolve_repository(self.repositories.as_ref(), artifact)?;
        let file = repo.to_file(artifact);
        let reader = self.readers.for_layout(repo.layout());

        match self.ingest(artifact, &repo, &file, reader) {
            Ok(()) => Ok(()),
            Err(PomStoreError::ProjectModel(msg)) => {
                let message = format!("Unable to read project model {} : {msg}", file.display());
                warn!("{message}");
                self.problems.record_problem(artifact, &message)
            }
            Err(e @ PomStoreError::Consumer(_)) => Err(e),
            Err(e) if e.is_persistence() => {
                warn!(
                    "Unable to save project model {} to the database : {e}",
                    file.display()
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    "Unable to process model {} due to : {} : {e}",
                    file.display(),
                    e.kind()
                );
                Ok(())
            }
        }
    }

    fn ingest(
        &self,
        artifact: &Artifact,
        repo: &ManagedRepositoryContent,
        file: &Path,
        reader: &dyn DescriptorReader,
    ) -> PomStoreResult<()> {
        let mut model = reader.read(file)?;
        model.origin = ORIGIN_FILESYSTEM.to_string();

        // Timestamped files keep their own version; the descriptor only
        // declares the -SNAPSHOT form.
        if is_unique_snapshot(&artifact.version) {
            model.version = artifact.version.clone();
        }

        let model = self.expression_filter.filter(&model)?;
        // The declared identity may differ from the artifact key (artifactId
        // case, groupId); a previous scan of this file is cached under it.
        if model.has_complete_coordinates() {
            self.cache.evict(&model.key());
        }
        let model = self.effective_filter.filter(&model)?;

        // The effective filter has cached the model. Anything short of a
        // successful save must take it out again.
        let stored = self.store_if_valid(&model, repo, artifact);
        if !matches!(stored, Ok(true)) {
            self.cache.evict(&model.key());
        }
        stored.map(|_| ())
    }

    fn store_if_valid(
        &self,
        model: &ProjectModel,
        repo: &ManagedRepositoryContent,
        artifact: &Artifact,
    ) -> PomStoreResult<bool> {
        if !self.is_valid_model(model, repo, artifact)? {
            warn!(
                "Invalid or corrupt pom. Project model not added to database - {}",
                model.key()
            );
            return Ok(false);
        }

        debug!("Adding project model to database - {}", model.key());
        self.store.save_project_model(model)?;
        Ok(true)
    }

    /// Check the model against the artifact's location, recording a problem
    /// on mismatch.
    pub fn is_valid_model(
        &self,
        model: &ProjectModel,
        repo: &ManagedRepositoryContent,
        artifact: &Artifact,
    ) -> PomStoreResult<bool> {
        let file = repo.to_file(artifact);
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match check_model(model, artifact, &file_name) {
            None => Ok(true),
            Some(diagnostic) => {
                warn!("{diagnostic}");
                self.problems.record_problem(artifact, &diagnostic)?;
                Ok(false)
            }
        }
    }

    fn remove_stale_model(&self, artifact: &Artifact) {
        match self.store.get_project_model(
            &artifact.group_id,
            &artifact.artifact_id,
            &artifact.version,
        ) {
            Ok(Some(old)) => {
                if let Err(e) = self.store.delete_project_model(&old) {
                    error!("Unable to delete existing project model {}: {e}", old.key());
                }
                self.cache.evict(&old.key());
            }
            Ok(None) => {}
            Err(e) => {
                warn!(
                    "Lookup of existing project model {} failed: {e}",
                    artifact.key()
                );
            }
        }
        // An effective model may be cached for this key without ever having
        // been stored.
        self.cache.evict(&artifact.key());
    }
}

impl ArtifactConsumer for ProjectModelToDatabaseConsumer {
    fn id(&self) -> &str {
        CONSUMER_ID
    }

    fn description(&self) -> &str {
        CONSUMER_DESCRIPTION
    }

    fn is_permanent(&self) -> bool {
        true
    }

    fn included_types(&self) -> &[&str] {
        INCLUDED_TYPES
    }

    fn process_artifact(&self, artifact: &Artifact) -> PomStoreResult<()> {
        self.process(artifact)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::*;
    use crate::repository::{ManagedRepository, RepositoryLayout};
    use crate::store::MemoryStore;

    struct Fixture {
        _dir: tempfile::TempDir,
        root: PathBuf,
        store: Arc<MemoryStore>,
        consumer: ProjectModelToDatabaseConsumer,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let registry = RepositoryRegistry::from_repositories(&[ManagedRepository::new(
            "internal",
            &root,
            RepositoryLayout::Default,
        )])
        .unwrap();
        let store = Arc::new(MemoryStore::new());
        let consumer = ProjectModelToDatabaseConsumer::with_standard_filters(
            store.clone(),
            Arc::new(registry),
            Arc::new(ResolutionCache::default()),
        );
        Fixture {
            _dir: dir,
            root,
            store,
            consumer,
        }
    }

    fn write_pom(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    fn pom(group: &str, artifact: &str, version: &str) -> String {
        format!(
            "<project><modelVersion>4.0.0</modelVersion><groupId>{group}</groupId>\
             <artifactId>{artifact}</artifactId><version>{version}</version></project>"
        )
    }

    #[test]
    fn test_consumer_identity() {
        let f = fixture();
        assert_eq!(f.consumer.id(), "update-db-project");
        assert_eq!(
            f.consumer.description(),
            "Update database with project model information."
        );
        assert!(f.consumer.is_permanent());
        assert_eq!(f.consumer.included_types(), &["pom"]);
    }

    #[test]
    fn test_stores_valid_model() {
        let f = fixture();
        write_pom(&f.root, "com/x/foo/1.0/foo-1.0.pom", &pom("com.x", "foo", "1.0"));
        f.consumer
            .process(&Artifact::new("com.x", "foo", "1.0", "pom", "internal"))
            .unwrap();

        let stored = f.store.get_project_model("com.x", "foo", "1.0").unwrap().unwrap();
        assert_eq!(stored.origin, "filesystem");
        assert!(f.store.all_problems().is_empty());
    }

    #[test]
    fn test_unique_snapshot_takes_file_version() {
        let f = fixture();
        write_pom(
            &f.root,
            "com/x/foo/1.0-SNAPSHOT/foo-1.0-20090101.120000-1.pom",
            &pom("com.x", "foo", "1.0-SNAPSHOT"),
        );
        let artifact = Artifact::new("com.x", "foo", "1.0-20090101.120000-1", "pom", "internal");
        f.consumer.process(&artifact).unwrap();

        assert!(f
            .store
            .get_project_model("com.x", "foo", "1.0-20090101.120000-1")
            .unwrap()
            .is_some());
        assert!(f.store.all_problems().is_empty());
    }

    #[test]
    fn test_persist_failure_is_swallowed() {
        let f = fixture();
        write_pom(&f.root, "com/x/foo/1.0/foo-1.0.pom", &pom("com.x", "foo", "1.0"));
        f.store.fail_saves(true);
        f.consumer
            .process(&Artifact::new("com.x", "foo", "1.0", "pom", "internal"))
            .unwrap();
        assert_eq!(f.store.count_project_models().unwrap(), 0);
        assert!(f.store.all_problems().is_empty());
    }

    #[test]
    fn test_stale_lookup_and_delete_failures_are_swallowed() {
        let f = fixture();
        write_pom(&f.root, "com/x/foo/1.0/foo-1.0.pom", &pom("com.x", "foo", "1.0"));
        let artifact = Artifact::new("com.x", "foo", "1.0", "pom", "internal");
        f.consumer.process(&artifact).unwrap();

        f.store.fail_deletes(true);
        f.consumer.process(&artifact).unwrap();
        f.store.fail_deletes(false);

        f.store.fail_gets(true);
        f.consumer.process(&artifact).unwrap();
        assert_eq!(f.store.count_project_models().unwrap(), 1);
    }

    #[test]
    fn test_problem_save_failure_is_escalated() {
        let f = fixture();
        write_pom(&f.root, "com/x/foo/1.0/foo-1.0.pom", "<project><oops>");
        f.store.fail_problem_saves(true);
        let err = f
            .consumer
            .process(&Artifact::new("com.x", "foo", "1.0", "pom", "internal"))
            .unwrap_err();
        assert!(matches!(err, PomStoreError::Consumer(_)));
    }

    #[test]
    fn test_invalid_model_is_not_left_in_cache() {
        let f = fixture();
        write_pom(&f.root, "com/x/foo/1.0/foo-1.0.pom", &pom("com.x", "bar", "1.0"));
        f.consumer
            .process(&Artifact::new("com.x", "foo", "1.0", "pom", "internal"))
            .unwrap();
        assert!(!f.consumer.cache().has_key("com.x:bar:1.0"));
        assert_eq!(f.store.all_problems().len(), 1);
    }

    #[test]
    fn test_rescan_of_case_mismatched_pom_sees_edits() {
        let f = fixture();
        let rel = "com/x/foo/1.0/foo-1.0.pom";
        let named = |name: &str| {
            format!(
                "<project><groupId>com.x</groupId><artifactId>FOO</artifactId>\
                 <version>1.0</version><name>{name}</name></project>"
            )
        };
        let artifact = Artifact::new("com.x", "foo", "1.0", "pom", "internal");

        write_pom(&f.root, rel, &named("first"));
        f.consumer.process(&artifact).unwrap();
        write_pom(&f.root, rel, &named("second"));
        f.consumer.process(&artifact).unwrap();

        let stored = f.store.get_project_model("com.x", "FOO", "1.0").unwrap().unwrap();
        assert_eq!(stored.name.as_deref(), Some("second"));
        assert_eq!(f.store.count_project_models().unwrap(), 1);
    }

    #[test]
    fn test_failed_save_leaves_nothing_cached() {
        let f = fixture();
        write_pom(&f.root, "com/x/foo/1.0/foo-1.0.pom", &pom("com.x", "foo", "1.0"));
        let artifact = Artifact::new("com.x", "foo", "1.0", "pom", "internal");
        f.consumer.process(&artifact).unwrap();
        assert!(f.consumer.cache().has_key("com.x:foo:1.0"));

        f.store.fail_saves(true);
        f.consumer.process(&artifact).unwrap();
        assert!(f.store.get_project_model("com.x", "foo", "1.0").unwrap().is_none());
        assert!(!f.consumer.cache().has_key("com.x:foo:1.0"));
    }
}
