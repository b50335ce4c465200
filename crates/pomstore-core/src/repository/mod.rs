//! Managed repository content: maps artifacts to files for a repository id.
//!
//! The ingestion step only needs two things from here: resolve a repository
//! id to a [`ManagedRepositoryContent`], and ask that content for the path of
//! an artifact. The layout tag on the content also selects the descriptor
//! reader.

pub mod layout;

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::{PomStoreError, PomStoreResult};
use crate::models::Artifact;
use crate::store::database::expand_tilde;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryLayout {
    #[default]
    Default,
    Legacy,
}

impl RepositoryLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepositoryLayout::Default => "default",
            RepositoryLayout::Legacy => "legacy",
        }
    }
}

/// Configuration of a single managed repository.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedRepository {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub location: PathBuf,
    #[serde(default)]
    pub layout: RepositoryLayout,
}

impl ManagedRepository {
    pub fn new(id: &str, location: impl Into<PathBuf>, layout: RepositoryLayout) -> Self {
        Self {
            id: id.to_string(),
            name: None,
            location: location.into(),
            layout,
        }
    }
}

/// Path accessor for the contents of one managed repository.
#[derive(Clone, Debug)]
pub struct ManagedRepositoryContent {
    repository: ManagedRepository,
}

impl ManagedRepositoryContent {
    pub fn new(repository: ManagedRepository) -> Self {
        Self { repository }
    }

    pub fn id(&self) -> &str {
        &self.repository.id
    }

    pub fn layout(&self) -> RepositoryLayout {
        self.repository.layout
    }

    pub fn repository(&self) -> &ManagedRepository {
        &self.repository
    }

    /// Repository-relative path, `/`-separated.
    pub fn to_path(&self, artifact: &Artifact) -> String {
        match self.repository.layout {
            RepositoryLayout::Default => layout::default_path(artifact),
            RepositoryLayout::Legacy => layout::legacy_path(artifact),
        }
    }

    pub fn to_file(&self, artifact: &Artifact) -> PathBuf {
        let mut file = self.repository.location.clone();
        for segment in self.to_path(artifact).split('/') {
            file.push(segment);
        }
        file
    }
}

/// Resolves repository ids to their content accessor.
pub trait RepositoryContentFactory: Send + Sync {
    fn managed_repository_content(&self, repository_id: &str)
        -> PomStoreResult<ManagedRepositoryContent>;

    /// Every repository this factory knows, in configuration order.
    fn all_repository_contents(&self) -> Vec<ManagedRepositoryContent>;
}

/// Factory over a fixed, configured set of repositories.
#[derive(Clone, Debug, Default)]
pub struct RepositoryRegistry {
    repositories: IndexMap<String, ManagedRepository>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_repositories(repositories: &[ManagedRepository]) -> PomStoreResult<Self> {
        let mut registry = Self::new();
        for repo in repositories {
            registry.register(repo.clone())?;
        }
        Ok(registry)
    }

    /// Add a repository. Ids must be unique and non-empty.
    pub fn register(&mut self, mut repository: ManagedRepository) -> PomStoreResult<()> {
        if repository.id.trim().is_empty() {
            return Err(PomStoreError::Repository(
                "managed repository id must not be empty".into(),
            ));
        }
        if self.repositories.contains_key(&repository.id) {
            return Err(PomStoreError::Repository(format!(
                "duplicate managed repository id: {}",
                repository.id
            )));
        }
        repository.location = expand_tilde(&repository.location.to_string_lossy());
        self.repositories.insert(repository.id.clone(), repository);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }
}

impl RepositoryContentFactory for RepositoryRegistry {
    fn managed_repository_content(
        &self,
        repository_id: &str,
    ) -> PomStoreResult<ManagedRepositoryContent> {
        self.repositories
            .get(repository_id)
            .cloned()
            .map(ManagedRepositoryContent::new)
            .ok_or_else(|| {
                PomStoreError::Repository(format!(
                    "Unable to find managed repository configuration for id: {repository_id}"
                ))
            })
    }

    fn all_repository_contents(&self) -> Vec<ManagedRepositoryContent> {
        self.repositories
            .values()
            .cloned()
            .map(ManagedRepositoryContent::new)
            .collect()
    }
}
