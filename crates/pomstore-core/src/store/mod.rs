//! Coordinate store: the system of record for project models and repository
//! problems.

pub mod database;
pub mod memory;
pub mod schema;

use crate::errors::PomStoreResult;
use crate::models::{ProjectModel, RepositoryProblem};

pub use database::Database;
pub use memory::MemoryStore;

/// Persistence contract required by the ingestion step.
///
/// Individual calls are atomic; callers must not assume isolation across
/// calls.
pub trait ProjectModelStore: Send + Sync {
    /// Stored model for the triple, `None` when absent.
    fn get_project_model(
        &self,
        group_id: &str,
        artifact_id: &str,
        version: &str,
    ) -> PomStoreResult<Option<ProjectModel>>;

    /// Insert or replace the model keyed by its coordinate triple.
    fn save_project_model(&self, model: &ProjectModel) -> PomStoreResult<()>;

    fn delete_project_model(&self, model: &ProjectModel) -> PomStoreResult<()>;

    /// Insert or replace a problem keyed by (repository, path, origin, type).
    fn save_repository_problem(&self, problem: &RepositoryProblem) -> PomStoreResult<()>;

    fn count_project_models(&self) -> PomStoreResult<i64>;

    fn list_repository_problems(&self, repository_id: &str)
        -> PomStoreResult<Vec<RepositoryProblem>>;
}
