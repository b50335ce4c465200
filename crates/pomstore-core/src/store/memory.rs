//! In-memory coordinate store.
//!
//! Same upsert semantics as [`Database`](crate::store::Database), plus
//! failure switches so callers can exercise the error policy of the
//! ingestion step.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::errors::{PomStoreError, PomStoreResult};
use crate::models::{ProjectModel, RepositoryProblem};
use crate::store::ProjectModelStore;
use crate::version::version_key;

#[derive(Debug, Default)]
pub struct MemoryStore {
    models: Mutex<IndexMap<String, ProjectModel>>,
    problems: Mutex<IndexMap<(String, String, String, String), RepositoryProblem>>,
    fail_gets: AtomicBool,
    fail_saves: AtomicBool,
    fail_deletes: AtomicBool,
    fail_problem_saves: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_problem_saves(&self, fail: bool) {
        self.fail_problem_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful save/delete calls of any kind.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn all_problems(&self) -> Vec<RepositoryProblem> {
        self.problems.lock().values().cloned().collect()
    }

    fn injected(flag: &AtomicBool, what: &str) -> PomStoreResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(PomStoreError::Database(format!("injected {what} failure")));
        }
        Ok(())
    }
}

impl ProjectModelStore for MemoryStore {
    fn get_project_model(
        &self,
        group_id: &str,
        artifact_id: &str,
        version: &str,
    ) -> PomStoreResult<Option<ProjectModel>> {
        Self::injected(&self.fail_gets, "get")?;
        Ok(self
            .models
            .lock()
            .get(&version_key(group_id, artifact_id, version))
            .cloned())
    }

    fn save_project_model(&self, model: &ProjectModel) -> PomStoreResult<()> {
        Self::injected(&self.fail_saves, "save")?;
        if !model.has_complete_coordinates() {
            return Err(PomStoreError::Database(format!(
                "refusing to store model with incomplete coordinates: {}",
                model.key()
            )));
        }
        self.models.lock().insert(model.key(), model.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn delete_project_model(&self, model: &ProjectModel) -> PomStoreResult<()> {
        Self::injected(&self.fail_deletes, "delete")?;
        self.models.lock().shift_remove(&model.key());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn save_repository_problem(&self, problem: &RepositoryProblem) -> PomStoreResult<()> {
        Self::injected(&self.fail_problem_saves, "problem save")?;
        let key = (
            problem.repository_id.clone(),
            problem.path.clone(),
            problem.origin.clone(),
            problem.problem_type.clone(),
        );
        self.problems.lock().insert(key, problem.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn count_project_models(&self) -> PomStoreResult<i64> {
        Ok(self.models.lock().len() as i64)
    }

    fn list_repository_problems(
        &self,
        repository_id: &str,
    ) -> PomStoreResult<Vec<RepositoryProblem>> {
        Ok(self
            .problems
            .lock()
            .values()
            .filter(|p| p.repository_id == repository_id)
            .cloned()
            .collect())
    }
}
