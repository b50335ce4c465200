//! SQLite storage layer.
//!
//! Each public method opens its own connection so that the caller never has
//! to manage connection lifetime.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::errors::{PomStoreError, PomStoreResult};
use crate::models::{ProjectModel, RepositoryProblem};
use crate::store::{schema, ProjectModelStore};

// ---------------------------------------------------------------------------
// Helper: tilde expansion
// ---------------------------------------------------------------------------

/// Expand a leading `~` to the user's home directory.
pub(crate) fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            let mut expanded = PathBuf::from(home);
            if path.len() > 2 {
                expanded.push(&path[2..]);
            }
            return expanded;
        }
    }
    PathBuf::from(path)
}

fn content_hash(model_json: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(model_json.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// Database
// ---------------------------------------------------------------------------

/// SQLite-backed coordinate store.
#[derive(Debug, Clone)]
pub struct Database {
    db_path: PathBuf,
}

impl Database {
    /// Create a new `Database`. The path is expanded and parent directories
    /// are created if they do not already exist. The schema is not touched;
    /// see [`Database::init_schema`] or [`Database::open`].
    pub fn new(db_path: impl AsRef<Path>) -> PomStoreResult<Self> {
        let expanded = expand_tilde(&db_path.as_ref().to_string_lossy());
        let resolved = if expanded.is_absolute() {
            expanded
        } else {
            std::env::current_dir()?.join(&expanded)
        };
        if let Some(parent) = resolved.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self { db_path: resolved })
    }

    /// `new` followed by `init_schema`.
    pub fn open(db_path: impl AsRef<Path>) -> PomStoreResult<Self> {
        let db = Self::new(db_path)?;
        db.init_schema()?;
        Ok(db)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> PomStoreResult<Connection> {
        let conn = Connection::open(&self.db_path)?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        Ok(conn)
    }

    /// Set WAL mode, create all tables and indexes, then run pending
    /// migrations.
    pub fn init_schema(&self) -> PomStoreResult<()> {
        let conn = self.connect()?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        for stmt in schema::SCHEMA_STATEMENTS {
            conn.execute_batch(stmt)?;
        }
        schema::migrate_schema(&conn)?;
        Ok(())
    }

    pub fn schema_version(&self) -> PomStoreResult<i32> {
        let conn = self.connect()?;
        Ok(schema::get_schema_version(&conn))
    }

    /// SHA-256 of the stored model JSON, `None` when no model is stored.
    pub fn project_model_digest(
        &self,
        group_id: &str,
        artifact_id: &str,
        version: &str,
    ) -> PomStoreResult<Option<String>> {
        let conn = self.connect()?;
        let digest = conn
            .query_row(
                "SELECT content_hash FROM project_models \
                 WHERE group_id = ?1 AND artifact_id = ?2 AND version = ?3;",
                params![group_id, artifact_id, version],
                |row| row.get(0),
            )
            .optional()?;
        Ok(digest)
    }

    /// All stored versions of `group_id:artifact_id`, oldest insert first.
    pub fn list_versions(&self, group_id: &str, artifact_id: &str) -> PomStoreResult<Vec<String>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT version FROM project_models \
             WHERE group_id = ?1 AND artifact_id = ?2 ORDER BY rowid;",
        )?;
        let versions = stmt
            .query_map(params![group_id, artifact_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(versions)
    }
}

impl ProjectModelStore for Database {
    fn get_project_model(
        &self,
        group_id: &str,
        artifact_id: &str,
        version: &str,
    ) -> PomStoreResult<Option<ProjectModel>> {
        let conn = self.connect()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT model_json FROM project_models \
                 WHERE group_id = ?1 AND artifact_id = ?2 AND version = ?3;",
                params![group_id, artifact_id, version],
                |row| row.get(0),
            )
            .optional()?;
        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn save_project_model(&self, model: &ProjectModel) -> PomStoreResult<()> {
        if !model.has_complete_coordinates() {
            return Err(PomStoreError::Database(format!(
                "refusing to store model with incomplete coordinates: {}",
                model.key()
            )));
        }
        let model_json = serde_json::to_string(model)?;
        let hash = content_hash(&model_json);
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO project_models \
                 (group_id, artifact_id, version, packaging, origin, model_json, content_hash) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
             ON CONFLICT(group_id, artifact_id, version) DO UPDATE SET \
                 packaging = excluded.packaging, \
                 origin = excluded.origin, \
                 model_json = excluded.model_json, \
                 content_hash = excluded.content_hash, \
                 updated_at = CURRENT_TIMESTAMP;",
            params![
                model.group_id,
                model.artifact_id,
                model.version,
                model.packaging,
                model.origin,
                model_json,
                hash,
            ],
        )?;
        debug!("Stored project model {}", model.key());
        Ok(())
    }

    fn delete_project_model(&self, model: &ProjectModel) -> PomStoreResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "DELETE FROM project_models \
             WHERE group_id = ?1 AND artifact_id = ?2 AND version = ?3;",
            params![model.group_id, model.artifact_id, model.version],
        )?;
        Ok(())
    }

    fn save_repository_problem(&self, problem: &RepositoryProblem) -> PomStoreResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO repository_problems \
                 (repository_id, path, group_id, artifact_id, version, problem_type, origin, message) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
             ON CONFLICT(repository_id, path, origin, problem_type) DO UPDATE SET \
                 group_id = excluded.group_id, \
                 artifact_id = excluded.artifact_id, \
                 version = excluded.version, \
                 message = excluded.message, \
                 created_at = CURRENT_TIMESTAMP;",
            params![
                problem.repository_id,
                problem.path,
                problem.group_id,
                problem.artifact_id,
                problem.version,
                problem.problem_type,
                problem.origin,
                problem.message,
            ],
        )?;
        Ok(())
    }

    fn count_project_models(&self) -> PomStoreResult<i64> {
        let conn = self.connect()?;
        let count = conn.query_row("SELECT COUNT(*) FROM project_models;", [], |row| row.get(0))?;
        Ok(count)
    }

    fn list_repository_problems(
        &self,
        repository_id: &str,
    ) -> PomStoreResult<Vec<RepositoryProblem>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT repository_id, path, group_id, artifact_id, version, \
                    problem_type, origin, message \
             FROM repository_problems WHERE repository_id = ?1 ORDER BY id;",
        )?;
        let problems = stmt
            .query_map(params![repository_id], |row| {
                Ok(RepositoryProblem {
                    repository_id: row.get(0)?,
                    path: row.get(1)?,
                    group_id: row.get(2)?,
                    artifact_id: row.get(3)?,
                    version: row.get(4)?,
                    problem_type: row.get(5)?,
                    origin: row.get(6)?,
                    message: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(problems)
    }
}
