//! SQLite schema: baseline DDL plus versioned upgrade steps.
//!
//! The version lives in `PRAGMA user_version`. The baseline statements are
//! replayable and describe version 1; every later version is one entry in
//! [`MIGRATIONS`], applied in its own transaction.

use rusqlite::Connection;
use tracing::debug;

use crate::errors::PomStoreResult;

pub const SCHEMA_VERSION: i32 = 2;

pub const SCHEMA_STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS project_models (
        group_id TEXT NOT NULL,
        artifact_id TEXT NOT NULL,
        version TEXT NOT NULL,
        packaging TEXT NOT NULL,
        origin TEXT NOT NULL,
        model_json TEXT NOT NULL,
        content_hash TEXT NOT NULL,
        updated_at TEXT DEFAULT CURRENT_TIMESTAMP,
        PRIMARY KEY(group_id, artifact_id, version)
    );",
    "CREATE TABLE IF NOT EXISTS repository_problems (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        repository_id TEXT NOT NULL,
        path TEXT NOT NULL,
        group_id TEXT NOT NULL,
        artifact_id TEXT NOT NULL,
        version TEXT NOT NULL,
        problem_type TEXT NOT NULL,
        origin TEXT NOT NULL,
        message TEXT NOT NULL,
        created_at TEXT DEFAULT CURRENT_TIMESTAMP,
        UNIQUE(repository_id, path, origin, problem_type)
    );",
    "CREATE INDEX IF NOT EXISTS idx_project_models_artifact ON project_models(group_id, artifact_id);",
    "CREATE INDEX IF NOT EXISTS idx_repository_problems_repo ON repository_problems(repository_id, created_at);",
];

/// `(target version, DDL)` upgrade steps, ascending.
pub const MIGRATIONS: &[(i32, &str)] = &[
    (1, ""),
    // Problem lookups by coordinates, used when a model is replaced.
    (
        2,
        "CREATE INDEX IF NOT EXISTS idx_repository_problems_coords \
         ON repository_problems(group_id, artifact_id, version);",
    ),
];

/// Apply every step newer than the stored version. A failing step rolls
/// back alone and leaves the version at the last completed step.
pub fn migrate_schema(conn: &Connection) -> PomStoreResult<()> {
    let current = get_schema_version(conn);
    for &(version, ddl) in MIGRATIONS.iter().filter(|(v, _)| *v > current) {
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(ddl)?;
        tx.pragma_update(None, "user_version", version)?;
        tx.commit()?;
        debug!("Schema migrated to v{version}");
    }
    Ok(())
}

/// Stored schema version; 0 for a database never migrated.
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        for stmt in SCHEMA_STATEMENTS {
            conn.execute_batch(stmt).unwrap();
        }
        conn
    }

    fn has_index(conn: &Connection, name: &str) -> bool {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = ?1;",
            [name],
            |row| row.get::<_, i64>(0),
        )
        .unwrap()
            == 1
    }

    #[test]
    fn migrations_end_at_current_version() {
        assert_eq!(MIGRATIONS.last().map(|(v, _)| *v), Some(SCHEMA_VERSION));
    }

    #[test]
    fn migrate_baseline_adds_coords_index() {
        let conn = baseline();
        assert_eq!(get_schema_version(&conn), 0);
        assert!(!has_index(&conn, "idx_repository_problems_coords"));

        migrate_schema(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), SCHEMA_VERSION);
        assert!(has_index(&conn, "idx_repository_problems_coords"));
    }

    #[test]
    fn migrate_from_v1_runs_only_newer_steps() {
        let conn = baseline();
        conn.pragma_update(None, "user_version", 1).unwrap();
        migrate_schema(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), 2);
        assert!(has_index(&conn, "idx_repository_problems_coords"));
    }

    #[test]
    fn migrate_idempotent() {
        let conn = baseline();
        migrate_schema(&conn).unwrap();
        migrate_schema(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), SCHEMA_VERSION);
    }
}
