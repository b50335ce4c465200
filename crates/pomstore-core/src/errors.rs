//! Error types for the pomstore core library.

/// Top-level error enum for the pomstore core library.
///
/// The string variants are the ones the ingestion step classifies on:
/// `ProjectModel` failures are recorded as repository problems, `Database`
/// failures on persist are swallowed, `Consumer` failures always propagate.
#[derive(Debug, thiserror::Error)]
pub enum PomStoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Project model error: {0}")]
    ProjectModel(String),

    #[error("Consumer error: {0}")]
    Consumer(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl PomStoreError {
    /// Short, stable name of the variant, used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            PomStoreError::Database(_) => "database",
            PomStoreError::Repository(_) => "repository",
            PomStoreError::ProjectModel(_) => "project_model",
            PomStoreError::Consumer(_) => "consumer",
            PomStoreError::Config(_) => "config",
            PomStoreError::Io(_) => "io",
            PomStoreError::Sqlite(_) => "sqlite",
            PomStoreError::Json(_) => "json",
            PomStoreError::Toml(_) => "toml",
        }
    }

    /// True for failures raised by the persistence layer.
    pub fn is_persistence(&self) -> bool {
        matches!(self, PomStoreError::Database(_) | PomStoreError::Sqlite(_))
    }
}

pub type PomStoreResult<T> = Result<T, PomStoreError>;
