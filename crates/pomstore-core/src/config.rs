//! TOML configuration for the store, the resolution cache and the managed
//! repositories.
//!
//! ```toml
//! database_path = "~/.pomstore/pomstore.db"
//!
//! [cache]
//! max_entries = 512
//!
//! [[repositories]]
//! id = "internal"
//! location = "/srv/repos/internal"
//! layout = "default"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::DEFAULT_MAX_ENTRIES;
use crate::errors::{PomStoreError, PomStoreResult};
use crate::repository::ManagedRepository;

/// Overrides `database_path` when set and non-empty.
pub const DATABASE_ENV: &str = "POMSTORE_DATABASE";

pub const DEFAULT_DATABASE_PATH: &str = "~/.pomstore/pomstore.db";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PomStoreConfig {
    pub database_path: PathBuf,
    pub cache: CacheConfig,
    pub repositories: Vec<ManagedRepository>,
}

impl Default for PomStoreConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            cache: CacheConfig::default(),
            repositories: Vec::new(),
        }
    }
}

impl PomStoreConfig {
    /// Parse and validate. Environment overrides are not applied.
    pub fn from_toml_str(source: &str) -> PomStoreResult<Self> {
        let config: PomStoreConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read `path`, then apply environment overrides.
    pub fn load(path: &Path) -> PomStoreResult<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            PomStoreError::Config(format!("Unable to read {}: {e}", path.display()))
        })?;
        let mut config = Self::from_toml_str(&source)?;
        config.apply_env_overrides();
        debug!(
            "Loaded config from {} ({} repositories)",
            path.display(),
            config.repositories.len()
        );
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var(DATABASE_ENV) {
            let value = value.trim();
            if !value.is_empty() {
                self.database_path = PathBuf::from(value);
            }
        }
    }

    pub fn validate(&self) -> PomStoreResult<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(PomStoreError::Config("database_path must not be empty".into()));
        }
        if self.cache.max_entries == 0 {
            return Err(PomStoreError::Config(
                "cache.max_entries must be at least 1".into(),
            ));
        }
        for (i, repo) in self.repositories.iter().enumerate() {
            if repo.id.trim().is_empty() {
                return Err(PomStoreError::Config(format!(
                    "repositories[{i}] has an empty id"
                )));
            }
            if self.repositories[..i].iter().any(|r| r.id == repo.id) {
                return Err(PomStoreError::Config(format!(
                    "duplicate repository id: {}",
                    repo.id
                )));
            }
        }
        Ok(())
    }
}
