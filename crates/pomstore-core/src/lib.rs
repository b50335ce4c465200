//! pomstore core library: ingests project descriptors (POMs) found in managed
//! artifact repositories into a queryable coordinate store.
//!
//! The entry point is [`ProjectModelToDatabaseConsumer`], which takes one
//! discovered artifact at a time through read, interpolation, inheritance
//! resolution and location validation, then persists the effective model or
//! records a repository problem. The store, the repositories, the readers,
//! the filters and the resolution cache are all injected.

pub mod cache;
pub mod config;
pub mod consumer;
pub mod errors;
pub mod filter;
pub mod models;
pub mod reader;
pub mod repository;
pub mod store;
pub mod version;

pub use cache::ResolutionCache;
pub use config::PomStoreConfig;
pub use consumer::{run_database_scan, ArtifactConsumer, ProjectModelToDatabaseConsumer, ScanStats};
pub use errors::{PomStoreError, PomStoreResult};
pub use models::{Artifact, ProjectModel, RepositoryProblem};
pub use store::{Database, MemoryStore, ProjectModelStore};
