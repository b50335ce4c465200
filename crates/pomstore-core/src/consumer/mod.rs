//! Database-scan consumers and a minimal driver for them.

pub mod problems;
pub mod project_model;
pub mod validation;

use serde::Serialize;
use tracing::{info, warn};

use crate::errors::{PomStoreError, PomStoreResult};
use crate::models::Artifact;
use crate::repository::{ManagedRepositoryContent, RepositoryContentFactory};

pub use problems::ProblemRecorder;
pub use project_model::ProjectModelToDatabaseConsumer;

/// A step run once per unprocessed artifact during a database scan.
pub trait ArtifactConsumer: Send + Sync {
    fn id(&self) -> &str;

    fn description(&self) -> &str;

    /// Permanent consumers cannot be disabled through configuration.
    fn is_permanent(&self) -> bool {
        false
    }

    /// Artifact types this consumer wants to see.
    fn included_types(&self) -> &[&str];

    fn begin_scan(&self) {}

    fn process_artifact(&self, artifact: &Artifact) -> PomStoreResult<()>;

    fn complete_scan(&self) {}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub artifacts_seen: usize,
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Feed every artifact to every consumer that includes its type.
///
/// A failure on one artifact is logged and counted; the batch always runs to
/// completion.
pub fn run_database_scan(consumers: &[&dyn ArtifactConsumer], artifacts: &[Artifact]) -> ScanStats {
    let mut stats = ScanStats::default();
    for consumer in consumers {
        consumer.begin_scan();
    }

    for artifact in artifacts {
        stats.artifacts_seen += 1;
        let mut handled = false;
        for consumer in consumers {
            if !consumer
                .included_types()
                .iter()
                .any(|t| *t == artifact.artifact_type)
            {
                continue;
            }
            handled = true;
            match consumer.process_artifact(artifact) {
                Ok(()) => stats.processed += 1,
                Err(e) => {
                    warn!(
                        "Consumer {} failed on {}: {e}",
                        consumer.id(),
                        artifact.key()
                    );
                    stats.failed += 1;
                }
            }
        }
        if !handled {
            stats.skipped += 1;
        }
    }

    for consumer in consumers {
        consumer.complete_scan();
    }
    info!(
        "Database scan complete: {} artifacts, {} processed, {} skipped, {} failed",
        stats.artifacts_seen, stats.processed, stats.skipped, stats.failed
    );
    stats
}

/// Resolve the content accessor for the artifact's repository. Failure is
/// fatal for the consumer and surfaces as [`PomStoreError::Consumer`].
pub(crate) fn resolve_repository(
    repositories: &dyn RepositoryContentFactory,
    artifact: &Artifact,
) -> PomStoreResult<ManagedRepositoryContent> {
    repositories
        .managed_repository_content(&artifact.repository_id)
        .map_err(|e| {
            let detail = match e {
                PomStoreError::Repository(msg) => msg,
                other => other.to_string(),
            };
            PomStoreError::Consumer(format!("Unable to process project model: {detail}"))
        })
}
