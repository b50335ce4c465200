//! Model filter chain: expression interpolation, then effective-model
//! (inheritance) resolution.

pub mod effective;
pub mod expression;
pub mod resolver;

use crate::errors::PomStoreResult;
use crate::models::ProjectModel;

pub use effective::EffectiveProjectModelFilter;
pub use expression::ExpressionFilter;
pub use resolver::{ProjectModelResolver, RepositoryResolver, ResolverStack, StoreResolver};

/// A transform from one project model to another.
///
/// Failures that mean "this descriptor cannot be resolved" are reported as
/// [`PomStoreError::ProjectModel`](crate::errors::PomStoreError::ProjectModel).
pub trait ProjectModelFilter: Send + Sync {
    fn filter(&self, model: &ProjectModel) -> PomStoreResult<ProjectModel>;
}
