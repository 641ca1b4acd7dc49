//! Error types for the resolvers

use thiserror::Error;

use crate::domain::pipeline::{HashtreeSpec, ParallelismSpec};

/// Result type alias for resolver operations
pub type Result<T> = std::result::Result<T, ResolveError>;

/// Errors produced while turning a pipeline's declarative specs into
/// concrete values
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Both `constant` and `coefficient` set, or a negative coefficient
    #[error("unable to interpret parallelism spec {0:?}")]
    InvalidParallelismSpec(ParallelismSpec),

    #[error("unable to interpret hashtree spec {0:?}")]
    InvalidHashtreeSpec(HashtreeSpec),

    /// The cluster inventory could not be reached or reported no nodes
    #[error("unable to retrieve node list to determine parallelism")]
    ClusterUnavailable(#[source] anyhow::Error),
}
