//! Error types for the coordinator

use sluice_core::domain::job::JobState;
use thiserror::Error;

use crate::store::StoreError;

/// Result type alias for coordinator operations
pub type Result<T> = std::result::Result<T, CoordinatorError>;

/// Errors surfaced by coordinator operations
///
/// Every error leaves the store untouched: an operation either commits all of
/// its writes or none of them.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// The job already failed; failure is the one state no transition leaves
    #[error("cannot put job {job_id} in state {requested} as it's already in state FAILURE")]
    IllegalTransition { job_id: String, requested: JobState },

    #[error("pipeline not found: {0}")]
    PipelineNotFound(String),

    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("pipeline already exists: {0}")]
    PipelineExists(String),

    #[error("job already exists: {0}")]
    JobExists(String),

    /// The pipeline record has no spec commit to read from
    #[error("pipeline {0} has no spec commit")]
    MissingSpecCommit(String),

    #[error("could not read pipeline spec from the spec store: {0:#}")]
    SpecRead(anyhow::Error),

    #[error("could not decode pipeline spec: {0}")]
    SpecDecode(serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CoordinatorError {
    /// Check if this error is a missing pipeline or job
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::PipelineNotFound(_) | Self::JobNotFound(_))
    }
}
