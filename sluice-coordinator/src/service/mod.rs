//! Service Module
//!
//! Business logic layer for the coordinator.
//! Services run every multi-record update inside one transaction so the job
//! records and the per-pipeline aggregates never disagree.

pub mod job;
pub mod pipeline;

// Re-export for convenience
pub use job as job_service;
pub use pipeline as pipeline_service;
