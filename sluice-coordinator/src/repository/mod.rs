//! Repository Module
//!
//! Data access layer for the coordinator.
//! Each repository names the collection holding one record type and offers
//! one-shot reads and inserts, each in its own transaction.

pub mod job;
pub mod pipeline;

// Re-export for convenience
pub use job as job_repository;
pub use pipeline as pipeline_repository;
