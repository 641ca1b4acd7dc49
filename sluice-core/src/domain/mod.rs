//! Core domain types
//!
//! Records shared between the resolvers in this crate and the coordinator
//! that persists them. Job and pipeline records are the values stored in the
//! transactional store; the input tree and provenance types describe what a
//! job reads.

pub mod counts;
pub mod input;
pub mod job;
pub mod pipeline;
