//! Sluice Coordinator
//!
//! Transactional state coordination for Sluice jobs and pipelines.
//!
//! Every job transition updates the job record and its pipeline's per-state
//! counters in one optimistic transaction against a shared versioned store.
//! Conflicting attempts are rerun with fresh reads by [`Stm`], so concurrent
//! coordinators never lose or double-count a job.
//!
//! - [`store`]: the store abstraction, retry runner and backends
//! - [`service`]: job transitions, admission and pipeline failure
//! - [`repository`]: typed collections and one-shot reads
//! - [`spec_store`]: where full pipeline specifications are read from

pub mod config;
pub mod db;
pub mod error;
pub mod repository;
pub mod service;
pub mod spec_store;
pub mod store;

pub use config::Config;
pub use error::{CoordinatorError, Result};
pub use spec_store::SpecStore;
pub use store::{KvBackend, MemoryBackend, PgBackend, RetryPolicy, Stm};
