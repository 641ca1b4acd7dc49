//! Sluice Core
//!
//! Core types and resolvers for the Sluice pipeline system.
//!
//! This crate contains:
//! - Domain types: job and pipeline records, the input tree, provenance
//! - Resource quantities and the quantity parser capability
//! - Resolvers: resource lists, parallelism, hashtree counts, job inputs
//!
//! Nothing in here touches the shared store; see `sluice-coordinator` for the
//! transactional side.

pub mod cluster;
pub mod domain;
pub mod error;
pub mod resolve;
pub mod resource;

pub use cluster::{ClusterInventory, StaticInventory};
pub use error::ResolveError;
pub use resource::{Quantity, QuantityParser, ResourceList, ResourceName, StandardQuantityParser};
