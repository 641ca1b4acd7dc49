//! Resolvers
//!
//! Pure functions turning a pipeline's declarative specification into the
//! concrete values needed to admit a job: resource lists, worker and hashtree
//! counts, and an input tree pinned to exact commits.

pub mod input;
pub mod parallelism;
pub mod resources;

pub use input::resolve_job_input;
pub use parallelism::{resolve_hashtree_count, resolve_parallelism};
pub use resources::{resolve_limits, resolve_requests, resolve_resource_list};
