//! Spec store capability
//!
//! Full pipeline specifications are too large and change too rarely to keep
//! in the transactional store. They are committed to a versioned blob store
//! instead, and the pipeline record only points at the commit.

use async_trait::async_trait;

/// Repository holding every pipeline specification
pub const SPEC_REPO: &str = "spec";

/// Path of the specification file inside a spec commit
pub const SPEC_FILE: &str = "spec";

/// Read access to versioned pipeline specifications
#[async_trait]
pub trait SpecStore: Send + Sync {
    /// Returns the raw bytes of `path` as of `commit` in `repo`
    async fn read_pipeline_spec(&self, repo: &str, commit: &str, path: &str)
    -> anyhow::Result<Vec<u8>>;
}
