//! Cluster inventory capability

use async_trait::async_trait;

/// Reports the size of the cluster workers are scheduled onto
///
/// Implemented by the orchestration layer (e.g. by listing nodes through the
/// cluster API).
#[async_trait]
pub trait ClusterInventory: Send + Sync {
    /// Returns the number of schedulable nodes
    ///
    /// An error means the cluster could not be queried at all. Reporting zero
    /// nodes is not an error here; callers that need workers treat it as an
    /// unavailable cluster.
    async fn node_count(&self) -> anyhow::Result<usize>;
}

/// Inventory with a fixed node count
#[derive(Debug, Clone, Copy)]
pub struct StaticInventory(pub usize);

#[async_trait]
impl ClusterInventory for StaticInventory {
    async fn node_count(&self) -> anyhow::Result<usize> {
        Ok(self.0)
    }
}
