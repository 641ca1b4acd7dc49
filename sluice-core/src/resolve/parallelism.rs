//! Worker and hashtree counts

use crate::cluster::ClusterInventory;
use crate::domain::pipeline::{HashtreeSpec, ParallelismSpec};
use crate::error::{ResolveError, Result};

/// Computes the number of workers a pipeline starts
///
/// - no spec, or both fields zero: one worker
/// - `constant` only: exactly `constant` workers
/// - `coefficient` only: `floor(coefficient * nodes)`, at least one
///
/// The cluster inventory is only consulted in the coefficient case.
pub async fn resolve_parallelism(
    spec: Option<&ParallelismSpec>,
    inventory: &dyn ClusterInventory,
) -> Result<usize> {
    let Some(spec) = spec else {
        return Ok(1);
    };

    if spec.constant == 0 && spec.coefficient == 0.0 {
        Ok(1)
    } else if spec.constant > 0 && spec.coefficient == 0.0 {
        usize::try_from(spec.constant).map_err(|_| ResolveError::InvalidParallelismSpec(*spec))
    } else if spec.constant == 0 && spec.coefficient > 0.0 {
        let nodes = inventory
            .node_count()
            .await
            .map_err(ResolveError::ClusterUnavailable)?;
        if nodes == 0 {
            return Err(ResolveError::ClusterUnavailable(anyhow::anyhow!(
                "no nodes found"
            )));
        }

        let workers = (spec.coefficient * nodes as f64).floor().max(1.0);
        Ok(workers as usize)
    } else {
        Err(ResolveError::InvalidParallelismSpec(*spec))
    }
}

/// Computes the number of hashtree shards a pipeline's jobs produce
pub fn resolve_hashtree_count(spec: Option<&HashtreeSpec>) -> Result<i64> {
    match spec {
        None => Ok(1),
        Some(spec) if spec.constant == 0 => Ok(1),
        Some(spec) if spec.constant > 0 => Ok(spec.constant),
        Some(spec) => Err(ResolveError::InvalidHashtreeSpec(*spec)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::StaticInventory;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Inventory that fails every query and counts how often it was asked
    #[derive(Default)]
    struct UnreachableInventory {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ClusterInventory for UnreachableInventory {
        async fn node_count(&self) -> anyhow::Result<usize> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("connection refused")
        }
    }

    fn spec(constant: u64, coefficient: f64) -> ParallelismSpec {
        ParallelismSpec {
            constant,
            coefficient,
        }
    }

    #[tokio::test]
    async fn test_absent_or_zero_spec_is_one_worker() {
        let inventory = StaticInventory(8);
        assert_eq!(resolve_parallelism(None, &inventory).await.unwrap(), 1);
        assert_eq!(
            resolve_parallelism(Some(&spec(0, 0.0)), &inventory)
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_constant_ignores_cluster() {
        let inventory = UnreachableInventory::default();
        let workers = resolve_parallelism(Some(&spec(5, 0.0)), &inventory)
            .await
            .unwrap();

        assert_eq!(workers, 5);
        assert_eq!(inventory.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_coefficient_scales_with_nodes() {
        let half = spec(0, 0.5);
        assert_eq!(
            resolve_parallelism(Some(&half), &StaticInventory(3))
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            resolve_parallelism(Some(&half), &StaticInventory(10))
                .await
                .unwrap(),
            5
        );
        assert_eq!(
            resolve_parallelism(Some(&spec(0, 0.1)), &StaticInventory(2))
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_coefficient_without_cluster() {
        let result = resolve_parallelism(Some(&spec(0, 1.0)), &UnreachableInventory::default()).await;
        match result {
            Err(ResolveError::ClusterUnavailable(source)) => {
                assert_eq!(source.to_string(), "connection refused")
            }
            other => panic!("expected ClusterUnavailable, got {:?}", other),
        }

        let result = resolve_parallelism(Some(&spec(0, 1.0)), &StaticInventory(0)).await;
        assert!(matches!(result, Err(ResolveError::ClusterUnavailable(_))));
    }

    #[tokio::test]
    async fn test_both_fields_set_is_invalid() {
        let result = resolve_parallelism(Some(&spec(2, 0.5)), &StaticInventory(4)).await;
        assert!(matches!(result, Err(ResolveError::InvalidParallelismSpec(_))));

        let result = resolve_parallelism(Some(&spec(0, -1.0)), &StaticInventory(4)).await;
        assert!(matches!(result, Err(ResolveError::InvalidParallelismSpec(_))));
    }

    #[test]
    fn test_hashtree_count() {
        assert_eq!(resolve_hashtree_count(None).unwrap(), 1);
        assert_eq!(
            resolve_hashtree_count(Some(&HashtreeSpec { constant: 0 })).unwrap(),
            1
        );
        assert_eq!(
            resolve_hashtree_count(Some(&HashtreeSpec { constant: 7 })).unwrap(),
            7
        );
        assert!(matches!(
            resolve_hashtree_count(Some(&HashtreeSpec { constant: -2 })),
            Err(ResolveError::InvalidHashtreeSpec(_))
        ));
    }
}
