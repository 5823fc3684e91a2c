//! Per-deployment locks
//!
//! Callbacks for the same deployment update a step and then recompute the
//! deployment status from all steps. Holding the deployment's lock across
//! both keeps concurrent callbacks from interleaving.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OwnedMutexGuard;

/// Registry of async mutexes keyed by deployment id
#[derive(Debug, Default)]
pub struct DeploymentLocks {
    locks: Mutex<HashMap<i64, Arc<tokio::sync::Mutex<()>>>>,
}

impl DeploymentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to a deployment
    pub async fn lock(&self, deployment_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Drop entries nobody holds or waits on
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(deployment_id).or_default())
        };

        lock.lock_owned().await
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_deployment_is_exclusive() {
        let locks = DeploymentLocks::new();
        let guard = locks.lock(1).await;

        let second = tokio::time::timeout(Duration::from_millis(50), locks.lock(1)).await;
        assert!(second.is_err());

        drop(guard);
        let second = tokio::time::timeout(Duration::from_millis(50), locks.lock(1)).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_different_deployments_do_not_block() {
        let locks = DeploymentLocks::new();
        let _first = locks.lock(1).await;

        let other = tokio::time::timeout(Duration::from_millis(50), locks.lock(2)).await;
        assert!(other.is_ok());
    }

    #[tokio::test]
    async fn test_idle_entries_are_pruned() {
        let locks = DeploymentLocks::new();
        for id in 0..10 {
            let _guard = locks.lock(id).await;
        }

        let _guard = locks.lock(100).await;
        assert_eq!(locks.len(), 1);
    }
}
