//! # Sync Engine
//!
//! Owns the pending-mutation queue's lifecycle: enqueue on remote
//! unavailability, drain on reconnect, partial-failure bookkeeping, and the
//! non-reentrant draining guard.
//!
//! ## Drain Pass
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        One Drain Pass                                   │
//! │                                                                         │
//! │  queue: [P1, M1, O1, O2, D1]     (snapshot, enqueue order)             │
//! │             │                                                           │
//! │             ▼ dispatch each to its repository's remote-apply path       │
//! │  P1 ✓   M1 ✗   O1 ✓   O2 ✗   D1 ✓                                      │
//! │             │                                                           │
//! │             ▼ NO head-of-line blocking: M1's failure never stops O1     │
//! │  queue after: [M1, O2]           (failed items, original order)        │
//! │                                                                         │
//! │  all ✓ → queue KEY REMOVED (explicit "no pending work" signal,          │
//! │          distinguishable from "queue check not yet run")               │
//! │                                                                         │
//! │  returns Completed { synced: 3, failed: 2 } for aggregate reporting     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Failures during a drain are usually data-specific, not connectivity-wide,
//! so a mixed batch keeps flowing; whatever failed is retried on the next
//! pass. Replay bypasses local-cache writes entirely - the cache already
//! reflects every queued mutation from when it was first accepted.
//!
//! ## Concurrency
//!
//! State machine `Idle → Draining → Idle`, guarded by an atomic flag:
//! re-entrant drain requests are ignored so the same item can never be
//! submitted twice by overlapping passes. The queue rewrite at the end of a
//! pass assumes the system's single-logical-writer model (no enqueue
//! interleaves with an active drain).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use estoque_core::PendingMutation;
use estoque_store::LocalStore;

use crate::error::SyncResult;
use crate::gateway::RemoteGateway;
use crate::repository::Repositories;

// =============================================================================
// Drain Outcome
// =============================================================================

/// Result of a drain request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Gateway unavailable - nothing attempted.
    Offline,

    /// Queue was empty - nothing to do.
    Empty,

    /// Another drain pass is active; this request was ignored.
    AlreadyDraining,

    /// A full pass ran. `synced` items left the queue, `failed` items
    /// remain in their original relative order.
    Completed { synced: usize, failed: usize },
}

// =============================================================================
// Sync Engine
// =============================================================================

/// Owner of the pending-mutation queue.
pub struct SyncEngine {
    /// Queue persistence.
    store: Arc<LocalStore>,

    /// Availability source for the drain entry condition.
    gateway: Arc<dyn RemoteGateway>,

    /// Non-reentrant drain guard.
    draining: AtomicBool,
}

impl SyncEngine {
    /// Creates a new engine over the given store and gateway.
    pub fn new(store: Arc<LocalStore>, gateway: Arc<dyn RemoteGateway>) -> Self {
        SyncEngine {
            store,
            gateway,
            draining: AtomicBool::new(false),
        }
    }

    /// Appends a mutation to the persisted queue.
    ///
    /// Called by repositories only when the gateway is unavailable - a
    /// remote error while available is a data problem and is surfaced to
    /// the caller instead of being deferred here.
    pub async fn enqueue(&self, mutation: PendingMutation) -> SyncResult<()> {
        let mut queue = self.store.read_queue().await?;
        queue.push(mutation);
        self.store.write_queue(&queue).await?;
        debug!(pending = queue.len(), "Mutation queued for replay");
        Ok(())
    }

    /// Number of mutations waiting for replay.
    pub async fn pending_count(&self) -> SyncResult<usize> {
        Ok(self.store.pending_count().await?)
    }

    /// Runs one drain pass if the entry conditions hold.
    ///
    /// Entry conditions: gateway available, queue non-empty, no pass already
    /// active. Each queued item is dispatched in original enqueue order;
    /// afterwards the queue holds exactly the failed items (or the key is
    /// removed when everything succeeded).
    pub async fn drain(&self, repos: &Repositories) -> SyncResult<DrainOutcome> {
        if !self.gateway.is_available() {
            return Ok(DrainOutcome::Offline);
        }

        if self
            .draining
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Drain already in progress, ignoring request");
            return Ok(DrainOutcome::AlreadyDraining);
        }

        let result = self.drain_snapshot(repos).await;
        self.draining.store(false, Ordering::SeqCst);
        result
    }

    async fn drain_snapshot(&self, repos: &Repositories) -> SyncResult<DrainOutcome> {
        let snapshot = self.store.read_queue().await?;
        if snapshot.is_empty() {
            return Ok(DrainOutcome::Empty);
        }

        info!(count = snapshot.len(), "Draining pending queue");

        let mut synced = 0usize;
        let mut failed: Vec<PendingMutation> = Vec::new();

        for entry in snapshot {
            match repos.apply_remote(&entry).await {
                Ok(()) => {
                    debug!(id = %entry.id, kind = ?entry.kind, "Pending mutation applied");
                    synced += 1;
                }
                Err(error) => {
                    warn!(
                        id = %entry.id,
                        kind = ?entry.kind,
                        error = %error,
                        "Pending mutation failed, keeping in queue"
                    );
                    failed.push(entry);
                }
            }
        }

        let failed_count = failed.len();
        if failed.is_empty() {
            self.store.clear_queue().await?;
        } else {
            self.store.write_queue(&failed).await?;
        }

        info!(synced, failed = failed_count, "Drain pass complete");
        Ok(DrainOutcome::Completed {
            synced,
            failed: failed_count,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::Collection;
    use crate::repository::Repositories;
    use crate::testing::{memory_store, MockGateway};
    use estoque_core::Product;
    use std::time::Duration;

    fn product(id: &str, qty: i64) -> Product {
        Product {
            id: id.into(),
            name: format!("Produto {}", id),
            qty,
        }
    }

    async fn engine_with(
        gateway: Arc<MockGateway>,
    ) -> (Arc<SyncEngine>, Repositories, Arc<LocalStore>) {
        let store = memory_store().await;
        let engine = Arc::new(SyncEngine::new(
            store.clone(),
            gateway.clone() as Arc<dyn RemoteGateway>,
        ));
        let repos = Repositories::new(store.clone(), gateway, engine.clone());
        (engine, repos, store)
    }

    #[tokio::test]
    async fn test_drain_while_offline_does_nothing() {
        let gateway = MockGateway::offline();
        let (engine, repos, _store) = engine_with(gateway.clone()).await;

        engine
            .enqueue(PendingMutation::product(&product("A1", 1), true).unwrap())
            .await
            .unwrap();

        assert_eq!(engine.drain(&repos).await.unwrap(), DrainOutcome::Offline);
        assert_eq!(engine.pending_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_drain_empty_queue() {
        let gateway = MockGateway::online();
        let (engine, repos, _store) = engine_with(gateway).await;
        assert_eq!(engine.drain(&repos).await.unwrap(), DrainOutcome::Empty);
    }

    #[tokio::test]
    async fn test_full_success_removes_queue_key() {
        let gateway = MockGateway::online();
        let (engine, repos, store) = engine_with(gateway.clone()).await;

        engine
            .enqueue(PendingMutation::product(&product("A1", 1), true).unwrap())
            .await
            .unwrap();
        engine
            .enqueue(PendingMutation::product(&product("B2", 2), false).unwrap())
            .await
            .unwrap();

        let outcome = engine.drain(&repos).await.unwrap();
        assert_eq!(outcome, DrainOutcome::Completed { synced: 2, failed: 0 });

        // key removed, not set to []
        assert!(!store.queue_key_present().await.unwrap());
        assert_eq!(gateway.rows(Collection::Products).len(), 2);
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_failed_items_in_order() {
        let gateway = MockGateway::online();
        let (engine, repos, store) = engine_with(gateway.clone()).await;

        // m = 4 items, two of which will fail
        for (id, fails) in [("A1", false), ("B2", true), ("C3", false), ("D4", true)] {
            if fails {
                gateway.fail_id(id);
            }
            engine
                .enqueue(PendingMutation::product(&product(id, 1), true).unwrap())
                .await
                .unwrap();
        }

        let outcome = engine.drain(&repos).await.unwrap();
        assert_eq!(outcome, DrainOutcome::Completed { synced: 2, failed: 2 });

        let remaining = store.read_queue().await.unwrap();
        let ids: Vec<_> = remaining.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["B2", "D4"]); // original relative order

        // next pass, failures cleared: queue fully drains
        gateway.clear_failures();
        let outcome = engine.drain(&repos).await.unwrap();
        assert_eq!(outcome, DrainOutcome::Completed { synced: 2, failed: 0 });
        assert!(!store.queue_key_present().await.unwrap());
    }

    #[tokio::test]
    async fn test_reentrant_drain_is_ignored() {
        let gateway = MockGateway::online();
        let (engine, repos, _store) = engine_with(gateway.clone()).await;

        engine
            .enqueue(PendingMutation::product(&product("A1", 1), true).unwrap())
            .await
            .unwrap();

        // hold the first pass mid-item
        let gate = gateway.hold_executes();

        let engine_bg = engine.clone();
        let repos_bg = repos.clone();
        let first = tokio::spawn(async move { engine_bg.drain(&repos_bg).await });

        // give the first pass time to take the guard
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(
            engine.drain(&repos).await.unwrap(),
            DrainOutcome::AlreadyDraining
        );

        // release and let the first pass finish
        gate.add_permits(10);
        let outcome = first.await.unwrap().unwrap();
        assert_eq!(outcome, DrainOutcome::Completed { synced: 1, failed: 0 });

        // guard released: draining again is possible
        assert_eq!(engine.drain(&repos).await.unwrap(), DrainOutcome::Empty);
    }
}
