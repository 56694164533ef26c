//! # Movement Repository
//!
//! Append-only history rows. Movements are only ever inserted (never
//! updated) and only bulk-deleted when the operator clears the history.
//!
//! The operator tag travels inside the note on the wire - encoding happens
//! in [`crate::rows`], symmetric decode on every read.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use tracing::{debug, info, warn};

use estoque_core::{Movement, PendingMutation, MOVEMENT_FETCH_LIMIT};
use estoque_store::{CollectionKind, LocalStore};

use crate::engine::SyncEngine;
use crate::error::SyncResult;
use crate::gateway::{Collection, Command, Query, RemoteGateway};
use crate::rows;

/// Repository for movement (history) operations.
#[derive(Clone)]
pub struct MovementRepository {
    store: Arc<LocalStore>,
    gateway: Arc<dyn RemoteGateway>,
    engine: Arc<SyncEngine>,
}

impl MovementRepository {
    pub(crate) fn new(
        store: Arc<LocalStore>,
        gateway: Arc<dyn RemoteGateway>,
        engine: Arc<SyncEngine>,
    ) -> Self {
        MovementRepository { store, gateway, engine }
    }

    /// Fetches recent history: remote when available (newest first, capped
    /// at [`MOVEMENT_FETCH_LIMIT`] rows), the local cache otherwise.
    pub async fn fetch_all(&self) -> SyncResult<Vec<Movement>> {
        if self.gateway.is_available() {
            let query = Query::order_by("created_at")
                .descending()
                .limit(MOVEMENT_FETCH_LIMIT);
            match self.gateway.query(Collection::Movements, query).await {
                Ok(remote_rows) => {
                    return Ok(remote_rows.iter().filter_map(rows::movement_from_row).collect())
                }
                Err(error) => {
                    warn!(error = %error, "Remote history read failed, serving local cache")
                }
            }
        }
        Ok(self.store.read_collection(CollectionKind::Movements).await?)
    }

    /// Appends one movement, write-through with fallback.
    pub async fn save(&self, movement: &Movement) -> SyncResult<()> {
        if self.gateway.is_available() {
            self.push_remote(movement).await?;
            self.write_local(movement).await?;
            debug!(id = movement.id, qty = movement.qty, "Movement saved remotely");
        } else {
            self.write_local(movement).await?;
            self.engine
                .enqueue(PendingMutation::movement(movement)?)
                .await?;
            info!(id = movement.id, qty = movement.qty, "Movement saved offline and queued");
        }
        Ok(())
    }

    /// Drain path: remote insert only.
    pub(crate) async fn apply_remote(&self, movement: &Movement) -> SyncResult<()> {
        self.push_remote(movement).await
    }

    /// Clears the movement history.
    ///
    /// While available this purges the remote collection (everything at or
    /// below a far-future date ceiling) and then the local one. While
    /// offline only the local collection is cleared - a history wipe is
    /// deliberately never queued for replay.
    pub async fn clear_history(&self) -> SyncResult<()> {
        if self.gateway.is_available() {
            let ceiling = Utc
                .with_ymd_and_hms(3000, 1, 1, 0, 0, 0)
                .single()
                .expect("static ceiling date is valid");
            self.gateway.purge(Collection::Movements, ceiling).await?;
            info!("Remote movement history purged");
        }
        self.store.clear_collection(CollectionKind::Movements).await?;
        Ok(())
    }

    async fn push_remote(&self, movement: &Movement) -> SyncResult<()> {
        let row = rows::movement_to_row(movement);
        self.gateway
            .execute(Collection::Movements, Command::Insert(row))
            .await?;
        Ok(())
    }

    /// History is newest-first in the cache: prepend.
    async fn write_local(&self, movement: &Movement) -> SyncResult<()> {
        let mut movements: Vec<Movement> =
            self.store.read_collection(CollectionKind::Movements).await?;
        movements.insert(0, movement.clone());
        self.store
            .write_collection(CollectionKind::Movements, &movements)
            .await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::Repositories;
    use crate::testing::{memory_store, MockGateway};

    async fn repos_with(gateway: Arc<MockGateway>) -> (Repositories, Arc<LocalStore>) {
        let store = memory_store().await;
        let engine = Arc::new(SyncEngine::new(
            store.clone(),
            gateway.clone() as Arc<dyn RemoteGateway>,
        ));
        (Repositories::new(store.clone(), gateway, engine), store)
    }

    fn outbound(id: &str, qty: i64) -> Movement {
        Movement::record(
            Some(id.into()),
            format!("Produto {}", id),
            qty,
            Some("Retirada".into()),
            Some("007".into()),
        )
    }

    #[tokio::test]
    async fn test_offline_save_queues_and_prepends() {
        let gateway = MockGateway::offline();
        let (repos, store) = repos_with(gateway).await;

        repos.movements.save(&outbound("A1", -3)).await.unwrap();
        repos.movements.save(&outbound("B2", 2)).await.unwrap();

        let cached: Vec<Movement> = store.read_collection(CollectionKind::Movements).await.unwrap();
        assert_eq!(cached[0].prod_id.as_deref(), Some("B2")); // newest first
        assert_eq!(store.pending_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_online_save_encodes_operator_tag_on_wire() {
        let gateway = MockGateway::online();
        let (repos, _store) = repos_with(gateway.clone()).await;

        repos.movements.save(&outbound("A1", -3)).await.unwrap();

        let rows = gateway.rows(Collection::Movements);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["obs"], "[Mat: 007] Retirada");
        assert_eq!(rows[0]["qty"], -3);
    }

    #[tokio::test]
    async fn test_clear_history_online_purges_both_sides() {
        let gateway = MockGateway::online();
        let (repos, store) = repos_with(gateway.clone()).await;

        repos.movements.save(&outbound("A1", -1)).await.unwrap();
        repos.movements.clear_history().await.unwrap();

        assert!(gateway.rows(Collection::Movements).is_empty());
        let cached: Vec<Movement> = store.read_collection(CollectionKind::Movements).await.unwrap();
        assert!(cached.is_empty());
    }

    #[tokio::test]
    async fn test_clear_history_offline_is_local_only_and_not_queued() {
        let gateway = MockGateway::offline();
        let (repos, store) = repos_with(gateway).await;

        repos.movements.save(&outbound("A1", -1)).await.unwrap();
        let queued_before = store.pending_count().await.unwrap();

        repos.movements.clear_history().await.unwrap();

        let cached: Vec<Movement> = store.read_collection(CollectionKind::Movements).await.unwrap();
        assert!(cached.is_empty());
        // the wipe itself queued nothing
        assert_eq!(store.pending_count().await.unwrap(), queued_before);
    }
}
