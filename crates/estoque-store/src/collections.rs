//! # Keyed Collections & Pending Queue
//!
//! Access to the four persisted lists. Each collection is a single JSON
//! document under its own key; writers replace the whole value.
//!
//! ## Persisted Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     collections table                                   │
//! │                                                                         │
//! │  key               │ value                                              │
//! │  ──────────────────┼─────────────────────────────────────────────────── │
//! │  stock_products    │ [{"id":"789101","name":"Caneta Azul","qty":10},…]  │
//! │  stock_movements   │ [{"id":1716671999123,"qty":-3,…},…]                │
//! │  stock_orders      │ [{"id":"<uuid>","order_number":"101",…},…]         │
//! │  stock_sync_queue  │ [{"kind":"ORDER","payload":{…},…},…]               │
//! │                                                                         │
//! │  An ABSENT key reads as an empty collection. The queue key is          │
//! │  REMOVED (not set to []) after a fully successful drain - "no pending  │
//! │  work" stays distinguishable from "queue check not yet run".           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use estoque_core::PendingMutation;

use crate::error::StoreResult;
use crate::pool::LocalStore;

/// Key of the pending-mutation queue.
const QUEUE_KEY: &str = "stock_sync_queue";

// =============================================================================
// Collection Kind
// =============================================================================

/// The three entity collections (the queue is addressed separately).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Products,
    Movements,
    Orders,
}

impl CollectionKind {
    /// Storage key for this collection. The `stock_` prefix is kept from the
    /// original deployments so existing local data migrates as-is.
    pub fn key(&self) -> &'static str {
        match self {
            CollectionKind::Products => "stock_products",
            CollectionKind::Movements => "stock_movements",
            CollectionKind::Orders => "stock_orders",
        }
    }
}

// =============================================================================
// Raw Key Access
// =============================================================================

impl LocalStore {
    async fn read_value(&self, key: &str) -> StoreResult<Option<String>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM collections WHERE key = ?1")
                .bind(key)
                .fetch_optional(self.pool())
                .await?;
        Ok(value)
    }

    async fn write_value(&self, key: &str, value: &str) -> StoreResult<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO collections (key, value, updated_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(now)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn remove_value(&self, key: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM collections WHERE key = ?1")
            .bind(key)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    // =========================================================================
    // Entity Collections
    // =========================================================================

    /// Reads a whole collection. An absent key is an empty collection.
    pub async fn read_collection<T: DeserializeOwned>(
        &self,
        kind: CollectionKind,
    ) -> StoreResult<Vec<T>> {
        match self.read_value(kind.key()).await? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    /// Replaces a whole collection. No merging - callers pass the complete
    /// desired sequence.
    pub async fn write_collection<T: Serialize>(
        &self,
        kind: CollectionKind,
        items: &[T],
    ) -> StoreResult<()> {
        debug!(key = kind.key(), count = items.len(), "Writing collection");
        let json = serde_json::to_string(items)?;
        self.write_value(kind.key(), &json).await
    }

    /// Removes a collection entirely (history clearing).
    pub async fn clear_collection(&self, kind: CollectionKind) -> StoreResult<()> {
        debug!(key = kind.key(), "Clearing collection");
        self.remove_value(kind.key()).await
    }

    // =========================================================================
    // Pending Queue
    // =========================================================================

    /// Reads the pending-mutation queue in enqueue order.
    pub async fn read_queue(&self) -> StoreResult<Vec<PendingMutation>> {
        match self.read_value(QUEUE_KEY).await? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    /// Replaces the pending-mutation queue.
    pub async fn write_queue(&self, queue: &[PendingMutation]) -> StoreResult<()> {
        debug!(count = queue.len(), "Writing pending queue");
        let json = serde_json::to_string(queue)?;
        self.write_value(QUEUE_KEY, &json).await
    }

    /// Removes the queue key entirely.
    ///
    /// Removal, not an empty list: "no pending work" stays distinguishable
    /// from "a drain has not run yet".
    pub async fn clear_queue(&self) -> StoreResult<()> {
        debug!("Clearing pending queue");
        self.remove_value(QUEUE_KEY).await
    }

    /// Number of queued mutations (0 when the key is absent).
    pub async fn pending_count(&self) -> StoreResult<usize> {
        Ok(self.read_queue().await?.len())
    }

    /// Whether the queue key is present at all.
    pub async fn queue_key_present(&self) -> StoreResult<bool> {
        Ok(self.read_value(QUEUE_KEY).await?.is_some())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::StoreConfig;
    use estoque_core::Product;

    async fn store() -> LocalStore {
        LocalStore::new(StoreConfig::in_memory()).await.unwrap()
    }

    fn product(id: &str, qty: i64) -> Product {
        Product {
            id: id.into(),
            name: format!("Produto {}", id),
            qty,
        }
    }

    #[tokio::test]
    async fn test_absent_key_reads_as_empty() {
        let store = store().await;
        let products: Vec<Product> = store.read_collection(CollectionKind::Products).await.unwrap();
        assert!(products.is_empty());
        assert_eq!(store.pending_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_write_is_full_replace() {
        let store = store().await;
        store
            .write_collection(CollectionKind::Products, &[product("A1", 10), product("B2", 3)])
            .await
            .unwrap();
        store
            .write_collection(CollectionKind::Products, &[product("C3", 1)])
            .await
            .unwrap();

        let products: Vec<Product> = store.read_collection(CollectionKind::Products).await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, "C3");
    }

    #[tokio::test]
    async fn test_queue_round_trip_preserves_order() {
        let store = store().await;
        let entries = vec![
            PendingMutation::product(&product("A1", 10), true).unwrap(),
            PendingMutation::delete_order("some-uuid"),
        ];
        store.write_queue(&entries).await.unwrap();

        let read = store.read_queue().await.unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read[0].id, "A1");
        assert_eq!(read[1].id, "some-uuid");
        assert_eq!(store.pending_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_clear_queue_removes_the_key() {
        let store = store().await;
        store
            .write_queue(&[PendingMutation::delete_order("x")])
            .await
            .unwrap();
        assert!(store.queue_key_present().await.unwrap());

        store.clear_queue().await.unwrap();
        assert!(!store.queue_key_present().await.unwrap());
        assert_eq!(store.pending_count().await.unwrap(), 0);

        // an explicitly-written empty list keeps the key
        store.write_queue(&[]).await.unwrap();
        assert!(store.queue_key_present().await.unwrap());
    }

    #[tokio::test]
    async fn test_clear_collection() {
        let store = store().await;
        store
            .write_collection(CollectionKind::Movements, &[product("A1", 1)])
            .await
            .unwrap();
        store.clear_collection(CollectionKind::Movements).await.unwrap();
        let rows: Vec<Product> = store.read_collection(CollectionKind::Movements).await.unwrap();
        assert!(rows.is_empty());
    }
}
