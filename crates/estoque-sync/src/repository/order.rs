//! # Order Repository
//!
//! Write-through-with-fallback access to the order collection, plus the bulk
//! import entry point.
//!
//! ## Status Is Derived, Never Trusted
//!
//! Every save recomputes the status from the completion invariant (all items
//! picked AND a shipping channel flagged) instead of persisting whatever the
//! caller supplied - a stale client cannot push an inconsistent status. Every
//! load normalizes the other direction (see [`estoque_core::Order::normalize`]).

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use estoque_core::{import, validation, Order, PendingMutation, Product};
use estoque_store::{CollectionKind, LocalStore};

use crate::engine::SyncEngine;
use crate::error::SyncResult;
use crate::gateway::{Collection, Command, Query, RemoteGateway};
use crate::rows;

/// Repository for order operations.
#[derive(Clone)]
pub struct OrderRepository {
    store: Arc<LocalStore>,
    gateway: Arc<dyn RemoteGateway>,
    engine: Arc<SyncEngine>,
}

impl OrderRepository {
    pub(crate) fn new(
        store: Arc<LocalStore>,
        gateway: Arc<dyn RemoteGateway>,
        engine: Arc<SyncEngine>,
    ) -> Self {
        OrderRepository { store, gateway, engine }
    }

    /// Fetches all orders: remote when available (newest first), the local
    /// cache otherwise. Both paths normalize stale statuses.
    pub async fn fetch_all(&self) -> SyncResult<Vec<Order>> {
        if self.gateway.is_available() {
            match self
                .gateway
                .query(Collection::Orders, Query::order_by("date").descending())
                .await
            {
                Ok(remote_rows) => {
                    return Ok(remote_rows.iter().filter_map(rows::order_from_row).collect())
                }
                Err(error) => {
                    warn!(error = %error, "Remote order read failed, serving local cache")
                }
            }
        }

        let mut orders: Vec<Order> = self.store.read_collection(CollectionKind::Orders).await?;
        for order in &mut orders {
            order.normalize();
        }
        Ok(orders)
    }

    /// Saves an order, write-through with fallback, and returns the order as
    /// persisted (with its derived status).
    ///
    /// `is_new` selects the remote command: upsert for new orders (so a
    /// drain replay of the same id cannot conflict) and a partial update by
    /// identity for edits.
    pub async fn save(&self, order: &Order, is_new: bool) -> SyncResult<Order> {
        validation::validate_order(order)?;

        let mut order = order.clone();
        order.status = order.recomputed_status();

        if self.gateway.is_available() {
            self.push_remote(&order, is_new).await?;
            self.write_local(&order).await?;
            debug!(id = %order.id, number = %order.order_number, is_new, "Order saved remotely");
        } else {
            self.write_local(&order).await?;
            self.engine
                .enqueue(PendingMutation::order(&order, is_new)?)
                .await?;
            info!(id = %order.id, number = %order.order_number, is_new, "Order saved offline and queued");
        }
        Ok(order)
    }

    /// Deletes an order by id, write-through with fallback.
    pub async fn delete(&self, id: &str) -> SyncResult<()> {
        if self.gateway.is_available() {
            self.gateway
                .execute(Collection::Orders, Command::Delete { id: id.to_string() })
                .await?;
            self.remove_local(id).await?;
            debug!(id = %id, "Order deleted remotely");
        } else {
            self.remove_local(id).await?;
            self.engine.enqueue(PendingMutation::delete_order(id)).await?;
            info!(id = %id, "Order deleted offline and queued");
        }
        Ok(())
    }

    /// Bulk import from the semicolon-delimited order sheet.
    ///
    /// Each aggregated order goes through the normal [`save`](Self::save)
    /// path as new - which is exactly what queues them while offline.
    /// Returns the number of imported orders.
    pub async fn import(&self, text: &str) -> SyncResult<usize> {
        let products: Vec<Product> = self.store.read_collection(CollectionKind::Products).await?;
        let today = Utc::now().date_naive();
        let orders = import::parse_orders(text, &products, today);

        for order in &orders {
            self.save(order, true).await?;
        }

        info!(count = orders.len(), "Orders imported");
        Ok(orders.len())
    }

    /// Drain path: remote command only.
    pub(crate) async fn apply_remote(&self, order: &Order, is_new: bool) -> SyncResult<()> {
        self.push_remote(order, is_new).await
    }

    /// Drain path for deletions.
    pub(crate) async fn apply_remote_delete(&self, id: &str) -> SyncResult<()> {
        self.gateway
            .execute(Collection::Orders, Command::Delete { id: id.to_string() })
            .await?;
        Ok(())
    }

    async fn push_remote(&self, order: &Order, is_new: bool) -> SyncResult<()> {
        let command = if is_new {
            Command::Upsert(rows::order_to_row(order, true))
        } else {
            Command::Update {
                id: order.id.clone(),
                fields: rows::order_to_row(order, false),
            }
        };
        self.gateway.execute(Collection::Orders, command).await?;
        Ok(())
    }

    /// Merge by identity when cached, otherwise prepend.
    async fn write_local(&self, order: &Order) -> SyncResult<()> {
        let mut orders: Vec<Order> = self.store.read_collection(CollectionKind::Orders).await?;
        match orders.iter().position(|o| o.id == order.id) {
            Some(index) => orders[index] = order.clone(),
            None => orders.insert(0, order.clone()),
        }
        self.store.write_collection(CollectionKind::Orders, &orders).await?;
        Ok(())
    }

    async fn remove_local(&self, id: &str) -> SyncResult<()> {
        let mut orders: Vec<Order> = self.store.read_collection(CollectionKind::Orders).await?;
        orders.retain(|o| o.id != id);
        self.store.write_collection(CollectionKind::Orders, &orders).await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
