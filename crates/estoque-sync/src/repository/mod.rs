//! # Entity Repositories
//!
//! Write-through-with-fallback repositories, one per entity kind, plus the
//! cross-entity stock service. Every UI-facing mutation enters here.
//!
//! ## Shared Write Shape
//!
//! 1. validate required fields - a failure aborts with no side effects;
//! 2. gateway available → remote command; a remote failure aborts with no
//!    local mutation (the cache must not diverge from a rejected write);
//! 3. always update the local collection (the cache is the read-of-record);
//! 4. gateway unavailable → enqueue the mutation and report success to the
//!    caller ("accepted, pending delivery").
//!
//! The drain path re-enters through the `apply_remote` methods, which skip
//! validation and cache writes - the cache already reflects every queued
//! mutation from when it was first accepted.

pub mod movement;
pub mod order;
pub mod product;
pub mod stock;

pub use movement::MovementRepository;
pub use order::OrderRepository;
pub use product::ProductRepository;
pub use stock::{PickOutcome, StockDirection, StockService};

use std::sync::Arc;

use estoque_core::{Movement, MutationKind, Order, PendingMutation, Product};
use estoque_store::LocalStore;

use crate::engine::SyncEngine;
use crate::error::SyncResult;
use crate::gateway::RemoteGateway;

// =============================================================================
// Repositories Bundle
// =============================================================================

/// The three entity repositories over one store/gateway/engine triple.
#[derive(Clone)]
pub struct Repositories {
    pub products: ProductRepository,
    pub movements: MovementRepository,
    pub orders: OrderRepository,
}

impl Repositories {
    /// Builds all repositories over shared handles.
    pub fn new(
        store: Arc<LocalStore>,
        gateway: Arc<dyn RemoteGateway>,
        engine: Arc<SyncEngine>,
    ) -> Self {
        Repositories {
            products: ProductRepository::new(store.clone(), gateway.clone(), engine.clone()),
            movements: MovementRepository::new(store.clone(), gateway.clone(), engine.clone()),
            orders: OrderRepository::new(store, gateway, engine),
        }
    }

    /// Dispatches one queued mutation to its owning repository's
    /// remote-apply path. Called by the engine during a drain pass.
    pub(crate) async fn apply_remote(&self, entry: &PendingMutation) -> SyncResult<()> {
        match entry.kind {
            MutationKind::Product => {
                let product: Product = serde_json::from_value(entry.payload.clone())?;
                self.products.apply_remote(&product, entry.is_new).await
            }
            MutationKind::Movement => {
                let movement: Movement = serde_json::from_value(entry.payload.clone())?;
                self.movements.apply_remote(&movement).await
            }
            MutationKind::Order => {
                let order: Order = serde_json::from_value(entry.payload.clone())?;
                self.orders.apply_remote(&order, entry.is_new).await
            }
            MutationKind::DeleteOrder => {
                let id: String = serde_json::from_value(entry.payload.clone())?;
                self.orders.apply_remote_delete(&id).await
            }
        }
    }
}
