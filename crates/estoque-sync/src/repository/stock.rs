//! # Stock Service
//!
//! Cross-entity domain rules: stock transactions, order picking, and the
//! shipping toggle. Each operation composes the entity repositories so
//! every write still follows the write-through-with-fallback shape.
//!
//! ## Known Limitation: Two Writes, No Transaction
//!
//! A stock transaction is a Product update followed by a Movement insert -
//! two separate write-through calls. If the second fails after the first
//! succeeded, stock reflects the change but the history does not. There is
//! no cross-entity transaction in the data model to lean on; callers see
//! the error and the gap is visible in the history rather than silently
//! masked. (See DESIGN.md for the recorded decision.)

use estoque_core::{validation, CoreError, Movement, Order, OrderStatus, Product, ShippingMethod};

use crate::error::SyncResult;
use crate::repository::movement::MovementRepository;
use crate::repository::order::OrderRepository;
use crate::repository::product::ProductRepository;

// =============================================================================
// Inputs & Outcomes
// =============================================================================

/// Direction of a stock transaction. The delta sign derives from this:
/// outbound is negative, inbound positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDirection {
    /// Units entering stock.
    Inbound,
    /// Units leaving stock.
    Outbound,
}

/// Result of a pick action.
#[derive(Debug, Clone, PartialEq)]
pub enum PickOutcome {
    /// One unit was picked; the updated order is returned.
    Picked(Order),
    /// The line was already fully picked - informational no-op, not an
    /// error. Nothing was written.
    AlreadyPicked,
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// =============================================================================
// Stock Service
// =============================================================================

/// Stock transactions, picking, and shipping toggles over the repositories.
#[derive(Clone)]
pub struct StockService {
    products: ProductRepository,
    movements: MovementRepository,
    orders: OrderRepository,
}

impl StockService {
    pub(crate) fn new(
        products: ProductRepository,
        movements: MovementRepository,
        orders: OrderRepository,
    ) -> Self {
        StockService {
            products,
            movements,
            orders,
        }
    }

    /// Records a stock transaction: updates the product and appends the
    /// matching history row.
    ///
    /// ## Rules
    /// - `qty` must be positive; the direction carries the sign
    /// - the operator identifier is mandatory
    /// - outbound is rejected with `InsufficientStock` when
    ///   `qty > product.qty`, and nothing is written
    ///
    /// Returns the created movement.
    pub async fn record_transaction(
        &self,
        product: &Product,
        direction: StockDirection,
        qty: i64,
        matricula: &str,
        obs: Option<&str>,
    ) -> SyncResult<Movement> {
        validation::validate_transaction(qty, matricula)?;

        let delta = match direction {
            StockDirection::Outbound => -qty,
            StockDirection::Inbound => qty,
        };

        if direction == StockDirection::Outbound && !product.can_remove(qty) {
            return Err(CoreError::InsufficientStock {
                id: product.id.clone(),
                available: product.qty,
                requested: qty,
            }
            .into());
        }

        let updated = Product {
            qty: product.qty + delta,
            ..product.clone()
        };
        self.products.save(&updated, false).await?;

        // Second write of the pair; not atomic with the first.
        let movement = Movement::record(
            Some(product.id.clone()),
            product.name.clone(),
            delta,
            obs.and_then(non_empty),
            non_empty(matricula),
        );
        self.movements.save(&movement).await?;

        Ok(movement)
    }

    /// Picks one unit of `product_id` off the shelf for `order`.
    ///
    /// ## Rules
    /// - the product must belong to the order
    /// - an already fully picked line is a no-op ([`PickOutcome::AlreadyPicked`])
    /// - the product must exist in the cache and have stock left
    ///
    /// On success: stock down 1, a `-1` history row tagged with the order
    /// number, `qty_picked` up 1, order saved (status recomputed).
    pub async fn pick_item(&self, order: &Order, product_id: &str) -> SyncResult<PickOutcome> {
        let Some(item) = order.items.iter().find(|i| i.product_id == product_id) else {
            return Err(CoreError::ItemNotInOrder {
                order_number: order.order_number.clone(),
                product_id: product_id.to_string(),
            }
            .into());
        };
        if item.is_fully_picked() {
            return Ok(PickOutcome::AlreadyPicked);
        }

        let Some(product) = self.products.get_local(product_id).await? else {
            return Err(CoreError::ProductNotFound(product_id.to_string()).into());
        };
        if product.qty <= 0 {
            return Err(CoreError::OutOfStock(product_id.to_string()).into());
        }

        // 1. one unit off the shelf
        let updated = Product {
            qty: product.qty - 1,
            ..product.clone()
        };
        self.products.save(&updated, false).await?;

        // 2. the matching history row
        let movement = Movement::record(
            Some(item.product_id.clone()),
            item.product_name.clone(),
            -1,
            Some(format!("Separação Pedido #{}", order.order_number)),
            non_empty(&order.matricula),
        );
        self.movements.save(&movement).await?;

        // 3. the order line
        let mut updated_order = order.clone();
        for line in &mut updated_order.items {
            if line.product_id == product_id {
                line.qty_picked += 1;
            }
        }
        let saved = self.orders.save(&updated_order, false).await?;

        Ok(PickOutcome::Picked(saved))
    }

    /// Flips one shipping flag and saves the order with its recomputed
    /// status. On the pending→completed transition a system movement is
    /// appended recording the shipment.
    pub async fn toggle_shipping(
        &self,
        order: &Order,
        method: ShippingMethod,
    ) -> SyncResult<Order> {
        let mut updated = order.clone();
        match method {
            ShippingMethod::Malote => updated.envio_malote = !updated.envio_malote,
            ShippingMethod::Matriz => updated.entrega_matriz = !updated.entrega_matriz,
        }

        let was_completed = order.status == OrderStatus::Completed;
        let saved = self.orders.save(&updated, false).await?;

        if saved.status == OrderStatus::Completed && !was_completed {
            let channel = if saved.envio_malote {
                ShippingMethod::Malote.label()
            } else {
                ShippingMethod::Matriz.label()
            };
            let movement = Movement::record(
                None,
                format!("Envio Pedido #{}", saved.order_number),
                0,
                Some(format!(
                    "Pedido Concluído. Via: {}. Filial: {}",
                    channel, saved.filial
                )),
                non_empty(&saved.matricula),
            );
            self.movements.save(&movement).await?;
        }

        Ok(saved)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SyncEngine;
    use crate::gateway::RemoteGateway;
    use crate::repository::Repositories;
    use crate::testing::{memory_store, MockGateway};
    use estoque_core::OrderItem;
    use estoque_store::{CollectionKind, LocalStore};
    use chrono::NaiveDate;
    use std::sync::Arc;

    async fn service_with(
        gateway: Arc<MockGateway>,
    ) -> (StockService, Repositories, Arc<LocalStore>) {
        let store = memory_store().await;
        let engine = Arc::new(SyncEngine::new(
            store.clone(),
            gateway.clone() as Arc<dyn RemoteGateway>,
        ));
        let repos = Repositories::new(store.clone(), gateway, engine);
        let service = StockService::new(
            repos.products.clone(),
            repos.movements.clone(),
            repos.orders.clone(),
        );
        (service, repos, store)
    }

    fn product(id: &str, qty: i64) -> Product {
        Product {
            id: id.into(),
            name: format!("Produto {}", id),
            qty,
        }
    }

    fn picking_order(product_id: &str, requested: i64, picked: i64) -> Order {
        let mut order = Order::new("101", "João", NaiveDate::from_ymd_opt(2023, 10, 25).unwrap());
        order.matricula = "007".into();
        order.filial = "01".into();
        order.items.push(OrderItem {
            product_id: product_id.into(),
            product_name: format!("Produto {}", product_id),
            qty_requested: requested,
            qty_picked: picked,
        });
        order
    }

    #[tokio::test]
    async fn test_outbound_transaction_updates_stock_and_history() {
        let gateway = MockGateway::offline();
        let (service, repos, _store) = service_with(gateway).await;

        // Product {id: "A1", qty: 10}; outbound 3 with operator "007"
        let a1 = product("A1", 10);
        repos.products.save(&a1, true).await.unwrap();

        let movement = service
            .record_transaction(&a1, StockDirection::Outbound, 3, "007", None)
            .await
            .unwrap();

        let updated = repos.products.get_local("A1").await.unwrap().unwrap();
        assert_eq!(updated.qty, 7);
        assert_eq!(movement.prod_id.as_deref(), Some("A1"));
        assert_eq!(movement.qty, -3);
        assert_eq!(movement.matricula.as_deref(), Some("007"));
    }

    #[tokio::test]
    async fn test_insufficient_stock_writes_nothing() {
        let gateway = MockGateway::offline();
        let (service, repos, store) = service_with(gateway).await;

        let a1 = product("A1", 2);
        repos.products.save(&a1, true).await.unwrap();
        let queued_before = store.pending_count().await.unwrap();

        let err = service
            .record_transaction(&a1, StockDirection::Outbound, 3, "007", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::SyncError::Domain(CoreError::InsufficientStock { available: 2, requested: 3, .. })
        ));

        // no product mutation, no movement, nothing queued
        assert_eq!(repos.products.get_local("A1").await.unwrap().unwrap().qty, 2);
        let movements: Vec<Movement> =
            store.read_collection(CollectionKind::Movements).await.unwrap();
        assert!(movements.is_empty());
        assert_eq!(store.pending_count().await.unwrap(), queued_before);
    }

    #[tokio::test]
    async fn test_inbound_transaction_adds_stock() {
        let gateway = MockGateway::offline();
        let (service, repos, _store) = service_with(gateway).await;

        let a1 = product("A1", 10);
        repos.products.save(&a1, true).await.unwrap();

        let movement = service
            .record_transaction(&a1, StockDirection::Inbound, 5, "007", Some("Reposição"))
            .await
            .unwrap();

        assert_eq!(repos.products.get_local("A1").await.unwrap().unwrap().qty, 15);
        assert_eq!(movement.qty, 5);
        assert_eq!(movement.obs.as_deref(), Some("Reposição"));
    }

    #[tokio::test]
    async fn test_transaction_requires_operator() {
        let gateway = MockGateway::offline();
        let (service, repos, _store) = service_with(gateway).await;
        let a1 = product("A1", 10);
        repos.products.save(&a1, true).await.unwrap();

        let err = service
            .record_transaction(&a1, StockDirection::Outbound, 1, "  ", None)
            .await
            .unwrap_err();
        assert!(err.is_domain());
    }

    #[tokio::test]
    async fn test_pick_decrements_stock_and_increments_picked() {
        let gateway = MockGateway::offline();
        let (service, repos, store) = service_with(gateway).await;

        repos.products.save(&product("789101", 4), true).await.unwrap();
        let order = repos
            .orders
            .save(&picking_order("789101", 2, 0), true)
            .await
            .unwrap();

        let outcome = service.pick_item(&order, "789101").await.unwrap();
        let PickOutcome::Picked(updated) = outcome else {
            panic!("expected a pick");
        };

        assert_eq!(updated.items[0].qty_picked, 1);
        assert_eq!(repos.products.get_local("789101").await.unwrap().unwrap().qty, 3);

        let movements: Vec<Movement> =
            store.read_collection(CollectionKind::Movements).await.unwrap();
        assert_eq!(movements[0].qty, -1);
        assert_eq!(movements[0].obs.as_deref(), Some("Separação Pedido #101"));
        assert_eq!(movements[0].matricula.as_deref(), Some("007"));
    }

    #[tokio::test]
    async fn test_pick_fully_picked_line_is_informational_noop() {
        let gateway = MockGateway::offline();
        let (service, repos, store) = service_with(gateway).await;

        repos.products.save(&product("789101", 4), true).await.unwrap();
        let order = repos
            .orders
            .save(&picking_order("789101", 2, 2), true)
            .await
            .unwrap();
        let queued_before = store.pending_count().await.unwrap();

        let outcome = service.pick_item(&order, "789101").await.unwrap();
        assert_eq!(outcome, PickOutcome::AlreadyPicked);
        assert_eq!(store.pending_count().await.unwrap(), queued_before);
        assert_eq!(repos.products.get_local("789101").await.unwrap().unwrap().qty, 4);
    }

    #[tokio::test]
    async fn test_pick_with_zero_stock_is_rejected() {
        let gateway = MockGateway::offline();
        let (service, repos, _store) = service_with(gateway).await;

        repos.products.save(&product("789101", 0), true).await.unwrap();
        let order = repos
            .orders
            .save(&picking_order("789101", 2, 0), true)
            .await
            .unwrap();

        let err = service.pick_item(&order, "789101").await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::SyncError::Domain(CoreError::OutOfStock(_))
        ));
    }

    #[tokio::test]
    async fn test_pick_unknown_code_is_rejected() {
        let gateway = MockGateway::offline();
        let (service, repos, _store) = service_with(gateway).await;

        repos.products.save(&product("789101", 4), true).await.unwrap();
        let order = repos
            .orders
            .save(&picking_order("789101", 2, 0), true)
            .await
            .unwrap();

        let err = service.pick_item(&order, "000000").await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::SyncError::Domain(CoreError::ItemNotInOrder { .. })
        ));
    }

    #[tokio::test]
    async fn test_toggle_shipping_completes_and_logs_system_movement() {
        let gateway = MockGateway::offline();
        let (service, repos, store) = service_with(gateway).await;

        repos.products.save(&product("789101", 4), true).await.unwrap();
        let order = repos
            .orders
            .save(&picking_order("789101", 1, 1), true)
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);

        let completed = service
            .toggle_shipping(&order, ShippingMethod::Malote)
            .await
            .unwrap();
        assert_eq!(completed.status, OrderStatus::Completed);

        let movements: Vec<Movement> =
            store.read_collection(CollectionKind::Movements).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert!(movements[0].is_system());
        assert_eq!(movements[0].qty, 0);
        assert_eq!(movements[0].prod_name, "Envio Pedido #101");
        assert!(movements[0].obs.as_deref().unwrap().contains("Via: Malote"));

        // toggling the flag back off reverts to pending, no second movement
        let reverted = service
            .toggle_shipping(&completed, ShippingMethod::Malote)
            .await
            .unwrap();
        assert_eq!(reverted.status, OrderStatus::Pending);
        let movements: Vec<Movement> =
            store.read_collection(CollectionKind::Movements).await.unwrap();
        assert_eq!(movements.len(), 1);
    }
}
