//! # Sync Agent
//!
//! Main orchestrator for the sync layer. Owns the store, the gateway, the
//! engine, and the repositories, and runs the reconnection protocol.
//!
//! ## Reconnection Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        reconnect()                                      │
//! │                                                                         │
//! │  1. gateway.connect()      (re)establish the handle                    │
//! │          │                                                              │
//! │          ▼                                                              │
//! │  2. engine.drain(repos)    replay queued mutations, in order            │
//! │          │                                                              │
//! │          ▼                                                              │
//! │  3. refresh()              remote reads are authoritative once          │
//! │                            available: pull all three collections and    │
//! │                            rewrite the cache. Anything the drain just   │
//! │                            delivered is now server-side too, so the     │
//! │                            refresh both confirms and reconciles.        │
//! │                                                                         │
//! │  Queue outcomes reach the operator only in aggregate                    │
//! │  ("Sincronizados N itens.") through the notice sink.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tracing::{info, warn};

use estoque_core::{Notice, NoticeSink, NoOpSink};
use estoque_store::{CollectionKind, LocalStore};

use crate::engine::{DrainOutcome, SyncEngine};
use crate::error::SyncResult;
use crate::gateway::RemoteGateway;
use crate::repository::{
    MovementRepository, OrderRepository, ProductRepository, Repositories, StockService,
};

// =============================================================================
// Sync Agent
// =============================================================================

/// Entry point for embedding applications.
pub struct SyncAgent {
    store: Arc<LocalStore>,
    gateway: Arc<dyn RemoteGateway>,
    engine: Arc<SyncEngine>,
    repos: Repositories,
    stock: StockService,
    sink: Arc<dyn NoticeSink>,
}

impl SyncAgent {
    /// Creates an agent with no notice sink (headless).
    pub fn new(store: Arc<LocalStore>, gateway: Arc<dyn RemoteGateway>) -> Self {
        Self::with_sink(store, gateway, Arc::new(NoOpSink))
    }

    /// Creates an agent delivering aggregate sync notices to `sink`.
    pub fn with_sink(
        store: Arc<LocalStore>,
        gateway: Arc<dyn RemoteGateway>,
        sink: Arc<dyn NoticeSink>,
    ) -> Self {
        let engine = Arc::new(SyncEngine::new(store.clone(), gateway.clone()));
        let repos = Repositories::new(store.clone(), gateway.clone(), engine.clone());
        let stock = StockService::new(
            repos.products.clone(),
            repos.movements.clone(),
            repos.orders.clone(),
        );
        SyncAgent {
            store,
            gateway,
            engine,
            repos,
            stock,
            sink,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn products(&self) -> &ProductRepository {
        &self.repos.products
    }

    pub fn movements(&self) -> &MovementRepository {
        &self.repos.movements
    }

    pub fn orders(&self) -> &OrderRepository {
        &self.repos.orders
    }

    pub fn stock(&self) -> &StockService {
        &self.stock
    }

    /// Whether the gateway currently holds an established handle.
    pub fn is_online(&self) -> bool {
        self.gateway.is_available()
    }

    /// Number of mutations waiting for replay.
    pub async fn pending_count(&self) -> SyncResult<usize> {
        self.engine.pending_count().await
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Startup: try to connect and, if that works, sync and refresh.
    ///
    /// A failed connection is not an error here - the app starts in offline
    /// mode against the cache and the operator can reconnect later.
    pub async fn start(&self) -> SyncResult<()> {
        match self.gateway.connect().await {
            Ok(()) => {
                let pending = self.engine.pending_count().await?;
                if pending > 0 {
                    self.sink
                        .notify(Notice::info(format!("Enviando {} itens pendentes...", pending)));
                }
                self.drain_and_report().await?;
                self.refresh().await?;
            }
            Err(error) => {
                info!(error = %error, "Starting in offline mode");
            }
        }
        Ok(())
    }

    /// Explicit reconnect: (re)establish the handle, drain the queue, then
    /// refresh the cache from the remote source of truth.
    ///
    /// Connection failures surface to the caller - the operator asked for a
    /// reconnect and needs to know it didn't happen.
    pub async fn reconnect(&self) -> SyncResult<DrainOutcome> {
        self.gateway.connect().await?;

        let pending = self.engine.pending_count().await?;
        if pending > 0 {
            self.sink
                .notify(Notice::info(format!("Sincronizando {} itens offline...", pending)));
        }

        let outcome = self.drain_and_report().await?;
        self.refresh().await?;
        Ok(outcome)
    }

    /// Rewrites all three cached collections from the remote store.
    ///
    /// No-op while offline. Local-only records still in the queue survive in
    /// the cache through the next successful drain. A failed refresh of one
    /// collection aborts: the caller retries the whole pass rather than
    /// serving a half-reconciled cache.
    pub async fn refresh(&self) -> SyncResult<()> {
        if !self.gateway.is_available() {
            return Ok(());
        }

        let products = self.repos.products.fetch_all().await?;
        self.store
            .write_collection(CollectionKind::Products, &products)
            .await?;

        let movements = self.repos.movements.fetch_all().await?;
        self.store
            .write_collection(CollectionKind::Movements, &movements)
            .await?;

        let orders = self.repos.orders.fetch_all().await?;
        self.store
            .write_collection(CollectionKind::Orders, &orders)
            .await?;

        info!(
            products = products.len(),
            movements = movements.len(),
            orders = orders.len(),
            "Cache refreshed from remote"
        );
        Ok(())
    }

    async fn drain_and_report(&self) -> SyncResult<DrainOutcome> {
        let outcome = self.engine.drain(&self.repos).await?;
        match outcome {
            DrainOutcome::Completed { synced, failed } => {
                self.sink
                    .notify(Notice::success(format!("Sincronizados {} itens.", synced)));
                if failed > 0 {
                    warn!(failed, "Some pending mutations remain queued");
                }
            }
            DrainOutcome::Offline | DrainOutcome::Empty | DrainOutcome::AlreadyDraining => {}
        }
        Ok(outcome)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::Collection;
    use crate::testing::{memory_store, MockGateway};
    use estoque_core::{Order, OrderItem, Product};
    use chrono::NaiveDate;
    use std::sync::Mutex;

    struct RecordingSink(Mutex<Vec<Notice>>);

    impl NoticeSink for RecordingSink {
        fn notify(&self, notice: Notice) {
            self.0.lock().unwrap().push(notice);
        }
    }

    fn order(number: &str) -> Order {
        let mut order = Order::new(number, "João", NaiveDate::from_ymd_opt(2023, 10, 25).unwrap());
        order.items.push(OrderItem {
            product_id: "789101".into(),
            product_name: "Caneta Azul".into(),
            qty_requested: 2,
            qty_picked: 0,
        });
        order
    }

    #[tokio::test]
    async fn test_offline_order_survives_reconnect_end_to_end() {
        let gateway = MockGateway::offline();
        let store = memory_store().await;
        let agent = SyncAgent::new(store.clone(), gateway.clone());
        assert!(!agent.is_online());

        // offline save: cached + one ORDER queue entry
        let saved = agent.orders().save(&order("101"), true).await.unwrap();
        assert_eq!(agent.pending_count().await.unwrap(), 1);
        assert!(gateway.rows(Collection::Orders).is_empty());

        // reconnect: drain removes the entry, the order lands remotely
        let outcome = agent.reconnect().await.unwrap();
        assert_eq!(outcome, DrainOutcome::Completed { synced: 1, failed: 0 });
        assert_eq!(agent.pending_count().await.unwrap(), 0);
        assert!(!store.queue_key_present().await.unwrap());

        let remote = gateway.rows(Collection::Orders);
        assert_eq!(remote.len(), 1);
        assert_eq!(remote[0]["id"], serde_json::Value::String(saved.id));

        // and the refreshed cache still contains it
        let cached: Vec<Order> = store
            .read_collection(estoque_store::CollectionKind::Orders)
            .await
            .unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].order_number, "101");
    }

    #[tokio::test]
    async fn test_reconnect_reports_aggregate_count() {
        let gateway = MockGateway::offline();
        let store = memory_store().await;
        let sink = Arc::new(RecordingSink(Mutex::new(Vec::new())));
        let agent = SyncAgent::with_sink(store, gateway, sink.clone());

        let a1 = Product { id: "A1".into(), name: "Caneta".into(), qty: 1 };
        agent.products().save(&a1, true).await.unwrap();
        agent.orders().save(&order("101"), true).await.unwrap();

        agent.reconnect().await.unwrap();

        let notices = sink.0.lock().unwrap();
        assert!(notices
            .iter()
            .any(|n| n.message == "Sincronizando 2 itens offline..."));
        assert!(notices.iter().any(|n| n.message == "Sincronizados 2 itens."));
    }

    #[tokio::test]
    async fn test_refresh_pulls_authoritative_remote_state() {
        let gateway = MockGateway::online();
        let store = memory_store().await;
        let agent = SyncAgent::new(store.clone(), gateway.clone());

        gateway.seed(
            Collection::Products,
            vec![serde_json::json!({"id": "Z9", "name": "Remoto", "qty": 3})],
        );

        agent.refresh().await.unwrap();

        let cached: Vec<Product> = store
            .read_collection(estoque_store::CollectionKind::Products)
            .await
            .unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].id, "Z9");
    }

    #[tokio::test]
    async fn test_refresh_is_noop_offline() {
        let gateway = MockGateway::offline();
        let store = memory_store().await;
        let agent = SyncAgent::new(store.clone(), gateway);

        let a1 = Product { id: "A1".into(), name: "Caneta".into(), qty: 1 };
        agent.products().save(&a1, true).await.unwrap();

        agent.refresh().await.unwrap();

        // offline refresh must not wipe the cache
        let cached: Vec<Product> = store
            .read_collection(estoque_store::CollectionKind::Products)
            .await
            .unwrap();
        assert_eq!(cached.len(), 1);
    }

    #[tokio::test]
    async fn test_start_tolerates_offline_gateway() {
        // a gateway whose connect() fails: RestGateway with no configuration
        let gateway = Arc::new(crate::rest::RestGateway::new(crate::GatewayConfig::default()));
        let store = memory_store().await;
        let agent = SyncAgent::new(store, gateway);

        agent.start().await.unwrap();
        assert!(!agent.is_online());
    }
}
